// Source-agnostic earthquake records.
// USGS and CSV specifics stay in usgs.rs / table.rs; conversion happens there.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single earthquake event as loaded from an upstream source.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuakeEvent {
    /// Stable upstream identifier, when the source provides one.
    pub id: Option<String>,
    pub time: DateTime<Utc>,
    pub latitude: f64,
    pub longitude: f64,
    pub magnitude: Option<f64>,
    pub place: Option<String>,
}

impl QuakeEvent {
    pub fn new(time: DateTime<Utc>, latitude: f64, longitude: f64, magnitude: Option<f64>) -> Self {
        Self {
            id: None,
            time,
            latitude,
            longitude,
            magnitude,
            place: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_place(mut self, place: impl Into<String>) -> Self {
        self.place = Some(place.into());
        self
    }
}

/// Lat/lon rectangle an event must fall inside to be kept.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingRegion {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl BoundingRegion {
    pub const JAPAN: Self = Self {
        min_lat: 24.0,
        max_lat: 46.0,
        min_lon: 122.0,
        max_lon: 154.0,
    };

    pub const WORLD: Self = Self {
        min_lat: -90.0,
        max_lat: 90.0,
        min_lon: -180.0,
        max_lon: 180.0,
    };

    /// True when both coordinates are finite and inside the rectangle (inclusive).
    pub fn contains(&self, latitude: f64, longitude: f64) -> bool {
        latitude.is_finite()
            && longitude.is_finite()
            && (self.min_lat..=self.max_lat).contains(&latitude)
            && (self.min_lon..=self.max_lon).contains(&longitude)
    }

    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lon + self.max_lon) / 2.0,
        )
    }

    pub fn lat_span(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    pub fn lon_span(&self) -> f64 {
        self.max_lon - self.min_lon
    }
}
