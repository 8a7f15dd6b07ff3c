//! USGS FDSN event query: dedicated thread + reqwest → QuakeEvent list.

use bevy::log::{info, warn};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use crossbeam_channel::{Receiver, Sender};
use serde::Deserialize;
use std::thread;
use url::Url;

use crate::data::model::{BoundingRegion, QuakeEvent};
use crate::data::{non_empty, LoadError, LoadOutcome, QuakeSource};

pub const USGS_ENDPOINT: &str = "https://earthquake.usgs.gov/fdsnws/event/1/query";

/// Result ordering requested from the FDSN service.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OrderBy {
    TimeAsc,
    Time,
    Magnitude,
}

impl OrderBy {
    fn as_param(self) -> &'static str {
        match self {
            OrderBy::TimeAsc => "time-asc",
            OrderBy::Time => "time",
            OrderBy::Magnitude => "magnitude",
        }
    }
}

/// Parameters for one FDSN event query.
#[derive(Clone, Debug)]
pub struct UsgsQuery {
    pub endpoint: Url,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub min_magnitude: f64,
    pub region: BoundingRegion,
    pub order_by: OrderBy,
    /// Drop events without a magnitude (the heat layer weights by it).
    pub require_magnitude: bool,
}

impl UsgsQuery {
    /// Window of `days` ending at `now`, ordered oldest first.
    pub fn last_days(
        endpoint: Url,
        days: u32,
        now: DateTime<Utc>,
        min_magnitude: f64,
        region: BoundingRegion,
    ) -> Self {
        Self {
            endpoint,
            start: now - ChronoDuration::days(i64::from(days)),
            end: now,
            min_magnitude,
            region,
            order_by: OrderBy::TimeAsc,
            require_magnitude: true,
        }
    }

    pub fn url(&self) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("format", "geojson")
            .append_pair("starttime", &self.start.format("%Y-%m-%d").to_string())
            .append_pair("endtime", &self.end.format("%Y-%m-%d").to_string())
            .append_pair("minmagnitude", &self.min_magnitude.to_string())
            .append_pair("minlatitude", &self.region.min_lat.to_string())
            .append_pair("maxlatitude", &self.region.max_lat.to_string())
            .append_pair("minlongitude", &self.region.min_lon.to_string())
            .append_pair("maxlongitude", &self.region.max_lon.to_string())
            .append_pair("orderby", self.order_by.as_param());
        url
    }
}

#[derive(Deserialize)]
struct FeatureCollection {
    #[serde(default)]
    features: Vec<Feature>,
}

#[derive(Deserialize)]
struct Feature {
    id: Option<String>,
    properties: Properties,
    geometry: Option<Geometry>,
}

#[derive(Deserialize)]
struct Properties {
    time: Option<i64>,
    mag: Option<f64>,
    place: Option<String>,
}

#[derive(Deserialize)]
struct Geometry {
    #[serde(default)]
    coordinates: Vec<Option<f64>>,
}

/// Parse a GeoJSON feed body, dropping malformed or out-of-region records.
pub fn parse_feed(body: &str, region: &BoundingRegion, require_magnitude: bool) -> LoadOutcome {
    let collection: FeatureCollection = serde_json::from_str(body)?;
    let total = collection.features.len();

    let events: Vec<QuakeEvent> = collection
        .features
        .into_iter()
        .filter_map(|feature| feature_to_event(feature, region, require_magnitude))
        .collect();

    if events.len() < total {
        info!(
            "tremor: dropped {} of {total} feed records (malformed or outside region)",
            total - events.len()
        );
    }
    non_empty(events)
}

fn feature_to_event(
    feature: Feature,
    region: &BoundingRegion,
    require_magnitude: bool,
) -> Option<QuakeEvent> {
    let time = DateTime::from_timestamp_millis(feature.properties.time?)?;
    let coords = feature.geometry?.coordinates;
    let longitude = (*coords.first()?)?;
    let latitude = (*coords.get(1)?)?;
    if !region.contains(latitude, longitude) {
        return None;
    }
    let magnitude = feature.properties.mag.filter(|m| m.is_finite());
    if require_magnitude && magnitude.is_none() {
        return None;
    }

    Some(QuakeEvent {
        id: feature.id,
        time,
        latitude,
        longitude,
        magnitude,
        place: feature.properties.place,
    })
}

/// Live feed loader backed by the USGS FDSN event service.
pub struct UsgsFetcher {
    pub query: UsgsQuery,
}

impl UsgsFetcher {
    pub fn new(query: UsgsQuery) -> Self {
        Self { query }
    }
}

impl QuakeSource for UsgsFetcher {
    fn spawn(self) -> Receiver<LoadOutcome> {
        let (tx, rx) = crossbeam_channel::bounded(1);
        thread::spawn(move || {
            let rt = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(rt) => rt,
                Err(err) => {
                    warn!("tremor: failed to build tokio runtime: {err}");
                    send_outcome(&tx, Err(LoadError::Runtime(err.to_string())));
                    return;
                }
            };
            let outcome = rt.block_on(fetch(&self.query));
            send_outcome(&tx, outcome);
        });
        rx
    }
}

async fn fetch(query: &UsgsQuery) -> LoadOutcome {
    let url = query.url();
    info!("tremor: fetching {url}");

    let body = reqwest::get(url)
        .await?
        .error_for_status()?
        .text()
        .await?;

    let outcome = parse_feed(&body, &query.region, query.require_magnitude);
    match &outcome {
        Ok(events) => info!("tremor: loaded {} events", events.len()),
        Err(err) => warn!("tremor: feed load failed: {err}"),
    }
    outcome
}

pub(crate) fn send_outcome(tx: &Sender<LoadOutcome>, outcome: LoadOutcome) {
    if tx.send(outcome).is_err() {
        info!("tremor: feed receiver dropped before load finished");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const FEED: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {"id": "us1", "properties": {"time": 1700000000000, "mag": 4.2, "place": "off Honshu"},
             "geometry": {"coordinates": [142.1, 38.3, 10.0]}},
            {"id": "us2", "properties": {"time": 1700000600000, "mag": null, "place": null},
             "geometry": {"coordinates": [141.0, 37.0, 5.0]}},
            {"id": "us3", "properties": {"time": 1700001200000, "mag": 3.1, "place": "Taiwan"},
             "geometry": {"coordinates": [121.0, 23.5, 12.0]}},
            {"id": "us4", "properties": {"time": null, "mag": 3.3, "place": "bad time"},
             "geometry": {"coordinates": [140.0, 36.0]}}
        ]
    }"#;

    fn endpoint() -> Url {
        USGS_ENDPOINT.parse().unwrap()
    }

    #[test]
    fn query_url_carries_window_and_region() {
        let now = Utc.with_ymd_and_hms(2025, 3, 31, 12, 0, 0).unwrap();
        let query = UsgsQuery::last_days(endpoint(), 30, now, 3.0, BoundingRegion::JAPAN);
        let url = query.url();
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        let get = |k: &str| {
            pairs
                .iter()
                .find(|(key, _)| key == k)
                .map(|(_, v)| v.clone())
                .unwrap()
        };

        assert_eq!(get("format"), "geojson");
        assert_eq!(get("starttime"), "2025-03-01");
        assert_eq!(get("endtime"), "2025-03-31");
        assert_eq!(get("minmagnitude"), "3");
        assert_eq!(get("minlatitude"), "24");
        assert_eq!(get("maxlongitude"), "154");
        assert_eq!(get("orderby"), "time-asc");
    }

    #[test]
    fn parse_feed_keeps_valid_records_in_region() {
        let events = parse_feed(FEED, &BoundingRegion::JAPAN, true).unwrap();
        assert_eq!(events.len(), 1);
        let event = &events[0];
        assert_eq!(event.id.as_deref(), Some("us1"));
        assert_eq!(event.latitude, 38.3);
        assert_eq!(event.longitude, 142.1);
        assert_eq!(event.magnitude, Some(4.2));
        assert_eq!(event.time.timestamp_millis(), 1_700_000_000_000);
    }

    #[test]
    fn parse_feed_keeps_null_magnitude_when_not_required() {
        let events = parse_feed(FEED, &BoundingRegion::JAPAN, false).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].magnitude, None);
    }

    #[test]
    fn empty_feed_is_no_data() {
        let outcome = parse_feed(r#"{"features": []}"#, &BoundingRegion::WORLD, true);
        assert!(matches!(outcome, Err(LoadError::NoData)));
        let outcome = parse_feed(r#"{"type": "FeatureCollection"}"#, &BoundingRegion::WORLD, true);
        assert!(matches!(outcome, Err(LoadError::NoData)));
    }

    #[test]
    fn garbage_body_is_json_error() {
        let outcome = parse_feed("<html>", &BoundingRegion::WORLD, true);
        assert!(matches!(outcome, Err(LoadError::Json(_))));
    }
}
