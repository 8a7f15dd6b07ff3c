//! Tabular (CSV) event source with tolerant column matching.

use std::io::Read;
use std::path::PathBuf;
use std::thread;

use bevy::log::{info, warn};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use crossbeam_channel::Receiver;
use csv::StringRecord;

use crate::data::model::{BoundingRegion, QuakeEvent};
use crate::data::usgs::send_outcome;
use crate::data::{non_empty, LoadError, LoadOutcome, QuakeSource};

const LATITUDE: &[&str] = &["lat", "latitude"];
const LONGITUDE: &[&str] = &["lon", "lng", "longitude"];
const TIME: &[&str] = &["time", "timestamp", "date"];
const MAGNITUDE: &[&str] = &["mag", "magnitude"];
const PLACE: &[&str] = &["place"];
const ID: &[&str] = &["id"];

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// Resolved header positions. Latitude, longitude and time are mandatory.
#[derive(Debug, PartialEq)]
struct Columns {
    latitude: usize,
    longitude: usize,
    time: usize,
    magnitude: Option<usize>,
    place: Option<usize>,
    id: Option<usize>,
}

impl Columns {
    fn resolve(headers: &StringRecord) -> Result<Self, LoadError> {
        Ok(Self {
            latitude: find_column(headers, LATITUDE).ok_or(LoadError::MissingColumn("latitude"))?,
            longitude: find_column(headers, LONGITUDE)
                .ok_or(LoadError::MissingColumn("longitude"))?,
            time: find_column(headers, TIME).ok_or(LoadError::MissingColumn("time"))?,
            magnitude: find_column(headers, MAGNITUDE),
            place: find_column(headers, PLACE),
            id: find_column(headers, ID),
        })
    }
}

fn find_column(headers: &StringRecord, aliases: &[&str]) -> Option<usize> {
    headers
        .iter()
        .position(|h| aliases.iter().any(|alias| h.trim().eq_ignore_ascii_case(alias)))
}

/// Parse an absolute instant from the formats historical catalogues use.
/// Naive timestamps are taken as UTC; bare integers as epoch milliseconds.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
    }
    raw.parse::<i64>()
        .ok()
        .and_then(DateTime::from_timestamp_millis)
}

fn parse_float(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

fn optional_text(record: &StringRecord, column: Option<usize>) -> Option<String> {
    column
        .and_then(|i| record.get(i))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn record_to_event(
    record: &StringRecord,
    columns: &Columns,
    region: &BoundingRegion,
    require_magnitude: bool,
) -> Option<QuakeEvent> {
    let latitude = parse_float(record.get(columns.latitude)?)?;
    let longitude = parse_float(record.get(columns.longitude)?)?;
    if !region.contains(latitude, longitude) {
        return None;
    }
    let time = parse_timestamp(record.get(columns.time)?)?;
    let magnitude = columns
        .magnitude
        .and_then(|i| record.get(i))
        .and_then(parse_float);
    if require_magnitude && magnitude.is_none() {
        return None;
    }

    Some(QuakeEvent {
        id: optional_text(record, columns.id),
        time,
        latitude,
        longitude,
        magnitude,
        place: optional_text(record, columns.place),
    })
}

/// Read events from CSV text. A missing mandatory column fails the whole
/// load; individual bad rows are skipped.
pub fn parse_table<R: Read>(
    reader: R,
    region: &BoundingRegion,
    require_magnitude: bool,
) -> LoadOutcome {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    let columns = Columns::resolve(&headers)?;

    let mut dropped = 0usize;
    let mut events = Vec::new();
    for result in reader.records() {
        let event = result
            .ok()
            .and_then(|record| record_to_event(&record, &columns, region, require_magnitude));
        match event {
            Some(event) => events.push(event),
            None => dropped += 1,
        }
    }

    if dropped > 0 {
        info!("tremor: dropped {dropped} table rows (malformed or outside region)");
    }
    non_empty(events)
}

/// Historical catalogue loaded from a CSV file on disk.
pub struct TableSource {
    pub path: PathBuf,
    pub region: BoundingRegion,
    pub require_magnitude: bool,
}

impl TableSource {
    pub fn new(path: impl Into<PathBuf>, region: BoundingRegion) -> Self {
        Self {
            path: path.into(),
            region,
            require_magnitude: false,
        }
    }
}

impl QuakeSource for TableSource {
    fn spawn(self) -> Receiver<LoadOutcome> {
        let (tx, rx) = crossbeam_channel::bounded(1);
        thread::spawn(move || {
            info!("tremor: reading {}", self.path.display());
            let outcome = std::fs::File::open(&self.path)
                .map_err(LoadError::from)
                .and_then(|file| parse_table(file, &self.region, self.require_magnitude));
            if let Err(err) = &outcome {
                warn!("tremor: table load failed for {}: {err}", self.path.display());
            }
            send_outcome(&tx, outcome);
        });
        rx
    }
}
