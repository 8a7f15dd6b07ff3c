//! Frame store: bucketed events in chronological order plus display labels.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::data::QuakeEvent;
use crate::frames::bucket::{span_days, Granularity, GranularityThresholds};

/// Events sharing one bucket key.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    pub key: DateTime<Utc>,
    pub label: String,
    pub events: Vec<QuakeEvent>,
}

/// Immutable, chronologically ordered frames built from one dataset load.
#[derive(Clone, Debug, Default)]
pub struct FrameStore {
    frames: Vec<Frame>,
    granularity: Option<Granularity>,
    magnitude_extent: Option<(f64, f64)>,
    event_count: usize,
}

impl FrameStore {
    /// Bucket `events` at the granularity the thresholds pick for their span.
    /// Input order is preserved within each frame. Empty input gives an empty
    /// store.
    pub fn build(events: Vec<QuakeEvent>, thresholds: &GranularityThresholds) -> Self {
        let Some(span) = span_days(&events) else {
            return Self::default();
        };
        let granularity = thresholds.select(span);
        let event_count = events.len();
        let magnitude_extent = magnitude_extent(&events);

        let mut groups: BTreeMap<DateTime<Utc>, Vec<QuakeEvent>> = BTreeMap::new();
        for event in events {
            groups
                .entry(granularity.bucket_key(event.time))
                .or_default()
                .push(event);
        }

        let frames = groups
            .into_iter()
            .map(|(key, events)| Frame {
                key,
                label: granularity.label(key),
                events,
            })
            .collect();

        Self {
            frames,
            granularity: Some(granularity),
            magnitude_extent,
            event_count,
        }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Frame> {
        self.frames.get(index)
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.frames.iter().map(|f| f.label.as_str())
    }

    pub fn granularity(&self) -> Option<Granularity> {
        self.granularity
    }

    /// Min and max over non-null magnitudes in the whole dataset.
    pub fn magnitude_extent(&self) -> Option<(f64, f64)> {
        self.magnitude_extent
    }

    pub fn event_count(&self) -> usize {
        self.event_count
    }
}

fn magnitude_extent(events: &[QuakeEvent]) -> Option<(f64, f64)> {
    events
        .iter()
        .filter_map(|e| e.magnitude)
        .fold(None, |acc, m| match acc {
            None => Some((m, m)),
            Some((lo, hi)) => Some((lo.min(m), hi.max(m))),
        })
}
