use std::path::{Path, PathBuf};

use bevy::log::{info, warn};
use crossbeam_channel::{Receiver, TryRecvError};

use crate::data::model::{BoundingRegion, QuakeEvent};
use crate::data::usgs::send_outcome;
use crate::data::{non_empty, LoadError, LoadOutcome, QuakeSource};

/// One feature's pending dataset load. Systems poll this each frame until
/// the single outcome arrives.
pub struct FeedChannel {
    rx: Receiver<LoadOutcome>,
    done: bool,
}

impl FeedChannel {
    pub fn new(rx: Receiver<LoadOutcome>) -> Self {
        Self { rx, done: false }
    }

    /// Non-blocking. Yields the outcome once; afterwards always `None`.
    pub fn poll(&mut self) -> Option<LoadOutcome> {
        if self.done {
            return None;
        }
        match self.rx.try_recv() {
            Ok(outcome) => {
                self.done = true;
                Some(outcome)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.done = true;
                Some(Err(LoadError::Runtime(
                    "loader exited without a result".to_string(),
                )))
            }
        }
    }

    pub fn is_pending(&self) -> bool {
        !self.done
    }
}

/// Spawn the source's loader thread and wrap its receiver.
pub fn init_feed_channel(source: impl QuakeSource) -> FeedChannel {
    FeedChannel::new(source.spawn())
}

/// Records a loaded dataset for later replay from a fixture file.
pub struct RecordBuffer {
    pub path: PathBuf,
}

impl RecordBuffer {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Serialize events to the target path as JSON.
    pub fn flush(&self, events: &[QuakeEvent]) -> Result<(), LoadError> {
        let json = serde_json::to_string_pretty(events)?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, json)?;
        info!(
            "tremor: recorded {} events to {}",
            events.len(),
            self.path.display()
        );
        Ok(())
    }
}

fn read_fixture(path: &Path, region: &BoundingRegion, require_magnitude: bool) -> LoadOutcome {
    let json = std::fs::read_to_string(path)?;
    let recorded: Vec<QuakeEvent> = serde_json::from_str(&json)?;
    let total = recorded.len();

    let events: Vec<QuakeEvent> = recorded
        .into_iter()
        .filter(|e| region.contains(e.latitude, e.longitude))
        .filter(|e| !require_magnitude || e.magnitude.is_some_and(f64::is_finite))
        .collect();

    if events.len() < total {
        info!(
            "tremor: dropped {} of {total} fixture records (outside region or no magnitude)",
            total - events.len()
        );
    }
    non_empty(events)
}

/// Create a feed channel that replays events from a JSON fixture file,
/// applying the same region and magnitude rules as the live loaders.
pub fn init_fixture_channel(
    path: &Path,
    region: BoundingRegion,
    require_magnitude: bool,
) -> FeedChannel {
    let path = path.to_path_buf();
    let (tx, rx) = crossbeam_channel::bounded(1);

    std::thread::spawn(move || {
        let outcome = read_fixture(&path, &region, require_magnitude);
        if let Err(err) = &outcome {
            warn!("tremor: fixture {} unusable: {err}", path.display());
        }
        send_outcome(&tx, outcome);
    });

    FeedChannel::new(rx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::time::Duration;

    fn wait(channel: &mut FeedChannel) -> LoadOutcome {
        for _ in 0..200 {
            if let Some(outcome) = channel.poll() {
                return outcome;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        panic!("feed channel produced no outcome");
    }

    #[test]
    fn recorded_fixture_replays_identically() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fixtures").join("japan.json");
        let events = vec![
            QuakeEvent::new(Utc.with_ymd_and_hms(2024, 1, 1, 7, 10, 0).unwrap(), 37.5, 137.2, Some(7.5))
                .with_id("us6000m0xl")
                .with_place("Noto Peninsula"),
            QuakeEvent::new(Utc.with_ymd_and_hms(2024, 1, 2, 1, 0, 0).unwrap(), 37.3, 137.0, None),
        ];

        RecordBuffer::new(path.clone()).flush(&events).unwrap();
        let mut channel = init_fixture_channel(&path, BoundingRegion::JAPAN, false);

        assert_eq!(wait(&mut channel).unwrap(), events);
        assert!(!channel.is_pending());
        assert!(channel.poll().is_none());
    }

    #[test]
    fn replayed_fixture_drops_foreign_and_unsized_events() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mixed.json");
        let t = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let kept = QuakeEvent::new(t, 35.6, 139.7, Some(4.2)).with_id("kept");
        let events = vec![
            kept.clone(),
            QuakeEvent::new(t, 0.0, 0.0, Some(5.0)).with_id("gulf-of-guinea"),
            QuakeEvent::new(t, 36.0, 140.0, None).with_id("no-mag"),
        ];
        RecordBuffer::new(path.clone()).flush(&events).unwrap();

        let mut channel = init_fixture_channel(&path, BoundingRegion::JAPAN, true);
        assert_eq!(wait(&mut channel).unwrap(), vec![kept]);
    }

    #[test]
    fn fixture_with_only_rejected_events_is_no_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("foreign.json");
        let t = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        RecordBuffer::new(path.clone())
            .flush(&[QuakeEvent::new(t, 0.0, 0.0, None)])
            .unwrap();

        let mut channel = init_fixture_channel(&path, BoundingRegion::JAPAN, true);
        assert!(matches!(wait(&mut channel), Err(LoadError::NoData)));
    }

    #[test]
    fn missing_fixture_reports_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut channel = init_fixture_channel(
            &dir.path().join("absent.json"),
            BoundingRegion::JAPAN,
            true,
        );
        assert!(matches!(wait(&mut channel), Err(LoadError::Io(_))));
    }

    #[test]
    fn dropped_sender_is_reported_once() {
        let (tx, rx) = crossbeam_channel::bounded::<LoadOutcome>(1);
        drop(tx);
        let mut channel = FeedChannel::new(rx);
        assert!(matches!(channel.poll(), Some(Err(LoadError::Runtime(_)))));
        assert!(channel.poll().is_none());
    }
}
