mod channel;
mod model;
pub mod table;
pub mod usgs;

use crossbeam_channel::Receiver;
use thiserror::Error;

pub use channel::{init_feed_channel, init_fixture_channel, FeedChannel, RecordBuffer};
pub use model::{BoundingRegion, QuakeEvent};
pub use table::TableSource;
pub use usgs::{UsgsFetcher, UsgsQuery};

/// Why a dataset load produced no frames.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("no earthquake data found")]
    NoData,
    #[error("missing column: {0}")]
    MissingColumn(&'static str),
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid feed JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid table: {0}")]
    Csv(#[from] csv::Error),
    #[error("read failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("loader unavailable: {0}")]
    Runtime(String),
}

/// Result of one dataset load: the kept events, or the reason there are none.
pub type LoadOutcome = Result<Vec<QuakeEvent>, LoadError>;

/// Interface for event sources. Each spawn performs one load on its own
/// thread and sends exactly one outcome.
pub trait QuakeSource: Send + 'static {
    fn spawn(self) -> Receiver<LoadOutcome>;
}

/// Turn an empty load into `NoData` so callers only ever see usable data.
pub(crate) fn non_empty(events: Vec<QuakeEvent>) -> LoadOutcome {
    if events.is_empty() {
        Err(LoadError::NoData)
    } else {
        Ok(events)
    }
}
