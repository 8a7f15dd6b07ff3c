//! Minimal prelude for SDK consumers.

pub use crate::config::{app_config, AppConfig};
pub use crate::data::{BoundingRegion, LoadError, LoadOutcome, QuakeEvent, QuakeSource};
pub use crate::frames::{
    Frame, FrameStore, Granularity, GranularityThresholds, QuakeAnimation, StatusLine,
};
pub use crate::render::{FrameRenderer, HeatmapRenderer, MarkerRenderer};
pub use crate::sdk::QuakeExplorerBuilder;
