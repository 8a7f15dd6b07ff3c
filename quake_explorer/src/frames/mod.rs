//! Time-bucketed frame core shared by the heatmap and globe features.

mod animation;
pub mod bucket;
pub mod playback;
mod store;
pub mod visibility;

pub use animation::{QuakeAnimation, StatusLine};
pub use bucket::{span_days, Granularity, GranularityThresholds, ThresholdError};
pub use playback::{PlaybackController, PlaybackState};
pub use store::{Frame, FrameStore};
pub use visibility::{GateAction, VisibilityGate, VisibilitySample};
