//! Frame renderer strategies: weighted heat points and keyed globe markers.

pub mod heat;
pub mod markers;

use crate::frames::{Frame, FrameStore};

pub use heat::{heat_weight, HeatPoint, HeatSettings, HeatmapRenderer};
pub use markers::{
    reconcile, Marker, MarkerKey, MarkerPose, MarkerRenderer, MarkerSettings, Phase, RadiusScale,
    Reconciliation,
};

/// Maps one frame onto a visual representation. Must accept frames with no
/// events.
pub trait FrameRenderer {
    /// Called after every dataset (re)load, before any frame of it renders.
    fn dataset_loaded(&mut self, _store: &FrameStore) {}

    fn render_frame(&mut self, index: usize, frame: &Frame);
}
