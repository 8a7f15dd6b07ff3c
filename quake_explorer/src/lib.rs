//! Earthquake explorer — animated heatmap and globe of seismic events,
//! played frame by frame as each section scrolls into view.
//!
//! Library root: data sources, frame core, renderers, SDK builder, config.

mod camera;
pub mod config;
pub mod data;
pub mod frames;
pub mod render;
mod scene;
mod ui;

pub mod prelude;
pub mod sdk;

pub use data::{TableSource, UsgsFetcher, UsgsQuery};
pub use frames::{FrameStore, PlaybackController, QuakeAnimation, VisibilityGate};
pub use sdk::QuakeExplorerBuilder;
