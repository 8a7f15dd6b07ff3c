mod controls;
mod hud;

pub use controls::{feature_controls_system, intro_ui_system, marker_tooltip_system};
pub use hud::{hud_plugin, DatasetSummary, HudState};
