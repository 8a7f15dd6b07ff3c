//! Tremor — scroll-driven earthquake maps. Runs the quake_explorer app.

use bevy::prelude::*;
use quake_explorer::{config, QuakeExplorerBuilder};

fn main() {
    let _ = dotenvy::dotenv();
    let config = config::app_config();

    QuakeExplorerBuilder::new()
        .config(config)
        .window_title("Tremor")
        .window_resolution(1280., 720.)
        .clear_color(Color::srgb(0.03, 0.04, 0.07))
        .build()
        .run();
}
