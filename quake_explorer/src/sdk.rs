//! SDK entry points and builder for composing the earthquake explorer app.

use bevy::prelude::*;
use bevy_egui::EguiPlugin;
use chrono::Utc;

use crate::camera::{page_plugin, SectionId};
use crate::config::{self, AppConfig, GLOBE_HISTORY_DAYS, GLOBE_MIN_MAG};
use crate::data::{
    init_feed_channel, init_fixture_channel, BoundingRegion, FeedChannel, RecordBuffer,
    TableSource, UsgsFetcher, UsgsQuery,
};
use crate::frames::QuakeAnimation;
use crate::render::{HeatSettings, HeatmapRenderer, MarkerRenderer, MarkerSettings};
use crate::scene::{add_feature, globe_plugin, heatmap_plugin, setup_scene, QuakeFeature};
use crate::ui::{
    feature_controls_system, hud_plugin, intro_ui_system, marker_tooltip_system, HudState,
};

pub const HEATMAP_TITLE: &str = "Japan · live";
pub const GLOBE_TITLE: &str = "World · past year";

/// Builder for constructing a Tremor app with customizable features.
pub struct QuakeExplorerBuilder {
    config: Option<AppConfig>,
    heat_settings: HeatSettings,
    marker_settings: MarkerSettings,
    window_title: String,
    window_resolution: (f32, f32),
    clear_color: Color,
    enable_heatmap: bool,
    enable_globe: bool,
    enable_hud: bool,
    enable_controls: bool,
}

impl Default for QuakeExplorerBuilder {
    fn default() -> Self {
        Self {
            config: None,
            heat_settings: HeatSettings::default(),
            marker_settings: MarkerSettings::default(),
            window_title: "Tremor".to_string(),
            window_resolution: (1280.0, 720.0),
            clear_color: Color::srgb(0.03, 0.04, 0.07),
            enable_heatmap: true,
            enable_globe: true,
            enable_hud: true,
            enable_controls: true,
        }
    }
}

impl QuakeExplorerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use an explicit configuration instead of reading the environment.
    pub fn config(mut self, config: AppConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn heat_settings(mut self, settings: HeatSettings) -> Self {
        self.heat_settings = settings;
        self
    }

    pub fn marker_settings(mut self, settings: MarkerSettings) -> Self {
        self.marker_settings = settings;
        self
    }

    pub fn window_title(mut self, title: impl Into<String>) -> Self {
        self.window_title = title.into();
        self
    }

    pub fn window_resolution(mut self, width: f32, height: f32) -> Self {
        self.window_resolution = (width, height);
        self
    }

    pub fn clear_color(mut self, color: Color) -> Self {
        self.clear_color = color;
        self
    }

    pub fn disable_heatmap(mut self) -> Self {
        self.enable_heatmap = false;
        self
    }

    pub fn disable_globe(mut self) -> Self {
        self.enable_globe = false;
        self
    }

    pub fn disable_hud(mut self) -> Self {
        self.enable_hud = false;
        self
    }

    pub fn disable_controls(mut self) -> Self {
        self.enable_controls = false;
        self
    }

    /// Build the Bevy app with the selected configuration and features.
    pub fn build(self) -> App {
        let config = self.config.unwrap_or_else(config::app_config);

        let mut app = App::new();
        app.add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: self.window_title,
                resolution: self.window_resolution.into(),
                ..default()
            }),
            ..default()
        }))
        .add_plugins(EguiPlugin)
        .insert_resource(ClearColor(self.clear_color))
        .init_resource::<HudState>()
        .add_plugins(page_plugin)
        .add_systems(Startup, setup_scene);

        if self.enable_heatmap {
            add_feature(&mut app, heatmap_feature(&config, self.heat_settings));
            app.add_plugins(heatmap_plugin);
            if self.enable_controls {
                app.add_systems(Update, feature_controls_system::<HeatmapRenderer>);
            }
        }
        if self.enable_globe {
            add_feature(&mut app, globe_feature(&config, self.marker_settings));
            app.add_plugins(globe_plugin);
            if self.enable_controls {
                app.add_systems(
                    Update,
                    (feature_controls_system::<MarkerRenderer>, marker_tooltip_system),
                );
            }
        }
        if self.enable_controls {
            app.add_systems(Update, intro_ui_system);
        }
        if self.enable_hud {
            app.add_plugins(hud_plugin);
        }

        app
    }
}

fn heatmap_feature(config: &AppConfig, settings: HeatSettings) -> QuakeFeature<HeatmapRenderer> {
    let (channel, loading) = match &config.fixture {
        Some(path) => (
            init_fixture_channel(path, BoundingRegion::JAPAN, true),
            format!("Loading recorded data from {}…", path.display()),
        ),
        None => {
            let query = UsgsQuery::last_days(
                config.usgs_endpoint.clone(),
                config.live_days,
                Utc::now(),
                config.min_magnitude,
                BoundingRegion::JAPAN,
            );
            (
                init_feed_channel(UsgsFetcher::new(query)),
                format!("Loading live data (last {} days)…", config.live_days),
            )
        }
    };

    let animation = QuakeAnimation::new(
        HeatmapRenderer::new(settings),
        config.heat_period,
        config.thresholds,
        loading,
    );
    let feature = QuakeFeature::new(HEATMAP_TITLE, SectionId::Heatmap, animation, channel);
    match &config.record {
        Some(path) if config.fixture.is_none() => {
            feature.with_recorder(RecordBuffer::new(path.clone()))
        }
        _ => feature,
    }
}

fn globe_channel(config: &AppConfig) -> (FeedChannel, String) {
    match &config.globe_csv {
        Some(path) => (
            init_feed_channel(TableSource::new(path.clone(), BoundingRegion::WORLD)),
            format!("Loading {}…", path.display()),
        ),
        None => {
            let mut query = UsgsQuery::last_days(
                config.usgs_endpoint.clone(),
                GLOBE_HISTORY_DAYS,
                Utc::now(),
                GLOBE_MIN_MAG,
                BoundingRegion::WORLD,
            );
            query.require_magnitude = false;
            (
                init_feed_channel(UsgsFetcher::new(query)),
                format!("Loading M{GLOBE_MIN_MAG}+ events (last {GLOBE_HISTORY_DAYS} days)…"),
            )
        }
    }
}

fn globe_feature(config: &AppConfig, settings: MarkerSettings) -> QuakeFeature<MarkerRenderer> {
    let (channel, loading) = globe_channel(config);
    let animation = QuakeAnimation::new(
        MarkerRenderer::new(settings),
        config.globe_period,
        config.thresholds,
        loading,
    );
    QuakeFeature::new(GLOBE_TITLE, SectionId::Globe, animation, channel)
}
