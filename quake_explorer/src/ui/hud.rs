//! HUD overlay: per-feature dataset summary, playback state, FPS counter.

use bevy::diagnostic::{DiagnosticsStore, FrameTimeDiagnosticsPlugin};
use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts};

use crate::frames::{FrameStore, Granularity};
use crate::render::{HeatmapRenderer, MarkerRenderer};
use crate::scene::QuakeFeature;

/// Shape of one loaded dataset.
#[derive(Clone, Debug, PartialEq)]
pub struct DatasetSummary {
    pub events: usize,
    pub frames: usize,
    pub granularity: Option<Granularity>,
    pub magnitude_extent: Option<(f64, f64)>,
    pub first_label: Option<String>,
    pub last_label: Option<String>,
}

impl DatasetSummary {
    pub fn from_store(store: &FrameStore) -> Self {
        Self {
            events: store.event_count(),
            frames: store.len(),
            granularity: store.granularity(),
            magnitude_extent: store.magnitude_extent(),
            first_label: store.frames().first().map(|f| f.label.clone()),
            last_label: store.frames().last().map(|f| f.label.clone()),
        }
    }
}

/// Summaries of every loaded feature, in load order.
#[derive(Resource, Default)]
pub struct HudState {
    summaries: Vec<(String, DatasetSummary)>,
}

impl HudState {
    pub fn update_summary(&mut self, title: String, summary: DatasetSummary) {
        match self.summaries.iter_mut().find(|(t, _)| *t == title) {
            Some(entry) => entry.1 = summary,
            None => self.summaries.push((title, summary)),
        }
    }

    pub fn summaries(&self) -> impl Iterator<Item = &(String, DatasetSummary)> {
        self.summaries.iter()
    }
}

pub fn hud_plugin(app: &mut App) {
    app.add_plugins(FrameTimeDiagnosticsPlugin)
        .add_systems(Update, hud_overlay_system);
}

fn hud_overlay_system(
    mut contexts: EguiContexts,
    hud: Res<HudState>,
    diagnostics: Res<DiagnosticsStore>,
    heat: Option<Res<QuakeFeature<HeatmapRenderer>>>,
    globe: Option<Res<QuakeFeature<MarkerRenderer>>>,
) {
    let fps = diagnostics
        .get(&FrameTimeDiagnosticsPlugin::FPS)
        .and_then(|d| d.smoothed())
        .unwrap_or(0.0);

    let playing = |title: &str| -> Option<bool> {
        if let Some(f) = heat.as_ref().filter(|f| f.title == title) {
            return Some(f.animation.is_playing());
        }
        globe
            .as_ref()
            .filter(|f| f.title == title)
            .map(|f| f.animation.is_playing())
    };

    egui::Window::new("Datasets")
        .anchor(egui::Align2::RIGHT_TOP, [-10.0, 10.0])
        .resizable(false)
        .collapsible(false)
        .title_bar(false)
        .frame(
            egui::Frame::default()
                .fill(egui::Color32::from_rgba_premultiplied(15, 15, 25, 210))
                .inner_margin(egui::Margin::same(12))
                .corner_radius(egui::CornerRadius::same(6)),
        )
        .show(contexts.ctx_mut(), |ui| {
            ui.style_mut().override_text_style = Some(egui::TextStyle::Monospace);
            ui.visuals_mut().override_text_color = Some(egui::Color32::from_rgb(200, 220, 240));

            for (title, summary) in hud.summaries() {
                ui.label(
                    egui::RichText::new(title)
                        .size(15.0)
                        .color(egui::Color32::from_rgb(240, 170, 90)),
                );
                ui.label(format!("Events  {}", summary.events));
                ui.label(format!(
                    "Frames  {} ({})",
                    summary.frames,
                    summary
                        .granularity
                        .map_or_else(|| "-".to_string(), |g| g.to_string())
                ));
                if let (Some(first), Some(last)) = (&summary.first_label, &summary.last_label) {
                    ui.label(format!("Range   {first} → {last}"));
                }
                ui.label(format!("Mag     {}", format_extent(summary.magnitude_extent)));
                if let Some(is_playing) = playing(title) {
                    ui.label(if is_playing { "▶ playing" } else { "❚❚ paused" });
                }
                ui.add_space(6.0);
            }

            ui.separator();
            ui.label(format!("FPS  {fps:.0}"));
        });
}

fn format_extent(extent: Option<(f64, f64)>) -> String {
    match extent {
        Some((lo, hi)) => format!("{lo:.1}–{hi:.1}"),
        None => "n/a".to_string(),
    }
}
