//! Per-feature playback controls: Play / Pause, status label, frame scrubber.
//! Drawn at the top-left of the feature's section while it is on screen.

use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts};

use crate::camera::{PageLayout, SectionId};
use crate::frames::GateAction;
use crate::render::{FrameRenderer, MarkerRenderer};
use crate::scene::{HoveredMarker, QuakeFeature};

const PANEL_FILL: egui::Color32 = egui::Color32::from_rgba_premultiplied(15, 15, 25, 210);
const TEXT: egui::Color32 = egui::Color32::from_rgb(200, 220, 240);
const ACCENT: egui::Color32 = egui::Color32::from_rgb(240, 170, 90);

pub fn feature_controls_system<R: FrameRenderer + Send + Sync + 'static>(
    mut contexts: EguiContexts,
    page: Res<PageLayout>,
    windows: Query<&Window>,
    mut feature: ResMut<QuakeFeature<R>>,
) {
    if !page.visibility(feature.section).is_intersecting {
        return;
    }
    let Ok(window) = windows.get_single() else {
        return;
    };
    let Some(fraction) = page.screen_fraction_of(feature.section) else {
        return;
    };
    let y = (fraction * window.height()).max(0.0) + 10.0;

    let mut action = None;
    let mut seek = None;
    let frame_count = feature.animation.store().len();
    let mut index = feature.animation.index();

    egui::Area::new(egui::Id::new(("controls", feature.title.as_str())))
        .fixed_pos(egui::pos2(10.0, y))
        .show(contexts.ctx_mut(), |ui| {
            egui::Frame::default()
                .fill(PANEL_FILL)
                .inner_margin(egui::Margin::same(8))
                .corner_radius(egui::CornerRadius::same(4))
                .show(ui, |ui| {
                    ui.style_mut().override_text_style = Some(egui::TextStyle::Monospace);
                    ui.visuals_mut().override_text_color = Some(TEXT);

                    ui.label(egui::RichText::new(&feature.title).color(ACCENT));
                    ui.horizontal(|ui| {
                        if ui.button("Play").clicked() {
                            action = Some(GateAction::Play);
                        }
                        if ui.button("Pause").clicked() {
                            action = Some(GateAction::Pause);
                        }
                        ui.separator();
                        ui.label(feature.animation.status().to_string());
                    });

                    if frame_count > 1 {
                        let slider = egui::Slider::new(&mut index, 0..=frame_count - 1)
                            .show_value(false);
                        if ui.add(slider).changed() {
                            seek = Some(index);
                        }
                    }
                });
        });

    if let Some(action) = action {
        feature.apply(action);
    }
    if let Some(index) = seek {
        feature.animation.seek(index);
    }
}

/// Tooltip for the globe marker under the pointer.
pub fn marker_tooltip_system(
    mut contexts: EguiContexts,
    hovered: Res<HoveredMarker>,
    windows: Query<&Window>,
    globe: Option<Res<QuakeFeature<MarkerRenderer>>>,
) {
    let (Some(key), Some(globe)) = (hovered.key.as_ref(), globe) else {
        return;
    };
    let Some(marker) = globe.animation.renderer().get(key) else {
        return;
    };
    let Ok(window) = windows.get_single() else {
        return;
    };
    let Some(cursor) = window.cursor_position() else {
        return;
    };

    let pose = marker.pose();
    let magnitude = marker
        .magnitude
        .map_or_else(|| "M ?".to_string(), |m| format!("M {m:.1}"));
    let place = marker.place.as_deref().unwrap_or("Unknown location");

    egui::Area::new(egui::Id::new("marker_tooltip"))
        .fixed_pos(egui::pos2(cursor.x + 14.0, cursor.y + 14.0))
        .order(egui::Order::Tooltip)
        .show(contexts.ctx_mut(), |ui| {
            egui::Frame::default()
                .fill(PANEL_FILL)
                .inner_margin(egui::Margin::same(6))
                .corner_radius(egui::CornerRadius::same(4))
                .show(ui, |ui| {
                    ui.visuals_mut().override_text_color = Some(TEXT);
                    ui.label(egui::RichText::new(magnitude).color(ACCENT));
                    ui.label(place);
                    ui.label(format!("{:.2}°, {:.2}°", pose.latitude, pose.longitude));
                });
        });
}

/// Title card for the intro section.
pub fn intro_ui_system(mut contexts: EguiContexts, page: Res<PageLayout>, windows: Query<&Window>) {
    if !page.visibility(SectionId::Intro).is_intersecting {
        return;
    }
    let Ok(window) = windows.get_single() else {
        return;
    };
    let Some(fraction) = page.screen_fraction_of(SectionId::Intro) else {
        return;
    };
    let y = fraction * window.height() + window.height() * 0.35;

    egui::Area::new(egui::Id::new("intro"))
        .fixed_pos(egui::pos2(window.width() * 0.5 - 220.0, y))
        .show(contexts.ctx_mut(), |ui| {
            ui.visuals_mut().override_text_color = Some(TEXT);
            ui.label(egui::RichText::new("Tremor").size(42.0).color(ACCENT));
            ui.label(
                egui::RichText::new("A month of shaking under Japan, then a year around the world.")
                    .size(16.0),
            );
            ui.add_space(8.0);
            ui.label("Scroll down. Each map plays while it fills the screen.");
        });
}
