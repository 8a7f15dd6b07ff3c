//! One animated earthquake visualization mounted in a page section: its
//! pending load, playback context and visibility gate.

use bevy::log::warn;
use bevy::prelude::*;

use crate::camera::{PageLayout, SectionId};
use crate::data::{FeedChannel, RecordBuffer};
use crate::frames::{GateAction, QuakeAnimation, VisibilityGate};
use crate::render::FrameRenderer;
use crate::ui::HudState;

/// Per-visualization context. Inserted once when the app is built and kept
/// for its lifetime; a new load replaces the dataset in place.
#[derive(Resource)]
pub struct QuakeFeature<R: FrameRenderer + Send + Sync + 'static> {
    pub title: String,
    pub section: SectionId,
    pub animation: QuakeAnimation<R>,
    pub gate: VisibilityGate,
    channel: FeedChannel,
    recorder: Option<RecordBuffer>,
}

impl<R: FrameRenderer + Send + Sync + 'static> QuakeFeature<R> {
    pub fn new(
        title: impl Into<String>,
        section: SectionId,
        animation: QuakeAnimation<R>,
        channel: FeedChannel,
    ) -> Self {
        Self {
            title: title.into(),
            section,
            animation,
            gate: VisibilityGate::default(),
            channel,
            recorder: None,
        }
    }

    /// Save the loaded dataset to a fixture file once it arrives.
    pub fn with_recorder(mut self, recorder: RecordBuffer) -> Self {
        self.recorder = Some(recorder);
        self
    }

    pub fn is_loading(&self) -> bool {
        self.channel.is_pending()
    }

    /// Apply a gate decision. Both directions are no-ops when already there.
    pub fn apply(&mut self, action: GateAction) {
        match action {
            GateAction::Play => {
                self.animation.play();
            }
            GateAction::Pause => {
                self.animation.pause();
            }
        }
    }
}

/// Register a feature resource and the systems that drive it.
pub fn add_feature<R: FrameRenderer + Send + Sync + 'static>(
    app: &mut App,
    feature: QuakeFeature<R>,
) {
    app.insert_resource(feature).add_systems(
        Update,
        (
            ingest_feed::<R>,
            visibility_gate_system::<R>,
            playback_tick_system::<R>,
        )
            .chain(),
    );
}

/// Hand the dataset to the animation once the loader finishes.
pub fn ingest_feed<R: FrameRenderer + Send + Sync + 'static>(
    mut feature: ResMut<QuakeFeature<R>>,
    mut hud: ResMut<HudState>,
) {
    let Some(outcome) = feature.channel.poll() else {
        return;
    };

    if let (Ok(events), Some(recorder)) = (&outcome, &feature.recorder) {
        if let Err(err) = recorder.flush(events) {
            warn!("tremor: could not record {}: {err}", recorder.path.display());
        }
    }

    feature.animation.load(outcome);
    // Re-evaluate visibility against the fresh data.
    feature.gate.reset();

    let summary = crate::ui::DatasetSummary::from_store(feature.animation.store());
    let title = feature.title.clone();
    hud.update_summary(title, summary);
}

/// Feed the section's scroll visibility to the gate.
pub fn visibility_gate_system<R: FrameRenderer + Send + Sync + 'static>(
    page: Res<PageLayout>,
    mut feature: ResMut<QuakeFeature<R>>,
) {
    if feature.is_loading() {
        return;
    }
    let sample = page.visibility(feature.section);
    if let Some(action) = feature.gate.observe(sample) {
        feature.apply(action);
    }
}

/// Drive the playback timer with frame time.
pub fn playback_tick_system<R: FrameRenderer + Send + Sync + 'static>(
    time: Res<Time>,
    mut feature: ResMut<QuakeFeature<R>>,
) {
    feature.animation.tick(time.delta());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{LoadOutcome, QuakeEvent};
    use crate::frames::{GranularityThresholds, StatusLine};
    use crate::render::HeatmapRenderer;
    use chrono::{TimeZone, Utc};
    use std::time::Duration;

    fn feature(rx: crossbeam_channel::Receiver<LoadOutcome>) -> QuakeFeature<HeatmapRenderer> {
        QuakeFeature::new(
            "Japan",
            SectionId::Heatmap,
            QuakeAnimation::new(
                HeatmapRenderer::default(),
                Duration::from_millis(700),
                GranularityThresholds::default(),
                "Loading…",
            ),
            FeedChannel::new(rx),
        )
    }

    fn events() -> Vec<QuakeEvent> {
        (1..=3)
            .map(|d| {
                QuakeEvent::new(
                    Utc.with_ymd_and_hms(2024, 6, d, 0, 0, 0).unwrap(),
                    35.0,
                    139.0,
                    Some(4.0),
                )
            })
            .collect()
    }

    #[test]
    fn scrolling_section_into_view_starts_and_stops_playback() {
        let (tx, rx) = crossbeam_channel::bounded(1);
        let mut app = App::new();
        app.init_resource::<PageLayout>()
            .init_resource::<HudState>()
            .init_resource::<Time>();
        add_feature(&mut app, feature(rx));

        app.update();
        assert!(matches!(
            app.world().resource::<QuakeFeature<HeatmapRenderer>>().animation.status(),
            StatusLine::Loading(_)
        ));

        tx.send(Ok(events())).unwrap();
        app.update();
        {
            let feature = app.world().resource::<QuakeFeature<HeatmapRenderer>>();
            assert_eq!(feature.animation.status(), &StatusLine::Ready);
            assert!(!feature.animation.is_playing());
        }
        assert_eq!(app.world().resource::<HudState>().summaries().count(), 1);

        app.world_mut().resource_mut::<PageLayout>().scroll_by(8.0);
        app.update();
        assert!(app
            .world()
            .resource::<QuakeFeature<HeatmapRenderer>>()
            .animation
            .is_playing());

        app.world_mut().resource_mut::<PageLayout>().scroll_by(-8.0);
        app.update();
        assert!(!app
            .world()
            .resource::<QuakeFeature<HeatmapRenderer>>()
            .animation
            .is_playing());
    }
}
