//! Per-visualization playback context: frame store, controller, renderer
//! strategy and the status line they drive.

use std::fmt;
use std::time::Duration;

use crate::data::{LoadError, LoadOutcome};
use crate::frames::bucket::GranularityThresholds;
use crate::frames::playback::{PlaybackController, PlaybackState};
use crate::frames::store::{Frame, FrameStore};
use crate::render::FrameRenderer;

/// What the feature's label shows.
#[derive(Clone, Debug, PartialEq)]
pub enum StatusLine {
    Loading(String),
    NoData,
    Failed(String),
    Ready,
    Frame(String),
}

impl fmt::Display for StatusLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusLine::Loading(message) => f.write_str(message),
            StatusLine::NoData => f.write_str("No earthquake data found."),
            StatusLine::Failed(reason) => write!(f, "Unavailable: {reason}"),
            StatusLine::Ready => f.write_str("Ready — scroll here to play"),
            StatusLine::Frame(label) => f.write_str(label),
        }
    }
}

impl From<&LoadError> for StatusLine {
    fn from(err: &LoadError) -> Self {
        match err {
            LoadError::NoData => StatusLine::NoData,
            other => StatusLine::Failed(other.to_string()),
        }
    }
}

/// Renderer wrapper that mirrors each rendered frame's label into the status.
struct Labelled<'a, R: ?Sized> {
    renderer: &'a mut R,
    status: &'a mut StatusLine,
}

impl<R: FrameRenderer + ?Sized> FrameRenderer for Labelled<'_, R> {
    fn render_frame(&mut self, index: usize, frame: &Frame) {
        self.renderer.render_frame(index, frame);
        *self.status = StatusLine::Frame(frame.label.clone());
    }
}

/// One animated visualization. Created on mount, fed a dataset once it
/// loads, torn down with `unmount`.
pub struct QuakeAnimation<R> {
    store: FrameStore,
    playback: PlaybackController,
    thresholds: GranularityThresholds,
    renderer: R,
    status: StatusLine,
    loading_message: String,
}

impl<R: FrameRenderer> QuakeAnimation<R> {
    pub fn new(
        renderer: R,
        period: Duration,
        thresholds: GranularityThresholds,
        loading_message: impl Into<String>,
    ) -> Self {
        let loading_message = loading_message.into();
        Self {
            store: FrameStore::default(),
            playback: PlaybackController::new(period),
            thresholds,
            renderer,
            status: StatusLine::Loading(loading_message.clone()),
            loading_message,
        }
    }

    /// Replace the dataset. On success the first frame is shown paused and
    /// the status reads ready; on failure the status names the reason.
    pub fn load(&mut self, outcome: LoadOutcome) {
        self.playback.reset();
        match outcome {
            Ok(events) => {
                self.store = FrameStore::build(events, &self.thresholds);
                self.renderer.dataset_loaded(&self.store);
                if self.store.is_empty() {
                    self.status = StatusLine::NoData;
                    return;
                }
                self.playback.seek(0, &self.store, &mut self.renderer);
                self.status = StatusLine::Ready;
            }
            Err(err) => {
                self.store = FrameStore::default();
                self.renderer.dataset_loaded(&self.store);
                self.status = StatusLine::from(&err);
            }
        }
    }

    pub fn play(&mut self) -> bool {
        let mut target = Labelled {
            renderer: &mut self.renderer,
            status: &mut self.status,
        };
        self.playback.play(&self.store, &mut target)
    }

    pub fn pause(&mut self) -> bool {
        self.playback.pause()
    }

    pub fn tick(&mut self, delta: Duration) -> usize {
        let mut target = Labelled {
            renderer: &mut self.renderer,
            status: &mut self.status,
        };
        self.playback.tick(delta, &self.store, &mut target)
    }

    pub fn seek(&mut self, index: usize) {
        let mut target = Labelled {
            renderer: &mut self.renderer,
            status: &mut self.status,
        };
        self.playback.seek(index, &self.store, &mut target);
    }

    /// Stop playback and drop the dataset, back to the freshly mounted state.
    pub fn unmount(&mut self) {
        self.playback.reset();
        self.store = FrameStore::default();
        self.renderer.dataset_loaded(&self.store);
        self.status = StatusLine::Loading(self.loading_message.clone());
    }

    pub fn status(&self) -> &StatusLine {
        &self.status
    }

    pub fn state(&self) -> PlaybackState {
        self.playback.state()
    }

    pub fn is_playing(&self) -> bool {
        self.playback.is_playing()
    }

    pub fn index(&self) -> usize {
        self.playback.index()
    }

    pub fn store(&self) -> &FrameStore {
        &self.store
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }
}
