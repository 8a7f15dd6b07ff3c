//! Playback controller: current frame index plus a fixed-period timer that
//! loops over the frame store until paused.

use std::time::Duration;

use crate::frames::store::FrameStore;
use crate::render::FrameRenderer;

const MIN_PERIOD: Duration = Duration::from_millis(1);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Playing,
}

/// Owns the frame index and the timer. The timer is the elapsed-time
/// accumulator; `None` means no timer is armed.
#[derive(Debug)]
pub struct PlaybackController {
    index: usize,
    period: Duration,
    timer: Option<Duration>,
}

impl PlaybackController {
    pub fn new(period: Duration) -> Self {
        Self {
            index: 0,
            period: period.max(MIN_PERIOD),
            timer: None,
        }
    }

    pub fn state(&self) -> PlaybackState {
        if self.timer.is_some() {
            PlaybackState::Playing
        } else {
            PlaybackState::Idle
        }
    }

    pub fn is_playing(&self) -> bool {
        self.timer.is_some()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Render the current frame and arm the timer. No-op when already
    /// playing or when there is nothing to play. Returns whether playback
    /// started.
    pub fn play<R: FrameRenderer + ?Sized>(&mut self, store: &FrameStore, renderer: &mut R) -> bool {
        if self.timer.is_some() || store.is_empty() {
            return false;
        }
        self.index = self.index.min(store.len() - 1);
        render(store, self.index, renderer);
        self.timer = Some(Duration::ZERO);
        true
    }

    /// Disarm the timer, keeping the index so `play` resumes in place.
    pub fn pause(&mut self) -> bool {
        self.timer.take().is_some()
    }

    /// Feed elapsed time to the timer. Every full period advances one frame,
    /// wrapping after the last, and renders it. Returns the number of advances.
    pub fn tick<R: FrameRenderer + ?Sized>(
        &mut self,
        delta: Duration,
        store: &FrameStore,
        renderer: &mut R,
    ) -> usize {
        let Some(elapsed) = self.timer.as_mut() else {
            return 0;
        };
        if store.is_empty() {
            return 0;
        }

        *elapsed += delta;
        let mut advances = 0;
        while *elapsed >= self.period {
            *elapsed -= self.period;
            self.index = (self.index + 1) % store.len();
            render(store, self.index, renderer);
            advances += 1;
        }
        advances
    }

    /// Jump to a frame (clamped) and render it. Playback state is unchanged
    /// but a running timer restarts its period.
    pub fn seek<R: FrameRenderer + ?Sized>(
        &mut self,
        index: usize,
        store: &FrameStore,
        renderer: &mut R,
    ) {
        if store.is_empty() {
            return;
        }
        self.index = index.min(store.len() - 1);
        if let Some(elapsed) = self.timer.as_mut() {
            *elapsed = Duration::ZERO;
        }
        render(store, self.index, renderer);
    }

    /// Forget position and timer, as after a fresh data load.
    pub fn reset(&mut self) {
        self.index = 0;
        self.timer = None;
    }
}

fn render<R: FrameRenderer + ?Sized>(store: &FrameStore, index: usize, renderer: &mut R) {
    if let Some(frame) = store.get(index) {
        renderer.render_frame(index, frame);
    }
}
