//! Scroll-driven autoplay: reports play/pause when a section's visible
//! fraction crosses one of the observed thresholds.

pub const DEFAULT_THRESHOLDS: [f32; 3] = [0.0, 0.5, 1.0];
pub const DEFAULT_ACTIVATION: f32 = 0.5;

/// One intersection observation of a section against the viewport.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VisibilitySample {
    pub is_intersecting: bool,
    /// Visible share of the section, 0.0..=1.0.
    pub ratio: f32,
}

impl VisibilitySample {
    /// Sample for a section spanning `section` (top, bottom) seen through a
    /// viewport spanning `view`, both in page coordinates growing downward.
    pub fn from_spans(section: (f32, f32), view: (f32, f32)) -> Self {
        let (top, bottom) = section;
        let height = bottom - top;
        let overlap = (bottom.min(view.1) - top.max(view.0)).max(0.0);
        let ratio = if height > 0.0 {
            (overlap / height).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let is_intersecting = top < view.1 && bottom > view.0;
        Self {
            is_intersecting,
            ratio,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GateAction {
    Play,
    Pause,
}

/// Emits an action on the first observation and whenever the sample lands
/// in a different threshold band or intersection state than the last one.
#[derive(Clone, Debug)]
pub struct VisibilityGate {
    thresholds: Vec<f32>,
    activation: f32,
    last: Option<(bool, usize)>,
}

impl Default for VisibilityGate {
    fn default() -> Self {
        Self::new(&DEFAULT_THRESHOLDS, DEFAULT_ACTIVATION)
    }
}

impl VisibilityGate {
    pub fn new(thresholds: &[f32], activation: f32) -> Self {
        let mut thresholds = thresholds.to_vec();
        thresholds.sort_by(f32::total_cmp);
        Self {
            thresholds,
            activation,
            last: None,
        }
    }

    fn band(&self, ratio: f32) -> usize {
        self.thresholds.iter().filter(|&&t| ratio >= t).count()
    }

    pub fn observe(&mut self, sample: VisibilitySample) -> Option<GateAction> {
        let state = (sample.is_intersecting, self.band(sample.ratio));
        if self.last == Some(state) {
            return None;
        }
        self.last = Some(state);
        Some(Self::decide(sample, self.activation))
    }

    /// The play/pause rule on its own: intersecting and at least the
    /// activation share visible.
    pub fn decide(sample: VisibilitySample, activation: f32) -> GateAction {
        if sample.is_intersecting && sample.ratio >= activation {
            GateAction::Play
        } else {
            GateAction::Pause
        }
    }

    /// Forget the last observation so the next one always reports.
    pub fn reset(&mut self) {
        self.last = None;
    }
}
