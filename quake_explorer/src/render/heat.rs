use crate::frames::{Frame, FrameStore};
use crate::render::FrameRenderer;

/// Magnitude at which the heat weight saturates.
const MAX_MAGNITUDE: f64 = 9.0;
pub const MIN_WEIGHT: f32 = 0.2;

/// One weighted heat sample.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HeatPoint {
    pub latitude: f64,
    pub longitude: f64,
    pub weight: f32,
}

/// `(mag/9)^1.5 * 0.8 + 0.2`, clamped to `[0.2, 1.0]`. A missing magnitude
/// sits at the minimum visible weight.
pub fn heat_weight(magnitude: Option<f64>) -> f32 {
    let Some(mag) = magnitude.filter(|m| m.is_finite()) else {
        return MIN_WEIGHT;
    };
    let normalized = (mag / MAX_MAGNITUDE).max(0.0);
    let weight = normalized.powf(1.5) * 0.8 + f64::from(MIN_WEIGHT);
    (weight as f32).clamp(MIN_WEIGHT, 1.0)
}

/// Heat-layer drawing options.
#[derive(Clone, Debug)]
pub struct HeatSettings {
    /// Point radius in degrees of latitude.
    pub radius: f32,
    /// Extra falloff rings drawn around each point.
    pub blur_rings: u32,
    pub min_opacity: f32,
}

impl Default for HeatSettings {
    fn default() -> Self {
        Self {
            radius: 0.45,
            blur_rings: 3,
            min_opacity: 0.2,
        }
    }
}

/// Weighted-point renderer. Every frame replaces the whole point set.
#[derive(Default)]
pub struct HeatmapRenderer {
    pub settings: HeatSettings,
    points: Vec<HeatPoint>,
    frame: Option<usize>,
}

impl HeatmapRenderer {
    pub fn new(settings: HeatSettings) -> Self {
        Self {
            settings,
            points: Vec::new(),
            frame: None,
        }
    }

    pub fn points(&self) -> &[HeatPoint] {
        &self.points
    }

    /// Index of the frame currently shown, if any.
    pub fn frame(&self) -> Option<usize> {
        self.frame
    }
}

impl FrameRenderer for HeatmapRenderer {
    fn dataset_loaded(&mut self, _store: &FrameStore) {
        self.points.clear();
        self.frame = None;
    }

    fn render_frame(&mut self, index: usize, frame: &Frame) {
        self.points = frame
            .events
            .iter()
            .map(|event| HeatPoint {
                latitude: event.latitude,
                longitude: event.longitude,
                weight: heat_weight(event.magnitude),
            })
            .collect();
        self.frame = Some(index);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::QuakeEvent;
    use chrono::{TimeZone, Utc};

    #[test]
    fn weight_follows_power_law_with_floor() {
        assert!((heat_weight(Some(9.0)) - 1.0).abs() < 1e-6);
        assert!((heat_weight(Some(4.5)) - (0.5f32.powf(1.5) * 0.8 + 0.2)).abs() < 1e-6);
        assert_eq!(heat_weight(Some(0.0)), MIN_WEIGHT);
        assert_eq!(heat_weight(Some(-1.2)), MIN_WEIGHT);
        assert_eq!(heat_weight(Some(9.5)), 1.0);
        assert_eq!(heat_weight(None), MIN_WEIGHT);
    }

    #[test]
    fn each_frame_replaces_the_point_set() {
        let t = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let big = Frame {
            key: t,
            label: "2024-01-01".into(),
            events: vec![
                QuakeEvent::new(t, 35.0, 139.0, Some(3.0)),
                QuakeEvent::new(t, 36.0, 140.0, Some(6.0)),
            ],
        };
        let empty = Frame {
            key: t,
            label: "2024-01-02".into(),
            events: Vec::new(),
        };

        let mut renderer = HeatmapRenderer::default();
        renderer.render_frame(0, &big);
        assert_eq!(renderer.points().len(), 2);
        assert_eq!(renderer.points()[1].latitude, 36.0);

        renderer.render_frame(1, &empty);
        assert!(renderer.points().is_empty());
        assert_eq!(renderer.frame(), Some(1));
    }
}
