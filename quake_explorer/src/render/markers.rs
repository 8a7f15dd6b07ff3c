//! Positioned-marker renderer: keyed enter/update/exit reconciliation with
//! timed transitions.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use crate::data::QuakeEvent;
use crate::frames::{Frame, FrameStore};
use crate::render::FrameRenderer;

/// Marker identity. The upstream id when present, otherwise the
/// time + longitude + latitude composite (bit-exact).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum MarkerKey {
    Id(String),
    Composite {
        time_ms: i64,
        lon_bits: u64,
        lat_bits: u64,
    },
}

impl MarkerKey {
    pub fn of(event: &QuakeEvent) -> Self {
        match &event.id {
            Some(id) => MarkerKey::Id(id.clone()),
            None => MarkerKey::Composite {
                time_ms: event.time.timestamp_millis(),
                lon_bits: event.longitude.to_bits(),
                lat_bits: event.latitude.to_bits(),
            },
        }
    }
}

/// Linear magnitude → radius scale over the dataset's magnitude extent.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RadiusScale {
    domain: (f64, f64),
    range: (f32, f32),
}

impl RadiusScale {
    /// The domain span is widened to at least one magnitude unit.
    pub fn new(extent: Option<(f64, f64)>, r_min: f32, r_max: f32) -> Self {
        let (lo, hi) = extent.unwrap_or((0.0, 1.0));
        Self {
            domain: (lo, hi.max(lo + 1.0)),
            range: (r_min.min(r_max), r_max.max(r_min)),
        }
    }

    pub fn domain(&self) -> (f64, f64) {
        self.domain
    }

    /// Clamped to the range; a missing magnitude maps to the minimum radius.
    pub fn radius(&self, magnitude: Option<f64>) -> f32 {
        let (r_min, r_max) = self.range;
        let Some(mag) = magnitude.filter(|m| m.is_finite()) else {
            return r_min;
        };
        let (lo, hi) = self.domain;
        let t = ((mag - lo) / (hi - lo)).clamp(0.0, 1.0) as f32;
        r_min + t * (r_max - r_min)
    }
}

/// Enter/update/exit key sets between two consecutive frames.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Reconciliation {
    pub entering: Vec<MarkerKey>,
    pub updating: Vec<MarkerKey>,
    pub exiting: Vec<MarkerKey>,
}

/// Set difference/intersection of old and new keys. Entering and updating
/// keep the new frame's order, exiting keeps the old order.
pub fn reconcile(old: &[MarkerKey], new: &[MarkerKey]) -> Reconciliation {
    let old_set: HashSet<&MarkerKey> = old.iter().collect();
    let new_set: HashSet<&MarkerKey> = new.iter().collect();

    let (updating, entering): (Vec<MarkerKey>, Vec<MarkerKey>) =
        new.iter().cloned().partition(|k| old_set.contains(k));
    let exiting = old
        .iter()
        .filter(|k| !new_set.contains(k))
        .cloned()
        .collect();

    Reconciliation {
        entering,
        updating,
        exiting,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Entering,
    Updating,
    Exiting,
}

/// Position, size and opacity of a marker at one instant.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MarkerPose {
    pub latitude: f64,
    pub longitude: f64,
    pub radius: f32,
    pub opacity: f32,
}

impl MarkerPose {
    fn lerp(self, to: MarkerPose, t: f32) -> MarkerPose {
        let tf = f64::from(t);
        MarkerPose {
            latitude: self.latitude + (to.latitude - self.latitude) * tf,
            longitude: self.longitude + (to.longitude - self.longitude) * tf,
            radius: self.radius + (to.radius - self.radius) * t,
            opacity: self.opacity + (to.opacity - self.opacity) * t,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Marker {
    pub key: MarkerKey,
    pub phase: Phase,
    pub magnitude: Option<f64>,
    pub place: Option<String>,
    from: MarkerPose,
    to: MarkerPose,
    progress: f32,
}

impl Marker {
    pub fn pose(&self) -> MarkerPose {
        self.from.lerp(self.to, ease_cubic_in_out(self.progress))
    }

    pub fn target(&self) -> MarkerPose {
        self.to
    }

    pub fn progress(&self) -> f32 {
        self.progress
    }

    fn retarget(&mut self, phase: Phase, to: MarkerPose) {
        self.from = self.pose();
        self.to = to;
        self.phase = phase;
        self.progress = 0.0;
    }
}

fn ease_cubic_in_out(t: f32) -> f32 {
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

#[derive(Clone, Debug)]
pub struct MarkerSettings {
    pub r_min: f32,
    pub r_max: f32,
    pub opacity: f32,
    pub transition: Duration,
}

impl Default for MarkerSettings {
    fn default() -> Self {
        Self {
            r_min: 0.02,
            r_max: 0.12,
            opacity: 0.85,
            transition: Duration::from_millis(500),
        }
    }
}

/// Keeps the live marker set for the globe overlay in step with frames.
pub struct MarkerRenderer {
    pub settings: MarkerSettings,
    scale: RadiusScale,
    markers: HashMap<MarkerKey, Marker>,
    /// Keys of the last rendered frame, in that frame's order.
    live: Vec<MarkerKey>,
    last: Reconciliation,
}

impl Default for MarkerRenderer {
    fn default() -> Self {
        Self::new(MarkerSettings::default())
    }
}

impl MarkerRenderer {
    pub fn new(settings: MarkerSettings) -> Self {
        let scale = RadiusScale::new(None, settings.r_min, settings.r_max);
        Self {
            settings,
            scale,
            markers: HashMap::new(),
            live: Vec::new(),
            last: Reconciliation::default(),
        }
    }

    pub fn markers(&self) -> impl Iterator<Item = &Marker> {
        self.markers.values()
    }

    pub fn get(&self, key: &MarkerKey) -> Option<&Marker> {
        self.markers.get(key)
    }

    pub fn scale(&self) -> &RadiusScale {
        &self.scale
    }

    /// Markers that belong to the current frame (not fading out).
    pub fn live_count(&self) -> usize {
        self.markers
            .values()
            .filter(|m| m.phase != Phase::Exiting)
            .count()
    }

    pub fn last_reconciliation(&self) -> &Reconciliation {
        &self.last
    }

    /// Step transitions; exiting markers whose fade finished are removed.
    pub fn advance(&mut self, dt: Duration) {
        let step = if self.settings.transition.is_zero() {
            1.0
        } else {
            dt.as_secs_f32() / self.settings.transition.as_secs_f32()
        };
        for marker in self.markers.values_mut() {
            marker.progress = (marker.progress + step).min(1.0);
        }
        self.markers
            .retain(|_, m| !(m.phase == Phase::Exiting && m.progress >= 1.0));
    }

    fn pose_for(&self, event: &QuakeEvent) -> MarkerPose {
        MarkerPose {
            latitude: event.latitude,
            longitude: event.longitude,
            radius: self.scale.radius(event.magnitude),
            opacity: self.settings.opacity,
        }
    }
}

impl FrameRenderer for MarkerRenderer {
    fn dataset_loaded(&mut self, store: &FrameStore) {
        self.scale = RadiusScale::new(
            store.magnitude_extent(),
            self.settings.r_min,
            self.settings.r_max,
        );
        self.markers.clear();
        self.live.clear();
        self.last = Reconciliation::default();
    }

    fn render_frame(&mut self, _index: usize, frame: &Frame) {
        // First event wins when two share a key.
        let mut seen = HashSet::new();
        let incoming: Vec<(MarkerKey, &QuakeEvent)> = frame
            .events
            .iter()
            .map(|e| (MarkerKey::of(e), e))
            .filter(|(k, _)| seen.insert(k.clone()))
            .collect();

        let new: Vec<MarkerKey> = incoming.iter().map(|(k, _)| k.clone()).collect();
        let rec = reconcile(&self.live, &new);
        let entering: HashSet<&MarkerKey> = rec.entering.iter().collect();

        for (key, event) in &incoming {
            let to = self.pose_for(event);
            if entering.contains(key) {
                let start = MarkerPose {
                    radius: 0.0,
                    opacity: 0.0,
                    ..to
                };
                let marker = self.markers.entry(key.clone()).or_insert_with(|| Marker {
                    key: key.clone(),
                    phase: Phase::Entering,
                    magnitude: event.magnitude,
                    place: event.place.clone(),
                    from: start,
                    to,
                    progress: 0.0,
                });
                // A key still fading out comes back from where it is.
                if marker.phase == Phase::Exiting {
                    marker.magnitude = event.magnitude;
                    marker.place = event.place.clone();
                    marker.retarget(Phase::Entering, to);
                }
            } else if let Some(marker) = self.markers.get_mut(key) {
                marker.magnitude = event.magnitude;
                marker.place = event.place.clone();
                marker.retarget(Phase::Updating, to);
            }
        }

        for key in &rec.exiting {
            if let Some(marker) = self.markers.get_mut(key) {
                let to = MarkerPose {
                    opacity: 0.0,
                    ..marker.pose()
                };
                marker.retarget(Phase::Exiting, to);
            }
        }

        self.live = new;
        self.last = rec;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frames::GranularityThresholds;
    use chrono::{DateTime, TimeZone, Utc};

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 4, day, hour, 0, 0).unwrap()
    }

    fn frame(events: Vec<QuakeEvent>) -> Frame {
        Frame {
            key: at(1, 0),
            label: "2024-04-01".into(),
            events,
        }
    }

    fn key(n: u32) -> MarkerKey {
        MarkerKey::Id(format!("ev{n}"))
    }

    #[test]
    fn reconcile_partitions_keys() {
        let old = [key(1), key(2), key(3)];
        let new = [key(3), key(4), key(2)];
        let rec = reconcile(&old, &new);
        assert_eq!(rec.entering, [key(4)]);
        assert_eq!(rec.updating, [key(3), key(2)]);
        assert_eq!(rec.exiting, [key(1)]);
    }

    #[test]
    fn composite_key_used_without_id() {
        let a = QuakeEvent::new(at(1, 1), 10.0, 20.0, Some(5.0));
        let b = QuakeEvent::new(at(1, 1), 10.0, 20.0, Some(6.0));
        let c = QuakeEvent::new(at(1, 1), 10.0, 20.000001, Some(5.0));
        assert_eq!(MarkerKey::of(&a), MarkerKey::of(&b));
        assert_ne!(MarkerKey::of(&a), MarkerKey::of(&c));
        assert_eq!(MarkerKey::of(&a.clone().with_id("x")), MarkerKey::Id("x".into()));
    }

    #[test]
    fn radius_scale_is_monotone_and_bounded() {
        let scale = RadiusScale::new(Some((4.0, 7.5)), 2.0, 12.0);
        let mut last = 0.0;
        for step in 0..=35 {
            let mag = 4.0 + f64::from(step) * 0.1;
            let r = scale.radius(Some(mag));
            assert!((2.0..=12.0).contains(&r));
            assert!(r >= last);
            last = r;
        }
        assert_eq!(scale.radius(Some(4.0)), 2.0);
        assert_eq!(scale.radius(Some(7.5)), 12.0);
        assert_eq!(scale.radius(Some(9.0)), 12.0);
        assert_eq!(scale.radius(None), 2.0);
    }

    #[test]
    fn narrow_extent_widens_to_one_unit() {
        let scale = RadiusScale::new(Some((5.0, 5.0)), 0.0, 10.0);
        assert_eq!(scale.domain(), (5.0, 6.0));
        assert_eq!(scale.radius(Some(5.5)), 5.0);
    }

    #[test]
    fn rendered_count_matches_new_frame_and_exits_fade_out() {
        let a = QuakeEvent::new(at(1, 1), 35.0, 139.0, Some(5.0)).with_id("a");
        let b = QuakeEvent::new(at(1, 2), 36.0, 140.0, Some(6.0)).with_id("b");
        let c = QuakeEvent::new(at(2, 1), 37.0, 141.0, None).with_id("c");

        let store = FrameStore::build(
            vec![a.clone(), b.clone(), c.clone()],
            &GranularityThresholds::default(),
        );
        let mut renderer = MarkerRenderer::default();
        renderer.dataset_loaded(&store);

        renderer.render_frame(0, &frame(vec![a.clone(), b.clone()]));
        assert_eq!(renderer.live_count(), 2);
        let entering = renderer.get(&MarkerKey::of(&a)).unwrap();
        assert_eq!(entering.phase, Phase::Entering);
        assert_eq!(entering.pose().radius, 0.0);

        renderer.advance(Duration::from_secs(1));
        let settled = renderer.get(&MarkerKey::of(&b)).unwrap();
        assert_eq!(settled.pose().radius, renderer.settings.r_max);

        renderer.render_frame(1, &frame(vec![b.clone(), c.clone()]));
        let rec = renderer.last_reconciliation();
        assert_eq!(rec.entering, [MarkerKey::of(&c)]);
        assert_eq!(rec.updating, [MarkerKey::of(&b)]);
        assert_eq!(rec.exiting, [MarkerKey::of(&a)]);
        assert_eq!(renderer.live_count(), 2);
        assert_eq!(
            renderer.get(&MarkerKey::of(&a)).unwrap().phase,
            Phase::Exiting
        );

        renderer.advance(Duration::from_secs(1));
        assert!(renderer.get(&MarkerKey::of(&a)).is_none());
        assert_eq!(renderer.markers().count(), 2);
        assert_eq!(
            renderer.get(&MarkerKey::of(&c)).unwrap().pose().radius,
            renderer.settings.r_min
        );
    }

    #[test]
    fn exiting_keys_follow_previous_frame_order() {
        let events: Vec<QuakeEvent> = (1..=8)
            .map(|n| {
                QuakeEvent::new(at(1, n), 30.0 + f64::from(n), 135.0, Some(5.0))
                    .with_id(format!("ev{n}"))
            })
            .collect();
        let mut renderer = MarkerRenderer::default();
        renderer.render_frame(0, &frame(events.clone()));
        renderer.render_frame(1, &frame(vec![events[3].clone()]));

        let expected: Vec<MarkerKey> = [1, 2, 3, 5, 6, 7, 8].into_iter().map(key).collect();
        assert_eq!(renderer.last_reconciliation().exiting, expected);
        assert_eq!(renderer.last_reconciliation().updating, [key(4)]);
    }

    #[test]
    fn returning_marker_takes_new_details() {
        let first = QuakeEvent::new(at(1, 1), 35.0, 139.0, Some(5.0))
            .with_id("ev1")
            .with_place("Old label");
        let second = QuakeEvent::new(at(1, 1), 35.0, 139.0, Some(6.5))
            .with_id("ev1")
            .with_place("Revised label");
        let mut renderer = MarkerRenderer::default();

        renderer.render_frame(0, &frame(vec![first]));
        renderer.render_frame(1, &frame(Vec::new()));
        assert_eq!(renderer.get(&key(1)).unwrap().phase, Phase::Exiting);

        renderer.render_frame(2, &frame(vec![second]));
        let marker = renderer.get(&key(1)).unwrap();
        assert_eq!(marker.phase, Phase::Entering);
        assert_eq!(marker.magnitude, Some(6.5));
        assert_eq!(marker.place.as_deref(), Some("Revised label"));
        assert_eq!(renderer.live_count(), 1);
    }

    #[test]
    fn empty_frame_exits_everything() {
        let a = QuakeEvent::new(at(1, 1), 35.0, 139.0, Some(5.0));
        let mut renderer = MarkerRenderer::default();
        renderer.render_frame(0, &frame(vec![a]));
        renderer.render_frame(1, &frame(Vec::new()));
        assert_eq!(renderer.live_count(), 0);
        renderer.advance(Duration::from_secs(1));
        assert_eq!(renderer.markers().count(), 0);
    }

    #[test]
    fn duplicate_keys_in_one_frame_render_once() {
        let a = QuakeEvent::new(at(1, 1), 35.0, 139.0, Some(5.0));
        let mut renderer = MarkerRenderer::default();
        renderer.render_frame(0, &frame(vec![a.clone(), a]));
        assert_eq!(renderer.live_count(), 1);
    }
}
