use log::{debug, trace};
use std::collections::HashMap;

use crate::config::TrackerConfig;
use crate::geometry::{GeometryCache, Layout};
use crate::types::*;

/// Turns pointer samples into ordered string triggers.
///
/// # Taps and strums
///
/// A pointer-down plucks every string whose center lies within the tap
/// tolerance of the touch point, immediately. Each subsequent move compares
/// the previous and current normalized positions: a string is crossed when
/// the travel segment passes over or lands on its center.
///
/// # Strum stagger
///
/// Crossings within one sample are ordered by how far along the travel they
/// happen (`progress`), and fire `progress * strum_spread` seconds late, so a
/// fast swipe across all six strings still sounds as a strum rather than a
/// block chord.
///
/// # Pointers
///
/// Each pointer is tracked independently from down to up; there is no
/// ordering between pointers.
pub struct GestureTracker {
    config: TrackerConfig,
    layout: Option<Layout>,
    geometry: GeometryCache,
    /// Last normalized position per active pointer.
    active: HashMap<PointerId, f32>,
}

impl GestureTracker {
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            config,
            layout: None,
            geometry: GeometryCache::new(),
            active: HashMap::new(),
        }
    }

    /// Viewport resize, rotation, or first layout. The geometry is dropped
    /// and rebuilt on the next gesture.
    pub fn set_layout(&mut self, layout: Layout) {
        debug!(
            "Layout {}x{} ({:?})",
            layout.viewport.width,
            layout.viewport.height,
            layout.viewport.orientation()
        );
        self.geometry.invalidate();
        self.layout = Some(layout);
    }

    /// String centers, recomputed from the last known layout if the cache
    /// is empty.
    fn centers(&mut self) -> Option<[f32; NUM_STRINGS]> {
        if self.geometry.is_empty() {
            if let Some(layout) = &self.layout {
                self.geometry.recompute(layout);
            }
        }
        self.geometry.centers().copied()
    }

    fn normalize(&self, sample: &PointerSample) -> Option<f32> {
        let layout = self.layout.as_ref()?;
        Some(
            layout
                .viewport
                .normalize(sample.x, sample.y, self.config.edge_tolerance),
        )
    }

    pub fn geometry(&self) -> &GeometryCache {
        &self.geometry
    }

    pub fn position(&self, id: PointerId) -> Option<f32> {
        self.active.get(&id).copied()
    }

    pub fn active_pointers(&self) -> usize {
        self.active.len()
    }

    /// Start tracking a pointer and return the strings it taps.
    pub fn pointer_down(&mut self, sample: PointerSample) -> Vec<StringTrigger> {
        let Some(pos) = self.normalize(&sample) else {
            debug!("{} down before any layout; ignored", sample.id);
            return Vec::new();
        };
        self.active.insert(sample.id, pos);

        let Some(centers) = self.centers() else {
            return Vec::new();
        };
        let hits = taps(pos, &centers, self.config.tap_tolerance);
        trace!("{} down at {:.3} → taps {:?}", sample.id, pos, hits);
        hits.into_iter().map(StringTrigger::immediate).collect()
    }

    /// Advance a pointer and return the strings it crossed, in crossing
    /// order, with their stagger delays.
    pub fn pointer_move(&mut self, sample: PointerSample) -> Vec<StringTrigger> {
        let Some(curr) = self.normalize(&sample) else {
            return Vec::new();
        };

        let prev = match self.active.get(&sample.id) {
            Some(&p) => p,
            None => {
                if sample.id.seeds_on_move() {
                    // Down never registered: start tracking from here.
                    self.active.insert(sample.id, curr);
                }
                return Vec::new();
            }
        };
        self.active.insert(sample.id, curr);

        let Some(centers) = self.centers() else {
            return Vec::new();
        };
        let spread = self.config.strum_spread_secs;
        let triggers: Vec<StringTrigger> = detect_crossings(prev, curr, &centers)
            .into_iter()
            .map(|c| StringTrigger {
                string: c.string,
                delay: c.progress as f64 * spread,
            })
            .collect();
        if !triggers.is_empty() {
            trace!("{} {:.3} → {:.3}: {:?}", sample.id, prev, curr, triggers);
        }
        triggers
    }

    /// Stop tracking. Already-dispatched triggers are unaffected.
    pub fn pointer_up(&mut self, id: PointerId) {
        self.active.remove(&id);
    }
}

/// Strings whose centers lie strictly within `tolerance` of `pos`.
/// Closely spaced strings can all be hit by one tap.
pub fn taps(pos: f32, centers: &[f32], tolerance: f32) -> Vec<usize> {
    centers
        .iter()
        .enumerate()
        .filter(|(_, &c)| (pos - c).abs() < tolerance)
        .map(|(i, _)| i)
        .collect()
}

/// Every center crossed by travel from `prev` to `curr`, earliest first.
///
/// A center `c` is crossed when `prev < c <= curr` or `prev > c >= curr`:
/// leaving a center does not count, landing on one does.
pub fn detect_crossings(prev: f32, curr: f32, centers: &[f32]) -> Vec<Crossing> {
    let dist = (curr - prev).abs();
    let mut hits: Vec<Crossing> = centers
        .iter()
        .enumerate()
        .filter(|(_, &c)| (prev < c && c <= curr) || (prev > c && c >= curr))
        .map(|(string, &c)| Crossing {
            string,
            progress: if dist == 0.0 { 0.0 } else { (c - prev).abs() / dist },
        })
        .collect();
    // Stable: equal progress keeps string order.
    hits.sort_by(|a, b| a.progress.total_cmp(&b.progress));
    hits
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Viewport;

    fn landscape_tracker() -> (GestureTracker, Layout) {
        let layout = Layout::evenly_spaced(Viewport::new(1200.0, 600.0));
        let mut t = GestureTracker::new(TrackerConfig::default());
        t.set_layout(layout);
        (t, layout)
    }

    /// Pixel y for normalized position `v` in the 600px-tall landscape layout.
    fn y(v: f32) -> f32 {
        v * 600.0
    }

    #[test]
    fn test_three_string_crossing_order() {
        let hits = detect_crossings(0.1, 0.9, &[0.15, 0.5, 0.85]);
        assert_eq!(hits.len(), 3);
        let strings: Vec<usize> = hits.iter().map(|h| h.string).collect();
        assert_eq!(strings, vec![0, 1, 2]);
        assert!((hits[0].progress - 0.0625).abs() < 1e-5);
        assert!((hits[1].progress - 0.5).abs() < 1e-5);
        assert!((hits[2].progress - 0.9375).abs() < 1e-5);
    }

    #[test]
    fn test_upstroke_orders_high_strings_first() {
        let hits = detect_crossings(0.9, 0.1, &[0.15, 0.5, 0.85]);
        let strings: Vec<usize> = hits.iter().map(|h| h.string).collect();
        assert_eq!(strings, vec![2, 1, 0]);
        assert!((hits[0].progress - 0.0625).abs() < 1e-5);
    }

    #[test]
    fn test_stationary_sample_crosses_nothing() {
        assert!(detect_crossings(0.5, 0.5, &[0.15, 0.5, 0.85]).is_empty());
        assert!(detect_crossings(0.3, 0.3, &[0.3]).is_empty());
    }

    #[test]
    fn test_landing_counts_leaving_does_not() {
        let land = detect_crossings(0.2, 0.5, &[0.5]);
        assert_eq!(land.len(), 1);
        assert!((land[0].progress - 1.0).abs() < 1e-6);
        assert!(detect_crossings(0.5, 0.8, &[0.5]).is_empty());
    }

    #[test]
    fn test_taps_within_tolerance() {
        let centers = [0.1, 0.13, 0.5];
        assert_eq!(taps(0.11, &centers, 0.05), vec![0, 1]);
        assert!(taps(0.3, &centers, 0.05).is_empty());
        // Strict comparison at the boundary
        assert!(taps(0.75, &[0.5, 1.0], 0.25).is_empty());
    }

    #[test]
    fn test_tracker_strum_delays() {
        let (mut t, _) = landscape_tracker();
        let id = PointerId::Touch(1);
        // Down in the gap above string 0 (centers at 1/12, 3/12, ...)
        assert!(t.pointer_down(PointerSample { id, x: 100.0, y: y(0.0) }).is_empty());
        let triggers = t.pointer_move(PointerSample { id, x: 100.0, y: y(1.0) });

        assert_eq!(triggers.len(), NUM_STRINGS);
        for (i, trig) in triggers.iter().enumerate() {
            assert_eq!(trig.string, i);
            let expected = (2 * i + 1) as f64 / 12.0 * 0.04;
            assert!((trig.delay - expected).abs() < 1e-6);
        }
        assert!(triggers.windows(2).all(|w| w[0].delay <= w[1].delay));
        assert!(triggers.iter().all(|t| t.delay >= 0.0 && t.delay <= 0.04));
    }

    #[test]
    fn test_tracker_tap_on_string() {
        let (mut t, layout) = landscape_tracker();
        let (x, yy) = layout.string_point(2, 300.0);
        let triggers = t.pointer_down(PointerSample::touch(7, x, yy));
        assert_eq!(triggers, vec![StringTrigger::immediate(2)]);
        assert_eq!(t.active_pointers(), 1);
    }

    #[test]
    fn test_edge_snap_applies_before_crossing() {
        let (mut t, _) = landscape_tracker();
        let id = PointerId::Touch(3);
        t.pointer_down(PointerSample { id, x: 0.0, y: y(0.02) });
        assert_eq!(t.position(id), Some(0.0));
        t.pointer_move(PointerSample { id, x: 0.0, y: y(0.97) });
        assert_eq!(t.position(id), Some(1.0));
    }

    #[test]
    fn test_untracked_touch_seeds_without_crossing() {
        let (mut t, _) = landscape_tracker();
        let id = PointerId::Touch(9);
        assert!(t.pointer_move(PointerSample { id, x: 0.0, y: y(0.9) }).is_empty());
        assert!((t.position(id).unwrap() - 0.9).abs() < 1e-5);
        let triggers = t.pointer_move(PointerSample { id, x: 0.0, y: y(0.5) });
        let strings: Vec<usize> = triggers.iter().map(|t| t.string).collect();
        assert_eq!(strings, vec![4, 3]);
    }

    #[test]
    fn test_mouse_hover_is_ignored() {
        let (mut t, _) = landscape_tracker();
        assert!(t.pointer_move(PointerSample::mouse(0.0, y(0.1))).is_empty());
        assert!(t.pointer_move(PointerSample::mouse(0.0, y(0.9))).is_empty());
        assert_eq!(t.position(PointerId::Mouse), None);

        t.pointer_down(PointerSample::mouse(0.0, y(0.0)));
        assert_eq!(t.pointer_move(PointerSample::mouse(0.0, y(0.3))).len(), 2);
        t.pointer_up(PointerId::Mouse);
        assert!(t.pointer_move(PointerSample::mouse(0.0, y(0.9))).is_empty());
    }

    #[test]
    fn test_pointers_are_independent() {
        let (mut t, _) = landscape_tracker();
        let a = PointerId::Touch(1);
        let b = PointerId::Touch(2);
        t.pointer_down(PointerSample { id: a, x: 0.0, y: y(0.0) });
        t.pointer_down(PointerSample { id: b, x: 0.0, y: y(1.0) });
        let ta = t.pointer_move(PointerSample { id: a, x: 0.0, y: y(0.2) });
        let tb = t.pointer_move(PointerSample { id: b, x: 0.0, y: y(0.8) });
        assert_eq!(ta.iter().map(|t| t.string).collect::<Vec<_>>(), vec![0]);
        assert_eq!(tb.iter().map(|t| t.string).collect::<Vec<_>>(), vec![5]);
        t.pointer_up(a);
        assert_eq!(t.active_pointers(), 1);
    }

    #[test]
    fn test_geometry_built_on_first_gesture() {
        let (mut t, layout) = landscape_tracker();
        assert!(t.geometry().is_empty());
        let (x, yy) = layout.string_point(4, 300.0);
        assert_eq!(t.pointer_down(PointerSample::touch(2, x, yy)).len(), 1);
        assert!(!t.geometry().is_empty());

        // Rotation drops the old centers until the next gesture.
        t.set_layout(Layout::evenly_spaced(Viewport::new(600.0, 1200.0)));
        assert!(t.geometry().is_empty());
        t.pointer_move(PointerSample::touch(2, 10.0, 10.0));
        assert!(!t.geometry().is_empty());
    }

    #[test]
    fn test_no_layout_no_triggers() {
        let mut t = GestureTracker::new(TrackerConfig::default());
        assert!(t.pointer_down(PointerSample::touch(1, 10.0, 10.0)).is_empty());
        assert!(t.pointer_move(PointerSample::touch(1, 10.0, 500.0)).is_empty());
        assert_eq!(t.active_pointers(), 0);
    }

    #[test]
    fn test_portrait_strum() {
        let layout = Layout::evenly_spaced(Viewport::new(600.0, 1200.0));
        let mut t = GestureTracker::new(TrackerConfig::default());
        t.set_layout(layout);
        let id = PointerId::Touch(1);
        // Right edge is string 0: swipe right → left plays low to high
        t.pointer_down(PointerSample { id, x: 600.0, y: 500.0 });
        let triggers = t.pointer_move(PointerSample { id, x: 0.0, y: 520.0 });
        let strings: Vec<usize> = triggers.iter().map(|t| t.string).collect();
        assert_eq!(strings, vec![0, 1, 2, 3, 4, 5]);
    }
}
