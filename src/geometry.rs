//! Normalized string geometry.
//!
//! Every position the tracker compares is a scalar in 0.0–1.0 along the
//! axis a strum travels. In landscape that is down the screen; in portrait
//! the guitar is drawn rotated 90°, so the axis runs right-to-left and the
//! physical right edge is string 0.

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::types::NUM_STRINGS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Orientation {
    Landscape,
    Portrait,
}

/// Visible viewport size in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// A square viewport counts as portrait, as the CSS media query does.
    pub fn orientation(&self) -> Orientation {
        if self.height >= self.width {
            Orientation::Portrait
        } else {
            Orientation::Landscape
        }
    }

    /// Pointer position along the strum axis, before edge snapping.
    pub fn raw_position(&self, x: f32, y: f32) -> f32 {
        match self.orientation() {
            Orientation::Landscape => {
                if self.height <= 0.0 {
                    return 0.0;
                }
                y / self.height
            }
            Orientation::Portrait => {
                if self.width <= 0.0 {
                    return 0.0;
                }
                1.0 - x / self.width
            }
        }
    }

    /// Pointer position along the strum axis, snapped to the edges.
    pub fn normalize(&self, x: f32, y: f32, edge_tolerance: f32) -> f32 {
        snap_to_edges(self.raw_position(x, y), edge_tolerance)
    }
}

/// Values within `tolerance` of either end become exactly 0.0 or 1.0, so a
/// touch near the bezel reliably reaches the outer strings.
pub fn snap_to_edges(v: f32, tolerance: f32) -> f32 {
    if v.is_nan() || v < tolerance {
        0.0
    } else if v > 1.0 - tolerance {
        1.0
    } else {
        v
    }
}

/// One string element's placement along the container's strum axis (px).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub offset: f32,
    pub extent: f32,
}

impl Span {
    pub fn center(&self) -> f32 {
        self.offset + self.extent / 2.0
    }
}

/// What the layout collaborator reports: viewport plus where the six string
/// elements sit inside the string container.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    pub viewport: Viewport,
    /// Container length along the strum axis (px).
    pub container_extent: f32,
    pub strings: [Span; NUM_STRINGS],
}

impl Layout {
    /// Six equal string lanes filling the viewport along the strum axis.
    pub fn evenly_spaced(viewport: Viewport) -> Self {
        let extent = match viewport.orientation() {
            Orientation::Landscape => viewport.height,
            Orientation::Portrait => viewport.width,
        };
        let lane = extent / NUM_STRINGS as f32;
        let mut strings = [Span { offset: 0.0, extent: lane }; NUM_STRINGS];
        for (i, s) in strings.iter_mut().enumerate() {
            s.offset = i as f32 * lane;
        }
        Self {
            viewport,
            container_extent: extent,
            strings,
        }
    }

    /// Viewport pixel coordinate of string `index`'s center, for generating
    /// synthetic pointer samples.
    pub fn string_point(&self, index: usize, cross: f32) -> (f32, f32) {
        let along = self.strings[index].center() / self.container_extent;
        self.point_at(along, cross)
    }

    /// Viewport pixel coordinate for normalized position `along` on the strum
    /// axis; `cross` is the pixel coordinate on the other axis.
    pub fn point_at(&self, along: f32, cross: f32) -> (f32, f32) {
        match self.viewport.orientation() {
            Orientation::Landscape => (cross, along * self.viewport.height),
            Orientation::Portrait => ((1.0 - along) * self.viewport.width, cross),
        }
    }
}

/// Derived string centers, normalized to the container. Rebuilt whenever
/// the layout changes; never edited directly.
#[derive(Debug, Clone, Default)]
pub struct GeometryCache {
    centers: Option<[f32; NUM_STRINGS]>,
}

impl GeometryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.centers.is_none()
    }

    pub fn invalidate(&mut self) {
        self.centers = None;
    }

    pub fn centers(&self) -> Option<&[f32; NUM_STRINGS]> {
        self.centers.as_ref()
    }

    /// Rebuild from `layout`. A zero-sized container leaves the cache empty.
    pub fn recompute(&mut self, layout: &Layout) {
        if layout.container_extent <= 0.0 {
            warn!("String container has no extent; geometry unavailable");
            self.centers = None;
            return;
        }
        let mut centers = [0.0f32; NUM_STRINGS];
        for (c, span) in centers.iter_mut().zip(layout.strings.iter()) {
            *c = (span.center() / layout.container_extent).clamp(0.0, 1.0);
        }
        debug!("String geometry: {:?}", centers);
        self.centers = Some(centers);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orientation() {
        assert_eq!(Viewport::new(800.0, 400.0).orientation(), Orientation::Landscape);
        assert_eq!(Viewport::new(400.0, 800.0).orientation(), Orientation::Portrait);
        assert_eq!(Viewport::new(500.0, 500.0).orientation(), Orientation::Portrait);
    }

    #[test]
    fn test_landscape_uses_vertical() {
        let vp = Viewport::new(1000.0, 500.0);
        assert!((vp.raw_position(123.0, 250.0) - 0.5).abs() < 1e-6);
        assert!((vp.normalize(0.0, 100.0, 0.05) - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_portrait_right_edge_is_first_string() {
        let vp = Viewport::new(400.0, 800.0);
        assert!((vp.raw_position(400.0, 10.0) - 0.0).abs() < 1e-6);
        assert!((vp.raw_position(0.0, 10.0) - 1.0).abs() < 1e-6);
        assert!((vp.raw_position(100.0, 10.0) - 0.75).abs() < 1e-6);
    }

    #[test]
    fn test_edge_snapping() {
        assert_eq!(snap_to_edges(0.049, 0.05), 0.0);
        assert_eq!(snap_to_edges(-0.3, 0.05), 0.0);
        assert_eq!(snap_to_edges(0.951, 0.05), 1.0);
        assert_eq!(snap_to_edges(1.7, 0.05), 1.0);
        assert_eq!(snap_to_edges(0.5, 0.05), 0.5);
        assert_eq!(snap_to_edges(f32::NAN, 0.05), 0.0);
    }

    #[test]
    fn test_zero_viewport_is_safe() {
        let vp = Viewport::new(0.0, 0.0);
        assert_eq!(vp.normalize(10.0, 10.0, 0.05), 0.0);
    }

    #[test]
    fn test_evenly_spaced_centers() {
        let layout = Layout::evenly_spaced(Viewport::new(1200.0, 600.0));
        let mut cache = GeometryCache::new();
        assert!(cache.is_empty());
        cache.recompute(&layout);
        let centers = cache.centers().unwrap();
        for (i, c) in centers.iter().enumerate() {
            assert!((c - (i as f32 + 0.5) / 6.0).abs() < 1e-6);
        }
        cache.invalidate();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_centers_clamped() {
        let mut layout = Layout::evenly_spaced(Viewport::new(1200.0, 600.0));
        layout.strings[5].offset = 900.0;
        let mut cache = GeometryCache::new();
        cache.recompute(&layout);
        assert_eq!(cache.centers().unwrap()[5], 1.0);
    }

    #[test]
    fn test_empty_container_leaves_cache_empty() {
        let mut layout = Layout::evenly_spaced(Viewport::new(1200.0, 600.0));
        layout.container_extent = 0.0;
        let mut cache = GeometryCache::new();
        cache.recompute(&layout);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_string_point_maps_back() {
        for vp in [Viewport::new(1200.0, 600.0), Viewport::new(600.0, 1200.0)] {
            let layout = Layout::evenly_spaced(vp);
            for i in 0..NUM_STRINGS {
                let (x, y) = layout.string_point(i, 50.0);
                let expected = (i as f32 + 0.5) / 6.0;
                assert!((vp.raw_position(x, y) - expected).abs() < 1e-5);
            }
        }
    }
}
