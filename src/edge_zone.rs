use crate::config::RemovalConfig;

/// Where a pixel sits relative to the vignette-prone border.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeZone {
    Edge,
    Interior,
}

/// Effective thresholds for one zone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub white_threshold: u8,
    pub max_distance: f64,
}

/// Precomputed border limits for an image of fixed dimensions.
///
/// When the border would be narrower than one pixel on either axis the
/// image is too small to tell edge from interior, and all of it is edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoneBounds {
    left: f64,
    right: f64,
    top: f64,
    bottom: f64,
    all_edge: bool,
}

impl ZoneBounds {
    pub fn new(width: u32, height: u32, edge_fraction: f64) -> Self {
        let (width, height) = (f64::from(width), f64::from(height));
        let all_edge = edge_fraction > 0.0
            && (edge_fraction * width < 1.0 || edge_fraction * height < 1.0);
        ZoneBounds {
            left: edge_fraction * width,
            right: (1.0 - edge_fraction) * width,
            top: edge_fraction * height,
            bottom: (1.0 - edge_fraction) * height,
            all_edge,
        }
    }

    #[inline]
    pub fn zone(&self, x: u32, y: u32) -> EdgeZone {
        let (x, y) = (f64::from(x), f64::from(y));
        if self.all_edge || x < self.left || x > self.right || y < self.top || y > self.bottom {
            EdgeZone::Edge
        } else {
            EdgeZone::Interior
        }
    }
}

impl RemovalConfig {
    /// Thresholds in effect for `zone`; the border is relaxed to absorb vignetting.
    pub fn thresholds(&self, zone: EdgeZone) -> Thresholds {
        match zone {
            EdgeZone::Interior => Thresholds {
                white_threshold: self.white_threshold,
                max_distance: self.max_distance,
            },
            EdgeZone::Edge => Thresholds {
                white_threshold: self.white_threshold.saturating_sub(self.edge_threshold_relief),
                max_distance: self.max_distance + self.edge_distance_relief,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_border_band() {
        let bounds = ZoneBounds::new(100, 100, 0.15);
        assert_eq!(bounds.zone(0, 50), EdgeZone::Edge);
        assert_eq!(bounds.zone(14, 50), EdgeZone::Edge);
        assert_eq!(bounds.zone(15, 50), EdgeZone::Interior);
        assert_eq!(bounds.zone(84, 50), EdgeZone::Interior);
        assert_eq!(bounds.zone(86, 50), EdgeZone::Edge);
        assert_eq!(bounds.zone(50, 99), EdgeZone::Edge);
        assert_eq!(bounds.zone(50, 50), EdgeZone::Interior);
    }

    #[test]
    fn border_thinner_than_a_pixel_makes_everything_edge() {
        let bounds = ZoneBounds::new(4, 4, 0.15);
        for y in 0..4 {
            for x in 0..4 {
                assert_eq!(bounds.zone(x, y), EdgeZone::Edge);
            }
        }
        // One short axis is enough
        let bounds = ZoneBounds::new(100, 6, 0.15);
        assert_eq!(bounds.zone(50, 3), EdgeZone::Edge);
        // A one-pixel border is a real border
        let bounds = ZoneBounds::new(7, 7, 0.15);
        assert_eq!(bounds.zone(3, 3), EdgeZone::Interior);
    }

    #[test]
    fn zero_fraction_has_no_border() {
        let bounds = ZoneBounds::new(8, 8, 0.0);
        for y in 0..8 {
            for x in 0..8 {
                assert_eq!(bounds.zone(x, y), EdgeZone::Interior);
            }
        }
    }

    #[test]
    fn edge_thresholds_are_relaxed() {
        let config = RemovalConfig::default();
        let edge = config.thresholds(EdgeZone::Edge);
        let interior = config.thresholds(EdgeZone::Interior);
        assert_eq!(edge.white_threshold, 205);
        assert_eq!(edge.max_distance, 80.0);
        assert_eq!(interior.white_threshold, 220);
        assert_eq!(interior.max_distance, 60.0);
    }
}
