use serde::{Deserialize, Serialize};
use crate::error::{Error, Result};

/// Tunable thresholds for white backdrop removal.
///
/// The defaults are tuned for logos photographed or scanned on a white
/// backdrop, where the corners tend to darken slightly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemovalConfig {
    /// Minimum value every channel must exceed for a pixel to be "light"
    pub white_threshold: u8,
    /// Maximum Euclidean RGB distance from pure white for a pixel to be "near-white"
    pub max_distance: f64,
    /// Fraction of width/height, measured from each side, treated as the vignette border
    pub edge_fraction: f64,
    /// Amount subtracted from `white_threshold` inside the border
    pub edge_threshold_relief: u8,
    /// Amount added to `max_distance` inside the border
    pub edge_distance_relief: f64,
    /// Maximum pairwise channel difference for a pixel to count as neutral gray
    pub color_variance_limit: u8,
    /// Light-gray brightness floor is `white_threshold - gray_brightness_slack`
    pub gray_brightness_slack: u8,
    /// Transparent 8-neighbours required to erase a pixel during cleanup
    pub neighbor_cleanup_threshold: u8,
    /// Average brightness a pixel must exceed to be eligible for cleanup
    pub cleanup_brightness_floor: u8,
}

impl Default for RemovalConfig {
    fn default() -> Self {
        RemovalConfig {
            white_threshold: 220,
            max_distance: 60.0,
            edge_fraction: 0.15,
            edge_threshold_relief: 15,
            edge_distance_relief: 20.0,
            color_variance_limit: 20,
            gray_brightness_slack: 25,
            neighbor_cleanup_threshold: 6,
            cleanup_brightness_floor: 200,
        }
    }
}

impl RemovalConfig {

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=0.5).contains(&self.edge_fraction) {
            return Err(Error::InvalidConfig(format!(
                "edge_fraction must be within [0, 0.5], got {}",
                self.edge_fraction
            )));
        }
        if !self.max_distance.is_finite() || self.max_distance < 0.0 {
            return Err(Error::InvalidConfig(format!(
                "max_distance must be a non-negative number, got {}",
                self.max_distance
            )));
        }
        if !self.edge_distance_relief.is_finite() || self.edge_distance_relief < 0.0 {
            return Err(Error::InvalidConfig(format!(
                "edge_distance_relief must be a non-negative number, got {}",
                self.edge_distance_relief
            )));
        }
        if !(1..=8).contains(&self.neighbor_cleanup_threshold) {
            return Err(Error::InvalidConfig(format!(
                "neighbor_cleanup_threshold must be within 1..=8, got {}",
                self.neighbor_cleanup_threshold
            )));
        }
        Ok(())
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = RemovalConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.white_threshold, 220);
        assert_eq!(config.neighbor_cleanup_threshold, 6);
        assert_eq!(config.cleanup_brightness_floor, 200);
    }

    #[test]
    fn rejects_out_of_range_values() {
        let config = RemovalConfig { edge_fraction: 0.6, ..Default::default() };
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));

        let config = RemovalConfig { neighbor_cleanup_threshold: 0, ..Default::default() };
        assert!(config.validate().is_err());

        let config = RemovalConfig { neighbor_cleanup_threshold: 9, ..Default::default() };
        assert!(config.validate().is_err());

        let config = RemovalConfig { max_distance: f64::NAN, ..Default::default() };
        assert!(config.validate().is_err());
    }
}
