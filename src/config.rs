//! Background configuration.
//!
//! [`BackgroundConfig`] collects every tunable of the point field, the chain
//! walk and the line animation. It can be built in code with the `with_*`
//! methods or loaded from JSON; missing JSON keys fall back to the defaults.
//!
//! ```ignore
//! let config = BackgroundConfig::default()
//!     .with_point_count(600)
//!     .with_stagger_ms(100)
//!     .with_seed(7);
//! let scene = Scene::new(config, 16.0 / 9.0)?;
//! ```

use crate::camera::Camera;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Upper bound on cells per world axis across the field's extent.
const MAX_CELLS_PER_AXIS: f32 = (1 << 20) as f32;

/// Complete configuration for a [`Scene`](crate::Scene).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BackgroundConfig {
    /// Number of points in the field. Fixed for the lifetime of a population.
    pub point_count: usize,
    /// Per-tick x velocity range `(min, max)`.
    pub x_velocity_range: (f32, f32),
    /// Per-tick y velocity range `(min, max)`.
    pub y_velocity_range: (f32, f32),
    /// Depth range `(min, max)` points are spread over on z.
    pub depth_range: (f32, f32),
    /// Edge length of a spatial grid cell in world units.
    pub cell_size: f32,
    /// Range the per-step chain depth bound is drawn from (inclusive).
    pub chain_depth_range: (u32, u32),
    /// Hard cap on chain depth regardless of the drawn bound.
    pub chain_depth_cap: u32,
    /// Delay between successive line insertions of one chain, in milliseconds.
    pub stagger_ms: u64,
    /// Draw progress per second.
    pub line_speed: f32,
    /// Seconds a completed line holds before fading.
    pub fade_start: f32,
    /// Opacity lost per second while fading.
    pub fade_rate: f32,
    /// Point opacity gained per second after startup.
    pub point_fade_in_rate: f32,
    /// World units of vertical offset per scrolled pixel.
    pub scroll_parallax: f32,
    /// When set, start a chain from a random point every `(min, max)` ms.
    pub ambient_interval_ms: Option<(u64, u64)>,
    /// RNG seed. `None` seeds from entropy.
    pub seed: Option<u64>,
    /// Camera used to derive the viewport and unproject clicks.
    pub camera: Camera,
    /// z of the plane screen clicks are projected onto.
    pub click_plane_z: f32,
}

impl Default for BackgroundConfig {
    fn default() -> Self {
        Self {
            point_count: 1000,
            x_velocity_range: (-0.0005, 0.0005),
            y_velocity_range: (-0.0005, 0.0005),
            depth_range: (-2.0, 4.0),
            cell_size: 1.0,
            chain_depth_range: (4, 50),
            chain_depth_cap: 20,
            stagger_ms: 150,
            line_speed: 2.0,
            fade_start: 10.0,
            fade_rate: 0.3,
            // 0.01 every 16ms
            point_fade_in_rate: 0.625,
            scroll_parallax: 0.0001,
            ambient_interval_ms: None,
            seed: None,
            camera: Camera::default(),
            click_plane_z: 0.1,
        }
    }
}

impl BackgroundConfig {
    /// Set the number of points.
    pub fn with_point_count(mut self, count: usize) -> Self {
        self.point_count = count;
        self
    }

    /// Set the per-tick velocity range, applied to both x and y.
    pub fn with_velocity_range(mut self, min: f32, max: f32) -> Self {
        self.x_velocity_range = (min, max);
        self.y_velocity_range = (min, max);
        self
    }

    /// Set the z range points are placed in.
    pub fn with_depth_range(mut self, min: f32, max: f32) -> Self {
        self.depth_range = (min, max);
        self
    }

    /// Set the spatial grid cell size.
    pub fn with_cell_size(mut self, cell_size: f32) -> Self {
        self.cell_size = cell_size;
        self
    }

    /// Set the range the per-step depth bound is drawn from, and the hard cap.
    pub fn with_chain_depth(mut self, min: u32, max: u32, cap: u32) -> Self {
        self.chain_depth_range = (min, max);
        self.chain_depth_cap = cap;
        self
    }

    /// Set the delay between successive lines of one chain.
    pub fn with_stagger_ms(mut self, stagger_ms: u64) -> Self {
        self.stagger_ms = stagger_ms;
        self
    }

    /// Set line draw speed, hold time and fade rate.
    pub fn with_line_timing(mut self, line_speed: f32, fade_start: f32, fade_rate: f32) -> Self {
        self.line_speed = line_speed;
        self.fade_start = fade_start;
        self.fade_rate = fade_rate;
        self
    }

    /// Enable ambient chains fired at random intervals in `min..=max` ms.
    pub fn with_ambient_interval_ms(mut self, min: u64, max: u64) -> Self {
        self.ambient_interval_ms = Some((min, max));
        self
    }

    /// Use a fixed RNG seed for reproducible runs.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Replace the camera.
    pub fn with_camera(mut self, camera: Camera) -> Self {
        self.camera = camera;
        self
    }

    /// Stagger interval as a [`Duration`].
    pub fn stagger(&self) -> Duration {
        Duration::from_millis(self.stagger_ms)
    }

    /// Check that every range is ordered and every rate is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_range("x_velocity_range", self.x_velocity_range)?;
        check_range("y_velocity_range", self.y_velocity_range)?;
        check_range("depth_range", self.depth_range)?;

        if !(self.cell_size.is_finite() && self.cell_size > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "cell_size must be positive, got {}",
                self.cell_size
            )));
        }

        let (min_depth, max_depth) = self.chain_depth_range;
        if min_depth > max_depth {
            return Err(ConfigError::Invalid(format!(
                "chain_depth_range is empty: {}..={}",
                min_depth, max_depth
            )));
        }

        for (name, value) in [
            ("line_speed", self.line_speed),
            ("fade_rate", self.fade_rate),
            ("point_fade_in_rate", self.point_fade_in_rate),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::Invalid(format!(
                    "{} must be positive, got {}",
                    name, value
                )));
            }
        }

        if !(self.fade_start.is_finite() && self.fade_start >= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "fade_start must be non-negative, got {}",
                self.fade_start
            )));
        }

        if let Some((min, max)) = self.ambient_interval_ms {
            if min == 0 || min > max {
                return Err(ConfigError::Invalid(format!(
                    "ambient_interval_ms must be a non-empty range above zero, got {}..={}",
                    min, max
                )));
            }
        }

        self.camera.validate()?;

        // Cell keys must stay well inside i32 for the field's extent.
        let (near_z, far_z) = self.depth_range;
        let extent = near_z
            .abs()
            .max(far_z.abs())
            .max(self.camera.viewport(1.0).height);
        if extent / self.cell_size > MAX_CELLS_PER_AXIS {
            return Err(ConfigError::Invalid(format!(
                "cell_size {} is too small for a field spanning {} units",
                self.cell_size, extent
            )));
        }

        Ok(())
    }

    /// Parse a configuration from a JSON string and validate it.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a JSON file and validate it.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Save the configuration to a JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

fn check_range(name: &str, (min, max): (f32, f32)) -> Result<(), ConfigError> {
    if !(min.is_finite() && max.is_finite()) || min > max {
        return Err(ConfigError::Invalid(format!(
            "{} is empty or not finite: {}..={}",
            name, min, max
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = BackgroundConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.point_count, 1000);
        assert_eq!(config.chain_depth_cap, 20);
        assert_eq!(config.stagger(), Duration::from_millis(150));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = BackgroundConfig::from_json(r#"{ "point_count": 12, "seed": 3 }"#).unwrap();
        assert_eq!(config.point_count, 12);
        assert_eq!(config.seed, Some(3));
        assert_eq!(config.line_speed, 2.0);
        assert_eq!(config.depth_range, (-2.0, 4.0));
    }

    #[test]
    fn test_json_round_trip() {
        let config = BackgroundConfig::default()
            .with_ambient_interval_ms(5000, 20000)
            .with_seed(99);
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(BackgroundConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_rejects_inverted_range() {
        let config = BackgroundConfig::default().with_depth_range(4.0, -2.0);
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_rejects_bad_cell_size() {
        let config = BackgroundConfig::default().with_cell_size(0.0);
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_rejects_cell_size_too_small_for_field() {
        let config = BackgroundConfig::default().with_cell_size(1e-10);
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let config = BackgroundConfig::default().with_cell_size(0.01);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_empty_chain_range() {
        let config = BackgroundConfig::default().with_chain_depth(10, 2, 20);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            BackgroundConfig::from_json("{ point_count: "),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            BackgroundConfig::load("/definitely/not/here.json"),
            Err(ConfigError::Io(_))
        ));
    }
}
