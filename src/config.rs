//! Engine configuration.
//!
//! Every field has a default, so a partial JSON document (or none at all)
//! yields a usable configuration.

use serde::{Deserialize, Serialize};
use shoebox_core::{DefaultMaterials, FitConfig};
use shoebox_graph::PLAYBACK_START_DELAY;

use crate::error::Result;

/// Placeholder room pushed when the first floor appears (meters).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomDimensions {
    pub width: f32,
    pub length: f32,
    pub height: f32,
}

impl Default for RoomDimensions {
    fn default() -> Self {
        Self {
            width: 10.0,
            length: 5.0,
            height: 10.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentConfig {
    /// Clamping policy for degenerate floors and heights.
    pub fit: FitConfig,

    /// Room height until the user measures one (meters).
    pub initial_height: f32,

    pub default_room: RoomDimensions,

    /// Skip a refit push when no room parameter moved by more than this.
    /// `0.0` pushes on every floor update.
    pub refit_threshold: f32,

    pub default_materials: DefaultMaterials,

    /// Seconds between a play request and the synchronized start.
    pub start_delay: f64,

    /// Capture the rendered output while playing, when a recorder is set.
    pub recording_enabled: bool,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            fit: FitConfig::default(),
            initial_height: 3.0,
            default_room: RoomDimensions::default(),
            refit_threshold: 0.0,
            default_materials: DefaultMaterials::default(),
            start_delay: PLAYBACK_START_DELAY,
            recording_enabled: true,
        }
    }
}

impl EnvironmentConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).map_err(shoebox_core::Error::from)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let positive = |value: f32| value.is_finite() && value > 0.0;

        let invalid = |msg: String| -> Result<()> {
            Err(shoebox_core::Error::InvalidConfig(msg).into())
        };

        if !positive(self.initial_height) {
            return invalid(format!("initial_height must be positive, got {}", self.initial_height));
        }
        let RoomDimensions {
            width,
            length,
            height,
        } = self.default_room;
        if !(positive(width) && positive(length) && positive(height)) {
            return invalid(format!(
                "default_room must be positive, got {width} x {length} x {height}"
            ));
        }
        if !self.refit_threshold.is_finite() || self.refit_threshold < 0.0 {
            return invalid(format!(
                "refit_threshold must be >= 0, got {}",
                self.refit_threshold
            ));
        }
        if !self.start_delay.is_finite() || self.start_delay < 0.0 {
            return invalid(format!("start_delay must be >= 0, got {}", self.start_delay));
        }
        if !(positive(self.fit.min_extent) && positive(self.fit.min_height)) {
            return invalid("fit limits must be positive".into());
        }
        Ok(())
    }
}
