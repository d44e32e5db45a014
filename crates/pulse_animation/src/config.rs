//! Pulse configuration
//!
//! All timing is in milliseconds. Configs deserialize from TOML with every
//! field optional:
//!
//! ```toml
//! duration_ms = 1500
//! lifetime_ms = 900
//! spawn_interval_ms = 300
//! max_scale = 3.0
//! color = 0xFF22FF22
//! shape = "circle"
//! alpha_easing = "ease_in"
//! scale_easing = "linear"
//! ```

use std::fs;
use std::path::Path;

use pulse_core::Color;
use serde::{Deserialize, Serialize};

use crate::easing::Easing;
use crate::error::{PulseError, Result};
use crate::pulse::PulseShape;

/// Session and per-pulse settings for a [`PulseEngine`](crate::PulseEngine)
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct PulseConfig {
    /// How long new pulses keep spawning after attach
    pub duration_ms: u64,
    /// Lifetime of each pulse
    pub lifetime_ms: u64,
    /// Minimum gap between two spawns
    pub spawn_interval_ms: u64,
    /// Scale a pulse reaches at the end of its life
    pub max_scale: f32,
    /// Stroke color as `0xAARRGGBB`; the alpha channel is replaced by the
    /// animated opacity
    pub color: u32,
    /// Stroke width in pixels; `None` derives it from the target width
    pub stroke_width: Option<f32>,
    pub shape: PulseShape,
    pub alpha_easing: Easing,
    pub scale_easing: Easing,
    /// Pause between driver ticks
    pub tick_interval_ms: u64,
}

impl Default for PulseConfig {
    fn default() -> Self {
        Self {
            duration_ms: 1500,
            lifetime_ms: 900,
            spawn_interval_ms: 300,
            max_scale: 3.0,
            color: 0xFF22FF22,
            stroke_width: None,
            shape: PulseShape::Circle,
            alpha_easing: Easing::EaseIn,
            scale_easing: Easing::Linear,
            tick_interval_ms: 15,
        }
    }
}

impl PulseConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: PulseConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| PulseError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Serialize to a TOML string
    ///
    /// Fails if either easing is [`Easing::Custom`].
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| PulseError::InvalidConfig(format!("cannot serialize: {}", e)))
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        if self.lifetime_ms == 0 {
            return Err(PulseError::InvalidConfig(
                "lifetime_ms must be greater than zero".to_string(),
            ));
        }
        if self.tick_interval_ms == 0 {
            return Err(PulseError::InvalidConfig(
                "tick_interval_ms must be greater than zero".to_string(),
            ));
        }
        if !self.max_scale.is_finite() || self.max_scale < 1.0 {
            return Err(PulseError::InvalidConfig(format!(
                "max_scale must be a finite value >= 1.0, got {}",
                self.max_scale
            )));
        }
        if let Some(width) = self.stroke_width {
            if !width.is_finite() || width <= 0.0 {
                return Err(PulseError::InvalidConfig(format!(
                    "stroke_width must be positive, got {}",
                    width
                )));
            }
        }
        Ok(())
    }

    /// Stroke color as a [`Color`]
    pub fn color(&self) -> Color {
        Color::from_argb(self.color)
    }
}
