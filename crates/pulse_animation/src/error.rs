//! Error types for pulse_animation

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while configuring or starting pulse sessions
#[derive(Error, Debug)]
pub enum PulseError {
    /// The attach target has no usable area
    #[error("Invalid pulse target: bounds {width}x{height} must be positive and finite")]
    InvalidTarget { width: f32, height: f32 },

    /// A configuration value is out of range
    #[error("Invalid pulse configuration: {0}")]
    InvalidConfig(String),

    /// Configuration text is not valid TOML for [`PulseConfig`](crate::PulseConfig)
    #[error("Failed to parse pulse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Configuration file could not be read
    #[error("Failed to read {}: {source}", path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The tick thread could not be started
    #[error("Failed to spawn tick driver: {0}")]
    DriverSpawn(#[source] std::io::Error),
}

/// Result type for pulse_animation operations
pub type Result<T> = std::result::Result<T, PulseError>;
