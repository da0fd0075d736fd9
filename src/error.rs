//! Error types shared by the resolver, sampler, actuator and configuration layers.

use std::{io, path::PathBuf};

use crate::fan_curve::CurveError;

/// Result alias used across the library.
pub type Result<T> = std::result::Result<T, FanError>;

/// Every failure the daemon knows how to name.
///
/// Configuration and resolution errors are fatal and only occur before the
/// control loop starts. Sampling and write errors are raised per tick and are
/// answered by the failsafe path instead of terminating the process.
#[derive(thiserror::Error, Debug)]
pub enum FanError {
    #[error("Failed to read config file {path}: {source}")]
    ConfigRead { path: PathBuf, source: io::Error },

    #[error("Failed to parse YAML in {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("Unsupported config version {0}")]
    UnsupportedVersion(u8),

    #[error("Invalid configuration value for {field}: {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    #[error("Invalid fan curve: {0}")]
    InvalidCurve(#[from] CurveError),

    #[error("No hwmon source matches any of {names:?}")]
    NotFound { names: Vec<String> },

    #[error("No readable temp*_input under {sources:?}")]
    NoReadableInputs { sources: Vec<PathBuf> },

    #[error("Failed to write duty {duty} to {path}: {source}")]
    Write {
        path: PathBuf,
        duty: u8,
        source: io::Error,
    },
}

impl FanError {
    /// Returns `true` for errors the control loop absorbs with the failsafe duty.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::NoReadableInputs { .. } | Self::Write { .. })
    }
}
