// src/errors.rs

//! Crate-wide error type and result alias.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BuildRunnerError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Invalid platform '{0}'. Use 'android' or 'ios'.")]
    InvalidPlatform(String),

    #[error("Only Android builds are supported at the moment.")]
    UnsupportedPlatform(String),

    #[error("Invalid field '{field}': {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("A build for project {0} is already running")]
    AlreadyRunning(String),

    #[error("Failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, BuildRunnerError>;
