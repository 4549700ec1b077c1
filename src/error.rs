//! Error types for posestage

use thiserror::Error;

/// Main error type for posestage
#[derive(Error, Debug)]
pub enum StageError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Scene error: {0}")]
    Scene(#[from] SceneError),

    #[error("Tracking error: {0}")]
    Tracking(#[from] TrackingError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadFile(String),

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid configuration value: {field} - {message}")]
    InvalidValue { field: String, message: String },
}

/// Scene and asset errors surfaced by a scene backend
#[derive(Error, Debug)]
pub enum SceneError {
    #[error("Failed to load asset '{path}': {message}")]
    AssetLoad { path: String, message: String },

    #[error("Unknown asset handle: {0}")]
    UnknownAsset(u64),

    #[error("Failed to load environment '{path}': {message}")]
    Environment { path: String, message: String },
}

/// Pose tracking errors (receiver + tracker subprocess)
#[derive(Error, Debug)]
pub enum TrackingError {
    #[error("Pose receiver error: {0}")]
    Receiver(String),

    #[error("Pose packet parse error: {0}")]
    Parse(String),

    #[error("Tracker subprocess error: {0}")]
    Subprocess(String),
}

/// Result type alias for posestage operations
pub type Result<T> = std::result::Result<T, StageError>;
