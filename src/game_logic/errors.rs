use thiserror::Error;
use std::path::PathBuf;

use crate::game_logic::animation::ClipName;

#[derive(Error, Debug)]
pub enum ChaseError {
    // Config-related errors
    #[error("Failed to get config directory")]
    ConfigDirNotFound,

    #[error("Failed to access file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize config: {0}")]
    SerializationFailed(#[from] toml::ser::Error),

    #[error("Failed to deserialize config: {0}")]
    DeserializationFailed(#[from] toml::de::Error),

    #[error("Config file not found at path: {path}")]
    ConfigFileNotFound { path: PathBuf },

    // Layout-related errors
    #[error("Layout file not found at path: {path}")]
    LayoutFileNotFound { path: PathBuf },

    #[error("Invalid room layout: {reason}")]
    InvalidLayout { reason: String },

    #[error("Corrupted layout file: {reason}")]
    CorruptedLayoutFile { reason: String },

    // Simulation errors
    #[error("Invalid navigation grid: {reason}")]
    InvalidGrid { reason: String },

    #[error("Animation clip '{clip}' is missing from the model")]
    MissingClip { clip: ClipName },

    #[error("Invalid argument: {reason}")]
    InvalidArgument { reason: String },
}

/// Result type alias for all operations
pub type ChaseResult<T> = Result<T, ChaseError>;
