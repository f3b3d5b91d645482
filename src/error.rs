//! Error types for timemachine

use thiserror::Error;

/// Main error type for timemachine operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("File does not exist: {path}")]
    MissingFile { path: String },

    #[error("Relative paths are not supported: {path}")]
    RelativePath { path: String },

    #[error("Not a regular file: {path}")]
    NotAFile { path: String },

    #[error("Watch list error: {reason}")]
    WatchList { reason: String },

    #[error("Invalid configuration: {reason}")]
    Configuration { reason: String },

    #[error("Scheduling error: {reason}")]
    Scheduling { reason: String },
}

/// Result type alias for timemachine operations
pub type Result<T> = std::result::Result<T, Error>;
