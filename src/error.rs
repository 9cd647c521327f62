//! Error types for the lidar bridge

use std::time::Duration;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Lidar bridge error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Lidar device not present on the host
    #[error("Lidar device not connected")]
    NotConnected,

    /// start() while a session is active
    #[error("Server already running")]
    AlreadyRunning,

    /// stop() without an active session
    #[error("Server not running")]
    NotRunning,

    /// start() while a previous stop() is still winding down
    #[error("A stop is already in progress")]
    StopInProgress,

    /// Scanner process could not be launched
    #[error("Failed to spawn scanner process: {0}")]
    Spawn(String),

    /// Reader thread outlived the stop() deadline
    #[error("Reader thread did not exit within {0:?}")]
    StopTimeout(Duration),

    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration file could not be parsed
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Configuration could not be serialized
    #[error("Config write error: {0}")]
    ConfigWrite(#[from] toml::ser::Error),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}
