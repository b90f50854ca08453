//! Error types for richlog

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid configuration value for a named field
    #[error("invalid value for '{field}': {message}")]
    Config { field: String, message: String },

    /// Unknown preset name
    #[error("unknown preset '{name}', valid presets are: {}", valid.join(", "))]
    UnknownPreset { name: String, valid: Vec<String> },

    /// Config file could not be read or parsed
    #[error("failed to load configuration from '{path}': {message}")]
    ConfigFile { path: String, message: String },

    /// IO error with operation context
    #[error("IO error while {operation}: {message}")]
    IoOperation {
        operation: String,
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// File handler error with path
    #[error("file handler error for '{path}': {message}")]
    FileHandler { path: String, message: String },

    /// File rotation error
    #[error("file rotation failed for '{path}': {message}")]
    FileRotation { path: String, message: String },

    /// Async queue full and the handler is configured to raise
    #[error("async queue full: {capacity} records pending")]
    QueueFull { capacity: usize },

    /// Handler already closed, no new records accepted
    #[error("handler '{0}' is closed")]
    HandlerClosed(String),

    /// Writer error (generic)
    #[error("writer error: {0}")]
    Writer(String),
}

impl Error {
    /// Create a configuration error for a named field
    pub fn config(field: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Config {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create an unknown preset error listing the valid options
    pub fn unknown_preset(name: impl Into<String>, valid: &[&str]) -> Self {
        Error::UnknownPreset {
            name: name.into(),
            valid: valid.iter().map(|s| (*s).to_string()).collect(),
        }
    }

    /// Create a config file error
    pub fn config_file(path: impl Into<String>, message: impl Into<String>) -> Self {
        Error::ConfigFile {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an IO operation error with context
    pub fn io_operation(
        operation: impl Into<String>,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        Error::IoOperation {
            operation: operation.into(),
            message: message.into(),
            source,
        }
    }

    /// Create a file handler error
    pub fn file_handler(path: impl Into<String>, message: impl Into<String>) -> Self {
        Error::FileHandler {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a file rotation error
    pub fn file_rotation(path: impl Into<String>, message: impl Into<String>) -> Self {
        Error::FileRotation {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a writer error (generic)
    pub fn writer<S: Into<String>>(msg: S) -> Self {
        Error::Writer(msg.into())
    }
}
