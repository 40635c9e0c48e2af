//! Error types for the logging pipeline

use std::time::Duration;

pub type Result<T> = std::result::Result<T, LoggerError>;

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    /// Generic IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Unknown or malformed time zone name
    #[error("Invalid time zone: '{name}'")]
    InvalidTimezone { name: String },

    /// Invalid configuration with details
    #[error("Invalid configuration for {component}: {message}")]
    InvalidConfiguration { component: String, message: String },

    /// Formatter could not serialize an event
    #[error("Formatter error ({format_type}): {message}")]
    FormatterError {
        format_type: String,
        message: String,
    },

    /// Sink write or close failed
    #[error("Sink error for '{sink}': {message}")]
    SinkError { sink: String, message: String },

    /// Rotation setup or rollover failed
    #[error("Rotation failed for '{path}': {message}")]
    RotationError { path: String, message: String },

    /// Shutdown waiter deadline exceeded
    #[error("Shutdown timed out after {waited:?}")]
    ShutdownTimeout { waited: Duration },

    /// Operation attempted on a closed logger
    #[error("Logger already closed")]
    LoggerClosed,
}

impl LoggerError {
    /// Create an invalid time zone error
    pub fn timezone(name: impl Into<String>) -> Self {
        LoggerError::InvalidTimezone { name: name.into() }
    }

    /// Create an invalid configuration error
    pub fn config(component: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::InvalidConfiguration {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Create a formatter error
    pub fn formatter(format_type: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::FormatterError {
            format_type: format_type.into(),
            message: message.into(),
        }
    }

    /// Create a sink error
    pub fn sink(sink: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::SinkError {
            sink: sink.into(),
            message: message.into(),
        }
    }

    /// Create a rotation error
    pub fn rotation(path: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::RotationError {
            path: path.into(),
            message: message.into(),
        }
    }
}
