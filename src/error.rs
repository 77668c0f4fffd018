use std::io;
use thiserror::Error;

/// Custom error type for devmon
#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to start reporter: {0}")]
    ReporterStart(#[source] io::Error),
}

/// Result type alias for devmon
pub type Result<T> = std::result::Result<T, MonitorError>;

impl MonitorError {
    /// Create a config error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        MonitorError::Config(msg.into())
    }
}
