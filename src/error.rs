//! Error handling for the Serial JSON Monitor
//!
//! This module defines custom error types and a Result alias for use
//! throughout the application. Most errors are absorbed where they occur
//! (logged, then the loop continues); these types carry them up to the
//! point where that decision is made.

use thiserror::Error;

/// Main error type for monitor operations
#[derive(Error, Debug)]
pub enum MonitorError {
    /// Errors raised by the serial port driver
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    /// Errors related to configuration loading
    #[error("Configuration error: {0}")]
    Config(String),

    /// The serial link is not open (never opened, or already stopped)
    #[error("Serial link is not open")]
    NotConnected,

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<MonitorError>,
    },
}

impl MonitorError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        MonitorError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }
}

/// Result type alias for monitor operations
pub type Result<T> = std::result::Result<T, MonitorError>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context lazily to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<MonitorError>,
{
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.into().with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.into().with_context(f()))
    }
}
