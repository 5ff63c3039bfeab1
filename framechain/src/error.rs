//! Error types for Framechain
//!
//! This module defines the error types shared by the core presentation layer
//! and every backend implementation.

use std::fmt;

/// Result type for Framechain operations
pub type Result<T> = std::result::Result<T, Error>;

/// Framechain errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A native call did not report success
    BackendError {
        /// Name of the failed native operation
        operation: String,
        /// Native status code (e.g. the raw `VkResult`)
        status: i32,
    },

    /// The surface became stale between acquire and present (window resized)
    SurfaceOutOfDate {
        /// Name of the native operation that reported the stale surface
        operation: String,
    },

    /// No renderable configuration exists (no surface formats, no depth format, ...)
    Configuration(String),

    /// Out of GPU memory
    OutOfMemory,

    /// Object used while it is not in a usable state
    InvalidState(String),

    /// Backend bring-up failed (library, instance, device, window handles)
    InitializationFailed(String),
}

impl Error {
    /// Build a `BackendError` from an operation name and a native status code
    pub fn backend(operation: impl Into<String>, status: i32) -> Self {
        Error::BackendError {
            operation: operation.into(),
            status,
        }
    }

    /// Build a `SurfaceOutOfDate` error for the given operation
    pub fn out_of_date(operation: impl Into<String>) -> Self {
        Error::SurfaceOutOfDate {
            operation: operation.into(),
        }
    }

    /// Returns true if the error reports a stale surface.
    ///
    /// Callers may react by resizing the swap chain; the failed frame is lost either way.
    pub fn is_out_of_date(&self) -> bool {
        matches!(self, Error::SurfaceOutOfDate { .. })
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BackendError { operation, status } => {
                write!(f, "Backend error: {} failed with status {}", operation, status)
            }
            Error::SurfaceOutOfDate { operation } => {
                write!(f, "Surface out of date during {}", operation)
            }
            Error::Configuration(msg) => write!(f, "Configuration error: {}", msg),
            Error::OutOfMemory => write!(f, "Out of GPU memory"),
            Error::InvalidState(msg) => write!(f, "Invalid state: {}", msg),
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
