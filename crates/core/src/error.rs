//! Error types for storage backends
//!
//! Every backend operation reports failure through [`Error`]. The harness
//! never retries: any `Err` surfacing from a backend ends the run, so the
//! variants carry enough text to explain what the engine was doing.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for backend operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types reported by a backend under test
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error (file operations on the database directory)
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),

    /// Persisted data failed validation
    #[error("Data corruption: {0}")]
    Corruption(String),

    /// Invalid operation or state
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Database directory does not exist and `create_if_missing` was off
    #[error("Database not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Database directory exists and `error_if_exists` was on
    #[error("Database already exists: {}", .0.display())]
    AlreadyExists(PathBuf),

    /// Error reported by the wrapped engine, carrying its own status text
    #[error("Engine error: {0}")]
    Engine(String),

    /// Operation issued after `close()`
    #[error("Database is closed")]
    Closed,
}

impl Error {
    /// Build a corruption error from anything displayable
    pub fn corruption(msg: impl Into<String>) -> Self {
        Error::Corruption(msg.into())
    }

    /// Build an invalid-operation error from anything displayable
    pub fn invalid_operation(msg: impl Into<String>) -> Self {
        Error::InvalidOperation(msg.into())
    }

    /// Build an engine error from the engine's status text
    pub fn engine(msg: impl Into<String>) -> Self {
        Error::Engine(msg.into())
    }

    /// True when the error came from the operating system rather than the
    /// engine's own validation.
    pub fn is_io(&self) -> bool {
        matches!(self, Error::IoError(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_io() {
        let err = Error::IoError(io::Error::new(io::ErrorKind::NotFound, "file not found"));
        let msg = err.to_string();
        assert!(msg.contains("I/O error"));
        assert!(err.is_io());
    }

    #[test]
    fn test_error_display_corruption() {
        let err = Error::corruption("CRC check failed at offset 128");
        let msg = err.to_string();
        assert!(msg.contains("Data corruption"));
        assert!(msg.contains("offset 128"));
        assert!(!err.is_io());
    }

    #[test]
    fn test_error_display_invalid_operation() {
        let err = Error::invalid_operation("empty key");
        assert_eq!(err.to_string(), "Invalid operation: empty key");
    }

    #[test]
    fn test_error_display_paths() {
        let err = Error::NotFound(PathBuf::from("/tmp/db"));
        assert!(err.to_string().contains("/tmp/db"));

        let err = Error::AlreadyExists(PathBuf::from("bench-db"));
        assert!(err.to_string().contains("already exists"));
    }

    #[test]
    fn test_error_display_engine() {
        let err = Error::engine("Database already open. Cannot acquire lock.");
        assert_eq!(
            err.to_string(),
            "Engine error: Database already open. Cannot acquire lock."
        );
        assert!(!err.is_io());
    }

    #[test]
    fn test_error_display_closed() {
        assert_eq!(Error::Closed.to_string(), "Database is closed");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "access denied");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::IoError(_)));
    }
}
