//! Error types for the Strata database manager
//!
//! This module defines all error types used throughout the system.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! Errors fall into two groups:
//! - Structural errors (`NotFound`, `AlreadyExists`, `InvalidInput`) are raised
//!   synchronously by create/drop/initialize operations.
//! - Instance faults (`UnableToStart`, `UnableToStop`) are captured on the
//!   failing database instead of being returned, and only surface later through
//!   health queries or as the cause of a `ShutdownFailed` error.

use crate::types::DatabaseId;
use std::io;
use std::sync::Arc;
use thiserror::Error;

/// Result type alias for Strata operations
pub type StrataResult<T> = std::result::Result<T, StrataError>;

/// Error types for the Strata database manager
#[derive(Debug, Error)]
pub enum StrataError {
    /// I/O error (config files, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Referenced database is absent from the catalog or the registry
    #[error("database not found: {name}")]
    NotFound {
        /// Name of the missing database
        name: String,
    },

    /// Attempt to register a database that is already registered
    #[error("database already exists: {name}")]
    AlreadyExists {
        /// Name of the duplicate database
        name: String,
    },

    /// Malformed input (names, uuids, configuration values)
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Configuration could not be parsed or written
    #[error("configuration error: {0}")]
    Config(String),

    /// Failure reported by the durable catalog
    #[error("catalog error: {0}")]
    Catalog(String),

    /// Failure reported by a database instance or the instance factory
    #[error("instance error: {0}")]
    Instance(String),

    /// A database instance failed to start
    #[error("an error occurred! Unable to start `{id}`")]
    UnableToStart {
        /// Database that failed to start
        id: DatabaseId,
        /// Underlying fault
        #[source]
        cause: Box<StrataError>,
    },

    /// A database instance failed to stop
    #[error("an error occurred! Unable to stop `{id}`")]
    UnableToStop {
        /// Database that failed to stop
        id: DatabaseId,
        /// Underlying fault
        #[source]
        cause: Box<StrataError>,
    },

    /// One or more databases failed to stop during shutdown
    #[error("failed to stop {database} database ({others} other database(s) also failed)")]
    ShutdownFailed {
        /// Name of the first database that failed to stop
        database: String,
        /// Number of further databases that failed to stop
        others: usize,
        /// Failure captured on the first database
        #[source]
        cause: Arc<StrataError>,
    },
}

impl StrataError {
    /// Create a `NotFound` error for the given database name
    pub fn not_found(name: impl Into<String>) -> Self {
        StrataError::NotFound { name: name.into() }
    }

    /// Create an `AlreadyExists` error for the given database name
    pub fn already_exists(name: impl Into<String>) -> Self {
        StrataError::AlreadyExists { name: name.into() }
    }

    /// Create an `InvalidInput` error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        StrataError::InvalidInput(msg.into())
    }

    /// Create a `Config` error
    pub fn config(msg: impl Into<String>) -> Self {
        StrataError::Config(msg.into())
    }

    /// Create a `Catalog` error
    pub fn catalog(msg: impl Into<String>) -> Self {
        StrataError::Catalog(msg.into())
    }

    /// Create an `Instance` error
    pub fn instance(msg: impl Into<String>) -> Self {
        StrataError::Instance(msg.into())
    }

    /// Wrap a start fault for the given database
    pub fn unable_to_start(id: DatabaseId, cause: StrataError) -> Self {
        StrataError::UnableToStart {
            id,
            cause: Box::new(cause),
        }
    }

    /// Wrap a stop fault for the given database
    pub fn unable_to_stop(id: DatabaseId, cause: StrataError) -> Self {
        StrataError::UnableToStop {
            id,
            cause: Box::new(cause),
        }
    }

    /// True if this is a `NotFound` error
    pub fn is_not_found(&self) -> bool {
        matches!(self, StrataError::NotFound { .. })
    }

    /// True if this is an `AlreadyExists` error
    pub fn is_already_exists(&self) -> bool {
        matches!(self, StrataError::AlreadyExists { .. })
    }

    /// True if this failure was captured while starting a database
    pub fn is_start_failure(&self) -> bool {
        matches!(self, StrataError::UnableToStart { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;
    use uuid::Uuid;

    #[test]
    fn test_error_display_not_found() {
        let err = StrataError::not_found("tenant1");
        let msg = err.to_string();
        assert!(msg.contains("not found"));
        assert!(msg.contains("tenant1"));
        assert!(err.is_not_found());
    }

    #[test]
    fn test_error_display_already_exists() {
        let err = StrataError::already_exists("tenant1");
        assert!(err.to_string().contains("already exists"));
        assert!(err.is_already_exists());
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_unable_to_start_keeps_cause() {
        let id = DatabaseId::new("tenant1", Uuid::new_v4());
        let err = StrataError::unable_to_start(id, StrataError::instance("disk full"));
        assert!(err.is_start_failure());
        assert!(err.to_string().contains("Unable to start"));
        let source = err.source().unwrap();
        assert!(source.to_string().contains("disk full"));
    }

    #[test]
    fn test_unable_to_stop_is_not_start_failure() {
        let id = DatabaseId::new("tenant1", Uuid::new_v4());
        let err = StrataError::unable_to_stop(id, StrataError::instance("busy"));
        assert!(!err.is_start_failure());
        assert!(err.to_string().contains("Unable to stop"));
    }

    #[test]
    fn test_shutdown_failed_display() {
        let id = DatabaseId::new("tenant1", Uuid::new_v4());
        let cause = Arc::new(StrataError::unable_to_stop(id, StrataError::instance("x")));
        let err = StrataError::ShutdownFailed {
            database: "tenant1".to_string(),
            others: 2,
            cause,
        };
        let msg = err.to_string();
        assert!(msg.contains("failed to stop tenant1"));
        assert!(msg.contains("2 other"));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_error_from_io() {
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "access denied");
        let err: StrataError = io_err.into();
        assert!(matches!(err, StrataError::Io(_)));
    }
}
