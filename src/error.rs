//! Error types for lexivault
//!
//! This module defines the error hierarchy for the backup subsystem using
//! thiserror for ergonomic error definitions. Every error maps onto one of
//! the wire codes reported to the embedding application.

use serde::Serialize;
use thiserror::Error;

/// Wire-level error code reported alongside every failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorCode {
    /// Payload failed structural validation
    #[serde(rename = "INVALID_PAYLOAD")]
    InvalidPayload,
    /// Payload or container version is not understood
    #[serde(rename = "UNSUPPORTED_VERSION")]
    UnsupportedVersion,
    /// Container failed authentication or decryption
    #[serde(rename = "DECRYPT_FAILED")]
    DecryptFailed,
    /// A database constraint was violated
    #[serde(rename = "DB_CONSTRAINT")]
    DbConstraint,
    /// Any other storage failure
    #[serde(rename = "DB_ERROR")]
    DbError,
    /// Rollback itself failed; the store may be inconsistent
    #[serde(rename = "ROLLBACK_FAILED")]
    RollbackFailed,
    /// Anything that escaped classification
    #[serde(rename = "UNKNOWN")]
    Unknown,
}

impl ErrorCode {
    /// The wire spelling of this code
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidPayload => "INVALID_PAYLOAD",
            Self::UnsupportedVersion => "UNSUPPORTED_VERSION",
            Self::DecryptFailed => "DECRYPT_FAILED",
            Self::DbConstraint => "DB_CONSTRAINT",
            Self::DbError => "DB_ERROR",
            Self::RollbackFailed => "ROLLBACK_FAILED",
            Self::Unknown => "UNKNOWN",
        }
    }
}

/// The main error type for backup operations
#[derive(Error, Debug)]
pub enum BackupError {
    /// Payload failed validation before any mutation
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// Payload or container carries a version this build cannot read
    #[error("Unsupported version: {0}")]
    UnsupportedVersion(String),

    /// Integrity check or decryption failed
    #[error("Decryption failed: {0}")]
    DecryptFailed(String),

    /// A database constraint rejected a write
    #[error("Constraint violation: {0}")]
    DbConstraint(String),

    /// Other storage failure
    #[error("Database error: {0}")]
    DbError(String),

    /// Rollback failed after an earlier error; both are preserved
    #[error("Rollback failed ({rollback}) while handling: {source}")]
    RollbackFailed {
        /// The error that triggered the rollback attempt
        source: Box<BackupError>,
        /// The error raised by the rollback itself
        rollback: String,
    },

    /// Unclassified failure
    #[error("Unexpected error: {0}")]
    Unknown(String),
}

impl BackupError {
    /// The wire code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidPayload(_) => ErrorCode::InvalidPayload,
            Self::UnsupportedVersion(_) => ErrorCode::UnsupportedVersion,
            Self::DecryptFailed(_) => ErrorCode::DecryptFailed,
            Self::DbConstraint(_) => ErrorCode::DbConstraint,
            Self::DbError(_) => ErrorCode::DbError,
            Self::RollbackFailed { .. } => ErrorCode::RollbackFailed,
            Self::Unknown(_) => ErrorCode::Unknown,
        }
    }

    /// Check if this is a validation error
    pub fn is_invalid_payload(&self) -> bool {
        matches!(self, Self::InvalidPayload(_))
    }

    /// Check if this failure may have left the store inconsistent
    pub fn is_rollback_failure(&self) -> bool {
        matches!(self, Self::RollbackFailed { .. })
    }
}

impl From<rusqlite::Error> for BackupError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(inner, _)
                if inner.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Self::DbConstraint(err.to_string())
            }
            _ => Self::DbError(err.to_string()),
        }
    }
}

/// Result type alias for backup operations
pub type BackupResult<T> = Result<T, BackupError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BackupError::InvalidPayload("users missing".into());
        assert_eq!(err.to_string(), "Invalid payload: users missing");
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(
            BackupError::DecryptFailed("bad mac".into()).code(),
            ErrorCode::DecryptFailed
        );
        assert_eq!(
            BackupError::UnsupportedVersion("3".into()).code(),
            ErrorCode::UnsupportedVersion
        );
        assert_eq!(ErrorCode::DbConstraint.as_str(), "DB_CONSTRAINT");
    }

    #[test]
    fn test_rollback_failure_carries_both_errors() {
        let err = BackupError::RollbackFailed {
            source: Box::new(BackupError::DbConstraint("UNIQUE failed".into())),
            rollback: "cannot rollback - no transaction is active".into(),
        };
        assert!(err.is_rollback_failure());
        let text = err.to_string();
        assert!(text.contains("UNIQUE failed"));
        assert!(text.contains("no transaction is active"));
    }

    #[test]
    fn test_from_rusqlite_constraint() {
        let sqlite_err = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error {
                code: rusqlite::ErrorCode::ConstraintViolation,
                extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE,
            },
            Some("UNIQUE constraint failed: users.username".into()),
        );
        let err: BackupError = sqlite_err.into();
        assert_eq!(err.code(), ErrorCode::DbConstraint);
    }

    #[test]
    fn test_from_rusqlite_other() {
        let err: BackupError = rusqlite::Error::InvalidQuery.into();
        assert_eq!(err.code(), ErrorCode::DbError);
    }

    #[test]
    fn test_code_serializes_to_wire_spelling() {
        let json = serde_json::to_string(&ErrorCode::RollbackFailed).unwrap();
        assert_eq!(json, "\"ROLLBACK_FAILED\"");
    }
}
