//! Restore outcome model
//!
//! The tagged success/error value handed back to the embedding application
//! after an import attempt. Serializes as `{ok: true, restored: {…}}` or
//! `{ok: false, code, message, details}`.

use serde::Serialize;

use crate::error::{BackupError, ErrorCode};

/// Per-entity counts of what a successful restore wrote
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoredCounts {
    /// Users inserted or updated
    pub users: usize,
    /// Favorite rows written
    pub favorites: usize,
    /// Search-history entries stored
    pub search_history: usize,
}

/// Result of a restore attempt
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum RestoreOutcome {
    /// All mutations committed
    Success {
        /// Always `true`
        ok: bool,
        /// What was written
        restored: RestoredCounts,
    },
    /// Nothing persisted (or, for `ROLLBACK_FAILED`, the store needs attention)
    Failure {
        /// Always `false`
        ok: bool,
        /// Classified error code
        code: ErrorCode,
        /// Human-readable message
        message: String,
        /// Context bag: attempted counts, payload version, underlying errors
        details: serde_json::Map<String, serde_json::Value>,
    },
}

impl RestoreOutcome {
    /// Build a success outcome
    pub fn success(restored: RestoredCounts) -> Self {
        Self::Success { ok: true, restored }
    }

    /// Build a failure outcome from an error plus its context bag
    pub fn failure(
        err: &BackupError,
        details: serde_json::Map<String, serde_json::Value>,
    ) -> Self {
        Self::Failure {
            ok: false,
            code: err.code(),
            message: err.to_string(),
            details,
        }
    }

    /// Whether the restore committed
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// The error code, if this is a failure
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { code, .. } => Some(*code),
        }
    }

    /// The restored counts, if this is a success
    pub fn restored(&self) -> Option<RestoredCounts> {
        match self {
            Self::Success { restored, .. } => Some(*restored),
            Self::Failure { .. } => None,
        }
    }
}
