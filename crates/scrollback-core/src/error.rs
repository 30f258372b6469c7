//! Engine error types with fatal/recoverable classification.

use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Error taxonomy for the reconciliation engine.
///
/// Contract violations signal programming defects and are fatal; everything
/// else degrades (stale-but-consistent view beats a crashed live UI).
#[derive(Debug, Error)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────
    // Common/Infrastructure Errors
    // ─────────────────────────────────────────────────────────────
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ─────────────────────────────────────────────────────────────
    // Contract Violations
    // ─────────────────────────────────────────────────────────────
    #[error("contract violation: {message}")]
    Contract { message: String },

    // ─────────────────────────────────────────────────────────────
    // Snapshot/Store Errors
    // ─────────────────────────────────────────────────────────────
    #[error("inconsistent snapshot: {message}")]
    InconsistentSnapshot { message: String },

    #[error("store error: {message}")]
    Store { message: String },

    // ─────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────
    #[error("configuration error: {message}")]
    Config { message: String },

    // ─────────────────────────────────────────────────────────────
    // Channel/Communication Errors
    // ─────────────────────────────────────────────────────────────
    #[error("channel closed unexpectedly")]
    ChannelClosed,
}

// ─────────────────────────────────────────────────────────────
// Convenience Constructors
// ─────────────────────────────────────────────────────────────

impl Error {
    pub fn contract(message: impl Into<String>) -> Self {
        Self::Contract {
            message: message.into(),
        }
    }

    pub fn inconsistent(message: impl Into<String>) -> Self {
        Self::InconsistentSnapshot {
            message: message.into(),
        }
    }

    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Check if this error signals a programming defect that must abort
    /// rather than degrade.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Contract { .. })
    }

    /// Check if this is a recoverable error (log, degrade, continue).
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::InconsistentSnapshot { .. }
                | Error::Store { .. }
                | Error::Config { .. }
                | Error::ChannelClosed
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_messages() {
        let err = Error::contract("transition already enqueued");
        assert_eq!(
            err.to_string(),
            "contract violation: transition already enqueued"
        );

        let err = Error::inconsistent("out-of-order record");
        assert!(err.to_string().contains("out-of-order record"));
    }

    #[test]
    fn test_contract_violations_are_fatal() {
        assert!(Error::contract("double enqueue").is_fatal());
        assert!(!Error::contract("double enqueue").is_recoverable());
    }

    #[test]
    fn test_snapshot_errors_are_recoverable() {
        assert!(Error::inconsistent("overlapping holes").is_recoverable());
        assert!(!Error::inconsistent("overlapping holes").is_fatal());
        assert!(Error::store("closed").is_recoverable());
        assert!(Error::ChannelClosed.is_recoverable());
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
