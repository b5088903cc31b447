//! # Sync Error Types
//!
//! ## Error Categories
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Configuration        Transport              Local storage              │
//! │                                                                         │
//! │  InvalidConfig        Transport (timeout,    Database                   │
//! │  ConfigLoadFailed       refused, 5xx)                                   │
//! │  ConfigSaveFailed     UnexpectedStatus                                  │
//! │                       InvalidResponse                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A `Transport` error means the whole batch is considered unsent: the
//! pass ends with zero local mutation and the next timer tick retries.

use thiserror::Error;

/// Result type alias for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Sync error type covering terminal-side sync failures.
#[derive(Debug, Error)]
pub enum SyncError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid sync configuration.
    #[error("Invalid sync configuration: {0}")]
    InvalidConfig(String),

    /// Failed to load the config file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    /// Failed to save the config file.
    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),

    // =========================================================================
    // Transport Errors
    // =========================================================================
    /// No usable response at all: timeout, refused connection, DNS.
    #[error("Transport failure: {0}")]
    Transport(String),

    /// The server answered with a non-success status.
    #[error("Server returned HTTP {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    /// The response body could not be parsed as batch accounting.
    #[error("Invalid sync response: {0}")]
    InvalidResponse(String),

    // =========================================================================
    // Local Storage
    // =========================================================================
    /// The local ticket store failed.
    #[error(transparent)]
    Database(#[from] caisse_db::DbError),
}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        // Status errors carry a response and are classified by the caller;
        // everything reaching here is a transport-level failure.
        SyncError::Transport(err.to_string())
    }
}

impl SyncError {
    /// True when the whole batch must be treated as unsent.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            SyncError::Transport(_)
                | SyncError::UnexpectedStatus { .. }
                | SyncError::InvalidResponse(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_classification() {
        assert!(SyncError::Transport("timeout".into()).is_transport());
        assert!(SyncError::UnexpectedStatus {
            status: 503,
            body: String::new()
        }
        .is_transport());
        assert!(!SyncError::InvalidConfig("x".into()).is_transport());
    }
}
