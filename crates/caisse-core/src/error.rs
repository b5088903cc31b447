//! # Domain Error Types
//!
//! Typed errors for the pure business-logic layer. I/O-level failures
//! (database, network) live in the db/sync/server crates; everything here
//! is a rule violation that can be produced without touching the world.

use thiserror::Error;

/// Validation failures for incoming ticket payloads.
///
/// These map one-to-one to the reasons a ticket can land in the
/// `failedTicketIds` list of a sync batch response.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The ticket id is empty or not a usable identifier.
    #[error("Ticket id must not be blank")]
    BlankTicketId,

    /// A required reference field is blank.
    #[error("Required reference '{0}' must not be blank")]
    BlankReference(&'static str),

    /// The originating device id is blank.
    #[error("Device id must not be blank")]
    BlankDeviceId,

    /// Negative prices are rejected; refunds are out of scope for sync.
    #[error("Ticket price must not be negative (got {0} cents)")]
    NegativePrice(i64),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_are_descriptive() {
        let err = ValidationError::NegativePrice(-100);
        assert!(err.to_string().contains("-100"));
        assert!(ValidationError::BlankReference("staffId")
            .to_string()
            .contains("staffId"));
    }
}
