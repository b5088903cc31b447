//! # Validation Rules
//!
//! Structural validation of ticket payloads, applied server-side before a
//! ticket touches the ledger. Reference existence (does this staff id
//! exist?) is a database concern and lives in the ingest service; the
//! checks here need no I/O.

use crate::error::ValidationError;
use crate::protocol::TicketPayload;

/// Validates a ticket payload received by the sync endpoint.
///
/// A failing ticket is reported in `failedTicketIds` and never aborts the
/// rest of its batch.
pub fn validate_ticket_payload(payload: &TicketPayload) -> Result<(), ValidationError> {
    if payload.id.trim().is_empty() {
        return Err(ValidationError::BlankTicketId);
    }
    if payload.type_id.trim().is_empty() {
        return Err(ValidationError::BlankReference("typeId"));
    }
    if payload.staff_id.trim().is_empty() {
        return Err(ValidationError::BlankReference("staffId"));
    }
    if payload.site_id.trim().is_empty() {
        return Err(ValidationError::BlankReference("siteId"));
    }
    if payload.device_id.trim().is_empty() {
        return Err(ValidationError::BlankDeviceId);
    }
    if payload.price.is_negative() {
        return Err(ValidationError::NegativePrice(payload.price.cents()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;
    use chrono::Utc;

    fn payload() -> TicketPayload {
        TicketPayload {
            id: "ticket-1".into(),
            type_id: "type-1".into(),
            staff_id: "staff-1".into(),
            site_id: "site-1".into(),
            price: Money::from_cents(1000),
            created_at: Utc::now(),
            device_id: "term-1".into(),
        }
    }

    #[test]
    fn well_formed_payload_passes() {
        assert!(validate_ticket_payload(&payload()).is_ok());
    }

    #[test]
    fn blank_id_is_rejected() {
        let mut p = payload();
        p.id = "   ".into();
        assert_eq!(
            validate_ticket_payload(&p),
            Err(ValidationError::BlankTicketId)
        );
    }

    #[test]
    fn blank_references_are_rejected_with_field_name() {
        let mut p = payload();
        p.staff_id = String::new();
        assert_eq!(
            validate_ticket_payload(&p),
            Err(ValidationError::BlankReference("staffId"))
        );
    }

    #[test]
    fn negative_price_is_rejected() {
        let mut p = payload();
        p.price = Money::from_cents(-1);
        assert_eq!(
            validate_ticket_payload(&p),
            Err(ValidationError::NegativePrice(-1))
        );
    }

    #[test]
    fn zero_price_is_allowed() {
        let mut p = payload();
        p.price = Money::zero();
        assert!(validate_ticket_payload(&p).is_ok());
    }
}
