//! Idempotent ticket ingestion.
//!
//! One batch in, one accounting out. Every ticket is handled on its own:
//! a rejected ticket lands in `failed_ticket_ids` and the rest of the
//! batch still commits. Replays are harmless; the ledger write is an
//! insert, a last-write-wins overwrite, or a no-op, decided per ticket
//! inside [`LedgerDb::apply_ticket`].

use tracing::{info, warn};

use caisse_core::protocol::{SyncBatchRequest, SyncBatchResponse, TicketPayload};
use caisse_core::validate_ticket_payload;

use crate::db::ApplyOutcome;
use crate::error::ApiError;
use crate::AppState;

/// Processes one sync batch.
///
/// Fails the whole request only for structural problems (batch over the
/// configured size limit); anything wrong with an individual ticket is
/// reported through the response accounting instead.
pub async fn ingest_batch(
    state: &AppState,
    batch: SyncBatchRequest,
) -> Result<SyncBatchResponse, ApiError> {
    let limit = state.config.batch_size_limit;
    if batch.tickets.len() > limit {
        return Err(ApiError::InvalidRequest(format!(
            "batch of {} tickets exceeds limit of {}",
            batch.tickets.len(),
            limit
        )));
    }

    let mut response = SyncBatchResponse {
        total_received: batch.tickets.len(),
        ..Default::default()
    };

    for ticket in &batch.tickets {
        match ingest_one(state, ticket).await {
            Ok(ApplyOutcome::Inserted) => response.inserted += 1,
            // Idempotent no-ops count as updated so a retried batch
            // reads as fully handled by the terminal.
            Ok(ApplyOutcome::Overwritten) | Ok(ApplyOutcome::Unchanged) => response.updated += 1,
            Err(reason) => {
                warn!(id = %ticket.id, %reason, "Rejected ticket");
                response.errors += 1;
                response.failed_ticket_ids.push(ticket.id.clone());
            }
        }
    }

    info!(
        total = response.total_received,
        inserted = response.inserted,
        updated = response.updated,
        errors = response.errors,
        "Processed sync batch"
    );
    Ok(response)
}

/// Validates and applies a single ticket. The error is the rejection
/// reason reported in the server log; the terminal only sees the id in
/// `failed_ticket_ids`.
async fn ingest_one(state: &AppState, ticket: &TicketPayload) -> Result<ApplyOutcome, String> {
    validate_ticket_payload(ticket).map_err(|e| e.to_string())?;

    if let Some(field) = state
        .db
        .missing_reference(ticket)
        .await
        .map_err(|e| e.to_string())?
    {
        return Err(format!("unknown {field} reference"));
    }

    state
        .db
        .apply_ticket(ticket)
        .await
        .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testutil::seeded_state;
    use caisse_core::Money;
    use chrono::{TimeZone, Utc};

    fn payload(id: &str, cents: i64) -> TicketPayload {
        TicketPayload {
            id: id.to_string(),
            type_id: "type-1".to_string(),
            staff_id: "staff-1".to_string(),
            site_id: "site-1".to_string(),
            price: Money::from_cents(cents),
            created_at: Utc.with_ymd_and_hms(2025, 6, 15, 10, 0, 0).unwrap(),
            device_id: "term-1".to_string(),
        }
    }

    fn batch(tickets: Vec<TicketPayload>) -> SyncBatchRequest {
        SyncBatchRequest { tickets }
    }

    #[tokio::test]
    async fn fresh_batch_inserts_every_ticket() {
        let state = seeded_state().await;

        let resp = ingest_batch(&state, batch(vec![payload("t-1", 500), payload("t-2", 700)]))
            .await
            .unwrap();

        assert_eq!(resp.total_received, 2);
        assert_eq!(resp.inserted, 2);
        assert_eq!(resp.errors, 0);
        assert!(resp.failed_ticket_ids.is_empty());
        assert_eq!(state.db.ticket_count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn replayed_batch_is_idempotent() {
        let state = seeded_state().await;
        let req = batch(vec![payload("t-1", 500), payload("t-2", 700)]);

        ingest_batch(&state, req.clone()).await.unwrap();
        let resp = ingest_batch(&state, req).await.unwrap();

        // Same payload, same createdAt: pure no-ops, reported as updated.
        assert_eq!(resp.inserted, 0);
        assert_eq!(resp.updated, 2);
        assert_eq!(resp.errors, 0);
        assert_eq!(state.db.ticket_count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn newer_client_timestamp_overwrites() {
        let state = seeded_state().await;

        let mut original = payload("t-1", 500);
        ingest_batch(&state, batch(vec![original.clone()]))
            .await
            .unwrap();

        original.price = Money::from_cents(999);
        original.created_at = original.created_at + chrono::Duration::minutes(5);
        let resp = ingest_batch(&state, batch(vec![original])).await.unwrap();
        assert_eq!(resp.updated, 1);

        let (stored, _) = state.db.get_ticket("t-1").await.unwrap().unwrap();
        assert_eq!(stored.price, Money::from_cents(999));
    }

    #[tokio::test]
    async fn older_client_timestamp_is_ignored() {
        let state = seeded_state().await;

        let original = payload("t-1", 500);
        ingest_batch(&state, batch(vec![original.clone()]))
            .await
            .unwrap();

        let mut stale = original.clone();
        stale.price = Money::from_cents(1);
        stale.created_at = original.created_at - chrono::Duration::minutes(5);
        let resp = ingest_batch(&state, batch(vec![stale])).await.unwrap();

        // Still acknowledged, but the row keeps the newer data.
        assert_eq!(resp.updated, 1);
        let (stored, _) = state.db.get_ticket("t-1").await.unwrap().unwrap();
        assert_eq!(stored.price, Money::from_cents(500));
        assert_eq!(stored.created_at, original.created_at);
    }

    #[tokio::test]
    async fn one_bad_ticket_does_not_sink_the_batch() {
        let state = seeded_state().await;

        let mut tickets: Vec<TicketPayload> =
            (1..=4).map(|i| payload(&format!("t-{i}"), 100 * i)).collect();
        let mut bad = payload("t-bad", 500);
        bad.staff_id = "nobody".to_string();
        tickets.insert(2, bad);

        let resp = ingest_batch(&state, batch(tickets)).await.unwrap();

        assert_eq!(resp.total_received, 5);
        assert_eq!(resp.inserted, 4);
        assert_eq!(resp.errors, 1);
        assert_eq!(resp.failed_ticket_ids, vec!["t-bad".to_string()]);
        assert_eq!(state.db.ticket_count().await.unwrap(), 4);
    }

    #[tokio::test]
    async fn negative_price_is_rejected() {
        let state = seeded_state().await;

        let resp = ingest_batch(&state, batch(vec![payload("t-1", -100)]))
            .await
            .unwrap();

        assert_eq!(resp.errors, 1);
        assert!(resp.is_failed("t-1"));
        assert_eq!(state.db.ticket_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn oversized_batch_is_refused_outright() {
        let state = seeded_state().await;
        let limit = state.config.batch_size_limit;

        let tickets = (0..=limit).map(|i| payload(&format!("t-{i}"), 100)).collect();
        let err = ingest_batch(&state, batch(tickets)).await.unwrap_err();

        assert!(matches!(err, ApiError::InvalidRequest(_)));
        assert_eq!(state.db.ticket_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn accounting_always_sums_to_total() {
        let state = seeded_state().await;

        let mut bad = payload("t-bad", 500);
        bad.type_id = "no-such-type".to_string();
        let req = batch(vec![payload("t-1", 100), bad, payload("t-1", 100)]);

        let resp = ingest_batch(&state, req).await.unwrap();
        assert_eq!(
            resp.inserted + resp.updated + resp.errors,
            resp.total_received
        );
    }
}
