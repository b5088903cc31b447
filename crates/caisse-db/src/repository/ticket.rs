//! # Ticket Repository
//!
//! The Local Ticket Store: a durable queue of sale records and their sync
//! state.
//!
//! ## Queue Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    tickets Table as a Queue                             │
//! │                                                                         │
//! │  SALE ENTRY                                                             │
//! │      enqueue() ──► INSERT (sync_status = 'pending')                     │
//! │      Failure here is fatal to the sale: the UI must not accept a       │
//! │      sale that was not durably enqueued.                                │
//! │                                                                         │
//! │  SYNC AGENT (per pass)                                                  │
//! │      list_unsynced(n) ──► SELECT ... WHERE sync_status = 'pending'      │
//! │                           ORDER BY created_at ASC LIMIT n               │
//! │      mark_synced(ids) ──► UPDATE ... SET 'synced', synced_at = NOW      │
//! │      mark_failed(id)  ──► attempts += 1, stays 'pending'                │
//! │      quarantine(id)   ──► sync_status = 'error' (retry limit hit)       │
//! │      requeue_errors() ──► 'error' rows back to 'pending'                │
//! │                                                                         │
//! │  Tickets are NEVER deleted by the sync subsystem.                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use caisse_core::{NewTicket, SyncStatus, Ticket};

use crate::error::DbResult;

/// Repository for the terminal ticket queue.
#[derive(Debug, Clone)]
pub struct TicketRepository {
    pool: SqlitePool,
}

impl TicketRepository {
    /// Creates a new TicketRepository.
    pub fn new(pool: SqlitePool) -> Self {
        TicketRepository { pool }
    }

    /// Appends a ticket to the queue in `Pending` state.
    ///
    /// Fails only on storage I/O failure, which the caller must treat as
    /// fatal to the sale.
    pub async fn enqueue(&self, ticket: &Ticket) -> DbResult<()> {
        debug!(id = %ticket.id, price = ticket.price.cents(), "Enqueuing ticket");

        sqlx::query(
            r#"
            INSERT INTO tickets (
                id, type_id, staff_id, site_id, price,
                created_at, synced_at, sync_status, device_id, attempts, last_error
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&ticket.id)
        .bind(&ticket.type_id)
        .bind(&ticket.staff_id)
        .bind(&ticket.site_id)
        .bind(ticket.price)
        .bind(ticket.created_at)
        .bind(ticket.synced_at)
        .bind(ticket.sync_status)
        .bind(&ticket.device_id)
        .bind(ticket.attempts)
        .bind(&ticket.last_error)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Records a new sale: materializes a `Pending` ticket and enqueues it.
    pub async fn record_sale(&self, new: NewTicket, device_id: &str) -> DbResult<Ticket> {
        let ticket = new.into_ticket(device_id, Utc::now());
        self.enqueue(&ticket).await?;
        Ok(ticket)
    }

    /// Returns up to `limit` pending tickets, oldest first.
    ///
    /// Oldest-first ordering keeps delivery FIFO-ish per terminal: a pass
    /// always offers the oldest backlog before newer sales.
    pub async fn list_unsynced(&self, limit: u32) -> DbResult<Vec<Ticket>> {
        let tickets = sqlx::query_as::<_, Ticket>(
            r#"
            SELECT id, type_id, staff_id, site_id, price,
                   created_at, synced_at, sync_status, device_id, attempts, last_error
            FROM tickets
            WHERE sync_status = 'pending'
            ORDER BY created_at ASC
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(tickets)
    }

    /// Marks the given tickets as synced, in one transaction.
    ///
    /// Called only after a fully parsed successful batch response; an
    /// aborted pass must leave every ticket `Pending`.
    pub async fn mark_synced(&self, ids: &[String]) -> DbResult<()> {
        if ids.is_empty() {
            return Ok(());
        }

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        for id in ids {
            sqlx::query(
                r#"
                UPDATE tickets SET
                    sync_status = 'synced',
                    synced_at = ?2,
                    last_error = NULL
                WHERE id = ?1
                "#,
            )
            .bind(id)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        debug!(count = ids.len(), "Marked tickets synced");
        Ok(())
    }

    /// Records a server rejection for one ticket; it stays `Pending`.
    ///
    /// Returns the new attempt count so the caller can apply its retry
    /// policy.
    pub async fn mark_failed(&self, id: &str, error: &str) -> DbResult<i64> {
        let attempts: i64 = sqlx::query_scalar(
            r#"
            UPDATE tickets SET
                attempts = attempts + 1,
                last_error = ?2
            WHERE id = ?1
            RETURNING attempts
            "#,
        )
        .bind(id)
        .bind(error)
        .fetch_one(&self.pool)
        .await?;

        Ok(attempts)
    }

    /// Moves a ticket to `Error`, excluding it from future passes until
    /// an explicit requeue.
    pub async fn quarantine(&self, id: &str) -> DbResult<()> {
        sqlx::query("UPDATE tickets SET sync_status = 'error' WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Returns quarantined tickets to `Pending` for another round of
    /// retries. Returns how many were requeued.
    pub async fn requeue_errors(&self) -> DbResult<u64> {
        let result =
            sqlx::query("UPDATE tickets SET sync_status = 'pending' WHERE sync_status = 'error'")
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected())
    }

    /// Current backlog size, exposed to the UI as an indicator.
    pub async fn count_pending(&self) -> DbResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM tickets WHERE sync_status = 'pending'")
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    /// Fetches one ticket by id.
    pub async fn get(&self, id: &str) -> DbResult<Option<Ticket>> {
        let ticket = sqlx::query_as::<_, Ticket>(
            r#"
            SELECT id, type_id, staff_id, site_id, price,
                   created_at, synced_at, sync_status, device_id, attempts, last_error
            FROM tickets
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(ticket)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::Database;
    use caisse_core::Money;
    use chrono::{Duration, TimeZone};

    fn new_ticket(price_cents: i64) -> NewTicket {
        NewTicket {
            type_id: "type-1".into(),
            staff_id: "staff-1".into(),
            site_id: "site-1".into(),
            price: Money::from_cents(price_cents),
        }
    }

    async fn repo() -> TicketRepository {
        Database::in_memory().await.unwrap().tickets()
    }

    #[tokio::test]
    async fn enqueue_then_count_pending() {
        let repo = repo().await;
        assert_eq!(repo.count_pending().await.unwrap(), 0);

        repo.record_sale(new_ticket(500), "term-1").await.unwrap();
        repo.record_sale(new_ticket(750), "term-1").await.unwrap();

        assert_eq!(repo.count_pending().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn list_unsynced_is_oldest_first() {
        let repo = repo().await;
        let base = chrono::Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap();

        // Enqueue out of chronological order on purpose.
        for (offset_mins, label) in [(30i64, "second"), (0, "first"), (60, "third")] {
            let mut ticket = new_ticket(100).into_ticket("term-1", base);
            ticket.created_at = base + Duration::minutes(offset_mins);
            ticket.type_id = label.into();
            repo.enqueue(&ticket).await.unwrap();
        }

        let pending = repo.list_unsynced(10).await.unwrap();
        let order: Vec<&str> = pending.iter().map(|t| t.type_id.as_str()).collect();
        assert_eq!(order, ["first", "second", "third"]);
    }

    #[tokio::test]
    async fn list_unsynced_respects_limit() {
        let repo = repo().await;
        for _ in 0..5 {
            repo.record_sale(new_ticket(100), "term-1").await.unwrap();
        }
        assert_eq!(repo.list_unsynced(3).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn mark_synced_sets_status_and_timestamp() {
        let repo = repo().await;
        let a = repo.record_sale(new_ticket(100), "term-1").await.unwrap();
        let b = repo.record_sale(new_ticket(200), "term-1").await.unwrap();

        repo.mark_synced(&[a.id.clone(), b.id.clone()]).await.unwrap();

        let stored = repo.get(&a.id).await.unwrap().unwrap();
        assert_eq!(stored.sync_status, SyncStatus::Synced);
        assert!(stored.synced_at.is_some());
        assert_eq!(repo.count_pending().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn mark_failed_keeps_ticket_pending_and_counts_attempts() {
        let repo = repo().await;
        let t = repo.record_sale(new_ticket(100), "term-1").await.unwrap();

        let attempts = repo.mark_failed(&t.id, "unknown staffId").await.unwrap();
        assert_eq!(attempts, 1);
        let attempts = repo.mark_failed(&t.id, "unknown staffId").await.unwrap();
        assert_eq!(attempts, 2);

        let stored = repo.get(&t.id).await.unwrap().unwrap();
        assert_eq!(stored.sync_status, SyncStatus::Pending);
        assert_eq!(stored.last_error.as_deref(), Some("unknown staffId"));
        assert_eq!(repo.count_pending().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn quarantine_and_requeue_round_trip() {
        let repo = repo().await;
        let t = repo.record_sale(new_ticket(100), "term-1").await.unwrap();

        repo.quarantine(&t.id).await.unwrap();
        assert_eq!(repo.count_pending().await.unwrap(), 0);
        assert!(repo.list_unsynced(10).await.unwrap().is_empty());

        let requeued = repo.requeue_errors().await.unwrap();
        assert_eq!(requeued, 1);
        assert_eq!(repo.count_pending().await.unwrap(), 1);
    }
}
