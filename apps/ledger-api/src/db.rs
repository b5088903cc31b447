//! Database layer for the Ledger API.
//!
//! Owns every SQL statement against the central ledger. The per-ticket
//! read-compare-write of the sync endpoint lives here so its atomicity
//! (one transaction per ticket) is enforced in exactly one place.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use tracing::{debug, info};
use uuid::Uuid;

use caisse_core::protocol::TicketPayload;
use caisse_core::reconciliation::day_bounds_utc;
use caisse_core::{Money, Versement};

use crate::error::ApiError;

// =============================================================================
// Apply Outcome
// =============================================================================

/// Result of merging one incoming ticket into the ledger.
///
/// An explicit type instead of a try/catch-and-continue loop: the ingest
/// service aggregates these into the batch accounting, and logs can tell
/// a genuine overwrite from an idempotent no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// No ledger row existed for this id; inserted fresh.
    Inserted,
    /// Incoming `created_at` was strictly newer; mutable fields overwritten.
    Overwritten,
    /// Incoming `created_at` not newer; nothing changed (duplicate or
    /// late delivery, resolved silently).
    Unchanged,
}

// =============================================================================
// Ledger Database
// =============================================================================

/// Central ledger connection pool.
#[derive(Clone)]
pub struct LedgerDb {
    pool: SqlitePool,
}

impl LedgerDb {
    /// Connect to the ledger database and run migrations.
    pub async fn connect(url: &str) -> Result<Self, ApiError> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| ApiError::Database(e.to_string()))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true);

        // A shared in-memory database only exists per-connection; keep the
        // pool at one connection so tests see a single schema.
        let max_connections = if url.contains(":memory:") { 1 } else { 10 };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .map_err(|e| ApiError::Database(e.to_string()))?;

        sqlx::migrate!("../../migrations/ledger")
            .run(&pool)
            .await
            .map_err(|e| ApiError::Migration(e.to_string()))?;

        info!("Ledger database ready");
        Ok(LedgerDb { pool })
    }

    /// Raw pool access.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Lightweight liveness check for the health endpoint.
    pub async fn ping(&self) -> Result<(), ApiError> {
        sqlx::query_scalar::<_, i64>("SELECT 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(())
    }

    // =========================================================================
    // Reference Data
    // =========================================================================
    // Reference data is owned by external management surfaces; these
    // writers exist for provisioning and tests only.

    pub async fn insert_site(&self, id: &str, name: &str) -> Result<(), ApiError> {
        sqlx::query("INSERT INTO sites (id, name) VALUES (?1, ?2)")
            .bind(id)
            .bind(name)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn insert_staff(&self, id: &str, site_id: &str, name: &str) -> Result<(), ApiError> {
        sqlx::query("INSERT INTO staff (id, site_id, name) VALUES (?1, ?2, ?3)")
            .bind(id)
            .bind(site_id)
            .bind(name)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn insert_sale_type(
        &self,
        id: &str,
        site_id: &str,
        name: &str,
    ) -> Result<(), ApiError> {
        sqlx::query("INSERT INTO sale_types (id, site_id, name) VALUES (?1, ?2, ?3)")
            .bind(id)
            .bind(site_id)
            .bind(name)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn site_exists(&self, id: &str) -> Result<bool, ApiError> {
        self.exists("sites", id).await
    }

    /// Checks that all three references of a ticket payload exist.
    /// Returns the name of the first missing reference, if any.
    pub async fn missing_reference(
        &self,
        payload: &TicketPayload,
    ) -> Result<Option<&'static str>, ApiError> {
        if !self.exists("sites", &payload.site_id).await? {
            return Ok(Some("siteId"));
        }
        if !self.exists("staff", &payload.staff_id).await? {
            return Ok(Some("staffId"));
        }
        if !self.exists("sale_types", &payload.type_id).await? {
            return Ok(Some("typeId"));
        }
        Ok(None)
    }

    async fn exists(&self, table: &str, id: &str) -> Result<bool, ApiError> {
        // `table` is always a literal from this file, never user input.
        let sql = format!("SELECT COUNT(*) FROM {table} WHERE id = ?1");
        let count: i64 = sqlx::query_scalar(&sql)
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count > 0)
    }

    /// Staff site lookup, used when saving a versement.
    pub async fn staff_site(&self, staff_id: &str) -> Result<Option<String>, ApiError> {
        let site: Option<String> = sqlx::query_scalar("SELECT site_id FROM staff WHERE id = ?1")
            .bind(staff_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(site)
    }

    /// All staff members at a site, for the reconciliation summary.
    pub async fn staff_at_site(&self, site_id: &str) -> Result<Vec<(String, String)>, ApiError> {
        let rows: Vec<(String, String)> =
            sqlx::query_as("SELECT id, name FROM staff WHERE site_id = ?1 ORDER BY name")
                .bind(site_id)
                .fetch_all(&self.pool)
                .await?;
        Ok(rows)
    }

    // =========================================================================
    // Ticket Ingestion
    // =========================================================================

    /// Merges one ticket into the ledger: insert, last-write-wins
    /// overwrite, or no-op.
    ///
    /// The lookup-compare-write runs inside a single transaction, so two
    /// concurrent batches retrying the same id cannot interleave between
    /// the read and the write.
    pub async fn apply_ticket(&self, payload: &TicketPayload) -> Result<ApplyOutcome, ApiError> {
        let mut tx = self.pool.begin().await?;

        let existing: Option<DateTime<Utc>> =
            sqlx::query_scalar("SELECT created_at FROM tickets WHERE id = ?1")
                .bind(&payload.id)
                .fetch_optional(&mut *tx)
                .await?;

        let now = Utc::now();
        let outcome = match existing {
            None => {
                sqlx::query(
                    r#"
                    INSERT INTO tickets (
                        id, type_id, staff_id, site_id, price,
                        created_at, synced_at, device_id
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                    "#,
                )
                .bind(&payload.id)
                .bind(&payload.type_id)
                .bind(&payload.staff_id)
                .bind(&payload.site_id)
                .bind(payload.price)
                .bind(payload.created_at)
                .bind(now)
                .bind(&payload.device_id)
                .execute(&mut *tx)
                .await?;
                ApplyOutcome::Inserted
            }

            // Strictly newer client timestamp wins; equal or older is a
            // duplicate/late delivery and must not be misclassified as
            // new data.
            Some(stored) if payload.created_at > stored => {
                sqlx::query(
                    r#"
                    UPDATE tickets SET
                        price = ?2,
                        type_id = ?3,
                        created_at = ?4,
                        synced_at = ?5
                    WHERE id = ?1
                    "#,
                )
                .bind(&payload.id)
                .bind(payload.price)
                .bind(&payload.type_id)
                .bind(payload.created_at)
                .bind(now)
                .execute(&mut *tx)
                .await?;
                ApplyOutcome::Overwritten
            }

            Some(_) => ApplyOutcome::Unchanged,
        };

        tx.commit().await?;
        debug!(id = %payload.id, ?outcome, "Applied ticket");
        Ok(outcome)
    }

    /// Fetches one ledger ticket as its wire payload plus ingestion time.
    pub async fn get_ticket(
        &self,
        id: &str,
    ) -> Result<Option<(TicketPayload, DateTime<Utc>)>, ApiError> {
        #[derive(sqlx::FromRow)]
        struct Row {
            id: String,
            type_id: String,
            staff_id: String,
            site_id: String,
            price: Money,
            created_at: DateTime<Utc>,
            synced_at: DateTime<Utc>,
            device_id: String,
        }

        let row = sqlx::query_as::<_, Row>(
            r#"
            SELECT id, type_id, staff_id, site_id, price,
                   created_at, synced_at, device_id
            FROM tickets
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| {
            (
                TicketPayload {
                    id: r.id,
                    type_id: r.type_id,
                    staff_id: r.staff_id,
                    site_id: r.site_id,
                    price: r.price,
                    created_at: r.created_at,
                    device_id: r.device_id,
                },
                r.synced_at,
            )
        }))
    }

    /// Total ticket count, for assertions and diagnostics.
    pub async fn ticket_count(&self) -> Result<i64, ApiError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tickets")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    // =========================================================================
    // Reconciliation Queries
    // =========================================================================

    /// Theoretical revenue and ticket count for one staff member over a
    /// UTC datetime range.
    pub async fn theoretical_revenue(
        &self,
        staff_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<(Money, i64), ApiError> {
        let (sum, count): (i64, i64) = sqlx::query_as(
            r#"
            SELECT COALESCE(SUM(price), 0), COUNT(*)
            FROM tickets
            WHERE staff_id = ?1 AND created_at >= ?2 AND created_at < ?3
            "#,
        )
        .bind(staff_id)
        .bind(from)
        .bind(to)
        .fetch_one(&self.pool)
        .await?;

        Ok((Money::from_cents(sum), count))
    }

    /// Theoretical revenue for a single business day (UTC midnight
    /// boundaries, the same helper that versement storage uses).
    pub async fn theoretical_for_day(
        &self,
        staff_id: &str,
        date: NaiveDate,
    ) -> Result<(Money, i64), ApiError> {
        let (from, to) = day_bounds_utc(date);
        self.theoretical_revenue(staff_id, from, to).await
    }

    /// Upserts the single versement row for (staff, day).
    pub async fn upsert_versement(&self, v: &Versement) -> Result<(), ApiError> {
        sqlx::query(
            r#"
            INSERT INTO versements (
                id, staff_id, site_id, date,
                theoretical_amount, remitted_amount, variance,
                ticket_count, comment, created_at, validated_by
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            ON CONFLICT (staff_id, date) DO UPDATE SET
                site_id = excluded.site_id,
                theoretical_amount = excluded.theoretical_amount,
                remitted_amount = excluded.remitted_amount,
                variance = excluded.variance,
                ticket_count = excluded.ticket_count,
                comment = excluded.comment,
                created_at = excluded.created_at,
                validated_by = excluded.validated_by
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&v.staff_id)
        .bind(&v.site_id)
        .bind(v.date)
        .bind(v.theoretical_amount)
        .bind(v.remitted_amount)
        .bind(v.variance)
        .bind(v.ticket_count)
        .bind(&v.comment)
        .bind(v.created_at)
        .bind(&v.validated_by)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Fetches the versement for (staff, day), if reconciled.
    pub async fn get_versement(
        &self,
        staff_id: &str,
        date: NaiveDate,
    ) -> Result<Option<Versement>, ApiError> {
        let versement = sqlx::query_as::<_, Versement>(
            r#"
            SELECT staff_id, site_id, date,
                   theoretical_amount, remitted_amount, variance,
                   ticket_count, comment, created_at, validated_by
            FROM versements
            WHERE staff_id = ?1 AND date = ?2
            "#,
        )
        .bind(staff_id)
        .bind(date)
        .fetch_optional(&self.pool)
        .await?;
        Ok(versement)
    }

    /// Count of versement rows for (staff, day); the upsert invariant
    /// says this is always 0 or 1.
    pub async fn versement_count(
        &self,
        staff_id: &str,
        date: NaiveDate,
    ) -> Result<i64, ApiError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM versements WHERE staff_id = ?1 AND date = ?2")
                .bind(staff_id)
                .bind(date)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    /// Sum of remitted cash recorded for a staff member over an inclusive
    /// date range.
    pub async fn remitted_in_range(
        &self,
        staff_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Money, ApiError> {
        let sum: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(remitted_amount), 0)
            FROM versements
            WHERE staff_id = ?1 AND date >= ?2 AND date <= ?3
            "#,
        )
        .bind(staff_id)
        .bind(from)
        .bind(to)
        .fetch_one(&self.pool)
        .await?;
        Ok(Money::from_cents(sum))
    }
}
