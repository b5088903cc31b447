//! # Domain Types
//!
//! Core domain types for the sync subsystem.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │     Ticket      │   │   NewTicket     │   │   SyncStatus    │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  type_id        │   │  Pending        │       │
//! │  │  price (cents)  │   │  staff_id       │   │  Synced         │       │
//! │  │  sync_status    │   │  site_id        │   │  Error          │       │
//! │  │  attempts       │   │  price          │   └─────────────────┘       │
//! │  └─────────────────┘   └─────────────────┘                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity
//! A ticket's `id` is a UUID v4 generated **by the terminal** at sale time.
//! It is the idempotency key for the whole sync pipeline: the central
//! ledger deduplicates on it, so retried deliveries can never double-count
//! a sale.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::money::Money;

// =============================================================================
// Sync Status
// =============================================================================

/// Local synchronization state of a ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    /// Recorded locally, not yet accepted by the central ledger.
    Pending,
    /// Accepted by the central ledger; `synced_at` is set.
    Synced,
    /// Quarantined after exceeding the configured retry limit.
    /// Returns to `Pending` via an explicit requeue, never silently.
    Error,
}

impl std::fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncStatus::Pending => write!(f, "pending"),
            SyncStatus::Synced => write!(f, "synced"),
            SyncStatus::Error => write!(f, "error"),
        }
    }
}

// =============================================================================
// Ticket
// =============================================================================

/// A single recorded sale, immutable once created.
///
/// The sync subsystem never deletes tickets; `sync_status` is the only
/// locally mutable aspect, and the central ledger only ever overwrites a
/// ticket through the last-write-wins rule keyed on `created_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Ticket {
    /// Unique identifier (UUID v4), generated by the terminal.
    pub id: String,

    /// Sale type reference (owned externally).
    pub type_id: String,

    /// Staff member who recorded the sale.
    pub staff_id: String,

    /// Site the sale belongs to.
    pub site_id: String,

    /// Price at time of sale, in cents.
    pub price: Money,

    /// Sale timestamp, set by the terminal's clock.
    pub created_at: DateTime<Utc>,

    /// Set by the server upon successful ingestion.
    pub synced_at: Option<DateTime<Utc>>,

    /// Local synchronization state.
    pub sync_status: SyncStatus,

    /// Originating terminal, for audit only.
    pub device_id: String,

    /// Number of failed delivery attempts reported by the server.
    pub attempts: i64,

    /// Last server-reported error for this ticket, if any.
    pub last_error: Option<String>,
}

// =============================================================================
// New Ticket
// =============================================================================

/// Input for recording a sale on the terminal.
///
/// The store assigns the id, the creation timestamp, and the initial
/// `Pending` status; callers only supply what the cashier entered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTicket {
    /// Sale type reference.
    pub type_id: String,

    /// Staff member recording the sale.
    pub staff_id: String,

    /// Site of the sale.
    pub site_id: String,

    /// Price in cents.
    pub price: Money,
}

impl NewTicket {
    /// Materializes a full `Pending` ticket for the given terminal.
    pub fn into_ticket(self, device_id: &str, now: DateTime<Utc>) -> Ticket {
        Ticket {
            id: Uuid::new_v4().to_string(),
            type_id: self.type_id,
            staff_id: self.staff_id,
            site_id: self.site_id,
            price: self.price,
            created_at: now,
            synced_at: None,
            sync_status: SyncStatus::Pending,
            device_id: device_id.to_string(),
            attempts: 0,
            last_error: None,
        }
    }
}
