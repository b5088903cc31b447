//! # Wire Protocol
//!
//! JSON DTOs shared by the terminal sync engine and the central ledger.
//!
//! ## Batch Upload Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Sync Batch Round-Trip                                │
//! │                                                                         │
//! │  Terminal                                Central service                │
//! │  ────────                                ───────────────                │
//! │  SyncBatchRequest                                                       │
//! │  { tickets: [                                                           │
//! │      { id, typeId, staffId,      POST /tickets/sync                     │
//! │        siteId, price,         ─────────────────────►  per-ticket        │
//! │        createdAt, deviceId }                          insert / LWW /    │
//! │  ] }                                                  no-op / reject    │
//! │                                                                         │
//! │  SyncBatchResponse                                                      │
//! │  { totalReceived, inserted,   ◄─────────────────────                    │
//! │    updated, errors,                                                     │
//! │    failedTicketIds }                                                    │
//! │                                                                         │
//! │  mark synced: everything not in failedTicketIds                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All field names are camelCase on the wire; `price` and the amount
//! fields are integer cents; timestamps are RFC 3339.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::types::Ticket;

// =============================================================================
// Ticket Upload
// =============================================================================

/// A single ticket as sent to the sync endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketPayload {
    /// Client-generated idempotency key.
    pub id: String,
    pub type_id: String,
    pub staff_id: String,
    pub site_id: String,
    /// Price in cents.
    pub price: Money,
    /// Sale timestamp from the terminal clock; the LWW tiebreaker.
    pub created_at: DateTime<Utc>,
    /// Originating terminal, for audit only.
    pub device_id: String,
}

impl From<&Ticket> for TicketPayload {
    fn from(ticket: &Ticket) -> Self {
        TicketPayload {
            id: ticket.id.clone(),
            type_id: ticket.type_id.clone(),
            staff_id: ticket.staff_id.clone(),
            site_id: ticket.site_id.clone(),
            price: ticket.price,
            created_at: ticket.created_at,
            device_id: ticket.device_id.clone(),
        }
    }
}

/// Request body of `POST /tickets/sync`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncBatchRequest {
    pub tickets: Vec<TicketPayload>,
}

/// Response body of `POST /tickets/sync`.
///
/// `inserted + updated + errors == total_received` always holds;
/// idempotent no-ops are counted under `updated` so a retried batch
/// reads as fully handled.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncBatchResponse {
    pub total_received: usize,
    pub inserted: usize,
    pub updated: usize,
    pub errors: usize,
    pub failed_ticket_ids: Vec<String>,
}

impl SyncBatchResponse {
    /// True when a given ticket id was rejected by the server.
    pub fn is_failed(&self, id: &str) -> bool {
        self.failed_ticket_ids.iter().any(|f| f == id)
    }
}

// =============================================================================
// Reconciliation
// =============================================================================

/// Request body of `POST /reconciliation/versement`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersementRequest {
    pub staff_id: String,
    /// Business day (UTC), `YYYY-MM-DD`.
    pub date: NaiveDate,
    /// Cash actually handed in, in cents.
    pub remitted_amount: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// One per-staff row of `GET /reconciliation/summary`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffSummaryRow {
    pub staff_id: String,
    pub staff_name: String,
    pub ticket_count: i64,
    pub theoretical_amount: Money,
    pub remitted_amount: Money,
    pub variance: Money,
    /// `variance / theoretical * 100`; zero when theoretical is zero.
    pub variance_pct: f64,
    /// Set when `|variance_pct|` exceeds the configured threshold.
    pub alert: bool,
}

/// Response body of `GET /reconciliation/summary`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteSummary {
    pub site_id: String,
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    pub rows: Vec<StaffSummaryRow>,
}
