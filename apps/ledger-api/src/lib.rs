//! # Caisse Ledger API
//!
//! REST server for the central ledger: idempotent ticket ingestion and
//! cash reconciliation.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Ledger API Services                             │
//! │                                                                         │
//! │  ┌─────────────────────┐  ┌──────────────────────────────────────────┐ │
//! │  │   Ticket Ingest     │  │        Reconciliation Engine             │ │
//! │  │                     │  │                                          │ │
//! │  │ POST /tickets/sync  │  │ POST /reconciliation/versement           │ │
//! │  │ per-ticket insert / │  │ GET  /reconciliation/summary             │ │
//! │  │ LWW update / no-op  │  │ theoretical vs remitted, variance        │ │
//! │  └─────────────────────┘  └──────────────────────────────────────────┘ │
//! │                                                                         │
//! │  ┌─────────────────────┐  ┌──────────────────────────────────────────┐ │
//! │  │      Health         │  │            Infrastructure                │ │
//! │  │  GET /health        │  │  SQLite (sqlx) • Bearer TokenStore •     │ │
//! │  │  (prober target)    │  │  tracing + TraceLayer                    │ │
//! │  └─────────────────────┘  └──────────────────────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! Environment variables:
//! - `LEDGER_PORT` - HTTP port (default: 8080)
//! - `LEDGER_DATABASE_URL` - SQLite path (default: ./ledger.db)
//! - `LEDGER_API_TOKENS` - comma-separated accepted bearer tokens
//! - `LEDGER_BATCH_SIZE_LIMIT` - max tickets per sync batch (default: 1000)
//! - `LEDGER_VARIANCE_ALERT_PCT` - alert threshold (default: 5.0)

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod routes;
pub mod services;

use std::sync::Arc;

pub use config::LedgerConfig;
pub use db::LedgerDb;
pub use error::ApiError;

use auth::TokenStore;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub db: LedgerDb,
    pub config: Arc<LedgerConfig>,
    pub tokens: Arc<dyn TokenStore>,
}
