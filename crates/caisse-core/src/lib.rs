//! # caisse-core: Pure Business Logic for Caisse
//!
//! This crate is the heart of the Caisse sync and reconciliation system.
//! It contains the domain types and business rules as pure code with zero
//! I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Caisse Architecture                              │
//! │                                                                         │
//! │  Terminal side                         Central side                     │
//! │  ┌──────────────┐                      ┌──────────────────┐            │
//! │  │  caisse-db   │  HTTP batch upload   │   ledger-api     │            │
//! │  │ (ticket      │ ──────────────────►  │ (sync endpoint + │            │
//! │  │  store)      │   via caisse-sync    │  reconciliation) │            │
//! │  └──────┬───────┘                      └────────┬─────────┘            │
//! │         │                                       │                       │
//! │  ┌──────▼───────────────────────────────────────▼─────────┐            │
//! │  │               ★ caisse-core (THIS CRATE) ★             │            │
//! │  │                                                        │            │
//! │  │  ┌─────────┐ ┌─────────┐ ┌──────────┐ ┌─────────────┐ │            │
//! │  │  │  types  │ │  money  │ │ protocol │ │reconciliation│ │            │
//! │  │  │ Ticket  │ │  Money  │ │ wire DTOs│ │  variance    │ │            │
//! │  │  └─────────┘ └─────────┘ └──────────┘ └─────────────┘ │            │
//! │  │                                                        │            │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS  │            │
//! │  └────────────────────────────────────────────────────────┘            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Ticket, SyncStatus, NewTicket)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`protocol`] - Wire DTOs shared by terminal and central service
//! - [`reconciliation`] - Versement and variance math
//! - [`validation`] - Ticket payload validation rules
//! - [`error`] - Domain error types
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in cents (i64)
//! 4. **Explicit Errors**: All errors are typed, never strings or panics

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod protocol;
pub mod reconciliation;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::ValidationError;
pub use money::Money;
pub use reconciliation::{variance, variance_pct, Versement};
pub use types::{NewTicket, SyncStatus, Ticket};
pub use validation::validate_ticket_payload;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Default variance alert threshold in percent.
///
/// A reconciliation row is flagged when `|variance / theoretical| * 100`
/// exceeds this value. Deployments override it via server configuration.
pub const DEFAULT_VARIANCE_ALERT_PCT: f64 = 5.0;
