//! # caisse-db: Terminal Database Layer
//!
//! Durable, crash-safe persistence of tickets on the terminal, independent
//! of connectivity. This crate owns every SQL statement that touches the
//! terminal-local SQLite file.
//!
//! ## Layers
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │   Sale entry / Sync agent                                               │
//! │        │                                                                │
//! │        ▼                                                                │
//! │   Database (pool.rs) ── WAL SQLite pool + embedded migrations           │
//! │        │                                                                │
//! │        ▼                                                                │
//! │   TicketRepository (repository/ticket.rs) ── the Local Ticket Store     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A sale is acknowledged to the cashier only after `enqueue` returns
//! `Ok`; storage failure propagates and the sale is not recorded.

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use repository::ticket::TicketRepository;
