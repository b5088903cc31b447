//! Ledger API services.
//!
//! Each service is a set of async functions over [`AppState`]; the route
//! handlers in `routes` stay thin and delegate here.

pub mod health;
pub mod ingest;
pub mod reconciliation;
