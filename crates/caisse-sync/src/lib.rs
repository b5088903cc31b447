//! # caisse-sync: Terminal Sync Engine
//!
//! Background synchronization of locally recorded tickets to the central
//! ledger.
//!
//! ## Components
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Terminal Sync Engine                                │
//! │                                                                         │
//! │  ┌───────────────────┐   watch<bool>   ┌───────────────────────────┐   │
//! │  │ConnectivityProber │ ──────────────► │        SyncAgent          │   │
//! │  │ GET /health, 30s  │    online?      │  interval + manual passes │   │
//! │  └───────────────────┘                 │  overlap = no-op          │   │
//! │                                        └──────────┬────────────────┘   │
//! │                                                   │                    │
//! │  ┌───────────────────┐   list_unsynced /          │ POST /tickets/sync │
//! │  │   caisse-db       │ ◄────────────── mark_* ────┤  (HttpUplink)      │
//! │  │  (ticket store)   │                            ▼                    │
//! │  └───────────────────┘                    central ledger               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Data flows one way: store → agent → endpoint. The agent never learns
//! anything from the server except the per-batch accounting it uses to
//! flip local sync status.

pub mod agent;
pub mod config;
pub mod error;
pub mod prober;
pub mod uplink;

pub use agent::{AgentStatus, SyncAgent, SyncAgentHandle};
pub use config::SyncConfig;
pub use error::{SyncError, SyncResult};
pub use prober::{ConnectivityProber, ProberHandle};
pub use uplink::{HttpUplink, Uplink};
