//! # Sync Agent
//!
//! Orchestrates periodic and on-demand upload of pending tickets to the
//! central ledger.
//!
//! ## Pass Algorithm
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         One Sync Pass                                   │
//! │                                                                         │
//! │  1. Prober says offline?            ──► skip, no network attempted      │
//! │  2. list_unsynced(batch_size)                                           │
//! │  3. Empty batch?                    ──► done, no network call           │
//! │  4. POST batch with bearer token                                        │
//! │  5. Response parsed OK:                                                 │
//! │       ids NOT in failedTicketIds    ──► mark_synced (one transaction)   │
//! │       ids in failedTicketIds        ──► mark_failed (stay pending,      │
//! │                                         quarantine past retry limit)    │
//! │  6. Transport failure (timeout/refused/5xx):                            │
//! │       the WHOLE batch is unsent     ──► zero local mutation, next       │
//! │                                         tick retries                    │
//! │                                                                         │
//! │  Overlap: a try_lock makes a second trigger a no-op, never a wait.     │
//! │  Ordering: oldest-pending first, and a pass completes (or fails as    │
//! │  "nothing sent") before the next begins, so no ticket is marked        │
//! │  synced ahead of an older pending one from this terminal.              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, watch, Mutex, RwLock};
use tracing::{debug, error, info, warn};

use caisse_core::protocol::{SyncBatchRequest, TicketPayload};
use caisse_db::Database;

use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::uplink::Uplink;

// =============================================================================
// Agent Status
// =============================================================================

/// Snapshot of the agent's state, for the UI layer.
///
/// The UI only ever needs "online/offline" and the pending count; it
/// never sees conflict-resolution internals.
#[derive(Debug, Clone, Default)]
pub struct AgentStatus {
    /// Last known connectivity state.
    pub online: bool,

    /// Current local backlog.
    pub pending_count: i64,

    /// Completion time of the last successful pass that sent data.
    pub last_sync: Option<DateTime<Utc>>,

    /// Last pass-level error, if any.
    pub last_error: Option<String>,
}

/// What a single pass did. Returned to callers for observability and
/// deterministic tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PassOutcome {
    /// Prober reported offline; no network attempted.
    Offline,
    /// Nothing pending; no network call.
    NothingPending,
    /// Another pass was already running; this trigger was a no-op.
    AlreadyRunning,
    /// Batch delivered and accounted for.
    Sent { synced: usize, rejected: usize },
    /// No response at all; every ticket left untouched.
    TransportFailure,
}

// =============================================================================
// Sync Agent
// =============================================================================

/// Background sync engine for one terminal.
///
/// Generic over the [`Uplink`] so the network edge can be scripted in
/// tests.
pub struct SyncAgent<U: Uplink> {
    db: Arc<Database>,
    config: Arc<SyncConfig>,
    uplink: U,

    /// Latest connectivity state from the prober.
    online_rx: watch::Receiver<bool>,

    /// Shared snapshot for handles.
    status: Arc<RwLock<AgentStatus>>,

    /// Mutual exclusion between timer- and user-triggered passes.
    pass_lock: Mutex<()>,

    trigger_rx: mpsc::Receiver<()>,
    shutdown_rx: mpsc::Receiver<()>,
}

/// Handle for controlling a running agent from outside.
#[derive(Clone)]
pub struct SyncAgentHandle {
    trigger_tx: mpsc::Sender<()>,
    shutdown_tx: mpsc::Sender<()>,
    status: Arc<RwLock<AgentStatus>>,
}

impl SyncAgentHandle {
    /// Requests an immediate sync pass ("sync now"). Never blocks; if a
    /// pass is already queued or running this is a no-op.
    pub fn trigger_now(&self) {
        let _ = self.trigger_tx.try_send(());
    }

    /// Signals graceful shutdown. An in-flight pass is allowed to finish.
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(()).await;
    }

    /// Current status snapshot.
    pub async fn status(&self) -> AgentStatus {
        self.status.read().await.clone()
    }
}

impl<U: Uplink> SyncAgent<U> {
    /// Creates an agent and its control handle.
    ///
    /// `online_rx` is the prober's watch channel; tests inject their own.
    pub fn new(
        db: Arc<Database>,
        config: Arc<SyncConfig>,
        uplink: U,
        online_rx: watch::Receiver<bool>,
    ) -> (Self, SyncAgentHandle) {
        let (trigger_tx, trigger_rx) = mpsc::channel(1);
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        let status = Arc::new(RwLock::new(AgentStatus::default()));

        let agent = SyncAgent {
            db,
            config,
            uplink,
            online_rx,
            status: status.clone(),
            pass_lock: Mutex::new(()),
            trigger_rx,
            shutdown_rx,
        };

        let handle = SyncAgentHandle {
            trigger_tx,
            shutdown_tx,
            status,
        };

        (agent, handle)
    }

    /// Runs the agent loop: periodic passes, manual triggers, shutdown.
    ///
    /// Spawn as a background task. Because each pass runs inline in this
    /// loop, a shutdown signal received mid-pass takes effect after the
    /// pass completes; the pass itself never leaves partial local state.
    pub async fn run(mut self) {
        info!(
            device_id = %self.config.device.id,
            interval_secs = self.config.sync.interval_secs,
            batch_size = self.config.sync.batch_size,
            "Sync agent starting"
        );

        let mut interval = tokio::time::interval(self.config.interval());
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick fires immediately; skip it so startup does not
        // race the prober's first health check.
        interval.tick().await;

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.pass_and_log().await;
                }

                Some(()) = self.trigger_rx.recv() => {
                    debug!("Manual sync trigger");
                    self.pass_and_log().await;
                }

                _ = self.shutdown_rx.recv() => {
                    info!("Sync agent shutting down");
                    break;
                }
            }
        }

        info!("Sync agent stopped");
    }

    async fn pass_and_log(&self) {
        match self.run_pass().await {
            Ok(outcome) => debug!(?outcome, "Sync pass finished"),
            Err(e) => error!(error = %e, "Sync pass failed"),
        }
    }

    /// Executes one sync pass. Public so tests (and a "sync now" command
    /// wired without the loop) can drive passes deterministically.
    pub async fn run_pass(&self) -> SyncResult<PassOutcome> {
        // At most one pass at a time; concurrent triggers are no-ops.
        let Ok(_guard) = self.pass_lock.try_lock() else {
            debug!("Pass already running, skipping");
            return Ok(PassOutcome::AlreadyRunning);
        };

        if !*self.online_rx.borrow() {
            debug!("Offline, skipping pass");
            self.refresh_status(|s| s.online = false).await;
            return Ok(PassOutcome::Offline);
        }

        let tickets = self
            .db
            .tickets()
            .list_unsynced(self.config.sync.batch_size)
            .await?;

        if tickets.is_empty() {
            self.refresh_status(|s| {
                s.online = true;
                s.pending_count = 0;
            })
            .await;
            return Ok(PassOutcome::NothingPending);
        }

        let batch = SyncBatchRequest {
            tickets: tickets.iter().map(TicketPayload::from).collect(),
        };
        let count = batch.tickets.len();

        let response = match self.uplink.push_batch(batch).await {
            Ok(response) => response,
            Err(e) if e.is_transport() => {
                // Whole batch unsent: zero local mutation, retried next tick.
                warn!(error = %e, count, "Transport failure, batch left pending");
                self.refresh_status(|s| s.last_error = Some(e.to_string())).await;
                return Ok(PassOutcome::TransportFailure);
            }
            Err(e) => return Err(e),
        };

        // Local state changes only after a fully parsed successful
        // response.
        let mut synced_ids = Vec::with_capacity(count);
        let mut rejected = 0usize;

        for ticket in &tickets {
            if response.is_failed(&ticket.id) {
                rejected += 1;
                self.handle_rejection(&ticket.id).await?;
            } else {
                synced_ids.push(ticket.id.clone());
            }
        }

        self.db.tickets().mark_synced(&synced_ids).await?;

        let pending = self.db.tickets().count_pending().await?;
        self.refresh_status(|s| {
            s.online = true;
            s.pending_count = pending;
            s.last_sync = Some(Utc::now());
            s.last_error = None;
        })
        .await;

        info!(
            synced = synced_ids.len(),
            rejected,
            inserted = response.inserted,
            updated = response.updated,
            "Sync pass complete"
        );

        Ok(PassOutcome::Sent {
            synced: synced_ids.len(),
            rejected,
        })
    }

    /// Applies the retry policy to one server-rejected ticket.
    ///
    /// Default (`retry_limit = 0`) is unlimited retries: the ticket stays
    /// `Pending` forever rather than being silently dropped. With a
    /// configured limit, the ticket is quarantined to `Error` once the
    /// limit is reached and excluded from passes until requeued.
    async fn handle_rejection(&self, id: &str) -> SyncResult<()> {
        let attempts = self
            .db
            .tickets()
            .mark_failed(id, "rejected by sync endpoint")
            .await?;

        let limit = self.config.sync.retry_limit;
        if limit > 0 && attempts >= i64::from(limit) {
            warn!(id = %id, attempts, limit, "Retry limit reached, quarantining ticket");
            self.db.tickets().quarantine(id).await?;
        }

        Ok(())
    }

    async fn refresh_status(&self, apply: impl FnOnce(&mut AgentStatus)) {
        let mut status = self.status.write().await;
        apply(&mut status);
    }
}

// =============================================================================
// Tests
// =============================================================================
