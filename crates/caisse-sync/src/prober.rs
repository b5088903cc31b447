//! # Connectivity Prober
//!
//! Answers "can we reach the central service right now?" without side
//! effects.
//!
//! ## Contract
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  • GET {base_url}/health on its own schedule (default every 30s)        │
//! │  • Bounded timeout (default 5s)                                         │
//! │  • ANY failure (timeout, DNS, refused, 5xx) == offline                  │
//! │  • Never returns an error to its caller                                 │
//! │  • Publishes the boolean through a watch channel; subscribers get       │
//! │    the change notification for free                                     │
//! │  • Read-only: never touches the ticket store                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The sync agent only ever *reads* the latest value; a slow or hung
//! probe can never block a sync pass or sale entry.

use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info};

use crate::config::SyncConfig;

/// Periodic reachability checker for the central service.
pub struct ConnectivityProber {
    client: reqwest::Client,
    health_url: String,
    interval: Duration,
    online_tx: watch::Sender<bool>,
    shutdown_rx: mpsc::Receiver<()>,
}

/// Handle for observing and stopping a running prober.
#[derive(Clone)]
pub struct ProberHandle {
    online_rx: watch::Receiver<bool>,
    shutdown_tx: mpsc::Sender<()>,
}

impl ProberHandle {
    /// Last known connectivity state.
    pub fn is_online(&self) -> bool {
        *self.online_rx.borrow()
    }

    /// A receiver the sync agent (or UI) can watch for state flips.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.online_rx.clone()
    }

    /// Stops the prober loop.
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(()).await;
    }
}

impl ConnectivityProber {
    /// Creates a prober from the sync configuration.
    ///
    /// Starts pessimistic: the state is offline until the first probe
    /// succeeds, so a freshly booted terminal never fires a doomed batch.
    pub fn new(config: &SyncConfig) -> (Self, ProberHandle) {
        let client = reqwest::Client::builder()
            .timeout(config.probe_timeout())
            .build()
            .unwrap_or_default();

        let (online_tx, online_rx) = watch::channel(false);
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let prober = ConnectivityProber {
            client,
            health_url: format!("{}/health", config.sync.base_url.trim_end_matches('/')),
            interval: config.probe_interval(),
            online_tx,
            shutdown_rx,
        };

        let handle = ProberHandle {
            online_rx,
            shutdown_tx,
        };

        (prober, handle)
    }

    /// Runs the probe loop. Spawn as a background task.
    pub async fn run(mut self) {
        info!(url = %self.health_url, "Connectivity prober starting");

        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let online = self.probe().await;
                    // send_if_modified keeps the watch channel quiet unless
                    // the state actually flips.
                    let flipped = self.online_tx.send_if_modified(|current| {
                        if *current != online {
                            *current = online;
                            true
                        } else {
                            false
                        }
                    });
                    if flipped {
                        info!(online, "Connectivity state changed");
                    }
                }

                _ = self.shutdown_rx.recv() => {
                    info!("Connectivity prober shutting down");
                    break;
                }
            }
        }
    }

    /// One reachability check. Infallible by contract.
    async fn probe(&self) -> bool {
        match self.client.get(&self.health_url).send().await {
            Ok(resp) => {
                let ok = resp.status().is_success();
                debug!(status = resp.status().as_u16(), ok, "Health probe");
                ok
            }
            Err(e) => {
                debug!(error = %e, "Health probe failed, treating as offline");
                false
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SyncConfig;

    fn config(base_url: &str) -> SyncConfig {
        let mut config = SyncConfig::default();
        config.sync.base_url = base_url.to_string();
        config.sync.probe_timeout_secs = 1;
        config
    }

    #[tokio::test]
    async fn unreachable_host_reads_as_offline_not_error() {
        // Nothing listens on this port; connection is refused quickly.
        let (prober, _handle) = ConnectivityProber::new(&config("http://127.0.0.1:1"));
        assert!(!prober.probe().await);
    }

    #[tokio::test]
    async fn initial_state_is_offline() {
        let (_prober, handle) = ConnectivityProber::new(&config("http://127.0.0.1:1"));
        assert!(!handle.is_online());
    }

    #[tokio::test]
    async fn health_url_joins_without_double_slash() {
        let (prober, _handle) = ConnectivityProber::new(&config("http://ledger:8080/"));
        assert_eq!(prober.health_url, "http://ledger:8080/health");
    }
}
