//! # Ticket Uplink
//!
//! The seam between the sync agent and the central ledger. The agent is
//! generic over [`Uplink`] so tests can script responses; production uses
//! [`HttpUplink`], a thin reqwest client for `POST /tickets/sync`.
//!
//! The bearer token is an opaque string obtained from the authentication
//! collaborator; the uplink attaches it and never interprets it.

use std::future::Future;

use tracing::debug;

use caisse_core::protocol::{SyncBatchRequest, SyncBatchResponse};

use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};

// =============================================================================
// Uplink Trait
// =============================================================================

/// Pushes a ticket batch to the central ledger.
///
/// A returned error is always transport-level ("nothing was sent" as far
/// as local state is concerned); per-ticket rejections travel inside the
/// successful response's accounting.
pub trait Uplink: Send + Sync {
    /// Uploads one batch and returns the server's accounting.
    fn push_batch(
        &self,
        batch: SyncBatchRequest,
    ) -> impl Future<Output = SyncResult<SyncBatchResponse>> + Send;
}

// =============================================================================
// HTTP Uplink
// =============================================================================

/// Production uplink: JSON POST over HTTP with a bearer token.
#[derive(Debug, Clone)]
pub struct HttpUplink {
    client: reqwest::Client,
    sync_url: String,
    token: String,
}

impl HttpUplink {
    /// Builds the uplink from configuration plus the opaque credential.
    pub fn new(config: &SyncConfig, token: impl Into<String>) -> SyncResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout())
            .build()
            .map_err(|e| SyncError::Transport(e.to_string()))?;

        Ok(HttpUplink {
            client,
            sync_url: format!(
                "{}/tickets/sync",
                config.sync.base_url.trim_end_matches('/')
            ),
            token: token.into(),
        })
    }
}

impl Uplink for HttpUplink {
    fn push_batch(
        &self,
        batch: SyncBatchRequest,
    ) -> impl Future<Output = SyncResult<SyncBatchResponse>> + Send {
        async move {
            debug!(count = batch.tickets.len(), url = %self.sync_url, "Uploading batch");

            let response = self
                .client
                .post(&self.sync_url)
                .bearer_auth(&self.token)
                .json(&batch)
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                // 4xx/5xx without a parseable accounting body: the batch
                // counts as unsent and will be retried wholesale.
                let body = response.text().await.unwrap_or_default();
                return Err(SyncError::UnexpectedStatus {
                    status: status.as_u16(),
                    body,
                });
            }

            let accounting: SyncBatchResponse = response
                .json()
                .await
                .map_err(|e| SyncError::InvalidResponse(e.to_string()))?;

            debug!(
                inserted = accounting.inserted,
                updated = accounting.updated,
                errors = accounting.errors,
                "Batch accepted"
            );

            Ok(accounting)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sync_url_joins_without_double_slash() {
        let mut config = SyncConfig::default();
        config.sync.base_url = "http://ledger:8080/".into();
        let uplink = HttpUplink::new(&config, "token").unwrap();
        assert_eq!(uplink.sync_url, "http://ledger:8080/tickets/sync");
    }

    #[tokio::test]
    async fn refused_connection_is_a_transport_error() {
        let mut config = SyncConfig::default();
        config.sync.base_url = "http://127.0.0.1:1".into();
        config.sync.http_timeout_secs = 1;
        let uplink = HttpUplink::new(&config, "token").unwrap();

        let err = uplink
            .push_batch(SyncBatchRequest { tickets: vec![] })
            .await
            .unwrap_err();
        assert!(err.is_transport());
    }
}
