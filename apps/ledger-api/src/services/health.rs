//! Liveness check, also the target of terminal connectivity probes.

use serde::Serialize;

use crate::error::ApiError;
use crate::AppState;

/// Body of `GET /health`.
#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub database: &'static str,
}

/// Pings the ledger database; a terminal treats any non-2xx answer as
/// being offline.
pub async fn check(state: &AppState) -> Result<HealthStatus, ApiError> {
    state.db.ping().await?;
    Ok(HealthStatus {
        status: "ok",
        database: "up",
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testutil::seeded_state;

    #[tokio::test]
    async fn healthy_when_database_answers() {
        let state = seeded_state().await;
        let status = check(&state).await.unwrap();
        assert_eq!(status.status, "ok");
        assert_eq!(status.database, "up");
    }
}
