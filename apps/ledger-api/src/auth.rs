//! Bearer-token authentication.
//!
//! The sync subsystem treats credentials as opaque strings issued by an
//! external authentication collaborator. This module only extracts the
//! token and asks an injected [`TokenStore`] whether it is currently
//! valid; issuance, refresh, and revocation live elsewhere. There is
//! deliberately no process-global token map.

use std::collections::HashSet;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;

use crate::error::ApiError;
use crate::AppState;

// =============================================================================
// Token Store
// =============================================================================

/// Validates opaque bearer tokens.
///
/// Implemented over whatever persisted session store the deployment
/// uses; the bundled [`StaticTokenStore`] covers dev and tests.
pub trait TokenStore: Send + Sync {
    /// Returns true when the token is currently valid.
    fn is_valid(&self, token: &str) -> bool;
}

/// Fixed token set from configuration.
pub struct StaticTokenStore {
    tokens: HashSet<String>,
}

impl StaticTokenStore {
    pub fn new(tokens: impl IntoIterator<Item = String>) -> Self {
        StaticTokenStore {
            tokens: tokens.into_iter().collect(),
        }
    }
}

impl TokenStore for StaticTokenStore {
    fn is_valid(&self, token: &str) -> bool {
        self.tokens.contains(token)
    }
}

// =============================================================================
// Middleware
// =============================================================================

/// Extracts the token from an `Authorization: Bearer ...` header value.
pub fn extract_bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// axum middleware guarding the authenticated routes.
pub async fn require_bearer(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header = request
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::AuthFailed("Missing authorization header".into()))?;

    let token = extract_bearer_token(header)
        .ok_or_else(|| ApiError::AuthFailed("Invalid authorization header".into()))?;

    if !state.tokens.is_valid(token) {
        return Err(ApiError::AuthFailed("Unknown token".into()));
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_token_from_header() {
        assert_eq!(extract_bearer_token("Bearer abc123"), Some("abc123"));
        assert_eq!(extract_bearer_token("Bearer "), None);
        assert_eq!(extract_bearer_token("Basic abc123"), None);
    }

    #[test]
    fn static_store_checks_membership() {
        let store = StaticTokenStore::new(["good".to_string()]);
        assert!(store.is_valid("good"));
        assert!(!store.is_valid("bad"));
    }
}
