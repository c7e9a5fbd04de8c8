//! HTTP Basic auth. The credential store itself is out of scope for this
//! gateway — callers inject whatever backend they have (a config file, an
//! external user directory) behind [`CredentialStore`].

use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

#[async_trait::async_trait]
pub trait CredentialStore: Send + Sync {
    async fn check(&self, username: &str, password: &str) -> bool;
}

/// A store that accepts exactly one configured username/password pair —
/// enough for a single-subscriber deployment and for tests.
pub struct StaticCredentialStore {
    pub username: String,
    pub password: String,
}

#[async_trait::async_trait]
impl CredentialStore for StaticCredentialStore {
    async fn check(&self, username: &str, password: &str) -> bool {
        username == self.username && password == self.password
    }
}

fn decode_basic(header_value: &str) -> Option<(String, String)> {
    let encoded = header_value.strip_prefix("Basic ")?;
    let decoded = STANDARD.decode(encoded).ok()?;
    let text = String::from_utf8(decoded).ok()?;
    let (user, pass) = text.split_once(':')?;
    Some((user.to_string(), pass.to_string()))
}

pub async fn require_basic_auth(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header = request
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(ApiError::Unauthorized)?;
    let (user, pass) = decode_basic(header).ok_or(ApiError::Unauthorized)?;
    if !state.credentials.check(&user, &pass).await {
        return Err(ApiError::Unauthorized);
    }
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn static_store_accepts_configured_pair() {
        let store = StaticCredentialStore {
            username: "nexus".to_string(),
            password: "secret".to_string(),
        };
        assert!(store.check("nexus", "secret").await);
        assert!(!store.check("nexus", "wrong").await);
    }

    #[test]
    fn decodes_well_formed_basic_header() {
        let header = format!("Basic {}", STANDARD.encode("alice:wonderland"));
        let (user, pass) = decode_basic(&header).unwrap();
        assert_eq!(user, "alice");
        assert_eq!(pass, "wonderland");
    }

    #[test]
    fn rejects_missing_basic_prefix() {
        assert!(decode_basic("Bearer xyz").is_none());
    }
}
