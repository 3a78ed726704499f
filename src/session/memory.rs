//! In-memory session provider backed by a token table.
//!
//! Used by the test suite and by local development without a running
//! identity provider. Tokens are read from the session cookie or a bearer
//! `Authorization` header, the same surfaces the HTTP provider forwards.

use async_trait::async_trait;
use axum::http::{header::AUTHORIZATION, HeaderMap};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

use super::{ProviderError, SessionContext, SessionProvider};

pub const SESSION_COOKIE_NAME: &str = "orgspace_session";

#[derive(Debug, Default)]
pub struct MemorySessionProvider {
    sessions: RwLock<HashMap<String, SessionContext>>,
    failing: AtomicBool,
}

impl MemorySessionProvider {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a token for `context`; requests presenting it are that user.
    pub async fn insert(&self, token: &str, context: SessionContext) {
        self.sessions
            .write()
            .await
            .insert(token.to_string(), context);
    }

    pub async fn remove(&self, token: &str) {
        self.sessions.write().await.remove(token);
    }

    /// Makes every lookup fail, to exercise the pipeline's fail-open path.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl SessionProvider for MemorySessionProvider {
    async fn get_session(
        &self,
        headers: &HeaderMap,
    ) -> Result<Option<SessionContext>, ProviderError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(ProviderError::Unavailable("session table offline"));
        }
        let Some(token) = extract_session_token(headers) else {
            return Ok(None);
        };
        Ok(self.sessions.read().await.get(&token).cloned())
    }
}

fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    if let Some(token) = extract_bearer_token(headers) {
        return Some(token);
    }
    let header = headers.get(axum::http::header::COOKIE)?;
    let value = header.to_str().ok()?;
    for pair in value.split(';') {
        let trimmed = pair.trim();
        let mut parts = trimmed.splitn(2, '=');
        let key = parts.next()?.trim();
        let val = parts.next()?.trim();
        if key == SESSION_COOKIE_NAME {
            return Some(val.to_string());
        }
    }
    None
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let trimmed = value.trim();
    let token = trimmed
        .strip_prefix("Bearer ")
        .or_else(|| trimmed.strip_prefix("bearer "))?
        .trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{AuthUser, Session, UserRole};
    use uuid::Uuid;

    fn context(token: &str) -> SessionContext {
        let user_id = Uuid::new_v4();
        SessionContext {
            session: Session {
                token: token.to_string(),
                user_id,
                expires_at: "2026-01-01T00:00:00Z".to_string(),
            },
            user: AuthUser {
                id: user_id,
                name: Some("Alice".to_string()),
                email: "alice@example.com".to_string(),
                role: UserRole::User,
                banned: false,
            },
        }
    }

    fn cookie_headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(axum::http::header::COOKIE, value.parse().unwrap());
        headers
    }

    #[tokio::test]
    async fn resolves_cookie_token() {
        let provider = MemorySessionProvider::new();
        provider.insert("tok-1", context("tok-1")).await;

        let headers = cookie_headers("orgspace_session=tok-1");
        let resolved = provider.get_session(&headers).await.unwrap();
        assert_eq!(
            resolved.map(|ctx| ctx.user.email),
            Some("alice@example.com".to_string())
        );
    }

    #[tokio::test]
    async fn resolves_bearer_token_and_ignores_unknown_cookie() {
        let provider = MemorySessionProvider::new();
        provider.insert("tok-2", context("tok-2")).await;

        let mut headers = cookie_headers("other=nope");
        headers.insert(AUTHORIZATION, "Bearer tok-2".parse().unwrap());
        assert!(provider.get_session(&headers).await.unwrap().is_some());

        let headers = cookie_headers("orgspace_session=missing");
        assert!(provider.get_session(&headers).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn failing_provider_returns_an_error() {
        let provider = MemorySessionProvider::new();
        provider.set_failing(true);
        let headers = HeaderMap::new();
        assert!(provider.get_session(&headers).await.is_err());
    }
}
