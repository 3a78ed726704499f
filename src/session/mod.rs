//! Session contract consumed from the external identity provider.
//!
//! Credential verification, password hashing, and session issuance all
//! belong to the provider; this service only asks "who is calling?" and
//! reads the answer. Sessions are opaque and never mutated here.
//!
//! ## Fail-open policy
//!
//! A provider fault is downgraded to "no session" instead of failing the
//! request: anonymity is always a safe degraded state, and tenant-gated
//! content stays protected by the access decision downstream. Provider
//! unavailability must never turn into a 500 for the whole pipeline.

use async_trait::async_trait;
use axum::http::HeaderMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub mod http;
pub mod memory;

pub use self::http::HttpSessionProvider;
pub use self::memory::MemorySessionProvider;

/// Session record as issued by the identity provider.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub token: String,
    pub user_id: Uuid,
    pub expires_at: String,
}

/// User record as the identity provider reports it.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
    pub id: Uuid,
    pub name: Option<String>,
    pub email: String,
    #[serde(default)]
    pub role: UserRole,
    #[serde(default)]
    pub banned: bool,
}

/// Platform-wide role, distinct from per-organization membership roles.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    User,
    Admin,
}

impl UserRole {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }
}

/// Session/user pair returned for an authenticated caller.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct SessionContext {
    pub session: Session,
    pub user: AuthUser,
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("identity provider request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("identity provider returned {0}")]
    Status(reqwest::StatusCode),
    #[error("invalid session payload: {0}")]
    Payload(#[from] serde_json::Error),
    #[error("identity provider unavailable: {0}")]
    Unavailable(&'static str),
}

/// Resolves the caller's session from request headers.
///
/// Implementations must treat a missing or invalid session as `Ok(None)`;
/// `Err` is reserved for the provider itself failing.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    async fn get_session(
        &self,
        headers: &HeaderMap,
    ) -> Result<Option<SessionContext>, ProviderError>;
}
