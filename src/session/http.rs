//! HTTP-backed session provider.
//!
//! Forwards the caller's credentials (cookie or bearer header) to the
//! identity provider's session endpoint and parses the session/user pair
//! from the response.

use anyhow::{Context, Result};
use async_trait::async_trait;
use axum::http::{
    header::{AUTHORIZATION, COOKIE},
    HeaderMap,
};
use reqwest::{Client, StatusCode};
use url::Url;

use super::{ProviderError, SessionContext, SessionProvider};

const SESSION_ENDPOINT: &str = "api/auth/get-session";

#[derive(Debug)]
pub struct HttpSessionProvider {
    client: Client,
    session_url: String,
}

impl HttpSessionProvider {
    /// Builds a provider client for the identity service at `auth_base_url`.
    ///
    /// # Errors
    /// Returns an error when the base URL is invalid or the HTTP client
    /// cannot be constructed.
    pub fn new(auth_base_url: &str) -> Result<Self> {
        let base = Url::parse(auth_base_url)
            .with_context(|| format!("Invalid identity provider URL: {auth_base_url}"))?;
        let session_url = base
            .join(SESSION_ENDPOINT)
            .context("Failed to build session endpoint URL")?
            .to_string();
        let client = Client::builder()
            .user_agent(crate::APP_USER_AGENT)
            .build()
            .context("Failed to build identity provider HTTP client")?;
        Ok(Self {
            client,
            session_url,
        })
    }
}

#[async_trait]
impl SessionProvider for HttpSessionProvider {
    async fn get_session(
        &self,
        headers: &HeaderMap,
    ) -> Result<Option<SessionContext>, ProviderError> {
        let mut request = self.client.get(&self.session_url);
        if let Some(cookie) = headers.get(COOKIE).and_then(|value| value.to_str().ok()) {
            request = request.header(reqwest::header::COOKIE, cookie);
        }
        if let Some(authorization) = headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
        {
            request = request.header(reqwest::header::AUTHORIZATION, authorization);
        }

        let response = request.send().await?;
        let status = response.status();

        // The provider reports "nobody is signed in" as an empty success or
        // a 401; both are a normal anonymous caller, not a fault.
        if status == StatusCode::NO_CONTENT || status == StatusCode::UNAUTHORIZED {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(ProviderError::Status(status));
        }

        let body = response.text().await?;
        if body.is_empty() || body == "null" {
            return Ok(None);
        }
        let context: SessionContext = serde_json::from_str(&body)?;
        Ok(Some(context))
    }
}
