//! Reverse proxy for the identity provider's own routes.
//!
//! Sign-in, sign-up, and session endpoints are served by the provider;
//! this service forwards `/api/auth/*` to it verbatim so browsers talk to
//! one origin. The tenant gate skips these paths entirely.

use anyhow::{Context, Result};
use axum::{
    body::to_bytes,
    extract::{Extension, Request},
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE, COOKIE},
        HeaderMap, HeaderName, HeaderValue, StatusCode,
    },
    response::{IntoResponse, Response},
};
use reqwest::Client;
use std::sync::Arc;
use tracing::error;
use url::Url;

/// Provider handlers deal in small JSON payloads; anything larger is not
/// auth traffic.
const MAX_FORWARD_BODY_BYTES: usize = 1024 * 1024;

/// Request headers worth forwarding: credentials and body type.
const FORWARDED_REQUEST_HEADERS: [HeaderName; 3] = [COOKIE, AUTHORIZATION, CONTENT_TYPE];

#[derive(Debug)]
pub struct AuthProxy {
    client: Client,
    base: Url,
}

impl AuthProxy {
    /// # Errors
    /// Returns an error when the provider base URL is invalid or the HTTP
    /// client cannot be built.
    pub fn new(auth_base_url: &str) -> Result<Self> {
        let base = Url::parse(auth_base_url)
            .with_context(|| format!("Invalid identity provider URL: {auth_base_url}"))?;
        let client = Client::builder()
            .user_agent(crate::APP_USER_AGENT)
            .build()
            .context("Failed to build identity provider HTTP client")?;
        Ok(Self { client, base })
    }

    fn target(&self, path: &str, query: Option<&str>) -> Result<Url> {
        let mut url = self
            .base
            .join(path.trim_start_matches('/'))
            .with_context(|| format!("Invalid provider path: {path}"))?;
        url.set_query(query);
        Ok(url)
    }
}

/// Forwards the request to the identity provider and relays its response.
/// Provider faults surface as 502 — these routes are the provider's
/// surface, so there is no anonymous fallback here.
pub async fn forward(Extension(proxy): Extension<Arc<AuthProxy>>, request: Request) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let query = request.uri().query().map(str::to_string);
    let headers = request.headers().clone();

    let target = match proxy.target(&path, query.as_deref()) {
        Ok(target) => target,
        Err(err) => {
            error!("Failed to build provider URL for {path}: {err:#}");
            return StatusCode::BAD_GATEWAY.into_response();
        }
    };

    let body = match to_bytes(request.into_body(), MAX_FORWARD_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(err) => {
            error!("Failed to read auth request body: {err}");
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    let Ok(method) = reqwest::Method::from_bytes(method.as_str().as_bytes()) else {
        return StatusCode::METHOD_NOT_ALLOWED.into_response();
    };

    let mut upstream = proxy.client.request(method, target).body(body.to_vec());
    for name in FORWARDED_REQUEST_HEADERS {
        if let Some(value) = headers.get(&name).and_then(|value| value.to_str().ok()) {
            upstream = upstream.header(name.as_str(), value);
        }
    }

    let response = match upstream.send().await {
        Ok(response) => response,
        Err(err) => {
            error!("Identity provider proxy failed: {err}");
            return StatusCode::BAD_GATEWAY.into_response();
        }
    };

    let status =
        StatusCode::from_u16(response.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
    let mut relayed = HeaderMap::new();
    for (name, value) in response.headers() {
        // Set-Cookie carries the session; Content-Type keeps the payload
        // parseable. Hop-by-hop headers stay behind.
        if name == &reqwest::header::SET_COOKIE || name == &reqwest::header::CONTENT_TYPE {
            if let (Ok(name), Ok(value)) = (
                HeaderName::from_bytes(name.as_str().as_bytes()),
                HeaderValue::from_bytes(value.as_bytes()),
            ) {
                relayed.append(name, value);
            }
        }
    }

    match response.bytes().await {
        Ok(bytes) => (status, relayed, bytes.to_vec()).into_response(),
        Err(err) => {
            error!("Failed to read provider response body: {err}");
            StatusCode::BAD_GATEWAY.into_response()
        }
    }
}
