//! The tenant gate: glues the pipeline onto the router.
//!
//! Every request runs the same sequence — initialize-or-await shared
//! services, resolve the session (fail-open), resolve the tenant from the
//! hostname, resolve membership, reduce, decide. Serving dispositions
//! attach the assembled [`RequestContext`] to the request; redirect
//! dispositions short-circuit with a 302 unless the path is reserved.
//!
//! Reserved paths (`/api/`, `/user/`, `/orgs/new`) stay reachable in every
//! tenant state: a visitor on a dead subdomain must still be able to sign
//! in or create the organization the redirect points at.
//!
//! Service initialization is the only failure class that aborts a request
//! outright — no meaningful decision exists without the shared handles.
//! Session and membership failures degrade to context states instead; no
//! retries are attempted here.

use axum::{
    extract::{Extension, Request},
    http::{
        header::{HOST, LOCATION},
        HeaderValue, StatusCode,
    },
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::services::ServiceInit;

use super::context::RequestContext;
use super::decision::{decide, Disposition};
use super::hostname::TenantConfig;
use super::membership::resolve_membership;

/// Identity-provider routes are proxied untouched; running the pipeline on
/// them would consult the provider about its own traffic.
const PROVIDER_PREFIX: &str = "/api/auth/";

const RESERVED_MARKERS: [&str; 3] = ["/api/", "/user/", "/orgs/new"];

pub async fn tenant_gate(
    Extension(init): Extension<Arc<ServiceInit>>,
    Extension(config): Extension<Arc<TenantConfig>>,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    if path.starts_with(PROVIDER_PREFIX) {
        return next.run(request).await;
    }

    let services = match init.services().await {
        Ok(services) => services,
        Err(err) => {
            error!("Service initialization failed: {err:#}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "service initialization failed",
            )
                .into_response();
        }
    };

    // Fail-open: a provider fault is an anonymous caller, not a 500.
    let auth = match services.sessions.get_session(request.headers()).await {
        Ok(auth) => auth,
        Err(err) => {
            warn!("Session lookup failed, continuing anonymously: {err}");
            None
        }
    };
    let auth = auth.filter(|context| !context.user.banned);

    let host = request
        .headers()
        .get(HOST)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let tenant = config.tenant_slug(&host);

    // Membership is parameterized by the caller, so it must sequence after
    // session resolution; both are idempotent reads.
    let org = match tenant.as_deref() {
        Some(slug) => {
            let user_id = auth.as_ref().map(|context| context.user.id);
            Some(resolve_membership(services.store.as_ref(), slug, user_id).await)
        }
        None => None,
    };

    let context = RequestContext::assemble(tenant, auth, org);
    let disposition = decide(&context);
    debug!(%host, %path, ?disposition, "tenant gate decided");

    let location = match &disposition {
        Disposition::ServeMain | Disposition::ServeTenant { .. } => None,
        Disposition::RedirectToOrgCreation { suggested } => Some(format!(
            "{}/orgs/new?suggested={suggested}",
            config.main_origin()
        )),
        Disposition::RedirectToLogin => {
            Some(format!("{}://{host}/user/login", config.scheme()))
        }
        Disposition::RedirectToMain => Some(format!("{}/", config.main_origin())),
    };

    if let Some(location) = location {
        if !reserved_path(&path) {
            return found(&location);
        }
        debug!(%path, "reserved path bypasses tenant redirect");
    }

    request.extensions_mut().insert(context);
    next.run(request).await
}

/// 302 with a `Location` header. `axum::response::Redirect` only offers
/// 303/307/308, and the routing contract here is a plain `Found`.
fn found(location: &str) -> Response {
    match HeaderValue::from_str(location) {
        Ok(value) => (StatusCode::FOUND, [(LOCATION, value)]).into_response(),
        Err(err) => {
            error!("Invalid redirect target {location}: {err}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

fn reserved_path(path: &str) -> bool {
    RESERVED_MARKERS.iter().any(|marker| path.contains(marker))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_paths_cover_auth_login_and_org_creation() {
        assert!(reserved_path("/api/protected"));
        assert!(reserved_path("/user/login"));
        assert!(reserved_path("/orgs/new"));
        assert!(reserved_path("/nested/api/thing"));
        assert!(!reserved_path("/"));
        assert!(!reserved_path("/dashboard"));
        assert!(!reserved_path("/orgs"));
    }
}
