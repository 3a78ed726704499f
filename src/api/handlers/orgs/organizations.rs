//! Organization creation and listing handlers.

use axum::{
    extract::Extension,
    http::{header::HOST, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use tracing::error;

use crate::services::ServiceInit;
use crate::tenant::{
    context::RequestContext,
    hostname::{valid_slug, TenantConfig},
    store::CreateOrgError,
    ORG_SLUG_MAX, ORG_SLUG_MIN,
};

use super::types::{CreateOrgRequest, CreateOrgResponse, OrgResponse};

#[utoipa::path(
    post,
    path = "/orgs",
    request_body = CreateOrgRequest,
    responses(
        (status = 201, description = "Organization created; the creator is its admin.", body = CreateOrgResponse),
        (status = 400, description = "Invalid name or slug.", body = String),
        (status = 401, description = "No session."),
        (status = 409, description = "Slug already taken.", body = String),
    ),
    tag = "orgs"
)]
/// Creates an organization owned by the caller and returns the subdomain
/// dashboard URL to land on. The slug becomes the organization's
/// subdomain, so it is validated exactly as the hostname resolver will
/// later read it and is immutable after creation.
pub async fn create_org(
    headers: HeaderMap,
    context: Extension<RequestContext>,
    config: Extension<Arc<TenantConfig>>,
    init: Extension<Arc<ServiceInit>>,
    Json(payload): Json<CreateOrgRequest>,
) -> impl IntoResponse {
    let Some(user) = context.user.as_ref() else {
        return (
            StatusCode::UNAUTHORIZED,
            "Sign in to create an organization.",
        )
            .into_response();
    };

    let services = match init.services().await {
        Ok(services) => services,
        Err(err) => {
            error!("Service initialization failed: {err:#}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let name = payload.name.trim();
    if name.is_empty() {
        return (StatusCode::BAD_REQUEST, "Organization name is required.").into_response();
    }

    let slug = payload.slug.trim();
    if !valid_slug(slug) || slug.len() < ORG_SLUG_MIN || slug.len() > ORG_SLUG_MAX {
        return (
            StatusCode::BAD_REQUEST,
            "Slug can only contain lowercase letters, numbers, and hyphens.",
        )
            .into_response();
    }

    match services.store.slug_taken(slug).await {
        Ok(true) => {
            return (StatusCode::CONFLICT, "Organization slug already taken.").into_response()
        }
        Ok(false) => {}
        Err(err) => {
            error!("Failed to check slug availability: {err}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    }

    // The unique constraint stays the backstop for creations racing past
    // the pre-check.
    match services.store.create_org(name, slug, user.id).await {
        Ok(record) => {
            let host = headers
                .get(HOST)
                .and_then(|value| value.to_str().ok())
                .unwrap_or_else(|| config.main_domain());
            let redirect_url = config.tenant_dashboard_url(host, &record.slug);
            (
                StatusCode::CREATED,
                Json(CreateOrgResponse {
                    organization: OrgResponse::from(&record),
                    redirect_url,
                }),
            )
                .into_response()
        }
        Err(CreateOrgError::SlugTaken) => {
            (StatusCode::CONFLICT, "Organization slug already taken.").into_response()
        }
        Err(CreateOrgError::Store(err)) => {
            error!("Failed to create organization: {err}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[utoipa::path(
    get,
    path = "/orgs",
    responses(
        (status = 200, description = "Organizations the caller belongs to.", body = [OrgResponse]),
        (status = 401, description = "No session."),
    ),
    tag = "orgs"
)]
/// Lists the caller's organizations, for the workspace picker on the
/// main-domain landing.
pub async fn list_orgs(
    context: Extension<RequestContext>,
    init: Extension<Arc<ServiceInit>>,
) -> impl IntoResponse {
    let Some(user) = context.user.as_ref() else {
        return StatusCode::UNAUTHORIZED.into_response();
    };

    let services = match init.services().await {
        Ok(services) => services,
        Err(err) => {
            error!("Service initialization failed: {err:#}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    match services.store.orgs_for_user(user.id).await {
        Ok(records) => {
            let rows: Vec<OrgResponse> = records.iter().map(OrgResponse::from).collect();
            (StatusCode::OK, Json(rows)).into_response()
        }
        Err(err) => {
            error!("Failed to list organizations: {err}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
