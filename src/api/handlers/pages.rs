//! Landing, dashboard, login, and org-creation page surfaces.

use axum::{
    extract::{Extension, Query},
    http::{header::LOCATION, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;

use crate::session::AuthUser;
use crate::tenant::{context::RequestContext, hostname::TenantConfig};

use super::orgs::types::OrgResponse;

#[derive(Debug, Serialize, ToSchema)]
pub struct UserSummary {
    pub id: String,
    pub name: Option<String>,
    pub email: String,
    pub role: String,
}

impl From<&AuthUser> for UserSummary {
    fn from(user: &AuthUser) -> Self {
        Self {
            id: user.id.to_string(),
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role.as_str().to_string(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HomeResponse {
    pub service: String,
    pub version: String,
    pub user: Option<UserSummary>,
    pub organization: Option<OrgResponse>,
    pub role: Option<String>,
}

#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Landing summary for the resolved context.", body = HomeResponse),
    ),
    tag = "pages"
)]
/// Serves the main-domain landing or, on a tenant host, the workspace
/// summary for the signed-in member.
pub async fn home(context: Extension<RequestContext>) -> impl IntoResponse {
    Json(HomeResponse {
        service: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        user: context.user.as_ref().map(UserSummary::from),
        organization: context.organization.as_ref().map(OrgResponse::from),
        role: context.role.map(|role| role.as_str().to_string()),
    })
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardResponse {
    pub organization: OrgResponse,
    pub role: String,
    pub user: Option<UserSummary>,
}

#[utoipa::path(
    get,
    path = "/dashboard",
    responses(
        (status = 200, description = "Tenant dashboard for a member.", body = DashboardResponse),
        (status = 302, description = "No tenant resolved; back to the main domain."),
    ),
    tag = "pages"
)]
/// Serves the tenant dashboard. The gate only lets members through on
/// tenant hosts; a main-domain request has no dashboard to show.
pub async fn dashboard(
    context: Extension<RequestContext>,
    config: Extension<Arc<TenantConfig>>,
) -> impl IntoResponse {
    match (context.organization.as_ref(), context.role) {
        (Some(organization), Some(role)) => (
            StatusCode::OK,
            Json(DashboardResponse {
                organization: OrgResponse::from(organization),
                role: role.as_str().to_string(),
                user: context.user.as_ref().map(UserSummary::from),
            }),
        )
            .into_response(),
        _ => found(&format!("{}/", config.main_origin())),
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    slug: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginPageResponse {
    pub prompt: String,
    pub slug: Option<String>,
    pub signed_in: bool,
}

#[utoipa::path(
    get,
    path = "/user/login",
    params(("slug" = Option<String>, Query, description = "Organization the visitor was redirected from")),
    responses(
        (status = 200, description = "Login page payload.", body = LoginPageResponse),
    ),
    tag = "pages"
)]
/// Login page stub. Reserved-path handling keeps it reachable in every
/// tenant state; the `slug` parameter names the workspace that sent the
/// visitor here.
pub async fn login(
    Query(query): Query<LoginQuery>,
    context: Extension<RequestContext>,
) -> impl IntoResponse {
    let slug = query.slug.or_else(|| context.tenant_slug.clone());
    let prompt = match slug.as_deref() {
        Some(slug) => format!("Sign in to continue to {slug}."),
        None => "Sign in to continue.".to_string(),
    };
    Json(LoginPageResponse {
        prompt,
        slug,
        signed_in: context.user.is_some(),
    })
}

#[derive(Debug, Deserialize)]
pub struct NewOrgQuery {
    suggested: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct NewOrgPageResponse {
    pub suggested: Option<String>,
    pub signed_in: bool,
}

#[utoipa::path(
    get,
    path = "/orgs/new",
    params(("suggested" = Option<String>, Query, description = "Slug hint carried from an unresolved tenant host")),
    responses(
        (status = 200, description = "Org-creation page payload.", body = NewOrgPageResponse),
    ),
    tag = "pages"
)]
/// Org-creation page stub; `suggested` carries the slug of the subdomain
/// the visitor tried to reach.
pub async fn org_new(
    Query(query): Query<NewOrgQuery>,
    context: Extension<RequestContext>,
) -> impl IntoResponse {
    Json(NewOrgPageResponse {
        suggested: query.suggested,
        signed_in: context.user.is_some(),
    })
}

pub(super) fn found(location: &str) -> Response {
    match HeaderValue::from_str(location) {
        Ok(value) => (StatusCode::FOUND, [(LOCATION, value)]).into_response(),
        Err(err) => {
            error!("Invalid redirect target {location}: {err}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
