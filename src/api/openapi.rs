//! OpenAPI document for the service.
//!
//! Add new endpoints to `paths` (and their payloads to `components`) so
//! the swagger UI at `/docs` stays complete.

use utoipa::OpenApi;

use super::handlers::{health, orgs, pages, protected};

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        pages::home,
        pages::dashboard,
        pages::login,
        pages::org_new,
        protected::protected,
        orgs::organizations::create_org,
        orgs::organizations::list_orgs,
    ),
    components(schemas(
        health::Health,
        pages::HomeResponse,
        pages::DashboardResponse,
        pages::LoginPageResponse,
        pages::NewOrgPageResponse,
        pages::UserSummary,
        orgs::types::CreateOrgRequest,
        orgs::types::CreateOrgResponse,
        orgs::types::OrgResponse,
    )),
    tags(
        (name = "pages", description = "Landing, dashboard, and auth page surfaces"),
        (name = "orgs", description = "Organization management"),
        (name = "api", description = "Session-gated API endpoints"),
        (name = "health", description = "Service health"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_the_served_paths() {
        let doc = ApiDoc::openapi();
        for path in ["/", "/dashboard", "/user/login", "/orgs/new", "/orgs", "/api/protected", "/health"] {
            assert!(
                doc.paths.paths.contains_key(path),
                "missing OpenAPI path: {path}"
            );
        }
    }
}
