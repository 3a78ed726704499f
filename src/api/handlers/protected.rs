//! Session-gated API endpoint.

use axum::{extract::Extension, http::StatusCode, response::IntoResponse};

use crate::tenant::context::RequestContext;

#[utoipa::path(
    get,
    path = "/api/protected",
    responses(
        (status = 200, description = "Greeting for the signed-in caller.", body = String),
        (status = 401, description = "No session."),
    ),
    tag = "api"
)]
/// Returns a greeting for authenticated callers and 401 otherwise. API
/// paths are reserved, so this stays reachable on any host; the session
/// check is the whole gate.
pub async fn protected(context: Extension<RequestContext>) -> impl IntoResponse {
    match context.user.as_ref() {
        Some(user) => {
            let name = user.name.as_deref().unwrap_or(&user.email);
            (StatusCode::OK, format!("Hello {name}!")).into_response()
        }
        None => (StatusCode::UNAUTHORIZED, "Unauthorized").into_response(),
    }
}
