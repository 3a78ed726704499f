//! Router assembly and server bootstrap.

use anyhow::{Context, Result};
use axum::{
    body::Body,
    extract::MatchedPath,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderName, HeaderValue, Method, Request,
    },
    middleware,
    routing::{any, get, post},
    Extension, Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::PropagateRequestIdLayer,
    set_header::SetRequestHeaderLayer,
    trace::TraceLayer,
};
use tracing::{info, info_span, Span};
use ulid::Ulid;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::services::{ServiceInit, ServiceSettings};
use crate::tenant::{hostname::TenantConfig, middleware::tenant_gate};

pub(crate) mod handlers;
mod openapi;

pub use handlers::auth_proxy::AuthProxy;
pub use openapi::ApiDoc;

/// Builds the application router around the tenant gate.
///
/// # Errors
/// Returns an error when the configured public origin cannot be used as a
/// CORS origin header.
pub fn router(
    init: Arc<ServiceInit>,
    config: Arc<TenantConfig>,
    proxy: Arc<AuthProxy>,
) -> Result<Router> {
    let origin = HeaderValue::from_str(config.main_origin())
        .context("Invalid public base URL for CORS origin")?;
    let cors = CorsLayer::new()
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_methods([Method::GET, Method::POST])
        .allow_origin(AllowOrigin::exact(origin))
        .allow_credentials(true);

    Ok(Router::new()
        .route("/", get(handlers::pages::home))
        .route("/dashboard", get(handlers::pages::dashboard))
        .route("/user/login", get(handlers::pages::login))
        .route("/orgs/new", get(handlers::pages::org_new))
        .route(
            "/orgs",
            post(handlers::orgs::organizations::create_org)
                .get(handlers::orgs::organizations::list_orgs),
        )
        .route("/api/protected", get(handlers::protected::protected))
        .route("/api/auth/*path", any(handlers::auth_proxy::forward))
        .route("/health", get(handlers::health::health))
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(middleware::from_fn(tenant_gate))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(cors)
                .layer(Extension(init))
                .layer(Extension(config))
                .layer(Extension(proxy)),
        ))
}

/// Start the server
///
/// Services stay uninitialized until the first request reaches the tenant
/// gate; the listener comes up even when the database is still waking.
///
/// # Errors
/// Return error if failed to start the server
pub async fn new(
    port: u16,
    dsn: String,
    auth_base_url: String,
    config: TenantConfig,
) -> Result<()> {
    let init = Arc::new(ServiceInit::new(ServiceSettings {
        dsn,
        auth_base_url: auth_base_url.clone(),
    }));
    let proxy = Arc::new(AuthProxy::new(&auth_base_url)?);
    let app = router(init, Arc::new(config), proxy)?;

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            info!("Gracefully shutdown");
        })
        .await?;

    Ok(())
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}
