//! Service health endpoint.

use axum::{
    body::Body,
    extract::Extension,
    http::{HeaderMap, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use sqlx::Connection;
use std::sync::Arc;
use tracing::{debug, error, info_span, Instrument};
use utoipa::ToSchema;

use crate::services::ServiceInit;
use crate::GIT_COMMIT_HASH;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct Health {
    commit: String,
    name: String,
    version: String,
    database: String,
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service and database are healthy", body = [Health]),
        (status = 503, description = "Database is unreachable or services are uninitialized", body = [Health])
    ),
    tag = "health"
)]
// axum handler for health
pub async fn health(method: Method, init: Extension<Arc<ServiceInit>>) -> impl IntoResponse {
    let database = match init.ready() {
        // The gate initializes services before any handler runs, so this
        // only shows up when initialization itself is failing.
        None => Err("uninitialized"),
        Some(services) => match services.pool.as_ref() {
            None => Ok("memory"),
            Some(pool) => {
                let acquire_span = info_span!(
                    "db.acquire",
                    db.system = "postgresql",
                    db.operation = "ACQUIRE"
                );
                match pool.acquire().instrument(acquire_span).await {
                    Ok(mut conn) => {
                        let ping_span =
                            info_span!("db.ping", db.system = "postgresql", db.operation = "PING");
                        match conn.ping().instrument(ping_span).await {
                            Ok(()) => Ok("ok"),
                            Err(error) => {
                                error!("Failed to ping database: {}", error);
                                Err("error")
                            }
                        }
                    }
                    Err(error) => {
                        error!("Failed to acquire database connection: {}", error);
                        Err("error")
                    }
                }
            }
        },
    };

    let is_healthy = database.is_ok();
    let health = Health {
        commit: GIT_COMMIT_HASH.to_string(),
        name: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: match database {
            Ok(status) | Err(status) => status.to_string(),
        },
    };

    let body = if method == Method::GET {
        Json(&health).into_response()
    } else {
        Body::empty().into_response()
    };

    let short_hash = if health.commit.len() > 7 {
        &health.commit[0..7]
    } else {
        ""
    };

    let mut headers = HeaderMap::new();
    match format!("{}:{}:{}", health.name, health.version, short_hash).parse::<HeaderValue>() {
        Ok(value) => {
            debug!("X-App header: {:?}", value);
            headers.insert("X-App", value);
        }
        Err(err) => {
            error!("Failed to parse X-App header: {}", err);
        }
    }

    if is_healthy {
        (StatusCode::OK, headers, body)
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, headers, body)
    }
}
