// handlers/mod.rs - HTTP surface
//
// One module per resource, each exposing a `routes()` sub-router that is
// nested under its /api/v1 prefix in `router()`. Write access is gated by
// the JWT middleware via `route_layer`, so public reads never pay for it.

pub mod auth;
pub mod bootcamps;
pub mod courses;
pub mod reviews;
pub mod users;
pub mod webhook;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::db;
use crate::error::ApiError;
use crate::state::AppState;

/// Builds the full application router over a shared [`AppState`].
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .nest("/api/v1/bootcamps", bootcamps::routes())
        .nest("/api/v1/courses", courses::routes())
        .nest("/api/v1/reviews", reviews::routes())
        .nest("/api/v1/users", users::routes())
        .nest("/api/v1/auth", auth::routes())
        .nest("/api/v1/webhook", webhook::routes())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET / - API banner with the mounted endpoint groups.
async fn root() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "name": "campdir",
            "version": env!("CARGO_PKG_VERSION"),
            "description": "Bootcamp directory API",
            "endpoints": {
                "bootcamps": "/api/v1/bootcamps",
                "courses": "/api/v1/courses",
                "reviews": "/api/v1/reviews",
                "users": "/api/v1/users",
                "auth": "/api/v1/auth",
                "webhook": "/api/v1/webhook/email",
                "health": "/health"
            }
        }
    }))
}

/// GET /health - liveness plus a database round trip.
async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let timestamp = chrono::Utc::now();
    match db::health_check(&state.pool).await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "healthy",
                    "database": "connected",
                    "timestamp": timestamp
                }
            })),
        ),
        Err(err) => {
            tracing::error!("health check failed: {}", err);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "database unavailable",
                    "data": {
                        "status": "degraded",
                        "database": "disconnected",
                        "timestamp": timestamp
                    }
                })),
            )
        }
    }
}

/// Path ids arrive as raw strings. A value that does not parse as a UUID
/// cannot match any row, so it reads as the resource being absent rather
/// than as a client syntax error.
pub(crate) fn parse_id(raw: &str, resource: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw)
        .map_err(|_| ApiError::not_found(format!("{} not found with id of {}", resource, raw)))
}

pub(crate) fn not_found(resource: &str, id: Uuid) -> ApiError {
    ApiError::not_found(format!("{} not found with id of {}", resource, id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_ids_read_as_missing_resources() {
        let err = parse_id("abc-123", "Bootcamp").unwrap_err();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.message(), "Bootcamp not found with id of abc-123");
    }

    #[test]
    fn well_formed_ids_parse() {
        let id = parse_id("8c1f9e2a-0b3d-4c5e-9f6a-7b8c9d0e1f2a", "Course").unwrap();
        assert_eq!(id.to_string(), "8c1f9e2a-0b3d-4c5e-9f6a-7b8c9d0e1f2a");
    }
}
