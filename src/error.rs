// HTTP API error types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),

    // 401 Unauthorized
    Unauthorized(String),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict
    Conflict(String),

    // 500 Internal Server Error
    InternalServerError(String),

    // 502 Bad Gateway (external service issues)
    BadGateway(String),

    // 503 Service Unavailable
    ServiceUnavailable(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::BadRequest(_) => 400,
            ApiError::Unauthorized(_) => 401,
            ApiError::NotFound(_) => 404,
            ApiError::Conflict(_) => 409,
            ApiError::InternalServerError(_) => 500,
            ApiError::BadGateway(_) => 502,
            ApiError::ServiceUnavailable(_) => 503,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg) => msg,
            ApiError::Unauthorized(msg) => msg,
            ApiError::NotFound(msg) => msg,
            ApiError::Conflict(msg) => msg,
            ApiError::InternalServerError(msg) => msg,
            ApiError::BadGateway(msg) => msg,
            ApiError::ServiceUnavailable(msg) => msg,
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        json!({
            "success": false,
            "error": self.message(),
        })
    }
}

// Static constructor methods
impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict(message.into())
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }

    pub fn bad_gateway(message: impl Into<String>) -> Self {
        ApiError::BadGateway(message.into())
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        ApiError::ServiceUnavailable(message.into())
    }
}

// Convert boundary error types to ApiError
impl From<crate::db::DbError> for ApiError {
    fn from(err: crate::db::DbError) -> Self {
        match err {
            crate::db::DbError::NotFound(msg) => ApiError::not_found(msg),
            crate::db::DbError::InvalidValue { .. } => ApiError::bad_request(err.to_string()),
            crate::db::DbError::ConfigMissing(_) | crate::db::DbError::InvalidDatabaseUrl => {
                ApiError::service_unavailable("Database not configured")
            }
            crate::db::DbError::QueryError(msg) => {
                // Don't expose internal SQL errors to clients
                tracing::error!("database query error: {}", msg);
                ApiError::internal_server_error("An error occurred while processing your request")
            }
            crate::db::DbError::Migrate(e) => {
                tracing::error!("migration error: {}", e);
                ApiError::service_unavailable("Service is being updated, please try again later")
            }
            crate::db::DbError::Sqlx(sqlx_err) => ApiError::from_sqlx(sqlx_err),
        }
    }
}

impl ApiError {
    fn from_sqlx(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => ApiError::not_found("Resource not found"),
            sqlx::Error::Database(db) => match db.code().as_deref() {
                // unique_violation
                Some("23505") => ApiError::conflict("Duplicate field value entered"),
                // invalid_text_representation / datatype_mismatch: the client
                // sent a filter value the column type rejects
                Some("22P02") | Some("42804") => {
                    ApiError::bad_request("Invalid value in query parameters")
                }
                // check_violation, e.g. a rating outside 1..10
                Some("23514") => ApiError::bad_request("Invalid field value"),
                _ => {
                    tracing::error!("database error: {}", err);
                    ApiError::internal_server_error("Database error occurred")
                }
            },
            _ => {
                tracing::error!("database error: {}", err);
                ApiError::internal_server_error("Database error occurred")
            }
        }
    }
}

impl From<crate::authz::AccessDenied> for ApiError {
    fn from(err: crate::authz::AccessDenied) -> Self {
        match err {
            crate::authz::AccessDenied::AlreadyPublished { .. } => {
                ApiError::conflict(err.to_string())
            }
            _ => ApiError::unauthorized(err.to_string()),
        }
    }
}

impl From<crate::auth::AuthError> for ApiError {
    fn from(err: crate::auth::AuthError) -> Self {
        match err {
            crate::auth::AuthError::InvalidToken => {
                ApiError::unauthorized("Not authorized to access this route")
            }
            other => {
                tracing::error!("auth error: {}", other);
                ApiError::internal_server_error("Authentication is unavailable")
            }
        }
    }
}

impl From<crate::geo::GeoError> for ApiError {
    fn from(err: crate::geo::GeoError) -> Self {
        match err {
            crate::geo::GeoError::NoResult(loc) => {
                ApiError::bad_request(format!("Could not geocode location {}", loc))
            }
            other => {
                tracing::error!("geocoder error: {}", other);
                ApiError::bad_gateway("Geocoding service unavailable")
            }
        }
    }
}

impl From<crate::uploads::UploadError> for ApiError {
    fn from(err: crate::uploads::UploadError) -> Self {
        match err {
            crate::uploads::UploadError::Io(e) => {
                tracing::error!("photo upload io error: {}", e);
                ApiError::internal_server_error("Problem with file upload")
            }
            other => ApiError::bad_request(other.to_string()),
        }
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_json())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_body_uses_success_false_envelope() {
        let err = ApiError::not_found("Bootcamp not found with id abc");
        let body = err.to_json();
        assert_eq!(body["success"], json!(false));
        assert_eq!(body["error"], json!("Bootcamp not found with id abc"));
    }

    #[test]
    fn status_codes_match_variants() {
        assert_eq!(ApiError::bad_request("x").status_code(), 400);
        assert_eq!(ApiError::unauthorized("x").status_code(), 401);
        assert_eq!(ApiError::not_found("x").status_code(), 404);
        assert_eq!(ApiError::conflict("x").status_code(), 409);
        assert_eq!(ApiError::service_unavailable("x").status_code(), 503);
    }
}
