// handlers/users.rs - /api/v1/users, admin only
//
// Every route sits behind the JWT middleware and re-checks the admin role
// in the handler, so a valid token with a lesser role still gets a 401.

use axum::extract::{Path, RawQuery, State};
use axum::http::StatusCode;
use axum::middleware::from_fn;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Json, Router};
use serde::Deserialize;
use serde_json::json;

use crate::auth::hash_password;
use crate::authz::{self, Principal, Role};
use crate::db::models::user::{User, USERS};
use crate::db::repository;
use crate::error::ApiError;
use crate::middleware::protect;
use crate::query::QueryPlan;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/:id", get(get_one).put(update).delete(remove))
        .route_layer(from_fn(protect))
}

#[derive(Debug, Deserialize)]
pub struct CreateUserPayload {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct UpdateUserPayload {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

/// Role names come in as free text; anything outside the known set is a
/// client error rather than a silent default.
fn parse_role(raw: &str) -> Result<Role, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::bad_request("Please provide a valid role"))
}

/// GET / - user listing through the query pipeline. The password hash is
/// not part of the filterable column set, so it can never be projected.
async fn list(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    RawQuery(query): RawQuery,
) -> Result<impl IntoResponse, ApiError> {
    authz::require_role(&principal, &[Role::Admin])?;
    let plan = QueryPlan::from_query(query.as_deref().unwrap_or(""));
    let page = repository::list(&state.pool, &USERS, &plan).await?;
    let pagination = plan.paginate(page.total);
    Ok(Json(json!({
        "success": true,
        "count": page.rows.len(),
        "pagination": pagination,
        "data": page.rows,
    })))
}

/// GET /:id
async fn get_one(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    authz::require_role(&principal, &[Role::Admin])?;
    let id = super::parse_id(&id, "User")?;
    let user = User::find(&state.pool, id)
        .await?
        .ok_or_else(|| super::not_found("User", id))?;
    Ok(Json(json!({"success": true, "data": user})))
}

/// POST / - admins may create users with any role, admin included.
async fn create(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(data): Json<CreateUserPayload>,
) -> Result<impl IntoResponse, ApiError> {
    authz::require_role(&principal, &[Role::Admin])?;
    let role = match data.role.as_deref() {
        Some(raw) => parse_role(raw)?,
        None => Role::User,
    };
    super::auth::validate_password(&data.password)?;

    let hash = hash_password(&data.password)?;
    let user = User::insert(&state.pool, &data.name, &data.email, role, &hash).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({"success": true, "data": user})),
    ))
}

/// PUT /:id - partial update, role changes included.
async fn update(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
    Json(data): Json<UpdateUserPayload>,
) -> Result<impl IntoResponse, ApiError> {
    authz::require_role(&principal, &[Role::Admin])?;
    let id = super::parse_id(&id, "User")?;
    User::find(&state.pool, id)
        .await?
        .ok_or_else(|| super::not_found("User", id))?;

    let role = match data.role.as_deref() {
        Some(raw) => Some(parse_role(raw)?),
        None => None,
    };
    let user =
        User::update_admin(&state.pool, id, data.name.as_deref(), data.email.as_deref(), role)
            .await?;
    Ok(Json(json!({"success": true, "data": user})))
}

/// DELETE /:id
async fn remove(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    authz::require_role(&principal, &[Role::Admin])?;
    let id = super::parse_id(&id, "User")?;
    if !User::delete(&state.pool, id).await? {
        return Err(super::not_found("User", id));
    }
    Ok(Json(json!({"success": true, "data": {}})))
}
