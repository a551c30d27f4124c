// handlers/reviews.rs - /api/v1/reviews plus the nested bootcamp routes
//
// Unlike courses, creating a review does not require owning the parent
// bootcamp. The one-review-per-user rule is enforced by the unique index
// on (bootcamp_id, owner_id) and surfaces as a 409.

use axum::extract::{Path, RawQuery, State};
use axum::http::StatusCode;
use axum::middleware::from_fn;
use axum::response::IntoResponse;
use axum::routing::{get, put};
use axum::{Extension, Json, Router};
use serde_json::{json, Value};

use crate::authz::{self, Principal, Role};
use crate::db::models::bootcamp::Bootcamp;
use crate::db::models::review::{CreateReview, Review, UpdateReview, REVIEWS};
use crate::db::repository;
use crate::error::ApiError;
use crate::middleware::protect;
use crate::query::{Comparison, Condition, QueryPlan};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    let public = Router::new()
        .route("/", get(list))
        .route("/:id", get(get_one));
    let protected = Router::new()
        .route("/:id", put(update).delete(remove))
        .route_layer(from_fn(protect));
    public.merge(protected)
}

/// GET / - all reviews through the query pipeline.
async fn list(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Result<impl IntoResponse, ApiError> {
    let plan = QueryPlan::from_query(query.as_deref().unwrap_or(""));
    let page = repository::list(&state.pool, &REVIEWS, &plan).await?;
    let pagination = plan.paginate(page.total);
    Ok(Json(json!({
        "success": true,
        "count": page.rows.len(),
        "pagination": pagination,
        "data": page.rows,
    })))
}

/// GET /api/v1/bootcamps/:id/reviews
pub(crate) async fn list_for_bootcamp(
    State(state): State<AppState>,
    Path(id): Path<String>,
    RawQuery(query): RawQuery,
) -> Result<impl IntoResponse, ApiError> {
    let id = super::parse_id(&id, "Bootcamp")?;
    let mut plan = QueryPlan::from_query(query.as_deref().unwrap_or(""));
    plan.conditions.push(Condition {
        field: "bootcamp_id".to_string(),
        op: Comparison::Eq,
        value: Value::String(id.to_string()),
    });
    let page = repository::list(&state.pool, &REVIEWS, &plan).await?;
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
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = super::parse_id(&id, "Review")?;
    let review = Review::find(&state.pool, id)
        .await?
        .ok_or_else(|| super::not_found("Review", id))?;
    Ok(Json(json!({"success": true, "data": review})))
}

/// POST /api/v1/bootcamps/:id/reviews - users and admins only.
pub(crate) async fn create_for_bootcamp(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
    Json(data): Json<CreateReview>,
) -> Result<impl IntoResponse, ApiError> {
    authz::require_role(&principal, &[Role::User, Role::Admin])?;
    let id = super::parse_id(&id, "Bootcamp")?;
    Bootcamp::find(&state.pool, id)
        .await?
        .ok_or_else(|| super::not_found("Bootcamp", id))?;

    let review = Review::insert(&state.pool, id, principal.id, &data).await?;
    refresh_average_rating(&state, id).await;
    Ok((
        StatusCode::CREATED,
        Json(json!({"success": true, "data": review})),
    ))
}

/// PUT /:id - owner or admin.
async fn update(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
    Json(data): Json<UpdateReview>,
) -> Result<impl IntoResponse, ApiError> {
    let id = super::parse_id(&id, "Review")?;
    let existing = Review::find(&state.pool, id)
        .await?
        .ok_or_else(|| super::not_found("Review", id))?;
    authz::require_owner(existing.owner_id, &principal)?;

    let review = Review::update(&state.pool, id, &data).await?;
    refresh_average_rating(&state, existing.bootcamp_id).await;
    Ok(Json(json!({"success": true, "data": review})))
}

/// DELETE /:id - owner or admin.
async fn remove(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = super::parse_id(&id, "Review")?;
    let existing = Review::find(&state.pool, id)
        .await?
        .ok_or_else(|| super::not_found("Review", id))?;
    authz::require_owner(existing.owner_id, &principal)?;

    Review::delete(&state.pool, id).await?;
    refresh_average_rating(&state, existing.bootcamp_id).await;
    Ok(Json(json!({"success": true, "data": {}})))
}

/// Same policy as the course cost rollup: log and move on.
async fn refresh_average_rating(state: &AppState, bootcamp_id: uuid::Uuid) {
    if let Err(err) = Review::recompute_average_rating(&state.pool, bootcamp_id).await {
        tracing::warn!(
            "failed to refresh average rating for bootcamp {}: {}",
            bootcamp_id,
            err
        );
    }
}
