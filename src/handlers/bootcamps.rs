// handlers/bootcamps.rs - /api/v1/bootcamps
//
// Reads are public. Writes require a token and run through the ownership
// checks in authz; creation is additionally limited to one bootcamp per
// publisher. The nested course and review routes live here because they
// share the /:id prefix with the bootcamp routes.

use axum::body::Bytes;
use axum::extract::{Path, RawQuery, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::middleware::from_fn;
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::{Extension, Json, Router};
use serde_json::json;

use crate::authz::{self, Principal, Role};
use crate::db::models::bootcamp::{Bootcamp, CreateBootcamp, UpdateBootcamp, BOOTCAMPS};
use crate::db::repository;
use crate::error::ApiError;
use crate::geo::GeoError;
use crate::middleware::protect;
use crate::query::QueryPlan;
use crate::state::AppState;

use super::{courses, reviews};

pub fn routes() -> Router<AppState> {
    let public = Router::new()
        .route("/", get(list))
        .route("/:id", get(get_one))
        .route("/radius/:zipcode/:distance", get(in_radius))
        .route("/:id/courses", get(courses::list_for_bootcamp))
        .route("/:id/reviews", get(reviews::list_for_bootcamp));
    let protected = Router::new()
        .route("/", post(create))
        .route("/:id", put(update).delete(remove))
        .route("/:id/photo", put(upload_photo))
        .route("/:id/courses", post(courses::create_for_bootcamp))
        .route("/:id/reviews", post(reviews::create_for_bootcamp))
        .route_layer(from_fn(protect));
    public.merge(protected)
}

/// GET / - filtered, projected, sorted, paginated listing.
async fn list(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Result<impl IntoResponse, ApiError> {
    let plan = QueryPlan::from_query(query.as_deref().unwrap_or(""));
    let page = repository::list(&state.pool, &BOOTCAMPS, &plan).await?;
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
    let id = super::parse_id(&id, "Bootcamp")?;
    let bootcamp = Bootcamp::find(&state.pool, id)
        .await?
        .ok_or_else(|| super::not_found("Bootcamp", id))?;
    Ok(Json(json!({"success": true, "data": bootcamp})))
}

/// POST / - publishers and admins only, and a publisher may only hold one.
async fn create(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(data): Json<CreateBootcamp>,
) -> Result<impl IntoResponse, ApiError> {
    authz::require_role(&principal, &[Role::Publisher, Role::Admin])?;
    let already_owns = Bootcamp::owner_has_bootcamp(&state.pool, principal.id).await?;
    authz::require_first_publication(&principal, already_owns)?;

    let point = match data.address.as_deref() {
        Some(address) if !address.trim().is_empty() => {
            match state.geocoder.geocode(address).await {
                Ok(point) => Some(point),
                // Without a geocoder the address is stored as given.
                Err(GeoError::NotConfigured) => None,
                Err(err) => return Err(err.into()),
            }
        }
        _ => None,
    };

    let bootcamp = Bootcamp::insert(&state.pool, principal.id, &data, point).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({"success": true, "data": bootcamp})),
    ))
}

/// PUT /:id - owner or admin. The stored coordinates are left alone even
/// when the address changes.
async fn update(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
    Json(data): Json<UpdateBootcamp>,
) -> Result<impl IntoResponse, ApiError> {
    let id = super::parse_id(&id, "Bootcamp")?;
    let existing = Bootcamp::find(&state.pool, id)
        .await?
        .ok_or_else(|| super::not_found("Bootcamp", id))?;
    authz::require_owner(existing.owner_id, &principal)?;

    let bootcamp = Bootcamp::update(&state.pool, id, &data).await?;
    Ok(Json(json!({"success": true, "data": bootcamp})))
}

/// DELETE /:id - owner or admin. Courses and reviews go with it.
async fn remove(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = super::parse_id(&id, "Bootcamp")?;
    let existing = Bootcamp::find(&state.pool, id)
        .await?
        .ok_or_else(|| super::not_found("Bootcamp", id))?;
    authz::require_owner(existing.owner_id, &principal)?;

    Bootcamp::delete(&state.pool, id).await?;
    Ok(Json(json!({"success": true, "data": {}})))
}

/// GET /radius/:zipcode/:distance - bootcamps within `distance` miles of
/// the geocoded zipcode.
async fn in_radius(
    State(state): State<AppState>,
    Path((zipcode, distance)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let miles: f64 = distance
        .parse()
        .map_err(|_| ApiError::bad_request("Distance must be a number"))?;
    let center = state.geocoder.geocode(&zipcode).await?;
    let bootcamps = Bootcamp::within_radius(&state.pool, center, miles).await?;
    Ok(Json(json!({
        "success": true,
        "count": bootcamps.len(),
        "data": bootcamps,
    })))
}

/// PUT /:id/photo - owner or admin uploads the raw image bytes.
async fn upload_photo(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let id = super::parse_id(&id, "Bootcamp")?;
    let existing = Bootcamp::find(&state.pool, id)
        .await?
        .ok_or_else(|| super::not_found("Bootcamp", id))?;
    authz::require_owner(existing.owner_id, &principal)?;

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok());
    let filename = state.photos.save(id, content_type, &body).await?;
    Bootcamp::set_photo(&state.pool, id, &filename).await?;
    Ok(Json(json!({"success": true, "data": filename})))
}
