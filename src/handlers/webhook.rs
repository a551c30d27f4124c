// handlers/webhook.rs - /api/v1/webhook
//
// The email provider posts urlencoded form bodies, so this is the one
// route group that does not speak JSON on the way in. Delivery goes
// through the MailboxStore trait; which backend sits behind it is the
// caller's business.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use serde_json::json;

use crate::error::ApiError;
use crate::mail::InboundEmailForm;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/email", post(receive_email))
        .route("/email/:recipient", get(emails_for_recipient))
}

/// POST /email - store an inbound message as delivered by the provider.
async fn receive_email(
    State(state): State<AppState>,
    Form(form): Form<InboundEmailForm>,
) -> Result<impl IntoResponse, ApiError> {
    tracing::info!("inbound email for {} from {}", form.recipient, form.sender);
    let email = state.mailbox.store(form).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({"success": true, "data": email})),
    ))
}

/// GET /email/:recipient - stored messages for one address, oldest first.
async fn emails_for_recipient(
    State(state): State<AppState>,
    Path(recipient): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let emails = state.mailbox.for_recipient(&recipient).await?;
    Ok(Json(json!({
        "success": true,
        "count": emails.len(),
        "data": emails,
    })))
}
