use axum::{Json, extract::State, extract::rejection::JsonRejection};
use tracing::debug;

use lifeguide_types::api::ChatRequest;
use lifeguide_types::models::AiResponse;

use crate::error::ApiError;
use crate::state::AppState;

/// POST /api/chat
///
/// One-shot answer without history. Nothing is stored.
pub async fn send_chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<AiResponse>, ApiError> {
    let Json(req) = payload.map_err(|rejection| ApiError::Validation {
        message: "Failed to process chat message".into(),
        details: rejection.body_text(),
    })?;
    req.validate().map_err(|details| ApiError::Validation {
        message: "Failed to process chat message".into(),
        details,
    })?;

    debug!("REST chat in {} mode", req.mode);
    let response = state.assistant.respond(req.mode, &req.message, &[]).await;
    Ok(Json(response))
}
