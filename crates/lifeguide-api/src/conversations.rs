use axum::{
    Json,
    extract::{Path, Query, State},
};
use uuid::Uuid;

use lifeguide_types::api::UserIdQuery;
use lifeguide_types::models::{Conversation, Message};

use crate::error::ApiError;
use crate::state::AppState;

/// GET /api/conversations?userId=
pub async fn list_conversations(
    State(state): State<AppState>,
    Query(query): Query<UserIdQuery>,
) -> Result<Json<Vec<Conversation>>, ApiError> {
    let user_id = required_user_id(query.user_id)?;
    Ok(Json(state.store.get_conversations_by_user(&user_id)?))
}

/// GET /api/conversations/{id}/messages
///
/// Unknown or malformed ids yield `[]`.
pub async fn list_messages(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Message>>, ApiError> {
    let Ok(conversation_id) = id.parse::<Uuid>() else {
        return Ok(Json(vec![]));
    };
    Ok(Json(state.store.get_messages_by_conversation(conversation_id)?))
}

pub(crate) fn required_user_id(user_id: Option<String>) -> Result<String, ApiError> {
    user_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::BadRequest("User ID required".into()))
}
