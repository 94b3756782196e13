use axum::{Json, extract::State};

use lifeguide_types::api::StatusResponse;

use crate::state::AppState;

/// GET /api/status
pub async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "ok".into(),
        demo_mode: state.assistant.is_demo(),
        connected_clients: state.dispatcher.client_count().await,
    })
}
