use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use tracing::info;

use lifeguide_types::api::ProfileRequest;
use lifeguide_types::models::UserProfile;

use crate::conversations::required_user_id;
use crate::error::ApiError;
use crate::state::AppState;

/// POST /api/profile: create or merge-update the user's profile.
pub async fn update_profile(
    State(state): State<AppState>,
    payload: Result<Json<ProfileRequest>, JsonRejection>,
) -> Result<Json<UserProfile>, ApiError> {
    let Json(req) = payload?;
    let user_id = required_user_id(req.user_id)?;

    let profile = state.store.upsert_user_profile(&user_id, req.update)?;
    info!("Profile updated for {}", user_id);
    Ok(Json(profile))
}
