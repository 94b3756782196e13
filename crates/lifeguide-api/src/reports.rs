use axum::{
    Json,
    extract::{Query, State, rejection::JsonRejection},
};

use lifeguide_assistant::ReportContext;
use lifeguide_types::api::{GenerateReportRequest, UserIdQuery};
use lifeguide_types::models::{AiReport, NewReport};

use crate::conversations::required_user_id;
use crate::error::ApiError;
use crate::state::AppState;

/// POST /api/reports/generate
///
/// Builds a report from the user's profile and recent conversations, then
/// stores it.
pub async fn generate_report(
    State(state): State<AppState>,
    payload: Result<Json<GenerateReportRequest>, JsonRejection>,
) -> Result<Json<AiReport>, ApiError> {
    let Json(req) = payload?;
    let (Some(user_id), Some(report_type)) = (req.user_id.filter(|id| !id.is_empty()), req.report_type)
    else {
        return Err(ApiError::BadRequest("User ID and report type required".into()));
    };

    let profile = state.store.get_user_profile(&user_id)?;
    let conversations = state.store.get_conversations_by_user(&user_id)?;
    let context = ReportContext::new(profile, conversations);

    let generated = state.assistant.generate_report(report_type, &context).await;

    let report = state.store.create_report(
        &user_id,
        NewReport {
            report_type,
            title: generated.title,
            content: generated.content,
        },
    )?;

    Ok(Json(report))
}

/// GET /api/reports?userId= (newest first)
pub async fn list_reports(
    State(state): State<AppState>,
    Query(query): Query<UserIdQuery>,
) -> Result<Json<Vec<AiReport>>, ApiError> {
    let user_id = required_user_id(query.user_id)?;
    Ok(Json(state.store.get_reports_by_user(&user_id)?))
}
