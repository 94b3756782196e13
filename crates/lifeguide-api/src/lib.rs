pub mod chat;
pub mod conversations;
pub mod error;
pub mod profile;
pub mod reports;
pub mod state;
pub mod status;
pub mod users;

use axum::{
    Router,
    routing::{get, post},
};

pub use error::ApiError;
pub use state::{AppState, AppStateInner};

/// All `/api` routes.
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/chat", post(chat::send_chat))
        .route("/api/conversations", get(conversations::list_conversations))
        .route("/api/conversations/{id}/messages", get(conversations::list_messages))
        .route("/api/reports/generate", post(reports::generate_report))
        .route("/api/reports", get(reports::list_reports))
        .route("/api/profile", post(profile::update_profile))
        .route("/api/users", post(users::register))
        .route("/api/users/{id}", get(users::get_user))
        .route("/api/auth/login", post(users::login))
        .route("/api/status", get(status::status))
        .with_state(state)
}
