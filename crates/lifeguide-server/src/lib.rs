pub mod config;

use std::path::Path;
use std::sync::Arc;

use axum::{
    Router,
    extract::{State, WebSocketUpgrade},
    response::IntoResponse,
    routing::get,
};
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use tracing::info;

use lifeguide_api::{AppState, AppStateInner};
use lifeguide_assistant::{Assistant, DemoResponder, OpenAiClient};
use lifeguide_gateway::connection;

use crate::config::{ConfigError, ServerConfig};

/// Pick the response generator the configuration asks for.
pub fn build_assistant(config: &ServerConfig) -> anyhow::Result<Assistant> {
    if config.demo_mode {
        info!("Demo mode: answering with canned responses");
        return Ok(Assistant::Demo(DemoResponder::new()));
    }

    let api_key = config.openai_api_key.clone().ok_or(ConfigError::MissingApiKey)?;
    let client = OpenAiClient::new(api_key, config.openai_base_url.clone(), config.openai_model.clone())?;
    info!("Using completion model {} at {}", client.model(), config.openai_base_url);
    Ok(Assistant::OpenAi(client))
}

pub fn build_state(config: &ServerConfig) -> anyhow::Result<AppState> {
    let store = lifeguide_db::open(config.db_path.as_deref())?;
    let assistant = build_assistant(config)?;
    Ok(Arc::new(AppStateInner::new(store, assistant)))
}

/// REST routes, the `/ws` gateway and (optionally) the static web client.
pub fn app(state: AppState, static_dir: Option<&Path>) -> Router {
    let ws_route = Router::new()
        .route("/ws", get(ws_upgrade))
        .with_state(state.clone());

    let mut app = Router::new()
        .merge(lifeguide_api::routes(state))
        .merge(ws_route);

    if let Some(dir) = static_dir {
        info!("Serving web client from {}", dir.display());
        app = app.fallback_service(ServeDir::new(dir).fallback(ServeFile::new(dir.join("index.html"))));
    }

    app.layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

async fn ws_upgrade(State(state): State<AppState>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(move |socket| {
        connection::handle_connection(socket, state.dispatcher.clone(), state.relay())
    })
}
