use tracing::info;

use lifeguide_server::config::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lifeguide=debug,tower_http=debug".into()),
        )
        .init();

    let config = ServerConfig::from_env()?;
    let state = lifeguide_server::build_state(&config)?;
    let app = lifeguide_server::app(state, config.static_dir.as_deref());

    info!("LifeGuide server listening on {}", config.addr);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
