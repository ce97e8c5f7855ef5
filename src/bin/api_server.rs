// API Server Binary Entry Point
//
// Purpose: Start the Axum server for recommendations and waste calculation
// Usage: cargo run --bin api_server

use pouch_advisor::config::ServerConfig;
use pouch_advisor::{create_router, AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; real environment variables still apply
    let dotenv_loaded = dotenvy::dotenv().is_ok();

    // Initialize tracing (structured logging)
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    // Default log level: info for our crate, warn for others
                    "pouch_advisor=info,tower_http=debug,axum=debug,warn".into()
                }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting API server...");
    if dotenv_loaded {
        tracing::info!("Loaded environment from .env");
    }

    let config = ServerConfig::from_env()?;

    tracing::info!("Configuration:");
    tracing::info!("  ADDRESS: {}", config.socket_addr());
    tracing::info!("  GEMINI_MODEL: {}", config.gemini.model);
    tracing::info!("  GEMINI_API_KEY: {}", if config.gemini.api_key.is_some() { "set" } else { "unset" });
    tracing::info!("  SESSION_TTL_SECS: {}", config.session_ttl.as_secs());
    tracing::info!("  SESSION_CAPACITY: {}", config.session_capacity);
    tracing::info!("  STATIC_DIR: {}", config.static_dir);

    let state = AppState::new(&config)?;

    // Create router with all endpoints and middleware
    let app = create_router(state);

    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .await?;

    Ok(())
}
