use anyhow::{Context, Result};
use safepick::config::AppConfig;
use safepick::web::create_router;
use safepick::{init_tracing, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize logging
    init_tracing();

    let config = AppConfig::from_env()?;
    let state = AppState::build(config.clone())
        .await
        .context("Failed to initialise application state")?;

    if config.gemini_api_key.is_none() {
        tracing::warn!("GEMINI_API_KEY not set; prediction endpoints will return errors");
    }

    let app = create_router(state);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!("Starting web server at http://{}", addr);
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
