pub mod api;
pub mod config;
pub mod db;
pub mod errors;
pub mod models;
pub mod utils;
pub mod web;

pub use api::*;
pub use models::*;
pub use utils::*;

use anyhow::Result;
use api::espn_api::EspnClient;
use api::gemini_api::{load_prompt, GeminiClient, PredictionGenerator};
use config::AppConfig;
use db::{PredictionStore, SqlStore};
use std::path::Path;
use std::sync::Arc;
use utils::grading::Grader;

/// Services shared by the web handlers and the CLI, built once at start-up
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub store: Arc<dyn PredictionStore>,
    pub espn: Arc<EspnClient>,
    pub generator: Arc<dyn PredictionGenerator>,
    pub grader: Arc<Grader>,
}

impl AppState {
    /// Connect to the database and construct the real clients
    pub async fn build(config: AppConfig) -> Result<Self> {
        let store: Arc<dyn PredictionStore> =
            Arc::new(SqlStore::connect(&config.database_url).await?);
        let espn = Arc::new(EspnClient::new(
            config.espn_base_url.as_str(),
            config.http_timeout(),
        )?);
        let generator: Arc<dyn PredictionGenerator> = Arc::new(GeminiClient::new(
            config.gemini_api_key.clone(),
            config.gemini_model.as_str(),
            config.gemini_base_url.as_str(),
            load_prompt(Path::new(&config.prompt_path)),
            config.http_timeout(),
        )?);
        let gateway: Arc<dyn ResultsGateway> = espn.clone();

        Ok(Self::from_parts(config, store, espn, generator, gateway))
    }

    /// Assemble from already-built services; grading goes through `gateway`
    pub fn from_parts(
        config: AppConfig,
        store: Arc<dyn PredictionStore>,
        espn: Arc<EspnClient>,
        generator: Arc<dyn PredictionGenerator>,
        gateway: Arc<dyn ResultsGateway>,
    ) -> Self {
        let grader = Arc::new(Grader::new(
            Arc::clone(&store),
            gateway,
            config.grading_concurrency,
        ));

        Self {
            config,
            store,
            espn,
            generator,
            grader,
        }
    }
}

/// Install the global tracing subscriber, honouring `RUST_LOG` (default `info`)
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}
