use crate::api::{espn_api, gemini_api};
use crate::utils::grading::DEFAULT_CONCURRENCY;
use std::env;
use std::time::Duration;

const DEFAULT_DATABASE_URL: &str = "sqlite://safepick.db?mode=rwc";
const DEFAULT_PROMPT_PATH: &str = "prompts/prediction_prompt.txt";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,

    // LLM
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub prompt_path: String,

    // Scoreboard feed
    pub espn_base_url: String,
    pub http_timeout_secs: u64,

    // Grading
    pub grading_concurrency: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.into(),
            host: "0.0.0.0".into(),
            port: 5000,
            gemini_api_key: None,
            gemini_model: gemini_api::DEFAULT_MODEL.into(),
            gemini_base_url: gemini_api::DEFAULT_BASE_URL.into(),
            prompt_path: DEFAULT_PROMPT_PATH.into(),
            espn_base_url: espn_api::DEFAULT_BASE_URL.into(),
            http_timeout_secs: 10,
            grading_concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

impl AppConfig {
    /// Read settings from the environment. Call `dotenv` first to pick up `.env`.
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();

        Ok(Self {
            database_url: env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            host: env::var("HOST").unwrap_or(defaults.host),
            port: env::var("PORT")
                .unwrap_or_else(|_| defaults.port.to_string())
                .parse()
                .map_err(|e| anyhow::anyhow!("PORT must be a port number: {}", e))?,

            gemini_api_key: env::var("GEMINI_API_KEY").ok().filter(|k| !k.is_empty()),
            gemini_model: env::var("GEMINI_MODEL").unwrap_or(defaults.gemini_model),
            gemini_base_url: env::var("GEMINI_BASE_URL").unwrap_or(defaults.gemini_base_url),
            prompt_path: env::var("PROMPT_PATH").unwrap_or(defaults.prompt_path),

            espn_base_url: env::var("ESPN_BASE_URL").unwrap_or(defaults.espn_base_url),
            http_timeout_secs: env::var("HTTP_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.http_timeout_secs),

            grading_concurrency: env::var("GRADING_CONCURRENCY")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|n: &usize| *n > 0)
                .unwrap_or(defaults.grading_concurrency),
        })
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
