use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

const BUILTIN_PROMPT: &str = include_str!("../../prompts/prediction_prompt.txt");

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Gemini API not configured or key missing.")]
    NotConfigured,
    #[error("Prompt template not loaded")]
    PromptMissing,
    #[error("AI is currently busy (Rate Limit Exceeded). Please try again in a minute.")]
    RateLimited,
    #[error("Empty response from AI")]
    EmptyResponse,
    #[error("AI Generation failed: {0}")]
    Upstream(String),
    #[error("AI Generation failed: response was not valid JSON ({0})")]
    InvalidJson(#[from] serde_json::Error),
}

impl From<reqwest::Error> for GenerationError {
    fn from(e: reqwest::Error) -> Self {
        GenerationError::Upstream(e.to_string())
    }
}

/// Produces a structured betting prediction for a fixture
#[async_trait]
pub trait PredictionGenerator: Send + Sync {
    async fn generate(
        &self,
        home: &str,
        away: &str,
        league: &str,
    ) -> Result<Value, GenerationError>;

    /// Round-trip a trivial prompt to prove the model is reachable
    async fn ping(&self) -> Result<String, GenerationError>;
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

/// Load the prompt template from disk, falling back to the bundled one
pub fn load_prompt(path: &Path) -> String {
    match std::fs::read_to_string(path) {
        Ok(template) => template,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Using bundled prompt template");
            BUILTIN_PROMPT.to_string()
        }
    }
}

pub fn render_prompt(template: &str, home: &str, away: &str, league: &str) -> String {
    template
        .replace("{home}", home)
        .replace("{away}", away)
        .replace("{league}", league)
}

/// Models like to wrap JSON answers in Markdown fences
pub fn strip_code_fences(text: &str) -> &str {
    let mut clean = text.trim();
    if let Some(rest) = clean.strip_prefix("```json") {
        clean = rest;
    } else if let Some(rest) = clean.strip_prefix("```") {
        clean = rest;
    }
    if let Some(rest) = clean.strip_suffix("```") {
        clean = rest;
    }
    clean.trim()
}

pub struct GeminiClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    prompt_template: String,
}

impl GeminiClient {
    pub fn new(
        api_key: Option<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
        prompt_template: String,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let api_key = api_key.filter(|k| !k.trim().is_empty());
        if api_key.is_none() {
            tracing::warn!("GEMINI_API_KEY not set, predictions are disabled");
        }
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build Gemini HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            model: model.into(),
            prompt_template,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn generate_text(&self, prompt: &str) -> Result<String, GenerationError> {
        let api_key = self.api_key.as_deref().ok_or(GenerationError::NotConfigured)?;
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );

        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
        };

        let response = self
            .client
            .post(&url)
            .query(&[("key", api_key)])
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(GenerationError::RateLimited);
        }
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, detail = %detail, "Gemini request failed");
            return Err(GenerationError::Upstream(format!("{} {}", status, detail)));
        }

        let parsed: GenerateResponse = response.json().await?;
        let text: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().map(|p| p.text).collect::<String>())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(GenerationError::EmptyResponse);
        }
        Ok(text)
    }
}

#[async_trait]
impl PredictionGenerator for GeminiClient {
    async fn generate(
        &self,
        home: &str,
        away: &str,
        league: &str,
    ) -> Result<Value, GenerationError> {
        if !self.is_configured() {
            return Err(GenerationError::NotConfigured);
        }
        if self.prompt_template.trim().is_empty() {
            return Err(GenerationError::PromptMissing);
        }

        let prompt = render_prompt(&self.prompt_template, home, away, league);
        let text = self.generate_text(&prompt).await?;
        let prediction: Value = serde_json::from_str(strip_code_fences(&text))?;

        tracing::info!(home, away, league, model = %self.model, "Prediction generated");
        Ok(prediction)
    }

    async fn ping(&self) -> Result<String, GenerationError> {
        self.generate_text("Say \"Hello, API is working!\"").await
    }
}
