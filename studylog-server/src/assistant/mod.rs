//! Generative-text backend used by the chat endpoint.

pub mod prompt;

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::server::AssistantConfig;

#[derive(Debug, thiserror::Error)]
pub enum AssistantError {
    #[error("assistant request failed: {0}")]
    Http(String),
    #[error("assistant returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("assistant response parse failed: {0}")]
    Parse(String),
    #[error("assistant returned no text")]
    Empty,
}

/// Takes a fully rendered prompt and returns the model's reply.
#[async_trait]
pub trait Assistant: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, AssistantError>;
}

/// Google Generative Language API (`models/{model}:generateContent`).
pub struct GeminiAssistant {
    client: reqwest::Client,
    url: String,
    api_key: String,
    model: String,
}

impl GeminiAssistant {
    pub fn new(cfg: &AssistantConfig) -> Result<Self, AssistantError> {
        let api_key = cfg
            .api_key
            .clone()
            .ok_or_else(|| AssistantError::Http("no API key configured".into()))?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()
            .map_err(|e| AssistantError::Http(format!("client build failed: {e}")))?;
        let url = format!(
            "{}/models/{}:generateContent",
            cfg.base_url.trim_end_matches('/'),
            cfg.model
        );
        Ok(Self {
            client,
            url,
            api_key,
            model: cfg.model.clone(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<PartOut<'a>>,
}

#[derive(Serialize)]
struct PartOut<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<PartIn>,
}

#[derive(Deserialize)]
struct PartIn {
    #[serde(default)]
    text: Option<String>,
}

/// Concatenated text parts of the first candidate.
fn first_candidate_text(resp: GenerateResponse) -> Option<String> {
    let content = resp.candidates.into_iter().next()?.content?;
    let text: String = content.parts.into_iter().filter_map(|p| p.text).collect();
    (!text.trim().is_empty()).then_some(text)
}

#[async_trait]
impl Assistant for GeminiAssistant {
    async fn generate(&self, prompt: &str) -> Result<String, AssistantError> {
        let req = GenerateRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![PartOut { text: prompt }],
            }],
        };

        let start = Instant::now();
        let resp = self
            .client
            .post(&self.url)
            .header("x-goog-api-key", &self.api_key)
            .json(&req)
            .send()
            .await
            .map_err(|e| AssistantError::Http(e.to_string()))?;
        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(AssistantError::Status { status, body });
        }
        let parsed: GenerateResponse = resp
            .json()
            .await
            .map_err(|e| AssistantError::Parse(e.to_string()))?;
        debug!(
            model = %self.model,
            duration_ms = start.elapsed().as_millis() as u64,
            "assistant reply received"
        );
        first_candidate_text(parsed).ok_or(AssistantError::Empty)
    }
}
