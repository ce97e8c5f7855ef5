//! Generative-AI text completion client
//!
//! [`TextGenerator`] is the seam the HTTP handlers depend on; [`GeminiClient`]
//! implements it against the Gemini `generateContent` REST endpoint.
//!
//! Retry policy: up to 2 retries with linear backoff (1s, 2s) for 5xx
//! responses and connection failures. 4xx responses and timeouts are not
//! retried.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

pub const DEFAULT_MODEL: &str = "gemini-1.5-pro";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

const MAX_RETRIES: u32 = 2;
const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Error)]
pub enum AiError {
    #[error("No API key configured for the AI provider")]
    MissingApiKey,

    #[error("AI provider request failed: {0}")]
    Transport(String),

    #[error("AI provider timed out after {}s", duration.as_secs())]
    Timeout { duration: Duration },

    #[error("AI provider returned {status}: {message}")]
    Provider { status: u16, message: String },

    #[error("AI provider returned no text ({0})")]
    EmptyResponse(String),

    #[error("Unexpected AI provider response: {0}")]
    MalformedResponse(String),
}

/// Single-shot text completion
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, AiError>;
}

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
    pub temperature: Option<f32>,
    pub max_output_tokens: Option<u32>,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(60),
            temperature: None,
            max_output_tokens: None,
        }
    }
}

#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    config: GeminiConfig,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Result<Self, AiError> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| AiError::Transport(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }

    pub fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, AiError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or(AiError::MissingApiKey)?;

        let body = GenerateContentRequest::new(prompt, &self.config);
        let url = self.endpoint();
        let mut attempt = 0;

        loop {
            attempt += 1;
            debug!(model = %self.config.model, attempt, prompt_chars = prompt.len(), "Calling Gemini");

            let sent = self
                .client
                .post(&url)
                .header("x-goog-api-key", api_key)
                .timeout(self.config.timeout)
                .json(&body)
                .send()
                .await;

            let response = match sent {
                Ok(response) => response,
                Err(e) if e.is_timeout() => {
                    return Err(AiError::Timeout { duration: self.config.timeout });
                }
                Err(e) => {
                    if attempt <= MAX_RETRIES {
                        warn!(attempt, error = %e, "Gemini request failed, will retry");
                        tokio::time::sleep(INITIAL_BACKOFF * attempt).await;
                        continue;
                    }
                    return Err(AiError::Transport(e.without_url().to_string()));
                }
            };

            let status = response.status();
            let text = response
                .text()
                .await
                .map_err(|e| AiError::Transport(e.without_url().to_string()))?;

            if status.is_server_error() && attempt <= MAX_RETRIES {
                warn!(attempt, status = status.as_u16(), "Gemini server error, will retry");
                tokio::time::sleep(INITIAL_BACKOFF * attempt).await;
                continue;
            }
            if !status.is_success() {
                return Err(provider_error(status, &text));
            }

            return parse_generated_text(&text);
        }
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<TextPart<'a>>,
}

#[derive(Debug, Serialize)]
struct TextPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

impl<'a> GenerateContentRequest<'a> {
    fn new(prompt: &'a str, config: &GeminiConfig) -> Self {
        let generation_config = if config.temperature.is_some() || config.max_output_tokens.is_some() {
            Some(GenerationConfig {
                temperature: config.temperature,
                max_output_tokens: config.max_output_tokens,
            })
        } else {
            None
        };
        Self {
            contents: vec![Content {
                role: "user",
                parts: vec![TextPart { text: prompt }],
            }],
            generation_config,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Concatenate the text parts of the first candidate
fn parse_generated_text(body: &str) -> Result<String, AiError> {
    let response: GenerateContentResponse =
        serde_json::from_str(body).map_err(|e| AiError::MalformedResponse(e.to_string()))?;

    let Some(candidate) = response.candidates.into_iter().next() else {
        let reason = response
            .prompt_feedback
            .and_then(|f| f.block_reason)
            .map(|r| format!("prompt blocked: {}", r))
            .unwrap_or_else(|| "no candidates".to_string());
        return Err(AiError::EmptyResponse(reason));
    };

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        let reason = candidate
            .finish_reason
            .map(|r| format!("finish reason: {}", r))
            .unwrap_or_else(|| "empty candidate".to_string());
        return Err(AiError::EmptyResponse(reason));
    }
    Ok(text)
}

fn provider_error(status: StatusCode, body: &str) -> AiError {
    let message = serde_json::from_str::<ErrorEnvelope>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| status.canonical_reason().unwrap_or("unknown error").to_string());
    AiError::Provider {
        status: status.as_u16(),
        message,
    }
}
