use crate::config::ClientSettings;
use crate::models::question::Difficulty;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, thiserror::Error)]
pub enum GenerationError {
    #[error("Generation backend timed out")]
    Timeout,

    #[error("Generation backend unreachable: {0}")]
    Transport(String),

    #[error("Generation backend returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Generation backend returned an empty response")]
    EmptyResponse,
}

/// Sends one prompt to the text-generation backend and returns its raw text.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(
        &self,
        prompt: &str,
        difficulty: Difficulty,
    ) -> Result<String, GenerationError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SamplingOptions {
    pub temperature: f32,
    pub top_p: f32,
    pub num_ctx: u32,
    pub repeat_penalty: f32,
}

impl SamplingOptions {
    pub fn for_difficulty(difficulty: Difficulty) -> Self {
        let temperature = match difficulty {
            Difficulty::Easy => 0.6,
            Difficulty::Medium => 0.75,
            Difficulty::Hard => 0.9,
        };
        Self {
            temperature,
            top_p: 0.9,
            num_ctx: 4096,
            repeat_penalty: 1.1,
        }
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: SamplingOptions,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

/// Client for an Ollama-compatible `/api/generate` endpoint.
#[derive(Clone)]
pub struct OllamaClient {
    client: Client,
    settings: ClientSettings,
}

impl OllamaClient {
    pub fn new(settings: ClientSettings, client: Client) -> Self {
        Self { client, settings }
    }

    /// Builds its own HTTP client with the configured connect timeout.
    pub fn from_settings(settings: ClientSettings) -> crate::error::Result<Self> {
        let client = Client::builder().connect_timeout(settings.timeout).build()?;
        Ok(Self::new(settings, client))
    }

    fn endpoint(&self) -> String {
        format!("{}/api/generate", self.settings.base_url.trim_end_matches('/'))
    }

    async fn send_once(
        &self,
        prompt: &str,
        difficulty: Difficulty,
    ) -> Result<String, GenerationError> {
        let body = GenerateRequest {
            model: &self.settings.model,
            prompt,
            stream: false,
            options: SamplingOptions::for_difficulty(difficulty),
        };

        let res = self
            .client
            .post(self.endpoint())
            .json(&body)
            .timeout(self.settings.timeout)
            .send()
            .await
            .map_err(classify)?;

        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            return Err(GenerationError::Status { status, body });
        }

        let parsed: GenerateResponse = res.json().await.map_err(classify)?;
        let text = parsed.response.trim();
        if text.is_empty() {
            return Err(GenerationError::EmptyResponse);
        }
        Ok(text.to_string())
    }
}

fn classify(err: reqwest::Error) -> GenerationError {
    if err.is_timeout() {
        GenerationError::Timeout
    } else {
        GenerationError::Transport(err.to_string())
    }
}

#[async_trait]
impl TextGenerator for OllamaClient {
    async fn generate(
        &self,
        prompt: &str,
        difficulty: Difficulty,
    ) -> Result<String, GenerationError> {
        let attempts = self.settings.max_attempts.max(1);
        let mut last_error = GenerationError::EmptyResponse;

        for attempt in 1..=attempts {
            match self.send_once(prompt, difficulty).await {
                Ok(text) => return Ok(text),
                Err(GenerationError::Timeout) => {
                    tracing::warn!(attempt, "Generation backend timeout");
                    last_error = GenerationError::Timeout;
                }
                Err(e) => {
                    tracing::warn!(attempt, error = %e, "Generation backend request failed");
                    last_error = e;
                }
            }
            if attempt < attempts {
                tokio::time::sleep(self.settings.retry_delay).await;
            }
        }

        Err(last_error)
    }
}
