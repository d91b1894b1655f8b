//! Nutrition coach — thin client for the generative-AI text endpoint.
//!
//! Prompt in, text out. Anything that goes wrong on the wire collapses to
//! the service-unavailable path at the API layer; the coach is an optional
//! feature and never affects ledger or achievement state.

use serde::Deserialize;
use thiserror::Error;

use crate::config::CoachConfig;

const API_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 1024;

const SYSTEM_PROMPT: &str = "You are a friendly nutrition coach inside a \
meal-tracking app. Answer briefly and practically. You are not a medical \
professional and should say so when asked for medical advice.";

/// Errors from the coach endpoint.
#[derive(Debug, Error)]
pub enum CoachError {
    #[error("API key not configured")]
    NoApiKey,

    #[error("network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("failed to parse response: {0}")]
    Parse(String),
}

#[derive(Deserialize)]
struct ApiResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: String,
}

/// Text-completion client.
#[derive(Clone)]
pub struct CoachClient {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
}

impl CoachClient {
    /// Build a client from config. Returns `None` when no API key is
    /// injected — the coach endpoint then answers 503.
    pub fn new(config: &CoachConfig, api_key: Option<String>) -> Option<Self> {
        let api_key = api_key?;
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .ok()?;
        Some(Self {
            client,
            api_url: config.api_url.clone(),
            api_key,
            model: config.model.clone(),
        })
    }

    /// Send a completion request and return the reply text.
    pub async fn complete(&self, prompt: &str) -> Result<String, CoachError> {
        let body = serde_json::json!({
            "model": self.model,
            "max_tokens": MAX_TOKENS,
            "system": SYSTEM_PROMPT,
            "messages": [
                { "role": "user", "content": prompt }
            ],
        });

        let response = self
            .client
            .post(format!("{}/messages", self.api_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| CoachError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(CoachError::Api { status, message });
        }

        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| CoachError::Parse(e.to_string()))?;

        api_response
            .content
            .into_iter()
            .map(|block| block.text)
            .reduce(|mut acc, text| {
                acc.push_str(&text);
                acc
            })
            .filter(|text| !text.is_empty())
            .ok_or_else(|| CoachError::Parse("empty completion".to_string()))
    }
}
