use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::{LlmProvider, SummarizerError};
use common::LlmConfig;

/// Gemini `generateContent` client.
pub struct GeminiProvider {
    endpoint: String,
    api_key: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl GeminiProvider {
    pub fn new(
        api_url: impl AsRef<str>,
        api_key: impl Into<String>,
        model: impl AsRef<str>,
    ) -> Self {
        Self {
            endpoint: format!(
                "{}/v1beta/models/{}:generateContent",
                api_url.as_ref().trim_end_matches('/'),
                model.as_ref()
            ),
            api_key: api_key.into(),
            timeout: Duration::from_secs(60),
            client: reqwest::Client::new(),
        }
    }

    pub fn from_config(config: &LlmConfig) -> Self {
        Self::new(&config.api_url, config.api_key(), &config.model)
            .with_timeout(config.timeout_seconds)
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout = Duration::from_secs(timeout_secs);
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait::async_trait]
impl LlmProvider for GeminiProvider {
    async fn summarize(&self, prompt: &str) -> Result<String, SummarizerError> {
        let req_body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: Some(prompt.to_string()),
                }],
            }],
        };

        let response = tokio::time::timeout(
            self.timeout,
            self.client
                .post(&self.endpoint)
                .query(&[("key", self.api_key.as_str())])
                .header("Content-Type", "application/json")
                .json(&req_body)
                .send(),
        )
        .await
        .map_err(|_| SummarizerError::Transport("LLM request timed out".to_string()))??;

        let status = response.status();
        let body = response.text().await?;
        debug!(status = status.as_u16(), bytes = body.len(), "LLM response received");

        if !status.is_success() {
            return Err(SummarizerError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        parse_summary(&body)
    }
}

/// Pull `candidates[0].content.parts[0].text` out of a response body, trimmed.
pub fn parse_summary(body: &str) -> Result<String, SummarizerError> {
    let resp: GenerateContentResponse = serde_json::from_str(body)
        .map_err(|e| SummarizerError::MalformedResponse(e.to_string()))?;

    resp.candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .and_then(|c| c.parts.into_iter().next())
        .and_then(|p| p.text)
        .map(|text| text.trim().to_string())
        .ok_or_else(|| {
            SummarizerError::MalformedResponse(
                "missing candidates[0].content.parts[0].text".to_string(),
            )
        })
        .and_then(|text| {
            if text.is_empty() {
                Err(SummarizerError::MalformedResponse("empty summary text".to_string()))
            } else {
                Ok(text)
            }
        })
}

// Gemini API request/response structures
#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}
