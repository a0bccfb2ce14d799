use thiserror::Error;

pub mod gemini;

/// Failure of a single summarization call.
#[derive(Debug, Error)]
pub enum SummarizerError {
    /// Endpoint answered with a non-success status.
    #[error("LLM API error {status}: {body}")]
    Upstream { status: u16, body: String },

    /// Success status, but the summary text could not be located in the body.
    #[error("Invalid LLM response format: {0}")]
    MalformedResponse(String),

    /// No HTTP response at all (connection failure, timeout, ...).
    #[error("LLM request failed: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for SummarizerError {
    fn from(error: reqwest::Error) -> Self {
        SummarizerError::Transport(error.to_string())
    }
}

/// Core trait for LLM providers.
#[async_trait::async_trait]
pub trait LlmProvider: Send + Sync {
    /// Send `prompt` in a single request and return the model's text, trimmed.
    async fn summarize(&self, prompt: &str) -> Result<String, SummarizerError>;
}
