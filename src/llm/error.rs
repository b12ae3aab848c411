use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("could not reach Ollama at {url}: {source}")] Unreachable {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("model '{0}' not found, try `ollama pull {0}`")] ModelNotFound(String),
    #[error("server returned {status}: {body}")] Status {
        status: u16,
        body: String,
    },
    #[error("request failed: {0}")] Request(#[source] reqwest::Error),
    #[error("invalid response payload: {0}")] Decode(#[from] serde_json::Error),
    #[error("stream interrupted: {0}")] Stream(String),
    #[error("embedding response was empty")]
    EmptyEmbedding,
    #[error("invalid configuration: {0}")] InvalidConfig(String),
    #[error("could not write output: {0}")] Output(#[from] std::io::Error),
}

impl LlmError {
    pub fn transport(url: &str, err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            LlmError::Unreachable { url: url.to_string(), source: err }
        } else if err.is_decode() {
            LlmError::Stream(err.to_string())
        } else {
            LlmError::Request(err)
        }
    }

    pub fn from_status(status: StatusCode, body: String, model: &str) -> Self {
        if status == StatusCode::NOT_FOUND {
            LlmError::ModelNotFound(model.to_string())
        } else {
            LlmError::Status { status: status.as_u16(), body }
        }
    }

    /// Whether repeating the same call could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            LlmError::Unreachable { .. } | LlmError::Stream(_) => true,
            LlmError::Status { status, .. } => *status == 429 || *status >= 500,
            LlmError::Request(e) => e.is_timeout() || e.is_connect(),
            LlmError::ModelNotFound(_) |
            LlmError::Decode(_) |
            LlmError::EmptyEmbedding |
            LlmError::InvalidConfig(_) |
            LlmError::Output(_) => false,
        }
    }
}
