pub mod chat;
pub mod embedding;
pub mod error;
pub mod mock;

pub use error::LlmError;

use serde::Serialize;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";
pub const DEFAULT_MODEL: &str = "llama3";

#[derive(Debug, Clone, Default)]
pub struct LlmConfig {
    pub base_url: Option<String>,
    pub completion_model: Option<String>,
    pub embedding_model: Option<String>,
    pub request_timeout: Option<Duration>,
}

impl LlmConfig {
    pub fn base_url(&self) -> String {
        self.base_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/')
            .to_string()
    }

    pub fn completion_model(&self) -> String {
        self.completion_model.clone().unwrap_or_else(|| DEFAULT_MODEL.to_string())
    }

    /// Falls back to the completion model, mirroring the `ollama` client default.
    pub fn embedding_model(&self) -> String {
        self.embedding_model.clone().unwrap_or_else(|| self.completion_model())
    }

    pub fn http_client(&self) -> Result<reqwest::Client, LlmError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = self.request_timeout {
            builder = builder.timeout(timeout);
        }
        builder.build().map_err(|e| LlmError::InvalidConfig(e.to_string()))
    }
}

/// Sampling parameters forwarded as the request's `options` object.
///
/// `temperature` trades determinism (0.0) for variety (up to ~2.0),
/// `top_p` restricts sampling to the smallest token set whose probability
/// mass reaches p, `top_k` to the k most likely tokens, `num_predict` caps
/// the number of generated tokens and `seed` fixes the sampler.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ModelOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_predict: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<i64>,
}

impl ModelOptions {
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_top_p(mut self, top_p: f32) -> Self {
        self.top_p = Some(top_p);
        self
    }

    pub fn with_top_k(mut self, top_k: u32) -> Self {
        self.top_k = Some(top_k);
        self
    }

    pub fn with_num_predict(mut self, num_predict: i32) -> Self {
        self.num_predict = Some(num_predict);
        self
    }

    pub fn with_seed(mut self, seed: i64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == ModelOptions::default()
    }
}
