use async_trait::async_trait;
use log::debug;
use reqwest::Client as HttpClient;
use serde::{ Deserialize, Serialize };

use super::{ EmbeddingClient, EmbeddingResponse };
use crate::llm::{ LlmConfig, LlmError };

pub struct OllamaEmbeddingClient {
    http: HttpClient,
    base_url: String,
    model: String,
}

#[derive(Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    #[serde(default)]
    embedding: Vec<f32>,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

impl OllamaEmbeddingClient {
    pub fn new(base_url: Option<String>, model: Option<String>) -> Result<Self, LlmError> {
        Self::from_config(
            &(LlmConfig {
                base_url,
                embedding_model: model,
                ..LlmConfig::default()
            })
        )
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        Ok(Self {
            http: config.http_client()?,
            base_url: config.base_url(),
            model: config.embedding_model(),
        })
    }
}

#[async_trait]
impl EmbeddingClient for OllamaEmbeddingClient {
    async fn embed(&self, text: &str) -> Result<EmbeddingResponse, LlmError> {
        let url = format!("{}/api/embeddings", self.base_url);
        debug!("POST {} (model={})", url, self.model);
        let resp = self.http
            .post(&url)
            .json(&(EmbeddingsRequest { model: &self.model, prompt: text }))
            .send().await
            .map_err(|e| LlmError::transport(&url, e))?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| LlmError::transport(&url, e))?;
        if !status.is_success() {
            let message = serde_json
                ::from_str::<ErrorBody>(&body)
                .map(|b| b.error)
                .unwrap_or(body);
            return Err(LlmError::from_status(status, message, &self.model));
        }

        let data: EmbeddingsResponse = serde_json::from_str(&body)?;
        if data.embedding.is_empty() {
            return Err(LlmError::EmptyEmbedding);
        }
        Ok(EmbeddingResponse { embedding: data.embedding })
    }
}
