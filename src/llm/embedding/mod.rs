pub mod ollama;

use async_trait::async_trait;
use std::sync::Arc;

use super::{ LlmConfig, LlmError };
use self::ollama::OllamaEmbeddingClient;

#[derive(Debug, Clone)]
pub struct EmbeddingResponse {
    pub embedding: Vec<f32>,
}

#[async_trait]
pub trait EmbeddingClient: Send + Sync {
    async fn embed(&self, text: &str) -> Result<EmbeddingResponse, LlmError>;
}

pub fn new_client(config: &LlmConfig) -> Result<Arc<dyn EmbeddingClient>, LlmError> {
    let client = OllamaEmbeddingClient::from_config(config)?;
    Ok(Arc::new(client))
}
