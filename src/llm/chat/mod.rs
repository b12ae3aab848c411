pub mod ollama;

use async_trait::async_trait;
use futures::{ Future, Stream };
use serde::Deserialize;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use super::{ LlmConfig, LlmError, ModelOptions };
use crate::models::chat::ChatMessage;
use self::ollama::OllamaClient;

pub type TextStream = Pin<Box<dyn Stream<Item = Result<String, LlmError>> + Send>>;

#[derive(Deserialize, Debug, Clone)]
pub struct CompletionResponse {
    pub response: String,
}

#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Single-shot completion (`/api/generate`).
    async fn generate(
        &self,
        prompt: &str,
        options: &ModelOptions
    ) -> Result<CompletionResponse, LlmError>;

    /// Multi-turn chat (`/api/chat`); returns the assistant message.
    async fn chat(
        &self,
        messages: &[ChatMessage],
        options: &ModelOptions
    ) -> Result<ChatMessage, LlmError>;

    async fn generate_stream(
        &self,
        prompt: &str,
        options: &ModelOptions
    ) -> Result<TextStream, LlmError> {
        let response = self.generate(prompt, options).await?;
        full_response_as_stream(move || async move { Ok(response.response) })
    }

    async fn chat_stream(
        &self,
        messages: &[ChatMessage],
        options: &ModelOptions
    ) -> Result<TextStream, LlmError> {
        let reply = self.chat(messages, options).await?;
        full_response_as_stream(move || async move { Ok(reply.content) })
    }

    fn get_model(&self) -> String;

    fn supports_native_streaming(&self) -> bool {
        false
    }
}

pub fn create_streaming_response<F, Fut>(response_fn: F) -> Result<TextStream, LlmError>
    where
        F: FnOnce(mpsc::Sender<Result<String, LlmError>>) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static
{
    let (tx, rx) = mpsc::channel(32);

    tokio::spawn(async move {
        response_fn(tx).await;
    });

    Ok(Box::pin(ReceiverStream::new(rx)))
}

pub fn full_response_as_stream<F, Fut>(response_fn: F) -> Result<TextStream, LlmError>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<String, LlmError>> + Send + 'static
{
    create_streaming_response(move |tx| async move {
        let _ = tx.send(response_fn().await).await;
    })
}

pub fn new_client(config: &LlmConfig) -> Result<Arc<dyn ChatClient>, LlmError> {
    let client = OllamaClient::from_config(config)?;
    Ok(Arc::new(client))
}
