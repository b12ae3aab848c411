//! Scripted in-memory clients for exercising recipes without a server.

use async_trait::async_trait;
use futures::stream;
use std::collections::HashMap;
use std::sync::atomic::{ AtomicUsize, Ordering };
use std::sync::Mutex;
use std::time::Duration;

use super::chat::{ ChatClient, CompletionResponse, TextStream };
use super::embedding::{ EmbeddingClient, EmbeddingResponse };
use super::{ LlmError, ModelOptions };
use crate::models::chat::ChatMessage;

#[derive(Debug, Clone)]
pub enum MockReply {
    Text(String),
    Failure {
        status: u16,
        body: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum MockRequest {
    Generate {
        prompt: String,
        options: ModelOptions,
    },
    Chat {
        messages: Vec<ChatMessage>,
        options: ModelOptions,
    },
}

impl MockRequest {
    /// The prompt, or the content of the last chat message.
    pub fn last_text(&self) -> &str {
        match self {
            MockRequest::Generate { prompt, .. } => prompt,
            MockRequest::Chat { messages, .. } =>
                messages
                    .last()
                    .map(|m| m.content.as_str())
                    .unwrap_or(""),
        }
    }
}

/// Replays its replies in order, cycling when exhausted.
#[derive(Debug)]
pub struct MockChatClient {
    model_id: String,
    replies: Vec<MockReply>,
    index: AtomicUsize,
    delay: Option<Duration>,
    requests: Mutex<Vec<MockRequest>>,
}

impl MockChatClient {
    pub fn new<S: Into<String>>(replies: Vec<S>) -> Self {
        Self::scripted(replies.into_iter().map(|r| MockReply::Text(r.into())).collect())
    }

    pub fn scripted(replies: Vec<MockReply>) -> Self {
        Self {
            model_id: "mock-model".to_string(),
            replies,
            index: AtomicUsize::new(0),
            delay: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(status: u16, body: &str) -> Self {
        Self::scripted(vec![MockReply::Failure { status, body: body.to_string() }])
    }

    pub fn with_model_id(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = model_id.into();
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn requests(&self) -> Vec<MockRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    async fn next_reply(&self, request: MockRequest) -> Result<String, LlmError> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.replies.is_empty() {
            return Ok(String::new());
        }
        let index = self.index.fetch_add(1, Ordering::SeqCst);
        match &self.replies[index % self.replies.len()] {
            MockReply::Text(text) => Ok(text.clone()),
            MockReply::Failure { status, body } =>
                Err(LlmError::Status { status: *status, body: body.clone() }),
        }
    }
}

fn word_chunks(text: String) -> TextStream {
    let chunks: Vec<Result<String, LlmError>> = text
        .split_inclusive(' ')
        .map(|piece| Ok(piece.to_string()))
        .collect();
    Box::pin(stream::iter(chunks))
}

#[async_trait]
impl ChatClient for MockChatClient {
    async fn generate(
        &self,
        prompt: &str,
        options: &ModelOptions
    ) -> Result<CompletionResponse, LlmError> {
        let request = MockRequest::Generate { prompt: prompt.to_string(), options: *options };
        let response = self.next_reply(request).await?;
        Ok(CompletionResponse { response })
    }

    async fn chat(
        &self,
        messages: &[ChatMessage],
        options: &ModelOptions
    ) -> Result<ChatMessage, LlmError> {
        let request = MockRequest::Chat {
            messages: messages.iter().map(ChatMessage::for_request).collect(),
            options: *options,
        };
        let content = self.next_reply(request).await?;
        Ok(ChatMessage::assistant(content))
    }

    async fn generate_stream(
        &self,
        prompt: &str,
        options: &ModelOptions
    ) -> Result<TextStream, LlmError> {
        let response = self.generate(prompt, options).await?;
        Ok(word_chunks(response.response))
    }

    async fn chat_stream(
        &self,
        messages: &[ChatMessage],
        options: &ModelOptions
    ) -> Result<TextStream, LlmError> {
        let reply = self.chat(messages, options).await?;
        Ok(word_chunks(reply.content))
    }

    fn get_model(&self) -> String {
        self.model_id.clone()
    }

    fn supports_native_streaming(&self) -> bool {
        true
    }
}

/// Looks embeddings up by exact text; unknown text fails with `EmptyEmbedding`.
#[derive(Debug, Default)]
pub struct MockEmbeddingClient {
    vectors: HashMap<String, Vec<f32>>,
}

impl MockEmbeddingClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_vector(mut self, text: &str, vector: Vec<f32>) -> Self {
        self.vectors.insert(text.to_string(), vector);
        self
    }
}

#[async_trait]
impl EmbeddingClient for MockEmbeddingClient {
    async fn embed(&self, text: &str) -> Result<EmbeddingResponse, LlmError> {
        self.vectors
            .get(text)
            .cloned()
            .map(|embedding| EmbeddingResponse { embedding })
            .ok_or(LlmError::EmptyEmbedding)
    }
}
