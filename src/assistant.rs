use futures::StreamExt;
use log::{ debug, warn };
use std::io::Write;
use std::sync::Arc;

use crate::llm::chat::ChatClient;
use crate::llm::{ LlmError, ModelOptions };
use crate::models::chat::ChatMessage;

/// Renders a call outcome as plain text: the payload, or `Error: <reason>`.
pub fn render_outcome(result: Result<String, LlmError>) -> String {
    match result {
        Ok(text) => text,
        Err(e) => format!("Error: {}", e),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamMode {
    Generate,
    Chat,
}

/// A model plus a fixed persona and sampling options. Every call is a single
/// attempt with no retry.
#[derive(Clone)]
pub struct Assistant {
    client: Arc<dyn ChatClient>,
    system_prompt: Option<String>,
    options: ModelOptions,
}

impl Assistant {
    pub fn new(client: Arc<dyn ChatClient>) -> Self {
        Self {
            client,
            system_prompt: None,
            options: ModelOptions::default(),
        }
    }

    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(system_prompt.into());
        self
    }

    pub fn with_persona(self, persona: &str) -> Self {
        self.with_system_prompt(format!("You are {}.", persona))
    }

    pub fn with_options(mut self, options: ModelOptions) -> Self {
        self.options = options;
        self
    }

    pub fn model(&self) -> String {
        self.client.get_model()
    }

    pub fn client(&self) -> Arc<dyn ChatClient> {
        Arc::clone(&self.client)
    }

    pub fn system_prompt(&self) -> Option<&str> {
        self.system_prompt.as_deref()
    }

    pub fn options(&self) -> &ModelOptions {
        &self.options
    }

    fn messages_for(&self, prompt: &str) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &self.system_prompt {
            messages.push(ChatMessage::system(system.clone()));
        }
        messages.push(ChatMessage::user(prompt));
        messages
    }

    /// Chat mode: `[system?, user]`, returns the assistant's content.
    pub async fn ask(&self, prompt: &str) -> Result<String, LlmError> {
        debug!("chat request to {} ({} chars)", self.model(), prompt.len());
        let reply = self.client.chat(&self.messages_for(prompt), &self.options).await?;
        Ok(reply.content)
    }

    /// Completion mode: the raw prompt, returns the `response` field.
    pub async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        debug!("generate request to {} ({} chars)", self.model(), prompt.len());
        let response = self.client.generate(prompt, &self.options).await?;
        Ok(response.response)
    }

    pub async fn ask_text(&self, prompt: &str) -> String {
        render_outcome(self.ask(prompt).await)
    }

    pub async fn complete_text(&self, prompt: &str) -> String {
        render_outcome(self.complete(prompt).await)
    }

    /// Writes each chunk to `out` as it arrives and returns the concatenation.
    pub async fn stream<W: Write + Send>(
        &self,
        prompt: &str,
        mode: StreamMode,
        out: &mut W
    ) -> Result<String, LlmError> {
        if !self.client.supports_native_streaming() {
            debug!("{} has no native streaming, reply arrives in one chunk", self.model());
        }
        let mut chunks = match mode {
            StreamMode::Generate => self.client.generate_stream(prompt, &self.options).await?,
            StreamMode::Chat => {
                self.client.chat_stream(&self.messages_for(prompt), &self.options).await?
            }
        };

        let mut full_response = String::new();
        while let Some(chunk) = chunks.next().await {
            let chunk = chunk?;
            out.write_all(chunk.as_bytes())?;
            out.flush()?;
            full_response.push_str(&chunk);
        }
        writeln!(out)?;
        Ok(full_response)
    }

    /// Like [`Assistant::stream`], but a failure is written to `out` and
    /// returned as `Error: ...` text.
    pub async fn stream_text<W: Write + Send>(
        &self,
        prompt: &str,
        mode: StreamMode,
        out: &mut W
    ) -> String {
        match self.stream(prompt, mode, out).await {
            Ok(text) => text,
            Err(e) => {
                warn!("stream from {} failed: {}", self.model(), e);
                let message = format!("Error: {}", e);
                let _ = writeln!(out, "{}", message);
                message
            }
        }
    }
}
