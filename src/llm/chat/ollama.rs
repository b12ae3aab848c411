use async_trait::async_trait;
use futures_util::StreamExt;
use log::{ debug, warn };
use reqwest::Client as HttpClient;
use serde::de::DeserializeOwned;
use serde::{ Deserialize, Serialize };
use tokio::sync::mpsc;

use super::{ create_streaming_response, ChatClient, CompletionResponse, TextStream };
use crate::llm::{ LlmConfig, LlmError, ModelOptions };
use crate::models::catalog::{ ModelDetails, ModelInfo };
use crate::models::chat::ChatMessage;

#[derive(Debug, Clone)]
pub struct OllamaClient {
    http: HttpClient,
    base_url: String,
    completion_model: String,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    #[serde(skip_serializing_if = "ModelOptions::is_empty")]
    options: ModelOptions,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    stream: bool,
    #[serde(skip_serializing_if = "ModelOptions::is_empty")]
    options: ModelOptions,
}

#[derive(Serialize)]
struct ShowRequest<'a> {
    model: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelInfo>,
}

#[derive(Deserialize)]
struct GenerateChunk {
    #[serde(default)]
    response: String,
    #[serde(default)]
    done: bool,
    error: Option<String>,
}

#[derive(Deserialize)]
struct ChatChunk {
    message: Option<ChatMessage>,
    #[serde(default)]
    done: bool,
    error: Option<String>,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// One decoded line of a newline-delimited JSON stream.
struct StreamPiece {
    text: String,
    done: bool,
    error: Option<String>,
}

impl From<GenerateChunk> for StreamPiece {
    fn from(chunk: GenerateChunk) -> Self {
        StreamPiece { text: chunk.response, done: chunk.done, error: chunk.error }
    }
}

impl From<ChatChunk> for StreamPiece {
    fn from(chunk: ChatChunk) -> Self {
        StreamPiece {
            text: chunk.message.map(|m| m.content).unwrap_or_default(),
            done: chunk.done,
            error: chunk.error,
        }
    }
}

/// Splits a byte stream into complete lines, holding back a partial trailing
/// line until the next chunk (or `finish`) completes it.
#[derive(Default)]
pub(crate) struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    pub(crate) fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(bytes);
        let mut lines = Vec::new();
        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let raw: Vec<u8> = self.pending.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&raw).trim().to_string();
            if !line.is_empty() {
                lines.push(line);
            }
        }
        lines
    }

    pub(crate) fn finish(&mut self) -> Option<String> {
        let raw = std::mem::take(&mut self.pending);
        let line = String::from_utf8_lossy(&raw).trim().to_string();
        if line.is_empty() { None } else { Some(line) }
    }
}

impl OllamaClient {
    pub fn new(base_url: Option<String>, completion_model: Option<String>) -> Self {
        let config = LlmConfig {
            base_url,
            completion_model,
            ..LlmConfig::default()
        };

        Self {
            http: HttpClient::new(),
            base_url: config.base_url(),
            completion_model: config.completion_model(),
        }
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        Ok(Self {
            http: config.http_client()?,
            base_url: config.base_url(),
            completion_model: config.completion_model(),
        })
    }

    /// Same server and HTTP pool, different model.
    pub fn with_model(&self, model: &str) -> Self {
        Self {
            http: self.http.clone(),
            base_url: self.base_url.clone(),
            completion_model: model.to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, route: &str) -> String {
        format!("{}{}", self.base_url, route)
    }

    async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        route: &str,
        body: &B
    ) -> Result<T, LlmError> {
        let url = self.url(route);
        debug!("POST {}", url);
        let resp = self.http
            .post(&url)
            .json(body)
            .send().await
            .map_err(|e| LlmError::transport(&url, e))?;
        let resp = check_status(resp, &self.completion_model).await?;
        let text = resp.text().await.map_err(|e| LlmError::transport(&url, e))?;
        Ok(serde_json::from_str(&text)?)
    }

    pub async fn list_models(&self) -> Result<Vec<ModelInfo>, LlmError> {
        let url = self.url("/api/tags");
        debug!("GET {}", url);
        let resp = self.http
            .get(&url)
            .send().await
            .map_err(|e| LlmError::transport(&url, e))?;
        let resp = check_status(resp, &self.completion_model).await?;
        let text = resp.text().await.map_err(|e| LlmError::transport(&url, e))?;
        let tags: TagsResponse = serde_json::from_str(&text)?;
        Ok(tags.models)
    }

    pub async fn show_model(&self, name: &str) -> Result<ModelDetails, LlmError> {
        let url = self.url("/api/show");
        let resp = self.http
            .post(&url)
            .json(&(ShowRequest { model: name }))
            .send().await
            .map_err(|e| LlmError::transport(&url, e))?;
        let resp = check_status(resp, name).await?;
        let text = resp.text().await.map_err(|e| LlmError::transport(&url, e))?;
        Ok(serde_json::from_str(&text)?)
    }

    fn ndjson_stream<C>(&self, route: &str, body: serde_json::Value) -> Result<TextStream, LlmError>
        where C: DeserializeOwned + Into<StreamPiece> + Send + 'static
    {
        let url = self.url(route);
        let http = self.http.clone();
        let model = self.completion_model.clone();

        create_streaming_response(move |tx| async move {
            let response = match http.post(&url).json(&body).send().await {
                Ok(resp) => resp,
                Err(e) => {
                    let _ = tx.send(Err(LlmError::transport(&url, e))).await;
                    return;
                }
            };
            let response = match check_status(response, &model).await {
                Ok(resp) => resp,
                Err(e) => {
                    let _ = tx.send(Err(e)).await;
                    return;
                }
            };

            let mut bytes = response.bytes_stream();
            let mut lines = LineBuffer::default();
            while let Some(chunk) = bytes.next().await {
                match chunk {
                    Ok(buf) => {
                        for line in lines.push(&buf) {
                            if !forward_line::<C>(&tx, &line).await {
                                return;
                            }
                        }
                    }
                    Err(e) => {
                        let _ = tx.send(Err(LlmError::Stream(e.to_string()))).await;
                        return;
                    }
                }
            }
            if let Some(line) = lines.finish() {
                forward_line::<C>(&tx, &line).await;
            }
        })
    }
}

/// Sends the text of one stream line; returns false once the stream should stop.
async fn forward_line<C>(tx: &mpsc::Sender<Result<String, LlmError>>, line: &str) -> bool
    where C: DeserializeOwned + Into<StreamPiece>
{
    let piece: StreamPiece = match serde_json::from_str::<C>(line) {
        Ok(chunk) => chunk.into(),
        Err(e) => {
            warn!("Skipping unparseable stream line ({}): {}", e, line);
            return true;
        }
    };
    if let Some(message) = piece.error {
        let _ = tx.send(Err(LlmError::Stream(message))).await;
        return false;
    }
    if !piece.text.is_empty() && tx.send(Ok(piece.text)).await.is_err() {
        return false;
    }
    !piece.done
}

async fn check_status(resp: reqwest::Response, model: &str) -> Result<reqwest::Response, LlmError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    let message = serde_json
        ::from_str::<ErrorBody>(&body)
        .map(|b| b.error)
        .unwrap_or(body);
    Err(LlmError::from_status(status, message, model))
}

#[async_trait]
impl ChatClient for OllamaClient {
    async fn generate(
        &self,
        prompt: &str,
        options: &ModelOptions
    ) -> Result<CompletionResponse, LlmError> {
        let req = GenerateRequest {
            model: &self.completion_model,
            prompt,
            stream: false,
            options: *options,
        };
        self.post_json("/api/generate", &req).await
    }

    async fn chat(
        &self,
        messages: &[ChatMessage],
        options: &ModelOptions
    ) -> Result<ChatMessage, LlmError> {
        let req = ChatRequest {
            model: &self.completion_model,
            messages: messages.iter().map(ChatMessage::for_request).collect(),
            stream: false,
            options: *options,
        };
        let resp: ChatResponse = self.post_json("/api/chat", &req).await?;
        Ok(resp.message)
    }

    async fn generate_stream(
        &self,
        prompt: &str,
        options: &ModelOptions
    ) -> Result<TextStream, LlmError> {
        let req = GenerateRequest {
            model: &self.completion_model,
            prompt,
            stream: true,
            options: *options,
        };
        self.ndjson_stream::<GenerateChunk>("/api/generate", serde_json::to_value(&req)?)
    }

    async fn chat_stream(
        &self,
        messages: &[ChatMessage],
        options: &ModelOptions
    ) -> Result<TextStream, LlmError> {
        let req = ChatRequest {
            model: &self.completion_model,
            messages: messages.iter().map(ChatMessage::for_request).collect(),
            stream: true,
            options: *options,
        };
        self.ndjson_stream::<ChatChunk>("/api/chat", serde_json::to_value(&req)?)
    }

    fn get_model(&self) -> String {
        self.completion_model.clone()
    }

    fn supports_native_streaming(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_buffer_joins_split_lines() {
        let mut buffer = LineBuffer::default();
        assert!(buffer.push(b"{\"response\":\"Hel").is_empty());
        let lines = buffer.push(b"lo\",\"done\":false}\n{\"response\":\"!\"}");
        assert_eq!(lines, vec!["{\"response\":\"Hello\",\"done\":false}".to_string()]);
        assert_eq!(buffer.finish().as_deref(), Some("{\"response\":\"!\"}"));
        assert_eq!(buffer.finish(), None);
    }

    #[test]
    fn line_buffer_skips_blank_lines() {
        let mut buffer = LineBuffer::default();
        let lines = buffer.push(b"\n\r\n{\"done\":true}\n");
        assert_eq!(lines, vec!["{\"done\":true}".to_string()]);
    }

    #[tokio::test]
    async fn forward_line_stops_on_done_and_error() {
        let (tx, mut rx) = mpsc::channel(4);
        assert!(forward_line::<GenerateChunk>(&tx, r#"{"response":"a","done":false}"#).await);
        assert!(!forward_line::<GenerateChunk>(&tx, r#"{"response":"b","done":true}"#).await);
        assert!(
            !forward_line::<ChatChunk>(&tx, r#"{"error":"model ran out of memory"}"#).await
        );
        assert!(forward_line::<ChatChunk>(&tx, "not json").await);
        drop(tx);

        assert_eq!(rx.recv().await.unwrap().unwrap(), "a");
        assert_eq!(rx.recv().await.unwrap().unwrap(), "b");
        assert!(matches!(rx.recv().await.unwrap(), Err(LlmError::Stream(_))));
        assert!(rx.recv().await.is_none());
    }

    #[test]
    fn generate_request_omits_empty_options() {
        let req = GenerateRequest {
            model: "llama3",
            prompt: "hi",
            stream: false,
            options: ModelOptions::default(),
        };
        let json = serde_json::to_value(&req).unwrap();
        assert!(json.get("options").is_none());

        let req = GenerateRequest { options: ModelOptions::default().with_top_k(40), ..req };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["options"]["top_k"], 40);
    }
}
