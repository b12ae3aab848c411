mod transcript;

pub use transcript::{ Transcript, TranscriptMetadata };

use chrono::{ DateTime, Utc };
use log::{ debug, info };
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

use crate::assistant::render_outcome;
use crate::llm::chat::ChatClient;
use crate::llm::{ LlmError, ModelOptions };
use crate::models::chat::{ ChatMessage, Role };

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("transcript IO error: {0}")] Io(#[from] std::io::Error),
    #[error("transcript JSON error: {0}")] Json(#[from] serde_json::Error),
}

/// Keeps an ordered message sequence and replays it on every turn.
///
/// With `max_history = Some(n)` at most `n` messages are kept; the oldest go
/// first, except that a leading system message stays pinned (when `n > 1`)
/// and counts toward `n`. A limit of 0 means no limit.
pub struct ConversationManager {
    client: Arc<dyn ChatClient>,
    options: ModelOptions,
    messages: Vec<ChatMessage>,
    max_history: Option<usize>,
    created: DateTime<Utc>,
}

impl ConversationManager {
    pub fn new(client: Arc<dyn ChatClient>, system_prompt: Option<&str>) -> Self {
        let mut messages = Vec::new();
        if let Some(system) = system_prompt.filter(|s| !s.is_empty()) {
            messages.push(ChatMessage::system(system).stamped());
        }
        Self {
            client,
            options: ModelOptions::default(),
            messages,
            max_history: None,
            created: Utc::now(),
        }
    }

    pub fn with_max_history(mut self, max_history: usize) -> Self {
        self.max_history = (max_history > 0).then_some(max_history);
        self.enforce_limit();
        self
    }

    pub fn with_options(mut self, options: ModelOptions) -> Self {
        self.options = options;
        self
    }

    pub fn created(&self) -> DateTime<Utc> {
        self.created
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty_state(&self) -> bool {
        self.messages.iter().all(|m| m.role == Role::System)
    }

    pub fn history(&self) -> Vec<ChatMessage> {
        self.messages.clone()
    }

    pub fn add_message(&mut self, role: Role, content: &str) {
        self.messages.push(ChatMessage::new(role, content).stamped());
        self.enforce_limit();
    }

    /// One chat turn. The user message stays in history even if the call fails.
    pub async fn send(&mut self, user_text: &str) -> Result<String, LlmError> {
        self.add_message(Role::User, user_text);
        debug!("sending {} message(s) to {}", self.messages.len(), self.client.get_model());
        let reply = self.client.chat(&self.messages, &self.options).await?;
        self.add_message(Role::Assistant, &reply.content);
        Ok(reply.content)
    }

    pub async fn send_text(&mut self, user_text: &str) -> String {
        render_outcome(self.send(user_text).await)
    }

    /// Drops everything but system messages.
    pub fn clear(&mut self) {
        self.messages.retain(|m| m.role == Role::System);
    }

    fn enforce_limit(&mut self) {
        let Some(max) = self.max_history else {
            return;
        };
        if self.messages.len() <= max {
            return;
        }
        let pinned = usize::from(
            max > 1 && self.messages.first().map(|m| m.role) == Some(Role::System)
        );
        let excess = self.messages.len() - max;
        self.messages.drain(pinned..pinned + excess);
    }

    pub fn to_transcript(&self) -> Transcript {
        Transcript {
            metadata: TranscriptMetadata { created: self.created },
            messages: self.messages.clone(),
        }
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), HistoryError> {
        self.to_transcript().save(path)
    }

    /// Replaces the current history and metadata with the file's contents.
    pub fn load<P: AsRef<Path>>(&mut self, path: P) -> Result<(), HistoryError> {
        let transcript = Transcript::load(&path)?;
        info!(
            "Loaded {} message(s) from {}",
            transcript.messages.len(),
            path.as_ref().display()
        );
        self.created = transcript.metadata.created;
        self.messages = transcript.messages;
        self.enforce_limit();
        Ok(())
    }
}

pub fn format_history_for_prompt(messages: &[ChatMessage]) -> String {
    if messages.is_empty() {
        return String::new();
    }
    let mut result = String::from("Previous conversation:\n");
    for msg in messages {
        let role_display = match msg.role {
            Role::User => "User",
            Role::Assistant => "Assistant",
            Role::System => "System",
        };

        result.push_str(&format!("{}: {}\n", role_display, msg.content));
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::mock::{ MockChatClient, MockRequest };

    fn contents(messages: &[ChatMessage]) -> Vec<(Role, String)> {
        messages
            .iter()
            .map(|m| (m.role, m.content.clone()))
            .collect()
    }

    #[tokio::test]
    async fn send_records_turns_in_order() {
        let mock = Arc::new(MockChatClient::new(vec!["8", "16"]));
        let mut conv = ConversationManager::new(mock.clone(), Some("You are a helpful math tutor."));

        assert_eq!(conv.send("What is 5 + 3?").await.unwrap(), "8");
        assert_eq!(conv.send("Now multiply that by 2").await.unwrap(), "16");

        assert_eq!(
            contents(&conv.history()),
            vec![
                (Role::System, "You are a helpful math tutor.".to_string()),
                (Role::User, "What is 5 + 3?".to_string()),
                (Role::Assistant, "8".to_string()),
                (Role::User, "Now multiply that by 2".to_string()),
                (Role::Assistant, "16".to_string())
            ]
        );

        // the second call replays the full history, without timestamps
        match &mock.requests()[1] {
            MockRequest::Chat { messages, .. } => {
                assert_eq!(messages.len(), 4);
                assert!(messages.iter().all(|m| m.timestamp.is_none()));
            }
            other => panic!("unexpected request {:?}", other),
        }
    }

    #[tokio::test]
    async fn clear_keeps_system_prompt() {
        let mut conv = ConversationManager::new(
            Arc::new(MockChatClient::new(vec!["hi"])),
            Some("be nice")
        );
        conv.send("hello").await.unwrap();
        conv.clear();
        assert_eq!(contents(&conv.history()), vec![(Role::System, "be nice".to_string())]);
        assert!(conv.is_empty_state());
    }

    #[tokio::test]
    async fn eviction_keeps_most_recent() {
        let mock = Arc::new(MockChatClient::new(vec!["r1", "r2", "r3", "r4"]));
        let mut conv = ConversationManager::new(mock, None).with_max_history(3);
        for turn in ["m1", "m2", "m3", "m4"] {
            conv.send(turn).await.unwrap();
        }
        assert_eq!(
            contents(&conv.history()),
            vec![
                (Role::Assistant, "r3".to_string()),
                (Role::User, "m4".to_string()),
                (Role::Assistant, "r4".to_string())
            ]
        );
    }

    #[tokio::test]
    async fn eviction_pins_system_prompt() {
        let mock = Arc::new(MockChatClient::new(vec!["r1", "r2", "r3"]));
        let mut conv = ConversationManager::new(mock, Some("sys")).with_max_history(3);
        for turn in ["m1", "m2", "m3"] {
            conv.send(turn).await.unwrap();
        }
        assert_eq!(conv.message_count(), 3);
        assert_eq!(
            contents(&conv.history()),
            vec![
                (Role::System, "sys".to_string()),
                (Role::User, "m3".to_string()),
                (Role::Assistant, "r3".to_string())
            ]
        );
    }

    #[tokio::test]
    async fn zero_limit_keeps_everything() {
        let mock = Arc::new(MockChatClient::new(vec!["hi there", "still here"]));
        let mut conv = ConversationManager::new(mock.clone(), Some("sys")).with_max_history(0);
        conv.send("hello").await.unwrap();
        conv.send("again").await.unwrap();

        assert_eq!(conv.message_count(), 5);
        match &mock.requests()[0] {
            MockRequest::Chat { messages, .. } => {
                assert_eq!(messages.len(), 2);
                assert_eq!(messages[1].content, "hello");
            }
            other => panic!("unexpected request {:?}", other),
        }
    }

    #[tokio::test]
    async fn failed_send_keeps_user_message() {
        let mut conv = ConversationManager::new(Arc::new(MockChatClient::failing(503, "busy")), None);
        let text = conv.send_text("hello?").await;
        assert!(text.starts_with("Error: "));
        assert_eq!(contents(&conv.history()), vec![(Role::User, "hello?".to_string())]);
    }

    #[tokio::test]
    async fn transcript_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("conversation.json");

        let mut conv = ConversationManager::new(
            Arc::new(MockChatClient::new(vec!["Hello!", "42"])),
            None
        ).with_max_history(5);
        conv.send("Hello!").await.unwrap();
        conv.send("Remember this number: 42").await.unwrap();
        conv.save(&path).unwrap();

        let raw: serde_json::Value = serde_json
            ::from_str(&std::fs::read_to_string(&path).unwrap())
            .unwrap();
        assert!(raw["metadata"]["created"].is_string());
        assert_eq!(raw["messages"].as_array().unwrap().len(), 4);

        let mut restored = ConversationManager::new(Arc::new(MockChatClient::new(vec!["x"])), None);
        restored.load(&path).unwrap();
        assert_eq!(restored.history(), conv.history());
        assert_eq!(restored.created(), conv.created());
    }

    #[tokio::test]
    async fn load_applies_history_limit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("long.json");

        let mut long = ConversationManager::new(
            Arc::new(MockChatClient::new(vec!["r1", "r2", "r3"])),
            Some("sys")
        );
        for turn in ["m1", "m2", "m3"] {
            long.send(turn).await.unwrap();
        }
        long.save(&path).unwrap();

        let mut limited = ConversationManager::new(
            Arc::new(MockChatClient::new(vec!["x"])),
            None
        ).with_max_history(3);
        limited.load(&path).unwrap();
        assert_eq!(
            contents(&limited.history()),
            vec![
                (Role::System, "sys".to_string()),
                (Role::User, "m3".to_string()),
                (Role::Assistant, "r3".to_string())
            ]
        );
    }

    #[test]
    fn formats_history_for_prompt() {
        let messages = vec![ChatMessage::user("hi"), ChatMessage::assistant("hello")];
        assert_eq!(
            format_history_for_prompt(&messages),
            "Previous conversation:\nUser: hi\nAssistant: hello\n"
        );
        assert_eq!(format_history_for_prompt(&[]), "");
    }
}
