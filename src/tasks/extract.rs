use log::warn;
use serde_json::Value;

use crate::assistant::Assistant;
use crate::llm::LlmError;

pub fn entities_prompt(text: &str, entity_types: &[&str]) -> String {
    format!(
        "Extract the following from this text: {}\n\nText: {}\n\nProvide as a list.",
        entity_types.join(", "),
        text
    )
}

pub fn json_response_prompt(prompt: &str) -> String {
    format!("{}\n\nRespond with valid JSON only.", prompt)
}

pub fn json_extraction_prompt(text: &str, schema: &Value) -> Result<String, serde_json::Error> {
    Ok(
        format!(
            "Extract information from this text as JSON following this schema:\n{}\n\nText: {}\n\nJSON output:",
            serde_json::to_string_pretty(schema)?,
            text
        )
    )
}

/// Parses the first JSON object or array found in a model reply, tolerating
/// surrounding prose and code fences.
pub fn parse_json_reply(reply: &str) -> Option<Value> {
    if let Ok(value) = serde_json::from_str::<Value>(reply.trim()) {
        return Some(value);
    }
    let start = reply.find(|c| c == '{' || c == '[')?;
    let close = if reply[start..].starts_with('{') { '}' } else { ']' };
    let end = reply.rfind(close)?;
    if end < start {
        return None;
    }
    serde_json::from_str(&reply[start..=end]).ok()
}

pub struct DataExtractor {
    assistant: Assistant,
}

impl DataExtractor {
    pub fn new(assistant: Assistant) -> Self {
        Self { assistant }
    }

    pub async fn entities(&self, text: &str, entity_types: &[&str]) -> Result<String, LlmError> {
        self.assistant.ask(&entities_prompt(text, entity_types)).await
    }

    pub async fn json_response(&self, prompt: &str) -> Result<String, LlmError> {
        self.assistant.complete(&json_response_prompt(prompt)).await
    }

    /// The raw reply, plus its parsed form when it contains valid JSON.
    pub async fn extract_json(
        &self,
        text: &str,
        schema: &Value
    ) -> Result<(String, Option<Value>), LlmError> {
        let reply = self.assistant.complete(&json_extraction_prompt(text, schema)?).await?;
        let parsed = parse_json_reply(&reply);
        if parsed.is_none() {
            warn!("Model reply did not contain valid JSON");
        }
        Ok((reply, parsed))
    }
}
