use super::Length;
use crate::assistant::Assistant;
use crate::llm::LlmError;

fn length_instruction(length: Length) -> &'static str {
    match length {
        Length::Short => "in 1-2 sentences",
        Length::Medium => "in 3-5 sentences",
        Length::Long => "in 1-2 paragraphs",
    }
}

pub fn summary_prompt(text: &str, length: Length) -> String {
    format!("Summarize the following text {}:\n\n{}", length_instruction(length), text)
}

pub fn bullet_prompt(text: &str, num_points: usize) -> String {
    format!("Summarize the following text in {} bullet points:\n\n{}", num_points, text)
}

pub fn key_points_prompt(text: &str) -> String {
    format!(
        "Extract the key points from this text:\n\n{}\n\nList the main ideas and important information.",
        text
    )
}

pub fn audience_prompt(text: &str, audience: &str) -> String {
    format!("Summarize this text for {}:\n\n{}", audience, text)
}

pub struct Summarizer {
    assistant: Assistant,
}

impl Summarizer {
    pub fn new(assistant: Assistant) -> Self {
        Self { assistant }
    }

    pub async fn summarize(&self, text: &str, length: Length) -> Result<String, LlmError> {
        self.assistant.ask(&summary_prompt(text, length)).await
    }

    pub async fn bullets(&self, text: &str, num_points: usize) -> Result<String, LlmError> {
        self.assistant.ask(&bullet_prompt(text, num_points)).await
    }

    pub async fn key_points(&self, text: &str) -> Result<String, LlmError> {
        self.assistant.ask(&key_points_prompt(text)).await
    }

    pub async fn for_audience(&self, text: &str, audience: &str) -> Result<String, LlmError> {
        self.assistant.ask(&audience_prompt(text, audience)).await
    }
}
