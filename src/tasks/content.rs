use super::Length;
use crate::assistant::Assistant;
use crate::llm::LlmError;

fn word_count(length: Length) -> &'static str {
    match length {
        Length::Short => "300 words",
        Length::Medium => "500 words",
        Length::Long => "800 words",
    }
}

pub fn blog_post_prompt(topic: &str, length: Length) -> String {
    format!("Write a {} blog post about: {}", word_count(length), topic)
}

pub fn email_prompt(purpose: &str, recipient: &str, tone: &str) -> String {
    format!("Write a {} email to {} for the purpose of: {}", tone, recipient, purpose)
}

pub fn story_prompt(genre: &str, elements: &[&str]) -> String {
    format!("Write a {} short story that includes: {}", genre, elements.join(", "))
}

pub fn product_description_prompt(product_name: &str, features: &[&str]) -> String {
    let bullets = features
        .iter()
        .map(|f| format!("- {}", f))
        .collect::<Vec<_>>()
        .join("\n");
    format!("Write a compelling product description for: {}\n\nKey features:\n{}", product_name, bullets)
}

pub struct ContentGenerator {
    assistant: Assistant,
}

impl ContentGenerator {
    pub fn new(assistant: Assistant) -> Self {
        Self { assistant }
    }

    pub async fn blog_post(&self, topic: &str, length: Length) -> Result<String, LlmError> {
        self.assistant.complete(&blog_post_prompt(topic, length)).await
    }

    pub async fn email(&self, purpose: &str, recipient: &str, tone: &str) -> Result<String, LlmError> {
        self.assistant.complete(&email_prompt(purpose, recipient, tone)).await
    }

    pub async fn story(&self, genre: &str, elements: &[&str]) -> Result<String, LlmError> {
        self.assistant.complete(&story_prompt(genre, elements)).await
    }

    pub async fn product_description(
        &self,
        product_name: &str,
        features: &[&str]
    ) -> Result<String, LlmError> {
        self.assistant.complete(&product_description_prompt(product_name, features)).await
    }
}
