use log::info;
use serde::Serialize;

use crate::assistant::{ render_outcome, Assistant };
use crate::llm::LlmError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
}

impl SentimentLabel {
    /// The label the reply mentions first, if any.
    pub fn from_reply(reply: &str) -> Option<Self> {
        let lower = reply.to_lowercase();
        [
            (SentimentLabel::Positive, "positive"),
            (SentimentLabel::Negative, "negative"),
            (SentimentLabel::Neutral, "neutral"),
        ]
            .into_iter()
            .filter_map(|(label, word)| lower.find(word).map(|pos| (pos, label)))
            .min_by_key(|(pos, _)| *pos)
            .map(|(_, label)| label)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SentimentResult {
    pub text: String,
    pub sentiment: String,
    pub label: Option<SentimentLabel>,
}

pub fn sentiment_prompt(text: &str) -> String {
    format!(
        "Analyze the sentiment of this text. \nRespond with: Positive, Negative, or Neutral, followed by a brief explanation.\n\nText: {}",
        text
    )
}

pub fn score_prompt(text: &str) -> String {
    format!(
        "Rate the sentiment of this text on a scale from -1 (very negative) to +1 (very positive).\nProvide the score and explanation.\n\nText: {}",
        text
    )
}

pub fn emotion_prompt(text: &str) -> String {
    format!(
        "Identify the main emotions in this text (e.g., joy, anger, sadness, fear, surprise).\n\nText: {}",
        text
    )
}

pub struct SentimentAnalyzer {
    assistant: Assistant,
}

impl SentimentAnalyzer {
    pub fn new(assistant: Assistant) -> Self {
        Self { assistant }
    }

    pub async fn analyze(&self, text: &str) -> Result<String, LlmError> {
        self.assistant.ask(&sentiment_prompt(text)).await
    }

    pub async fn score(&self, text: &str) -> Result<String, LlmError> {
        self.assistant.ask(&score_prompt(text)).await
    }

    pub async fn emotions(&self, text: &str) -> Result<String, LlmError> {
        self.assistant.ask(&emotion_prompt(text)).await
    }

    pub async fn analyze_batch(&self, texts: &[&str]) -> Vec<SentimentResult> {
        let mut results = Vec::with_capacity(texts.len());
        for (i, text) in texts.iter().enumerate() {
            info!("Analyzing text {}/{}...", i + 1, texts.len());
            let outcome = self.analyze(text).await;
            let label = outcome.as_ref().ok().and_then(|reply| SentimentLabel::from_reply(reply));
            results.push(SentimentResult {
                text: text.to_string(),
                sentiment: render_outcome(outcome),
                label,
            });
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::mock::{ MockChatClient, MockReply };
    use std::sync::Arc;

    #[test]
    fn label_is_first_mentioned() {
        assert_eq!(
            SentimentLabel::from_reply("Positive. Nothing negative here."),
            Some(SentimentLabel::Positive)
        );
        assert_eq!(
            SentimentLabel::from_reply("Mostly NEGATIVE, not positive"),
            Some(SentimentLabel::Negative)
        );
        assert_eq!(SentimentLabel::from_reply("Hard to say."), None);
    }

    #[tokio::test]
    async fn batch_keeps_errors_inline() {
        let mock = MockChatClient::scripted(
            vec![
                MockReply::Text("Positive - enthusiastic.".into()),
                MockReply::Failure { status: 500, body: "oops".into() }
            ]
        );
        let analyzer = SentimentAnalyzer::new(Assistant::new(Arc::new(mock)));
        let results = analyzer.analyze_batch(&["Great service!", "Not satisfied."]).await;
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].label, Some(SentimentLabel::Positive));
        assert!(results[1].sentiment.starts_with("Error: "));
        assert_eq!(results[1].label, None);
    }
}
