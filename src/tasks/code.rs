use crate::assistant::Assistant;
use crate::llm::LlmError;

pub fn generate_prompt(description: &str, language: &str) -> String {
    format!("Write {} code that: {}\n\nProvide only the code, no explanations.", language, description)
}

pub fn explain_prompt(code: &str) -> String {
    format!("Explain what this code does:\n\n{}", code)
}

pub fn fix_prompt(code: &str, error: &str) -> String {
    format!("Fix this code:\n\n{}\n\nError: {}\n\nProvide the corrected code only.", code, error)
}

pub fn review_prompt(code: &str) -> String {
    format!(
        "Review this code and suggest improvements:\n\n{}\n\nProvide:\n1. What it does well\n2. Potential issues\n3. Suggested improvements",
        code
    )
}

/// Pulls the body of the first fenced block out of a reply, or returns it trimmed.
pub fn strip_code_fence(reply: &str) -> String {
    let trimmed = reply.trim();
    if let Some(start) = trimmed.find("```") {
        let after = &trimmed[start + 3..];
        let body_start = after.find('\n').map(|i| i + 1).unwrap_or(0);
        let body = &after[body_start..];
        if let Some(end) = body.find("```") {
            return body[..end].trim_end().to_string();
        }
    }
    trimmed.to_string()
}

pub struct CodeAssistant {
    assistant: Assistant,
}

impl CodeAssistant {
    pub fn new(assistant: Assistant) -> Self {
        Self { assistant }
    }

    pub async fn generate(&self, description: &str, language: &str) -> Result<String, LlmError> {
        self.assistant.complete(&generate_prompt(description, language)).await
    }

    pub async fn explain(&self, code: &str) -> Result<String, LlmError> {
        self.assistant.ask(&explain_prompt(code)).await
    }

    pub async fn fix(&self, code: &str, error: &str) -> Result<String, LlmError> {
        self.assistant.complete(&fix_prompt(code, error)).await
    }

    pub async fn review(&self, code: &str) -> Result<String, LlmError> {
        self.assistant.ask(&review_prompt(code)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::mock::{ MockChatClient, MockRequest };
    use std::sync::Arc;

    #[test]
    fn strips_fenced_block() {
        let reply = "Here you go:\n```python\ndef f(n):\n    return n\n```\nEnjoy";
        assert_eq!(strip_code_fence(reply), "def f(n):\n    return n");
        assert_eq!(strip_code_fence("  plain  "), "plain");
    }

    #[tokio::test]
    async fn generate_and_fix_use_completion_mode() {
        let mock = Arc::new(MockChatClient::new(vec!["code"]));
        let assistant = CodeAssistant::new(Assistant::new(mock.clone()));
        assistant.generate("factorial", "Rust").await.unwrap();
        assistant.fix("a / b", "ZeroDivisionError when b is 0").await.unwrap();
        assistant.review("x").await.unwrap();

        let requests = mock.requests();
        assert!(matches!(requests[0], MockRequest::Generate { .. }));
        assert!(requests[0].last_text().starts_with("Write Rust code that: factorial"));
        assert!(matches!(requests[1], MockRequest::Generate { .. }));
        assert!(requests[1].last_text().contains("Error: ZeroDivisionError when b is 0"));
        assert!(matches!(requests[2], MockRequest::Chat { .. }));
    }
}
