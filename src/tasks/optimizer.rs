use crate::assistant::Assistant;
use crate::llm::LlmError;

pub fn optimize_prompt(original_prompt: &str, goal: &str) -> String {
    format!(
        "Improve this prompt to better achieve the goal:\n\nOriginal Prompt: {}\nGoal: {}\n\nProvide an optimized prompt:",
        original_prompt,
        goal
    )
}

pub fn trial_prompt(prompt: &str, test_input: &str) -> String {
    format!("{}\n\nInput: {}", prompt, test_input)
}

#[derive(Debug, Clone)]
pub struct PromptComparison {
    pub optimized_prompt: String,
    pub original_result: String,
    pub optimized_result: String,
}

pub struct PromptOptimizer {
    assistant: Assistant,
}

impl PromptOptimizer {
    pub fn new(assistant: Assistant) -> Self {
        Self { assistant }
    }

    pub async fn optimize(&self, original_prompt: &str, goal: &str) -> Result<String, LlmError> {
        let reply = self.assistant.complete(&optimize_prompt(original_prompt, goal)).await?;
        Ok(reply.trim().to_string())
    }

    pub async fn test(&self, prompt: &str, test_input: &str) -> Result<String, LlmError> {
        self.assistant.complete(&trial_prompt(prompt, test_input)).await
    }

    /// Optimizes once, then runs both prompts on the same input.
    pub async fn compare(
        &self,
        original_prompt: &str,
        goal: &str,
        test_input: &str
    ) -> Result<PromptComparison, LlmError> {
        let optimized_prompt = self.optimize(original_prompt, goal).await?;
        let original_result = self.test(original_prompt, test_input).await?;
        let optimized_result = self.test(&optimized_prompt, test_input).await?;
        Ok(PromptComparison { optimized_prompt, original_result, optimized_result })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::mock::MockChatClient;
    use std::sync::Arc;

    #[tokio::test]
    async fn compare_runs_optimized_prompt() {
        let mock = Arc::new(
            MockChatClient::new(vec!["Translate to French, keeping tone.", "Bonjour", "Bonjour, comment allez-vous ?"])
        );
        let optimizer = PromptOptimizer::new(Assistant::new(mock.clone()));
        let comparison = optimizer
            .compare("Translate to French", "Accurate French translation", "Hello, how are you?").await
            .unwrap();
        assert_eq!(comparison.optimized_prompt, "Translate to French, keeping tone.");
        assert_eq!(comparison.optimized_result, "Bonjour, comment allez-vous ?");
        assert_eq!(
            mock.requests()[2].last_text(),
            "Translate to French, keeping tone.\n\nInput: Hello, how are you?"
        );
    }
}
