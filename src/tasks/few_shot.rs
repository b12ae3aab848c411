use serde::{ Deserialize, Serialize };

use crate::assistant::Assistant;
use crate::llm::LlmError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Example {
    pub input: String,
    pub output: String,
}

impl Example {
    pub fn new(input: impl Into<String>, output: impl Into<String>) -> Self {
        Self { input: input.into(), output: output.into() }
    }
}

fn render_examples(examples: &[Example]) -> String {
    examples
        .iter()
        .map(|ex| format!("Input: {}\nOutput: {}\n\n", ex.input, ex.output))
        .collect()
}

pub fn classify_prompt(text: &str, examples: &[Example]) -> String {
    format!(
        "Learn from these examples:\n\n{}Now classify this:\nInput: {}\nOutput:",
        render_examples(examples),
        text
    )
}

pub fn generate_prompt(task: &str, examples: &[Example], input: &str) -> String {
    format!("Task: {}\n\nExamples:\n{}Your turn:\nInput: {}\nOutput:", task, render_examples(examples), input)
}

pub struct FewShotLearner {
    assistant: Assistant,
}

impl FewShotLearner {
    pub fn new(assistant: Assistant) -> Self {
        Self { assistant }
    }

    pub async fn classify(&self, text: &str, examples: &[Example]) -> Result<String, LlmError> {
        let reply = self.assistant.complete(&classify_prompt(text, examples)).await?;
        Ok(reply.trim().to_string())
    }

    pub async fn generate(&self, task: &str, examples: &[Example], input: &str) -> Result<String, LlmError> {
        let reply = self.assistant.complete(&generate_prompt(task, examples, input)).await?;
        Ok(reply.trim().to_string())
    }
}
