use crate::assistant::Assistant;
use crate::llm::LlmError;

/// Without context the question is sent as-is.
pub fn answer_prompt(question: &str, context: Option<&str>) -> String {
    match context.map(str::trim).filter(|c| !c.is_empty()) {
        Some(context) => format!("Context: {}\n\nQuestion: {}\n\nAnswer:", context, question),
        None => question.to_string(),
    }
}

pub fn document_prompt(question: &str, document: &str) -> String {
    format!(
        "Based on the following document, answer this question:\n\nDocument:\n{}\n\nQuestion: {}\n\nAnswer based only on the information in the document:",
        document,
        question
    )
}

pub fn verify_prompt(question: &str, answer: &str, context: &str) -> String {
    format!(
        "Context: {}\n\nQuestion: {}\nProposed Answer: {}\n\nIs this answer correct based on the context? Explain.",
        context,
        question,
        answer
    )
}

pub struct QaSystem {
    assistant: Assistant,
}

impl QaSystem {
    pub fn new(assistant: Assistant) -> Self {
        Self { assistant }
    }

    pub async fn answer(&self, question: &str, context: Option<&str>) -> Result<String, LlmError> {
        self.assistant.ask(&answer_prompt(question, context)).await
    }

    pub async fn answer_from_document(&self, question: &str, document: &str) -> Result<String, LlmError> {
        self.assistant.ask(&document_prompt(question, document)).await
    }

    pub async fn verify(&self, question: &str, answer: &str, context: &str) -> Result<String, LlmError> {
        self.assistant.ask(&verify_prompt(question, answer, context)).await
    }
}
