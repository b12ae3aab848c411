pub mod keyword;
pub mod semantic;

use log::{ debug, info };

use crate::assistant::Assistant;
use crate::llm::LlmError;
use self::keyword::KeywordRetriever;

pub const DEFAULT_TOP_K: usize = 2;

/// Keyword retrieval feeding a context-grounded chat prompt.
pub struct SimpleRag {
    retriever: KeywordRetriever,
    assistant: Assistant,
    top_k: usize,
}

impl SimpleRag {
    pub fn new(retriever: KeywordRetriever, assistant: Assistant) -> Self {
        Self { retriever, assistant, top_k: DEFAULT_TOP_K }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn build_prompt(&self, question: &str) -> String {
        let hits: Vec<String> = self.retriever
            .score(question)
            .into_iter()
            .take(self.top_k)
            .map(|hit| {
                debug!("score {} for document {}", hit.score, hit.index);
                hit.document
            })
            .collect();
        let context = hits.join("\n\n");
        format!(
            "Use this context to answer the question:\n\nContext:\n{}\n\nQuestion: {}\n\nAnswer based on the context:",
            context,
            question
        )
    }

    pub async fn answer(&self, question: &str) -> Result<String, LlmError> {
        let prompt = self.build_prompt(question);
        info!("RAG prompt built for question: {}", question);
        self.assistant.ask(&prompt).await
    }

    pub async fn answer_text(&self, question: &str) -> String {
        crate::assistant::render_outcome(self.answer(question).await)
    }
}
