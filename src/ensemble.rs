use futures::future::join_all;
use log::{ info, warn };
use serde::Serialize;
use std::sync::Arc;
use std::time::{ Duration, Instant };

use crate::assistant::render_outcome;
use crate::llm::chat::ChatClient;
use crate::llm::{ LlmError, ModelOptions };

/// One answer per model, in the order the models were given.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelAnswer {
    pub model: String,
    pub answer: String,
}

pub struct ModelEnsemble {
    clients: Vec<Arc<dyn ChatClient>>,
    options: ModelOptions,
}

impl ModelEnsemble {
    pub fn new(clients: Vec<Arc<dyn ChatClient>>) -> Result<Self, LlmError> {
        if clients.is_empty() {
            return Err(LlmError::InvalidConfig("an ensemble needs at least one model".to_string()));
        }
        Ok(Self { clients, options: ModelOptions::default() })
    }

    pub fn with_options(mut self, options: ModelOptions) -> Self {
        self.options = options;
        self
    }

    pub fn models(&self) -> Vec<String> {
        self.clients
            .iter()
            .map(|c| c.get_model())
            .collect()
    }

    /// A failing model yields an `Error: ...` answer instead of failing the batch.
    pub async fn query_all(&self, prompt: &str) -> Vec<ModelAnswer> {
        let calls = self.clients.iter().map(|client| async move {
            let outcome = client.generate(prompt, &self.options).await.map(|r| r.response);
            if let Err(e) = &outcome {
                warn!("{} failed: {}", client.get_model(), e);
            }
            ModelAnswer { model: client.get_model(), answer: render_outcome(outcome) }
        });
        join_all(calls).await
    }

    pub fn synthesis_prompt(question: &str, answers: &[ModelAnswer]) -> String {
        let mut prompt = format!("Question: {}\n\nDifferent AI models gave these answers:\n", question);
        for answer in answers {
            prompt.push_str(&format!("\n{}: {}\n", answer.model, answer.answer));
        }
        prompt.push_str("\nProvide a consensus answer:");
        prompt
    }

    /// Queries every model, then asks the first one to reconcile the answers.
    pub async fn consensus(&self, question: &str) -> Result<String, LlmError> {
        let answers = self.query_all(question).await;
        let prompt = Self::synthesis_prompt(question, &answers);
        info!("Synthesizing {} answer(s) with {}", answers.len(), self.clients[0].get_model());
        Ok(self.clients[0].generate(&prompt, &self.options).await?.response)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct LatencyStats {
    pub avg: Duration,
    pub min: Duration,
    pub max: Duration,
    pub failures: usize,
}

impl LatencyStats {
    /// Zeroes when no call succeeded.
    pub fn from_samples(samples: &[Duration], failures: usize) -> Self {
        if samples.is_empty() {
            return Self { failures, ..Self::default() };
        }
        let total: Duration = samples.iter().sum();
        Self {
            avg: total / (samples.len() as u32),
            min: samples.iter().copied().min().unwrap_or_default(),
            max: samples.iter().copied().max().unwrap_or_default(),
            failures,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestCase {
    pub prompt: String,
    pub expected: String,
}

impl TestCase {
    pub fn new(prompt: impl Into<String>, expected: impl Into<String>) -> Self {
        Self { prompt: prompt.into(), expected: expected.into() }
    }
}

pub struct ModelEvaluator {
    client: Arc<dyn ChatClient>,
    options: ModelOptions,
}

impl ModelEvaluator {
    pub fn new(client: Arc<dyn ChatClient>) -> Self {
        Self { client, options: ModelOptions::default() }
    }

    /// Times each prompt sequentially; failed calls are counted but not timed.
    pub async fn latency(&self, prompts: &[&str]) -> LatencyStats {
        let mut samples = Vec::with_capacity(prompts.len());
        let mut failures = 0;
        for prompt in prompts {
            let start = Instant::now();
            match self.client.generate(prompt, &self.options).await {
                Ok(_) => samples.push(start.elapsed()),
                Err(e) => {
                    warn!("Latency call failed for '{}': {}", prompt, e);
                    failures += 1;
                }
            }
        }
        LatencyStats::from_samples(&samples, failures)
    }

    /// Fraction of cases whose reply contains the expected text, ignoring case.
    /// A failed call counts as a miss.
    pub async fn accuracy(&self, cases: &[TestCase]) -> f64 {
        if cases.is_empty() {
            return 0.0;
        }
        let mut correct = 0;
        for case in cases {
            match self.client.generate(&case.prompt, &self.options).await {
                Ok(reply) if reply.response.to_lowercase().contains(&case.expected.to_lowercase()) => {
                    correct += 1;
                }
                Ok(_) => {}
                Err(e) => warn!("Accuracy case '{}' failed: {}", case.prompt, e),
            }
        }
        (correct as f64) / (cases.len() as f64)
    }
}
