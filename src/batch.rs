use futures::future::join_all;
use log::{ debug, error };
use std::sync::Arc;
use std::time::{ Duration, Instant };

use crate::assistant::render_outcome;
use crate::llm::chat::ChatClient;
use crate::llm::ModelOptions;

#[derive(Debug, Clone)]
pub struct BatchRun {
    pub results: Vec<String>,
    pub elapsed: Duration,
}

/// Both runs over the same prompts.
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub prompts: Vec<String>,
    pub sequential: BatchRun,
    pub concurrent: BatchRun,
}

impl BatchReport {
    /// Sequential time over concurrent time; 0 when the concurrent run took no time.
    pub fn speedup(&self) -> f64 {
        let concurrent = self.concurrent.elapsed.as_secs_f64();
        if concurrent == 0.0 {
            return 0.0;
        }
        self.sequential.elapsed.as_secs_f64() / concurrent
    }
}

/// Runs generate prompts one after another or all at once. Every result is
/// the reply text or `Error: ...`, at the same index as its prompt.
pub struct BatchProcessor {
    client: Arc<dyn ChatClient>,
    options: ModelOptions,
}

impl BatchProcessor {
    pub fn new(client: Arc<dyn ChatClient>) -> Self {
        Self { client, options: ModelOptions::default() }
    }

    pub fn with_options(mut self, options: ModelOptions) -> Self {
        self.options = options;
        self
    }

    pub async fn process_sequential(&self, prompts: &[String]) -> BatchRun {
        let start = Instant::now();
        let mut results = Vec::with_capacity(prompts.len());
        for prompt in prompts {
            let outcome = self.client.generate(prompt, &self.options).await.map(|r| r.response);
            results.push(render_outcome(outcome));
        }
        BatchRun { results, elapsed: start.elapsed() }
    }

    /// One tokio task per prompt.
    pub async fn process_concurrent(&self, prompts: &[String]) -> BatchRun {
        let start = Instant::now();
        let handles = prompts.iter().map(|prompt| {
            let client = Arc::clone(&self.client);
            let options = self.options;
            let prompt = prompt.clone();
            tokio::spawn(async move {
                debug!("generating for '{}'", prompt);
                render_outcome(client.generate(&prompt, &options).await.map(|r| r.response))
            })
        });

        let results = join_all(handles).await
            .into_iter()
            .map(|joined| {
                joined.unwrap_or_else(|e| {
                    error!("Batch task failed: {}", e);
                    format!("Error: {}", e)
                })
            })
            .collect();
        BatchRun { results, elapsed: start.elapsed() }
    }

    pub async fn compare(&self, prompts: &[String]) -> BatchReport {
        let sequential = self.process_sequential(prompts).await;
        let concurrent = self.process_concurrent(prompts).await;
        BatchReport { prompts: prompts.to_vec(), sequential, concurrent }
    }
}
