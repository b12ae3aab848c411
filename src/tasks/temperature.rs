use log::info;
use serde::Serialize;

use crate::assistant::{ render_outcome, Assistant };
use crate::llm::{ LlmError, ModelOptions };

/// From deterministic to noticeably creative.
pub const COMPARISON_TEMPERATURES: [f32; 4] = [0.0, 0.5, 1.0, 1.5];

/// One option set per temperature; every other field comes from `base`.
pub fn temperature_sweep(base: ModelOptions, temperatures: &[f32]) -> Vec<ModelOptions> {
    temperatures
        .iter()
        .map(|t| base.with_temperature(*t))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemperatureReply {
    pub temperature: f32,
    pub reply: String,
}

/// Runs one prompt in chat mode under different sampling options.
pub struct TemperatureExplorer {
    assistant: Assistant,
}

impl TemperatureExplorer {
    pub fn new(assistant: Assistant) -> Self {
        Self { assistant }
    }

    pub async fn generate_with_options(
        &self,
        prompt: &str,
        options: ModelOptions
    ) -> Result<String, LlmError> {
        self.assistant.clone().with_options(options).ask(prompt).await
    }

    pub async fn generate_with_temperature(&self, prompt: &str, temperature: f32) -> Result<String, LlmError> {
        let options = self.assistant.options().with_temperature(temperature);
        self.generate_with_options(prompt, options).await
    }

    /// One reply per temperature, in order; failures become `Error: ...` text.
    pub async fn compare(&self, prompt: &str, temperatures: &[f32]) -> Vec<TemperatureReply> {
        let mut replies = Vec::with_capacity(temperatures.len());
        for options in temperature_sweep(*self.assistant.options(), temperatures) {
            let temperature = options.temperature.unwrap_or_default();
            info!("Generating at temperature {}...", temperature);
            let reply = render_outcome(self.generate_with_options(prompt, options).await);
            replies.push(TemperatureReply { temperature, reply });
        }
        replies
    }
}
