pub mod commands;

use clap::{ Parser, Subcommand, ValueEnum };
use std::path::PathBuf;
use std::time::Duration;

use crate::llm::{ LlmConfig, ModelOptions };
use crate::tasks::Length;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    // --- Ollama Args ---
    /// Base URL of the Ollama server
    #[arg(long, env = "OLLAMA_HOST", default_value = "http://localhost:11434")]
    pub base_url: String,

    /// Model used for completions and chat
    #[arg(short, long, env = "OLLAMA_MODEL", default_value = "llama3")]
    pub model: String,

    /// Model used for embeddings. Defaults to --model if not set.
    #[arg(long, env = "EMBEDDING_MODEL")]
    pub embedding_model: Option<String>,

    /// Per-request timeout in seconds. No timeout if not set.
    #[arg(long, env = "REQUEST_TIMEOUT_SECS")]
    pub request_timeout_secs: Option<u64>,

    // --- Sampling Args ---
    /// Sampling temperature (0.0 deterministic, up to ~2.0)
    #[arg(long, env = "TEMPERATURE")]
    pub temperature: Option<f32>,

    /// Nucleus sampling threshold
    #[arg(long, env = "TOP_P")]
    pub top_p: Option<f32>,

    /// Sample only from the k most likely tokens
    #[arg(long, env = "TOP_K")]
    pub top_k: Option<u32>,

    // --- Misc ---
    /// JSON file with extra prompt templates ({"templates": {"name": "..."}})
    #[arg(long, env = "PROMPTS_PATH")]
    pub prompts_path: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, env = "DEBUG", default_value_t = false)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Args {
    pub fn llm_config(&self) -> LlmConfig {
        LlmConfig {
            base_url: Some(self.base_url.clone()),
            completion_model: Some(self.model.clone()),
            embedding_model: self.embedding_model.clone(),
            request_timeout: self.request_timeout_secs.map(Duration::from_secs),
        }
    }

    pub fn model_options(&self) -> ModelOptions {
        ModelOptions {
            temperature: self.temperature,
            top_p: self.top_p,
            top_k: self.top_k,
            ..ModelOptions::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CodeAction {
    Generate,
    Explain,
    Fix,
    Review,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ContentKind {
    Blog,
    Email,
    Story,
    Product,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Send a single prompt and print the reply
    Hello {
        #[arg(default_value = "Hello! Please introduce yourself in one sentence.")]
        prompt: String,
    },
    /// One chat turn with an optional system prompt or persona
    Chat {
        message: String,
        #[arg(long)]
        system: Option<String>,
        /// Shorthand for --system "You are <persona>."
        #[arg(long, conflicts_with = "system")]
        persona: Option<String>,
    },
    /// Run one prompt at several temperatures and print each reply
    Temperatures {
        #[arg(default_value = "Complete this: The ocean is")]
        prompt: String,
        /// Temperature to try, repeatable. 0.0, 0.5, 1.0 and 1.5 if none.
        #[arg(long = "temp")]
        temperatures: Vec<f32>,
    },
    /// Raw text completion
    Generate {
        prompt: String,
    },
    /// Print the reply chunk by chunk as it is produced
    Stream {
        prompt: String,
        /// Use the chat endpoint instead of generate
        #[arg(long)]
        chat: bool,
    },
    /// Fill a named prompt template and send it
    Template {
        #[arg(default_value = "translation")]
        name: String,
        /// Template values as key=value
        #[arg(long = "var", value_name = "KEY=VALUE")]
        vars: Vec<String>,
        /// Print the filled prompt without sending it
        #[arg(long)]
        dry_run: bool,
    },
    Translate {
        text: String,
        /// Target language, repeatable
        #[arg(long = "to", default_value = "Spanish")]
        targets: Vec<String>,
        #[arg(long = "from")]
        source: Option<String>,
        /// Also detect the source language
        #[arg(long)]
        detect: bool,
    },
    Summarize {
        text: String,
        #[arg(long, default_value = "medium")]
        length: Length,
        /// Bullet-point summary with this many points
        #[arg(long)]
        bullets: Option<usize>,
        /// Rewrite for a specific audience
        #[arg(long)]
        audience: Option<String>,
    },
    Sentiment {
        #[arg(required = true)]
        texts: Vec<String>,
        /// Also ask for a score and the detected emotions
        #[arg(long)]
        detailed: bool,
    },
    Code {
        #[arg(value_enum)]
        action: CodeAction,
        /// A description for `generate`, source code otherwise
        input: String,
        #[arg(long, default_value = "python")]
        language: String,
        /// Error message for `fix`
        #[arg(long)]
        error: Option<String>,
    },
    Content {
        #[arg(value_enum)]
        kind: ContentKind,
        /// Topic, email purpose, story genre or product name
        subject: String,
        #[arg(long, default_value = "medium")]
        length: Length,
        #[arg(long, default_value = "professional")]
        tone: String,
        #[arg(long, default_value = "colleague")]
        recipient: String,
        /// Story elements or product features, repeatable
        #[arg(long = "item")]
        items: Vec<String>,
    },
    Qa {
        question: String,
        #[arg(long)]
        context: Option<String>,
        /// Check this proposed answer against --context instead of answering
        #[arg(long, requires = "context")]
        verify: Option<String>,
    },
    Extract {
        text: String,
        /// Entity types to extract, repeatable
        #[arg(long = "entity", default_values = ["people", "organizations", "locations", "dates"])]
        entities: Vec<String>,
        /// Extract as JSON following this JSON schema instead
        #[arg(long)]
        schema: Option<String>,
    },
    /// Classify text from a handful of labelled examples
    FewShot {
        text: String,
        /// Examples as input=output, repeatable. Sentiment examples if none.
        #[arg(long = "example", value_name = "INPUT=OUTPUT")]
        examples: Vec<String>,
    },
    /// Keyword retrieval over documents, then a grounded answer
    Rag {
        question: String,
        /// Documents to search, repeatable. A small built-in set if none.
        #[arg(long = "doc")]
        documents: Vec<String>,
        #[arg(long, default_value_t = crate::rag::DEFAULT_TOP_K)]
        top_k: usize,
    },
    /// Rank documents by embedding similarity to the query
    EmbedSearch {
        query: String,
        #[arg(long = "doc")]
        documents: Vec<String>,
        #[arg(long, default_value_t = 3)]
        top_k: usize,
    },
    /// List installed models, or show one model's details
    Models {
        name: Option<String>,
    },
    /// Let the model call get_weather or calculate
    Tools {
        #[arg(required = true)]
        requests: Vec<String>,
    },
    /// Ask several models and synthesize a consensus
    Ensemble {
        question: String,
        /// Models to query, repeatable. Defaults to --model.
        #[arg(long = "with")]
        models: Vec<String>,
    },
    /// Measure latency and accuracy on a small fixed test set
    Evaluate,
    Optimize {
        prompt: String,
        #[arg(long)]
        goal: String,
        /// Run both prompts on this input and print the results
        #[arg(long)]
        input: Option<String>,
    },
    /// Compare sequential and concurrent processing of several prompts
    Batch {
        prompts: Vec<String>,
    },
    /// Interactive multi-turn chat on stdin
    Conversation {
        #[arg(long, default_value = "You are a helpful assistant.")]
        system: String,
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        max_history: Option<u64>,
        /// Resume from this transcript file
        #[arg(long)]
        load: Option<PathBuf>,
        /// Where `/save` and exit write the transcript
        #[arg(long, default_value = "conversation.json")]
        transcript: PathBuf,
    },
}

/// Splits `key=value` on the first `=`.
pub fn parse_pair(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.trim().to_string(), v.to_string()))
        .filter(|(k, _)| !k.is_empty())
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", raw))
}
