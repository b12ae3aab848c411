pub mod agent;
pub mod assistant;
pub mod batch;
pub mod cli;
pub mod config;
pub mod ensemble;
pub mod history;
pub mod llm;
pub mod models;
pub mod rag;
pub mod tasks;

use cli::Args;
use log::{ debug, info };
use std::error::Error;

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    info!("--- Core Configuration ---");
    info!("Ollama Host: {}", args.base_url);
    info!("Model: {}", args.model);
    info!("Embedding Model: {}", args.embedding_model.as_deref().unwrap_or(args.model.as_str()));
    if let Some(secs) = args.request_timeout_secs {
        info!("Request Timeout: {}s", secs);
    }
    let options = args.model_options();
    if !options.is_empty() {
        info!("Sampling Options: {:?}", options);
    }
    info!("-------------------------");
    debug!("Command: {:?}", args.command);

    cli::commands::execute(args).await
}
