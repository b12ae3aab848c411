use log::warn;
use serde_json::Value;
use std::error::Error;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tokio::io::{ AsyncBufReadExt, BufReader };

use super::{ parse_pair, Args, CodeAction, Command, ContentKind };
use crate::agent::{ FunctionCallingAgent, ToolRegistry };
use crate::assistant::{ render_outcome, Assistant, StreamMode };
use crate::batch::BatchProcessor;
use crate::config::prompt::{ load_prompts, PromptConfig };
use crate::ensemble::{ ModelEnsemble, ModelEvaluator, TestCase };
use crate::history::{ format_history_for_prompt, ConversationManager };
use crate::llm::chat::ollama::OllamaClient;
use crate::llm::chat::{ self, ChatClient };
use crate::llm::embedding;
use crate::models::catalog::{ find_model, format_bytes, group_by_family, preview, total_size };
use crate::models::chat::Role;
use crate::rag::keyword::KeywordRetriever;
use crate::rag::semantic::EmbeddingIndex;
use crate::rag::SimpleRag;
use crate::tasks::code::CodeAssistant;
use crate::tasks::content::ContentGenerator;
use crate::tasks::extract::DataExtractor;
use crate::tasks::few_shot::{ Example, FewShotLearner };
use crate::tasks::optimizer::PromptOptimizer;
use crate::tasks::qa::QaSystem;
use crate::tasks::sentiment::SentimentAnalyzer;
use crate::tasks::summarize::Summarizer;
use crate::tasks::temperature::{ TemperatureExplorer, COMPARISON_TEMPERATURES };
use crate::tasks::translation::Translator;

type CliResult = Result<(), Box<dyn Error + Send + Sync>>;

const SAMPLE_DOCUMENTS: [&str; 4] = [
    "Python was created by Guido van Rossum and released in 1991.",
    "JavaScript is primarily used for web development.",
    "Machine learning is a subset of artificial intelligence.",
    "Rust guarantees memory safety without a garbage collector.",
];

const SAMPLE_BATCH: [&str; 3] = ["Count from 1 to 3", "Name 3 colors", "List 3 fruits"];

fn owned_or_samples(given: &[String], samples: &[&str]) -> Vec<String> {
    if given.is_empty() {
        samples.iter().map(|s| s.to_string()).collect()
    } else {
        given.to_vec()
    }
}

fn as_strs(values: &[String]) -> Vec<&str> {
    values.iter().map(String::as_str).collect()
}

pub async fn execute(args: Args) -> CliResult {
    let config = args.llm_config();
    let options = args.model_options();
    let client = chat::new_client(&config)?;
    let assistant = Assistant::new(Arc::clone(&client)).with_options(options);

    match args.command.clone() {
        Command::Hello { prompt } => {
            println!("{}", assistant.complete_text(&prompt).await);
        }
        Command::Chat { message, system, persona } => {
            let assistant = match (system, persona) {
                (Some(system), _) => assistant.with_system_prompt(system),
                (None, Some(persona)) => assistant.with_persona(&persona),
                (None, None) => assistant,
            };
            println!("{}", assistant.ask_text(&message).await);
        }
        Command::Temperatures { prompt, temperatures } => {
            let temperatures = if temperatures.is_empty() {
                COMPARISON_TEMPERATURES.to_vec()
            } else {
                temperatures
            };
            println!("Prompt: {}\n", prompt);
            println!("{}", "=".repeat(80));
            for result in TemperatureExplorer::new(assistant).compare(&prompt, &temperatures).await {
                println!("\nTemperature: {}", result.temperature);
                println!("{}", "-".repeat(80));
                println!("{}", result.reply);
            }
        }
        Command::Generate { prompt } => {
            println!("{}", assistant.complete_text(&prompt).await);
        }
        Command::Stream { prompt, chat } => {
            let mode = if chat { StreamMode::Chat } else { StreamMode::Generate };
            let mut stdout = std::io::stdout();
            assistant.stream_text(&prompt, mode, &mut stdout).await;
        }
        Command::Template { name, vars, dry_run } => {
            let prompts = prompt_config(args.prompts_path.as_deref())?;
            let template = prompts.template(&name)?;
            let pairs = vars
                .iter()
                .map(|raw| parse_pair(raw))
                .collect::<Result<Vec<_>, _>>()?;
            let values: Vec<(&str, &str)> = pairs
                .iter()
                .map(|(k, v)| (k.as_str(), v.as_str()))
                .collect();
            let prompt = template.fill(&values)?;
            println!("Prompt: {}\n", prompt);
            if !dry_run {
                println!("{}", assistant.complete_text(&prompt).await);
            }
        }
        Command::Translate { text, targets, source, detect } => {
            let translator = Translator::new(assistant);
            if detect {
                println!("Detected language: {}", render_outcome(translator.detect_language(&text).await));
            }
            if let Some(source) = source {
                for target in &targets {
                    let outcome = translator.translate(&text, target, Some(source.as_str())).await;
                    println!("{}: {}", target, render_outcome(outcome));
                }
            } else {
                for (lang, translation) in translator.translate_many(&text, &as_strs(&targets)).await {
                    println!("{}: {}", lang, translation);
                }
            }
        }
        Command::Summarize { text, length, bullets, audience } => {
            let summarizer = Summarizer::new(assistant);
            let outcome = match (bullets, audience) {
                (Some(points), _) => summarizer.bullets(&text, points).await,
                (None, Some(audience)) => summarizer.for_audience(&text, &audience).await,
                (None, None) => summarizer.summarize(&text, length).await,
            };
            println!("{}", render_outcome(outcome));
        }
        Command::Sentiment { texts, detailed } => {
            let analyzer = SentimentAnalyzer::new(assistant);
            for result in analyzer.analyze_batch(&as_strs(&texts)).await {
                println!("Text: {}", result.text);
                println!("Sentiment: {}", result.sentiment);
                if detailed {
                    println!("Score: {}", render_outcome(analyzer.score(&result.text).await));
                    println!("Emotions: {}", render_outcome(analyzer.emotions(&result.text).await));
                }
                println!();
            }
        }
        Command::Code { action, input, language, error } => {
            let coder = CodeAssistant::new(assistant);
            let outcome = match action {
                CodeAction::Generate => coder.generate(&input, &language).await,
                CodeAction::Explain => coder.explain(&input).await,
                CodeAction::Review => coder.review(&input).await,
                CodeAction::Fix => {
                    let error = error.unwrap_or_else(|| "unknown error".to_string());
                    coder.fix(&input, &error).await
                }
            };
            println!("{}", render_outcome(outcome));
        }
        Command::Content { kind, subject, length, tone, recipient, items } => {
            let generator = ContentGenerator::new(assistant);
            let items = as_strs(&items);
            let outcome = match kind {
                ContentKind::Blog => generator.blog_post(&subject, length).await,
                ContentKind::Email => generator.email(&subject, &recipient, &tone).await,
                ContentKind::Story => generator.story(&subject, &items).await,
                ContentKind::Product => generator.product_description(&subject, &items).await,
            };
            println!("{}", render_outcome(outcome));
        }
        Command::Qa { question, context, verify } => {
            let qa = QaSystem::new(assistant);
            let outcome = match (verify, context.as_deref()) {
                (Some(answer), Some(context)) => qa.verify(&question, &answer, context).await,
                _ => qa.answer(&question, context.as_deref()).await,
            };
            println!("Q: {}\nA: {}", question, render_outcome(outcome));
        }
        Command::Extract { text, entities, schema } => {
            let extractor = DataExtractor::new(assistant);
            match schema {
                Some(schema) => {
                    let schema: Value = serde_json::from_str(&schema)?;
                    match extractor.extract_json(&text, &schema).await {
                        Ok((_, Some(parsed))) => println!("{}", serde_json::to_string_pretty(&parsed)?),
                        Ok((raw, None)) => println!("{}", raw),
                        Err(e) => println!("Error: {}", e),
                    }
                }
                None => {
                    println!("{}", render_outcome(extractor.entities(&text, &as_strs(&entities)).await));
                }
            }
        }
        Command::FewShot { text, examples } => {
            let examples = if examples.is_empty() {
                vec![
                    Example::new("I love this product!", "Positive"),
                    Example::new("This is terrible.", "Negative"),
                    Example::new("It's okay, nothing special.", "Neutral")
                ]
            } else {
                examples
                    .iter()
                    .map(|raw| parse_pair(raw).map(|(input, output)| Example::new(input, output)))
                    .collect::<Result<Vec<_>, _>>()?
            };
            let learner = FewShotLearner::new(assistant);
            println!("{}", render_outcome(learner.classify(&text, &examples).await));
        }
        Command::Rag { question, documents, top_k } => {
            let retriever = KeywordRetriever::new(owned_or_samples(&documents, &SAMPLE_DOCUMENTS));
            let rag = SimpleRag::new(retriever, assistant).with_top_k(top_k);
            println!("Q: {}\nA: {}", question, rag.answer_text(&question).await);
        }
        Command::EmbedSearch { query, documents, top_k } => {
            let embedder = embedding::new_client(&config)?;
            let index = EmbeddingIndex::build(embedder, owned_or_samples(&documents, &SAMPLE_DOCUMENTS)).await;
            match index.search(&query, top_k).await {
                Ok(hits) => {
                    for hit in hits {
                        println!("{:.3}  {}", hit.similarity, hit.document);
                    }
                }
                Err(e) => println!("Error: {}", e),
            }
        }
        Command::Models { name } => {
            let ollama = OllamaClient::from_config(&config)?;
            match name {
                Some(name) => print_model_details(&ollama, &name).await,
                None => print_model_list(&ollama).await,
            }
        }
        Command::Tools { requests } => {
            let agent = FunctionCallingAgent::new(assistant, ToolRegistry::with_builtins());
            for request in requests {
                println!("Request: {}", request);
                println!("Response: {}\n", agent.handle_text(&request).await);
            }
        }
        Command::Ensemble { question, models } => {
            let base = OllamaClient::from_config(&config)?;
            let models = if models.is_empty() { vec![args.model.clone()] } else { models };
            let clients: Vec<Arc<dyn ChatClient>> = models
                .iter()
                .map(|m| Arc::new(base.with_model(m)) as Arc<dyn ChatClient>)
                .collect();
            let ensemble = ModelEnsemble::new(clients)?.with_options(options);
            println!("Question: {}\n\nIndividual Responses:", question);
            for answer in ensemble.query_all(&question).await {
                println!("{}: {}\n", answer.model, answer.answer);
            }
            println!("Consensus Answer:\n{}", render_outcome(ensemble.consensus(&question).await));
        }
        Command::Evaluate => {
            let evaluator = ModelEvaluator::new(client);
            println!("Evaluating Latency...");
            let latency = evaluator.latency(&["What is 2+2?", "Name a color", "Count to 3"]).await;
            println!("Average: {:.2}s", latency.avg.as_secs_f64());
            println!("Min: {:.2}s", latency.min.as_secs_f64());
            println!("Max: {:.2}s", latency.max.as_secs_f64());
            if latency.failures > 0 {
                println!("Failed calls: {}", latency.failures);
            }
            println!("\nEvaluating Accuracy...");
            let cases = vec![TestCase::new("What is 2+2?", "4"), TestCase::new("Capital of France?", "Paris")];
            println!("Accuracy: {:.1}%", evaluator.accuracy(&cases).await * 100.0);
        }
        Command::Optimize { prompt, goal, input } => {
            let optimizer = PromptOptimizer::new(assistant);
            match input {
                Some(input) =>
                    match optimizer.compare(&prompt, &goal, &input).await {
                        Ok(comparison) => {
                            println!("Optimized prompt: {}\n", comparison.optimized_prompt);
                            println!("Original result: {}\n", comparison.original_result);
                            println!("Optimized result: {}", comparison.optimized_result);
                        }
                        Err(e) => println!("Error: {}", e),
                    }
                None => println!("{}", render_outcome(optimizer.optimize(&prompt, &goal).await)),
            }
        }
        Command::Batch { prompts } => {
            let prompts = owned_or_samples(&prompts, &SAMPLE_BATCH);
            let report = BatchProcessor::new(client).with_options(options).compare(&prompts).await;
            for (label, run) in [("Sequential", &report.sequential), ("Concurrent", &report.concurrent)] {
                println!("{} Processing:", label);
                for (prompt, result) in report.prompts.iter().zip(&run.results) {
                    println!("Prompt: {}\nResponse: {}\n", prompt, preview(result, 50));
                }
                println!("Time: {:.2}s\n", run.elapsed.as_secs_f64());
            }
            println!("Speedup: {:.2}x", report.speedup());
        }
        Command::Conversation { system, max_history, load, transcript } => {
            let mut conversation = ConversationManager::new(client, Some(system.as_str())).with_options(options);
            if let Some(max) = max_history {
                conversation = conversation.with_max_history(usize::try_from(max)?);
            }
            if let Some(path) = load {
                conversation.load(&path)?;
            }
            run_conversation(&mut conversation, &transcript).await?;
        }
    }
    Ok(())
}

fn prompt_config(path: Option<&Path>) -> Result<PromptConfig, Box<dyn Error + Send + Sync>> {
    let builtin = PromptConfig::builtin();
    match path {
        Some(path) => Ok(builtin.merged_with(load_prompts(path)?)),
        None => Ok(builtin),
    }
}

async fn print_model_list(ollama: &OllamaClient) {
    let models = match ollama.list_models().await {
        Ok(models) => models,
        Err(e) => {
            println!("Error: {}", e);
            return;
        }
    };
    if models.is_empty() {
        println!("No models installed. Pull one with `ollama pull llama3`.");
        return;
    }
    println!("{:<30} {:>12}  {}", "NAME", "SIZE", "MODIFIED");
    for model in &models {
        println!("{:<30} {:>12}  {}", model.name, format_bytes(model.size), model.modified_display());
    }
    println!("\nTotal: {} model(s), {}", models.len(), format_bytes(total_size(&models)));
    for (family, variants) in group_by_family(&models) {
        println!("  {}: {} variant(s)", family, variants.len());
    }
}

/// Accepts a partial name when it matches an installed model.
async fn print_model_details(ollama: &OllamaClient, name: &str) {
    let resolved = match ollama.list_models().await {
        Ok(models) => find_model(&models, name).map(|m| m.name.clone()),
        Err(e) => {
            warn!("Could not list models: {}", e);
            None
        }
    };
    let name = resolved.as_deref().unwrap_or(name);
    match ollama.show_model(name).await {
        Ok(details) => {
            println!("Model: {}", name);
            println!("\nParameters:\n{}", details.parameters);
            println!("\nTemplate:\n{}", preview(&details.template, 200));
            println!("\nModelfile:\n{}", preview(&details.modelfile, 500));
        }
        Err(e) => println!("Error: {}", e),
    }
}

/// Reads turns from stdin until `exit`/`quit` or end of input.
async fn run_conversation(conversation: &mut ConversationManager, transcript: &Path) -> CliResult {
    println!("Chat started. Commands: /clear, /history, /save, exit");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("You: ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        match handle_line(conversation, &line, transcript).await {
            Some(output) if output.is_empty() => {}
            Some(output) => println!("{}", output),
            None => {
                break;
            }
        }
    }
    if conversation.is_empty_state() {
        warn!("Nothing to save");
    } else {
        conversation.save(transcript)?;
    }
    Ok(())
}

/// One line of the interactive session. `/clear`, `/history` and `/save`
/// are handled locally; anything else is a chat turn. Returns the text to
/// print, or `None` when the session should end.
async fn handle_line(
    conversation: &mut ConversationManager,
    line: &str,
    transcript: &Path
) -> Option<String> {
    let output = match line.trim() {
        "" => String::new(),
        "exit" | "quit" => {
            return None;
        }
        "/clear" => {
            conversation.clear();
            "History cleared.".to_string()
        }
        "/history" => {
            let turns: Vec<_> = conversation
                .history()
                .into_iter()
                .filter(|m| m.role != Role::System)
                .collect();
            format_history_for_prompt(&turns).trim_end().to_string()
        }
        "/save" =>
            match conversation.save(transcript) {
                Ok(()) => format!("Saved to {}", transcript.display()),
                Err(e) => format!("Error: {}", e),
            }
        text => format!("Assistant: {}", conversation.send_text(text).await),
    };
    Some(output)
}
