//! Runs the real HTTP clients against an in-process fake Ollama server.

use axum::body::Body;
use axum::http::StatusCode;
use axum::response::{ IntoResponse, Response };
use axum::routing::{ get, post };
use axum::{ Json, Router };
use serde_json::{ json, Value };
use std::sync::Arc;

use ollama_recipes::assistant::{ render_outcome, Assistant, StreamMode };
use ollama_recipes::history::ConversationManager;
use ollama_recipes::llm::chat::ollama::OllamaClient;
use ollama_recipes::llm::chat::ChatClient;
use ollama_recipes::llm::embedding::ollama::OllamaEmbeddingClient;
use ollama_recipes::llm::embedding::EmbeddingClient;
use ollama_recipes::llm::{ LlmError, ModelOptions };
use ollama_recipes::models::chat::Role;
use ollama_recipes::rag::semantic::EmbeddingIndex;

fn not_found(model: &str) -> Response {
    (StatusCode::NOT_FOUND, Json(json!({"error": format!("model '{}' not found", model)}))).into_response()
}

/// Serializes `lines` as NDJSON and sends it in small chunks that cut
/// through the middle of lines.
fn ndjson(lines: Vec<Value>) -> Response {
    let body: String = lines
        .iter()
        .map(|l| format!("{}\n", l))
        .collect();
    let chunks: Vec<Result<String, std::io::Error>> = body
        .as_bytes()
        .chunks(7)
        .map(|c| Ok(String::from_utf8_lossy(c).into_owned()))
        .collect();
    Body::from_stream(futures::stream::iter(chunks)).into_response()
}

async fn generate(Json(body): Json<Value>) -> Response {
    let model = body["model"].as_str().unwrap_or_default();
    let prompt = body["prompt"].as_str().unwrap_or_default();
    if model == "missing" {
        return not_found(model);
    }
    if body["stream"].as_bool() == Some(true) {
        if model == "oom" {
            return ndjson(vec![json!({"response": "partial ", "done": false}), json!({"error": "out of memory"})]);
        }
        let mut lines: Vec<Value> = ["The ", "future ", "is ", "bright"]
            .iter()
            .map(|w| json!({"response": w, "done": false}))
            .collect();
        lines.push(json!({"response": "", "done": true}));
        return ndjson(lines);
    }
    let response = match body.get("options") {
        Some(options) => format!("echo: {} (options: {})", prompt, options),
        None => format!("echo: {}", prompt),
    };
    Json(json!({"model": model, "response": response, "done": true})).into_response()
}

async fn chat(Json(body): Json<Value>) -> Response {
    let model = body["model"].as_str().unwrap_or_default();
    if model == "missing" {
        return not_found(model);
    }
    let messages = body["messages"].as_array().cloned().unwrap_or_default();
    let last = messages
        .last()
        .and_then(|m| m["content"].as_str())
        .unwrap_or_default()
        .to_string();
    if body["stream"].as_bool() == Some(true) {
        return ndjson(
            vec![
                json!({"message": {"role": "assistant", "content": "Leaves "}, "done": false}),
                json!({"message": {"role": "assistant", "content": "fall."}, "done": false}),
                json!({"message": {"role": "assistant", "content": ""}, "done": true})
            ]
        );
    }
    let content = format!("{} message(s), first role {}, last: {}", messages.len(), messages[0]["role"], last);
    Json(json!({"message": {"role": "assistant", "content": content}, "done": true})).into_response()
}

async fn embeddings(Json(body): Json<Value>) -> Response {
    let embedding = match body["prompt"].as_str().unwrap_or_default() {
        "Cats purr." => json!([1.0, 0.0]),
        "Dogs bark." => json!([0.0, 1.0]),
        "kittens" => json!([0.9, 0.1]),
        _ => json!([]),
    };
    Json(json!({"embedding": embedding})).into_response()
}

async fn tags() -> Json<Value> {
    Json(
        json!({
        "models": [
            {"name": "llama3:latest", "size": 4661224676u64, "modified_at": "2024-05-01T10:30:00.123456-07:00", "digest": "abc"},
            {"name": "llama3:70b", "size": 39969745349u64, "modified_at": "2024-05-02T08:00:00Z", "digest": "def"}
        ]
    })
    )
}

async fn show(Json(body): Json<Value>) -> Response {
    let model = body["model"].as_str().unwrap_or_default();
    if model != "llama3" {
        return not_found(model);
    }
    Json(
        json!({
        "modelfile": "FROM llama3",
        "parameters": "stop \"<|eot_id|>\"",
        "template": "{{ .Prompt }}"
    })
    ).into_response()
}

async fn spawn_fake_ollama() -> String {
    let app = Router::new()
        .route("/api/generate", post(generate))
        .route("/api/chat", post(chat))
        .route("/api/embeddings", post(embeddings))
        .route("/api/tags", get(tags))
        .route("/api/show", post(show));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn client(base_url: &str, model: &str) -> Arc<OllamaClient> {
    Arc::new(OllamaClient::new(Some(format!("{}/", base_url)), Some(model.to_string())))
}

#[tokio::test]
async fn generate_returns_response_field() {
    let base = spawn_fake_ollama().await;
    let assistant = Assistant::new(client(&base, "llama3"));
    assert_eq!(assistant.complete("What is 2 + 2?").await.unwrap(), "echo: What is 2 + 2?");

    let tuned = assistant.with_options(ModelOptions::default().with_temperature(0.5));
    assert_eq!(
        tuned.complete("hi").await.unwrap(),
        "echo: hi (options: {\"temperature\":0.5})"
    );
}

#[tokio::test]
async fn chat_sends_system_and_user() {
    let base = spawn_fake_ollama().await;
    let assistant = Assistant::new(client(&base, "llama3")).with_persona("a pirate");
    assert_eq!(
        assistant.ask_text("Tell me about programming.").await,
        "2 message(s), first role \"system\", last: Tell me about programming."
    );
}

#[tokio::test]
async fn missing_model_is_reported() {
    let base = spawn_fake_ollama().await;
    let assistant = Assistant::new(client(&base, "missing"));

    let err = assistant.complete("hi").await.unwrap_err();
    assert!(matches!(err, LlmError::ModelNotFound(ref m) if m == "missing"));
    assert!(!err.is_retryable());
    assert!(assistant.ask_text("hi").await.starts_with("Error: model 'missing' not found"));
}

#[tokio::test]
async fn generate_stream_reassembles_split_lines() {
    let base = spawn_fake_ollama().await;
    let assistant = Assistant::new(client(&base, "llama3"));
    let mut out = Vec::new();
    let full = assistant.stream("Complete this", StreamMode::Generate, &mut out).await.unwrap();
    assert_eq!(full, "The future is bright");
    assert_eq!(String::from_utf8(out).unwrap(), "The future is bright\n");
}

#[tokio::test]
async fn chat_stream_yields_message_content() {
    let base = spawn_fake_ollama().await;
    let assistant = Assistant::new(client(&base, "llama3"));
    let mut out = Vec::new();
    let full = assistant.stream_text("Write a haiku", StreamMode::Chat, &mut out).await;
    assert_eq!(full, "Leaves fall.");
}

#[tokio::test]
async fn stream_error_line_ends_stream() {
    let base = spawn_fake_ollama().await;
    let assistant = Assistant::new(client(&base, "oom"));
    let mut out = Vec::new();
    let text = assistant.stream_text("anything", StreamMode::Generate, &mut out).await;
    assert_eq!(text, "Error: stream interrupted: out of memory");
    let printed = String::from_utf8(out).unwrap();
    assert!(printed.starts_with("partial "));
    assert!(printed.ends_with("Error: stream interrupted: out of memory\n"));
}

#[tokio::test]
async fn stream_to_missing_model_fails() {
    let base = spawn_fake_ollama().await;
    let assistant = Assistant::new(client(&base, "missing"));
    let mut out = Vec::new();
    let err = assistant.stream("hi", StreamMode::Generate, &mut out).await.unwrap_err();
    assert!(matches!(err, LlmError::ModelNotFound(_)));
}

#[tokio::test]
async fn unreachable_server_renders_error_text() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let assistant = Assistant::new(client(&format!("http://{}", addr), "llama3"));
    let err = assistant.complete("hello").await.unwrap_err();
    assert!(matches!(err, LlmError::Unreachable { .. }), "{:?}", err);
    assert!(err.is_retryable());
    assert!(render_outcome(Err(err)).starts_with("Error: could not reach Ollama"));
}

#[tokio::test]
async fn embedding_search_ranks_by_similarity() {
    let base = spawn_fake_ollama().await;
    let embedder = Arc::new(OllamaEmbeddingClient::new(Some(base), Some("nomic-embed-text".to_string())).unwrap());

    let first = embedder.embed("Cats purr.").await.unwrap();
    assert_eq!(first.embedding, vec![1.0, 0.0]);
    assert!(matches!(embedder.embed("unknown").await, Err(LlmError::EmptyEmbedding)));

    let index = EmbeddingIndex::build(embedder, vec!["Dogs bark.", "Cats purr.", "Birds sing."]).await;
    assert_eq!(index.len(), 3);
    let hits = index.search("kittens", 2).await.unwrap();
    let documents: Vec<&str> = hits
        .iter()
        .map(|h| h.document.as_str())
        .collect();
    assert_eq!(documents, vec!["Cats purr.", "Dogs bark."]);
}

#[tokio::test]
async fn lists_and_shows_models() {
    let base = spawn_fake_ollama().await;
    let ollama = client(&base, "llama3");

    let models = ollama.list_models().await.unwrap();
    assert_eq!(models.len(), 2);
    assert_eq!(models[0].family(), "llama3");
    assert_eq!(models[1].modified_display(), "2024-05-02 08:00");

    let details = ollama.show_model("llama3").await.unwrap();
    assert_eq!(details.modelfile, "FROM llama3");
    assert!(matches!(ollama.show_model("gemma").await, Err(LlmError::ModelNotFound(ref m)) if m == "gemma"));
}

#[tokio::test]
async fn conversation_replays_history_over_http() {
    let base = spawn_fake_ollama().await;
    let chat_client: Arc<dyn ChatClient> = client(&base, "llama3");
    let mut conversation = ConversationManager::new(chat_client, Some("You are a helpful math tutor."));

    conversation.send("What is 5 + 3?").await.unwrap();
    let second = conversation.send("Now multiply that by 2").await.unwrap();
    assert_eq!(second, "4 message(s), first role \"system\", last: Now multiply that by 2");

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("conversation.json");
    conversation.save(&path).unwrap();

    let mut restored = ConversationManager::new(client(&base, "llama3"), None);
    restored.load(&path).unwrap();
    let roles: Vec<Role> = restored
        .history()
        .iter()
        .map(|m| m.role)
        .collect();
    assert_eq!(roles, vec![Role::System, Role::User, Role::Assistant, Role::User, Role::Assistant]);
}
