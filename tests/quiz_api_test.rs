use std::collections::VecDeque;
use std::env;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use quiz_engine::{
    build_router,
    config::GenerationSettings,
    models::question::Difficulty,
    services::{
        catalog_provider::StaticCatalogProvider,
        generation_client::{GenerationError, TextGenerator},
        question_sink::InMemoryQuestionSink,
        session_store::InMemorySessionStore,
    },
    AppState,
};
use serde_json::{json, Value as JsonValue};
use tower::ServiceExt;

const GOOD: &str = "Here is your question:\n\
                    Question: Which river is the longest in Nepal?\n\
                    A) Koshi\n\
                    B) Karnali\n\
                    C) Gandaki\n\
                    D) Bagmati\n\
                    Correct answer: B";

const EXPLANATION: &str = "The Karnali is the longest river that flows through Nepal.";

/// Pops scripted replies for question prompts; answers explanation prompts directly.
struct ScriptedGenerator {
    replies: Mutex<VecDeque<Result<String, GenerationError>>>,
    fallback: Result<String, GenerationError>,
}

impl ScriptedGenerator {
    fn new(
        replies: Vec<Result<String, GenerationError>>,
        fallback: Result<String, GenerationError>,
    ) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            fallback,
        }
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(
        &self,
        prompt: &str,
        _difficulty: Difficulty,
    ) -> Result<String, GenerationError> {
        if prompt.contains("explain why this answer is correct") {
            return Ok(EXPLANATION.to_string());
        }
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone())
    }
}

fn app(generator: ScriptedGenerator) -> (Router, InMemoryQuestionSink) {
    let sink = InMemoryQuestionSink::new();
    let state = AppState::new(
        Arc::new(generator),
        Arc::new(StaticCatalogProvider::builtin().expect("builtin catalog")),
        Arc::new(sink.clone()),
        Arc::new(InMemorySessionStore::new()),
        GenerationSettings {
            max_attempts: 3,
            retry_delay: Duration::ZERO,
            rng_seed: Some(11),
        },
    );
    (build_router(state), sink)
}

async fn call(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<JsonValue>,
) -> (StatusCode, JsonValue) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        JsonValue::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

#[tokio::test]
async fn health_and_domains() {
    let (app, _) = app(ScriptedGenerator::new(vec![], Ok(GOOD.to_string())));

    let (status, body) = call(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, body) = call(&app, "GET", "/api/quiz/domains", None).await;
    assert_eq!(status, StatusCode::OK);
    let domains = body["domains"].as_array().unwrap();
    assert_eq!(domains.len(), 7);
    assert!(domains.iter().any(|d| d["name"] == "public_service"));
}

#[tokio::test]
async fn question_then_answer_flow() {
    let (app, sink) = app(ScriptedGenerator::new(
        vec![Ok(GOOD.to_string())],
        Err(GenerationError::Timeout),
    ));

    let (status, question) = call(&app, "POST", "/api/quiz/sessions/alice/question", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(question["question"], "Which river is the longest in Nepal?");
    assert_eq!(question["options"]["B"], "Karnali");
    assert_eq!(question["question_number"], 1);
    assert_eq!(question["difficulty"], "easy");
    assert_eq!(question["source"], "generated");
    assert!(question.get("correct_label").is_none());
    assert!(question["question_id"].is_string());

    let saved = sink.saved().await;
    assert_eq!(saved.len(), 1);
    assert_eq!(json!(saved[0].0), question["question_id"]);

    let (status, answer) = call(
        &app,
        "POST",
        "/api/quiz/sessions/alice/answer",
        Some(json!({ "choice": "b" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(answer["correct"], true);
    assert_eq!(answer["your_choice"], "B");
    assert_eq!(answer["correct_answer"], "B");
    assert_eq!(answer["correct_text"], "Karnali");
    assert_eq!(answer["explanation"], EXPLANATION);

    let (_, wrong) = call(
        &app,
        "POST",
        "/api/quiz/sessions/alice/answer",
        Some(json!({ "choice": "D" })),
    )
    .await;
    assert_eq!(wrong["correct"], false);
}

#[tokio::test]
async fn broken_backend_still_serves_a_question() {
    let (app, sink) = app(ScriptedGenerator::new(
        vec![],
        Ok("Sorry, I can't help with that.".to_string()),
    ));

    let (status, question) = call(&app, "POST", "/api/quiz/sessions/bob/question", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(question["source"], "fallback");
    assert_eq!(question["options"].as_object().unwrap().len(), 4);
    assert_eq!(sink.saved().await.len(), 1);

    let (status, answer) = call(
        &app,
        "POST",
        "/api/quiz/sessions/bob/answer",
        Some(json!({ "choice": "A" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(answer["correct_text"].is_string());
}

#[tokio::test]
async fn answer_errors_and_reset() {
    let (app, _) = app(ScriptedGenerator::new(
        vec![Ok(GOOD.to_string())],
        Err(GenerationError::Timeout),
    ));

    let (status, body) = call(
        &app,
        "POST",
        "/api/quiz/sessions/carol/answer",
        Some(json!({ "choice": "A" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    call(&app, "POST", "/api/quiz/sessions/carol/question", None).await;

    let (status, _) = call(
        &app,
        "POST",
        "/api/quiz/sessions/carol/answer",
        Some(json!({ "choice": "E" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = call(
        &app,
        "POST",
        "/api/quiz/sessions/carol/answer",
        Some(json!({ "choice": "" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = call(&app, "POST", "/api/quiz/sessions/carol/reset", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "reset");

    let (status, _) = call(
        &app,
        "POST",
        "/api/quiz/sessions/carol/answer",
        Some(json!({ "choice": "B" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn sessions_are_independent() {
    let (app, _) = app(ScriptedGenerator::new(
        vec![Ok(GOOD.to_string())],
        Err(GenerationError::Transport("offline".to_string())),
    ));

    let (_, first) = call(&app, "POST", "/api/quiz/sessions/dave/question", None).await;
    let (_, second) = call(&app, "POST", "/api/quiz/sessions/erin/question", None).await;
    let (_, third) = call(&app, "POST", "/api/quiz/sessions/dave/question", None).await;

    assert_eq!(first["question_number"], 1);
    assert_eq!(second["question_number"], 1);
    assert_eq!(third["question_number"], 2);
}

#[test]
fn config_loads_from_environment() {
    env::set_var("SERVER_ADDRESS", "127.0.0.1:0");
    env::set_var("OLLAMA_URL", "http://127.0.0.1:11434");
    env::set_var("MAX_GENERATION_ATTEMPTS", "8");
    env::remove_var("DATABASE_URL");
    env::remove_var("CATALOG_PATH");

    quiz_engine::config::init_config().expect("init config");
    let config = quiz_engine::config::get_config();

    assert_eq!(config.ollama_model, "llama3");
    let settings = config.generation_settings();
    assert_eq!(settings.max_attempts, 8);
    assert_eq!(settings.retry_delay, Duration::from_millis(500));
    assert_eq!(config.client_settings().max_attempts, 3);
    assert!(config.database_url.is_none());
}
