pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;

use crate::config::{Config, GenerationSettings};
use crate::services::{
    answer_service::AnswerService, catalog_provider::CatalogProvider,
    generation_client::TextGenerator, orchestrator::QuestionOrchestrator,
    question_sink::QuestionSink, quiz_service::QuizService, session_store::SessionStore,
};
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub quiz_service: QuizService,
}

impl AppState {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        catalog: Arc<dyn CatalogProvider>,
        sink: Arc<dyn QuestionSink>,
        sessions: Arc<dyn SessionStore>,
        settings: GenerationSettings,
    ) -> Self {
        let orchestrator =
            QuestionOrchestrator::new(Arc::clone(&generator), Arc::clone(&catalog), sink, settings);
        let answers = AnswerService::new(generator);
        let quiz_service = QuizService::new(Arc::new(orchestrator), answers, sessions, catalog);

        Self { quiz_service }
    }

    pub fn from_config(
        config: &Config,
        generator: Arc<dyn TextGenerator>,
        catalog: Arc<dyn CatalogProvider>,
        sink: Arc<dyn QuestionSink>,
        sessions: Arc<dyn SessionStore>,
    ) -> Self {
        Self::new(generator, catalog, sink, sessions, config.generation_settings())
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::health::health))
        .route("/api/quiz/domains", get(routes::quiz::list_domains))
        .route(
            "/api/quiz/sessions/:session_id/question",
            post(routes::quiz::next_question),
        )
        .route(
            "/api/quiz/sessions/:session_id/answer",
            post(routes::quiz::submit_answer),
        )
        .route(
            "/api/quiz/sessions/:session_id/reset",
            post(routes::quiz::reset_session),
        )
        .with_state(state)
}
