pub mod answer_service;
pub mod catalog_provider;
pub mod fallback;
pub mod generation_client;
pub mod orchestrator;
pub mod prompt_builder;
pub mod quality_validator;
pub mod question_sink;
pub mod quiz_service;
pub mod response_parser;
pub mod session_store;
pub mod topic_selector;
