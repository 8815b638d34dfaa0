use axum::{
    extract::{Path, State},
    response::{IntoResponse, Json},
};
use serde_json::json;
use validator::Validate;

use crate::dto::quiz_dto::{
    AnswerPayload, AnswerResponse, DomainSummary, DomainsResponse, QuestionResponse, SessionPath,
};
use crate::error::Error;
use crate::models::question::OptionLabel;
use crate::AppState;

#[axum::debug_handler]
pub async fn list_domains(
    State(state): State<AppState>,
) -> crate::error::Result<impl IntoResponse> {
    let catalog = state.quiz_service.catalog().await?;
    let domains = catalog.domains().iter().map(DomainSummary::from).collect();
    Ok(Json(DomainsResponse { domains }))
}

#[axum::debug_handler]
pub async fn next_question(
    State(state): State<AppState>,
    Path(path): Path<SessionPath>,
) -> crate::error::Result<impl IntoResponse> {
    path.validate()?;
    let (outcome, number) = state.quiz_service.next_question(&path.session_id).await?;
    Ok(Json(QuestionResponse::from_record(
        outcome.record,
        outcome.record_id,
        number,
    )))
}

#[axum::debug_handler]
pub async fn submit_answer(
    State(state): State<AppState>,
    Path(path): Path<SessionPath>,
    Json(payload): Json<AnswerPayload>,
) -> crate::error::Result<impl IntoResponse> {
    path.validate()?;
    payload.validate()?;
    let choice: OptionLabel = payload.choice.parse().map_err(Error::BadRequest)?;

    let check = state.quiz_service.answer(&path.session_id, choice).await?;
    Ok(Json(AnswerResponse {
        correct: check.correct,
        your_choice: check.your_choice,
        correct_answer: check.correct_answer,
        correct_text: check.correct_text,
        explanation: check.explanation,
    }))
}

#[axum::debug_handler]
pub async fn reset_session(
    State(state): State<AppState>,
    Path(path): Path<SessionPath>,
) -> crate::error::Result<impl IntoResponse> {
    path.validate()?;
    state.quiz_service.reset(&path.session_id).await?;
    Ok(Json(json!({ "status": "reset", "session_id": path.session_id })))
}
