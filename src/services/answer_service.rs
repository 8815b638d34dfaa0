use crate::error::{Error, Result};
use crate::models::question::{Difficulty, OptionLabel, QuestionRecord};
use crate::models::session::SessionState;
use crate::services::generation_client::TextGenerator;
use crate::services::response_parser::ResponseParser;
use serde::Serialize;
use std::sync::Arc;

pub const DEFAULT_EXPLANATION: &str = "This is the correct answer.";
const MAX_EXPLANATION_CHARS: usize = 600;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnswerCheck {
    pub correct: bool,
    pub your_choice: OptionLabel,
    pub correct_answer: OptionLabel,
    pub correct_text: String,
    pub explanation: String,
}

#[derive(Clone)]
pub struct AnswerService {
    generator: Arc<dyn TextGenerator>,
}

impl AnswerService {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    pub fn is_correct(record: &QuestionRecord, choice: OptionLabel) -> bool {
        record.correct_label == choice
    }

    /// Compares `choice` against the session's current question.
    pub async fn check(&self, session: &SessionState, choice: OptionLabel) -> Result<AnswerCheck> {
        let record = session
            .current_question
            .as_ref()
            .ok_or_else(|| {
                Error::BadRequest("No question has been served in this session".to_string())
            })?;

        let correct = Self::is_correct(record, choice);
        let explanation = self.explain(record).await;

        Ok(AnswerCheck {
            correct,
            your_choice: choice,
            correct_answer: record.correct_label,
            correct_text: record.correct_text().unwrap_or_default().to_string(),
            explanation,
        })
    }

    /// Best effort; falls back to [`DEFAULT_EXPLANATION`].
    pub async fn explain(&self, record: &QuestionRecord) -> String {
        let prompt = explanation_prompt(record);
        match self.generator.generate(&prompt, Difficulty::Easy).await {
            Ok(text) => {
                let text = text.trim();
                if text.is_empty() || ResponseParser::is_error_reply(text) {
                    DEFAULT_EXPLANATION.to_string()
                } else {
                    text.chars().take(MAX_EXPLANATION_CHARS).collect()
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Explanation generation failed, using default");
                DEFAULT_EXPLANATION.to_string()
            }
        }
    }
}

fn explanation_prompt(record: &QuestionRecord) -> String {
    format!(
        "Question: {}\nCorrect answer: {}) {}\n\n\
         In two or three sentences, explain why this answer is correct. \
         Do not restate the question.",
        record.text,
        record.correct_label,
        record.correct_text().unwrap_or_default()
    )
}
