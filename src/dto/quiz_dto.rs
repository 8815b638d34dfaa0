use chrono::{DateTime, Utc};
use crate::models::catalog::DomainEntry;
use crate::models::question::{Difficulty, OptionLabel, QuestionRecord, QuestionSource};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct SessionPath {
    #[validate(length(min = 1, max = 128))]
    pub session_id: String,
}

/// Served question; the correct label stays on the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionResponse {
    pub question_id: Option<String>,
    pub question_number: u32,
    pub question: String,
    pub options: BTreeMap<OptionLabel, String>,
    pub domain: String,
    pub topic: String,
    pub difficulty: Difficulty,
    pub source: QuestionSource,
    pub served_at: DateTime<Utc>,
}

impl QuestionResponse {
    pub fn from_record(
        record: QuestionRecord,
        question_id: Option<String>,
        question_number: u32,
    ) -> Self {
        Self {
            question_id,
            question_number,
            question: record.text,
            options: record.options,
            domain: record.domain,
            topic: record.topic,
            difficulty: record.difficulty,
            source: record.source,
            served_at: Utc::now(),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct AnswerPayload {
    #[validate(length(min = 1, max = 8))]
    pub choice: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerResponse {
    pub correct: bool,
    pub your_choice: OptionLabel,
    pub correct_answer: OptionLabel,
    pub correct_text: String,
    pub explanation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainSummary {
    pub name: String,
    pub base_weight: f64,
    pub topics: Vec<String>,
}

impl From<&DomainEntry> for DomainSummary {
    fn from(entry: &DomainEntry) -> Self {
        Self {
            name: entry.name.clone(),
            base_weight: entry.base_weight,
            topics: entry.topics.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainsResponse {
    pub domains: Vec<DomainSummary>,
}
