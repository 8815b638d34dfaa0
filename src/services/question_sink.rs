use crate::error::Result;
use crate::models::question::{Difficulty, QuestionRecord};
use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Receives every question that is served, generated or fallback.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QuestionSink: Send + Sync {
    async fn save(&self, record: &QuestionRecord, difficulty: Difficulty) -> Result<String>;
}

#[derive(Clone)]
pub struct PgQuestionSink {
    pool: PgPool,
}

impl PgQuestionSink {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl QuestionSink for PgQuestionSink {
    async fn save(&self, record: &QuestionRecord, difficulty: Difficulty) -> Result<String> {
        let options = serde_json::to_value(&record.options)?;
        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO questions
                (domain, topic, difficulty, question_text, options, correct_answer,
                 is_approved, is_reviewed)
            VALUES ($1, $2, $3, $4, $5, $6, TRUE, FALSE)
            RETURNING id
            "#,
        )
        .bind(&record.domain)
        .bind(&record.topic)
        .bind(difficulty.as_str())
        .bind(&record.text)
        .bind(options)
        .bind(record.correct_label.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(id.to_string())
    }
}

/// Keeps saved questions in memory; used when no database is configured.
#[derive(Clone, Default)]
pub struct InMemoryQuestionSink {
    saved: Arc<Mutex<Vec<(String, QuestionRecord)>>>,
}

impl InMemoryQuestionSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn saved(&self) -> Vec<(String, QuestionRecord)> {
        self.saved.lock().await.clone()
    }
}

#[async_trait]
impl QuestionSink for InMemoryQuestionSink {
    async fn save(&self, record: &QuestionRecord, difficulty: Difficulty) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        let mut stored = record.clone();
        stored.difficulty = difficulty;
        self.saved.lock().await.push((id.clone(), stored));
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::question::{OptionLabel, QuestionSource};

    fn record() -> QuestionRecord {
        QuestionRecord {
            text: "Which is the largest lake in Nepal?".to_string(),
            options: OptionLabel::ALL
                .iter()
                .zip(["Rara", "Phewa", "Begnas", "Tilicho"])
                .map(|(l, o)| (*l, o.to_string()))
                .collect(),
            correct_label: OptionLabel::A,
            domain: "geography".to_string(),
            topic: "lakes".to_string(),
            difficulty: Difficulty::Easy,
            source: QuestionSource::Generated,
            raw_snippet: String::new(),
        }
    }

    #[tokio::test]
    async fn in_memory_sink_assigns_distinct_ids() {
        let sink = InMemoryQuestionSink::new();
        let first = sink.save(&record(), Difficulty::Easy).await.unwrap();
        let second = sink.save(&record(), Difficulty::Hard).await.unwrap();
        assert_ne!(first, second);
        assert!(Uuid::parse_str(&first).is_ok());

        let saved = sink.saved().await;
        assert_eq!(saved.len(), 2);
        assert_eq!(saved[1].0, second);
        assert_eq!(saved[1].1.difficulty, Difficulty::Hard);
    }

    #[test]
    fn options_serialise_as_label_keyed_object() {
        let json = serde_json::to_value(&record().options).unwrap();
        assert_eq!(json["A"], "Rara");
        assert_eq!(json["D"], "Tilicho");
    }
}
