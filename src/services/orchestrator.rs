use crate::config::GenerationSettings;
use crate::error::Result;
use crate::models::question::{Difficulty, QuestionRecord};
use crate::models::session::SessionState;
use crate::services::catalog_provider::CatalogProvider;
use crate::services::fallback::FallbackPool;
use crate::services::generation_client::{GenerationError, TextGenerator};
use crate::services::prompt_builder::PromptBuilder;
use crate::services::quality_validator::{QualityValidator, Rejection};
use crate::services::question_sink::QuestionSink;
use crate::services::response_parser::ResponseParser;
use crate::services::topic_selector::{TopicSelection, TopicSelector};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::{Arc, Mutex};

/// Why a single generation attempt was thrown away.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AttemptFailure {
    #[error("backend call failed: {0}")]
    Transport(GenerationError),

    #[error("response could not be parsed")]
    Parse,

    #[error("question rejected: {0:?}")]
    Rejected(Rejection),
}

#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    pub record: QuestionRecord,
    /// Backend attempts spent; zero for the emergency pool.
    pub attempts: u32,
    pub record_id: Option<String>,
}

/// Drives select → prompt → generate → parse → validate, falling back to
/// canned questions so a caller always gets a record.
pub struct QuestionOrchestrator {
    generator: Arc<dyn TextGenerator>,
    catalog: Arc<dyn CatalogProvider>,
    sink: Arc<dyn QuestionSink>,
    settings: GenerationSettings,
    rng: Mutex<StdRng>,
}

impl QuestionOrchestrator {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        catalog: Arc<dyn CatalogProvider>,
        sink: Arc<dyn QuestionSink>,
        settings: GenerationSettings,
    ) -> Self {
        let rng = match settings.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            generator,
            catalog,
            sink,
            settings,
            rng: Mutex::new(rng),
        }
    }

    pub fn settings(&self) -> &GenerationSettings {
        &self.settings
    }

    /// Never fails. The served record is committed to `session` and handed to the sink.
    pub async fn generate_question(&self, session: &mut SessionState) -> GenerationOutcome {
        let mut rng = self.fork_rng();

        let (record, attempts) = match self.run_pipeline(session, &mut rng).await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!(error = %e, "Question pipeline failed, serving emergency question");
                (FallbackPool::emergency(session, &mut rng), 0)
            }
        };

        let record_id = self.persist(&record).await;
        session.record_served(&record, record_id.clone());

        GenerationOutcome {
            record,
            attempts,
            record_id,
        }
    }

    async fn run_pipeline(
        &self,
        session: &SessionState,
        rng: &mut StdRng,
    ) -> Result<(QuestionRecord, u32)> {
        let catalog = self.catalog.catalog().await?;
        let selection = TopicSelector::select(session, &catalog, rng)?;
        let max_attempts = self.settings.max_attempts.max(1);

        for attempt in 0..max_attempts {
            match self.attempt(&selection, attempt, session, rng).await {
                Ok(record) => {
                    tracing::info!(
                        domain = %record.domain,
                        topic = %record.topic,
                        difficulty = %record.difficulty,
                        attempts = attempt + 1,
                        "Generated question accepted"
                    );
                    return Ok((record, attempt + 1));
                }
                Err(AttemptFailure::Transport(e)) => {
                    tracing::warn!(attempt = attempt + 1, error = %e, "Generation attempt failed");
                }
                Err(failure) => {
                    tracing::debug!(
                        attempt = attempt + 1,
                        reason = %failure,
                        "Generation attempt discarded"
                    );
                }
            }

            if attempt + 1 < max_attempts {
                tokio::time::sleep(self.settings.retry_delay).await;
            }
        }

        tracing::warn!(
            domain = %selection.domain,
            topic = %selection.topic,
            attempts = max_attempts,
            "Attempt budget exhausted, serving fallback question"
        );
        let record = FallbackPool::domain_fallback(
            &selection.domain,
            &selection.topic,
            selection.difficulty,
            session,
            rng,
        );
        Ok((record, max_attempts))
    }

    async fn attempt(
        &self,
        selection: &TopicSelection,
        attempt: u32,
        session: &SessionState,
        rng: &mut StdRng,
    ) -> std::result::Result<QuestionRecord, AttemptFailure> {
        let prompt = PromptBuilder::build(
            &selection.domain,
            &selection.topic,
            selection.difficulty,
            attempt,
            session,
        );
        let raw = self
            .call_backend(prompt, selection.difficulty)
            .await
            .map_err(AttemptFailure::Transport)?;

        let record = ResponseParser::parse(
            &raw,
            &selection.domain,
            &selection.topic,
            selection.difficulty,
            rng,
        )
        .ok_or(AttemptFailure::Parse)?;

        QualityValidator::check(&record, session).map_err(AttemptFailure::Rejected)?;
        Ok(record)
    }

    /// The backend call runs on its own task so that dropping the caller's
    /// future leaves it to finish against its own timeout.
    async fn call_backend(
        &self,
        prompt: String,
        difficulty: Difficulty,
    ) -> std::result::Result<String, GenerationError> {
        let generator = Arc::clone(&self.generator);
        let handle = tokio::spawn(async move { generator.generate(&prompt, difficulty).await });
        match handle.await {
            Ok(result) => result,
            Err(e) => Err(GenerationError::Transport(format!("generation task failed: {}", e))),
        }
    }

    async fn persist(&self, record: &QuestionRecord) -> Option<String> {
        match self.sink.save(record, record.difficulty).await {
            Ok(id) => Some(id),
            Err(e) => {
                tracing::error!(
                    error = %e,
                    source = ?record.source,
                    "Failed to persist question, serving it anyway"
                );
                None
            }
        }
    }

    fn fork_rng(&self) -> StdRng {
        let mut shared = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        StdRng::from_rng(&mut *shared).unwrap_or_else(|_| StdRng::from_entropy())
    }
}
