use crate::models::question::{QuestionRecord, MAX_QUESTION_CHARS, MIN_QUESTION_CHARS};
use crate::models::session::SessionState;
use std::collections::HashSet;

const MIN_OPTION_CHARS: usize = 2;
const MAX_OPTION_CHARS: usize = 150;
const MAX_OPTION_SPREAD: usize = 80;
const MIN_DISTINCT_OPTIONS: usize = 3;
const SIMILARITY_WINDOW: usize = 8;
const MAX_SIMILARITY: f64 = 0.75;

#[derive(Debug, Clone, PartialEq)]
pub enum Rejection {
    QuestionLength(usize),
    ExactDuplicate,
    OptionLength(usize),
    OptionSpread(usize),
    DuplicateOptions(usize),
    TooSimilar(f64),
}

pub struct QualityValidator;

impl QualityValidator {
    pub fn validate(record: &QuestionRecord, session: &SessionState) -> bool {
        Self::check(record, session).is_ok()
    }

    /// Same rules as [`QualityValidator::validate`], reporting the first one that failed.
    pub fn check(record: &QuestionRecord, session: &SessionState) -> Result<(), Rejection> {
        let question_len = record.text.chars().count();
        if !(MIN_QUESTION_CHARS..=MAX_QUESTION_CHARS).contains(&question_len) {
            return Err(Rejection::QuestionLength(question_len));
        }

        if session.used_questions.contains(&record.text) {
            return Err(Rejection::ExactDuplicate);
        }

        let lengths: Vec<usize> = record.options.values().map(|o| o.chars().count()).collect();
        if let Some(bad) = lengths
            .iter()
            .find(|len| **len < MIN_OPTION_CHARS || **len > MAX_OPTION_CHARS)
        {
            return Err(Rejection::OptionLength(*bad));
        }

        let spread = lengths.iter().max().unwrap_or(&0) - lengths.iter().min().unwrap_or(&0);
        if spread > MAX_OPTION_SPREAD {
            return Err(Rejection::OptionSpread(spread));
        }

        let distinct: HashSet<&String> = record.options.values().collect();
        if distinct.len() < MIN_DISTINCT_OPTIONS {
            return Err(Rejection::DuplicateOptions(distinct.len()));
        }

        for previous in session.used_questions.recent(SIMILARITY_WINDOW) {
            let similarity = jaccard_similarity(&record.text, previous);
            if similarity > MAX_SIMILARITY {
                return Err(Rejection::TooSimilar(similarity));
            }
        }

        Ok(())
    }
}

/// |A ∩ B| / |A ∪ B| over lowercased whitespace tokens; 0 when either side is empty.
pub fn jaccard_similarity(a: &str, b: &str) -> f64 {
    let left: HashSet<String> = a.split_whitespace().map(str::to_lowercase).collect();
    let right: HashSet<String> = b.split_whitespace().map(str::to_lowercase).collect();
    if left.is_empty() || right.is_empty() {
        return 0.0;
    }
    let intersection = left.intersection(&right).count();
    let union = left.union(&right).count();
    intersection as f64 / union as f64
}
