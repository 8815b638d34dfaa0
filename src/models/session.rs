use crate::models::question::QuestionRecord;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};

pub const USED_QUESTIONS_CAP: usize = 100;
pub const USED_TOPIC_KEYS_CAP: usize = 80;

/// FIFO that drops its oldest entry once `capacity` is reached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundedHistory {
    capacity: usize,
    items: VecDeque<String>,
}

impl BoundedHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            items: VecDeque::with_capacity(capacity.max(1)),
        }
    }

    pub fn push(&mut self, item: impl Into<String>) {
        if self.items.len() == self.capacity {
            self.items.pop_front();
        }
        self.items.push_back(item.into());
    }

    pub fn contains(&self, item: &str) -> bool {
        self.items.iter().any(|i| i == item)
    }

    /// The last `n` entries, oldest first.
    pub fn recent(&self, n: usize) -> impl Iterator<Item = &String> {
        self.items.iter().skip(self.items.len().saturating_sub(n))
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub used_questions: BoundedHistory,
    pub used_topic_keys: BoundedHistory,
    pub domain_usage_counts: HashMap<String, u32>,
    pub total_generated: u32,
    pub current_question: Option<QuestionRecord>,
    pub current_question_id: Option<String>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            used_questions: BoundedHistory::new(USED_QUESTIONS_CAP),
            used_topic_keys: BoundedHistory::new(USED_TOPIC_KEYS_CAP),
            domain_usage_counts: HashMap::new(),
            total_generated: 0,
            current_question: None,
            current_question_id: None,
        }
    }
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn domain_usage(&self, domain: &str) -> u32 {
        self.domain_usage_counts.get(domain).copied().unwrap_or(0)
    }

    /// Commits a served question (generated or fallback) to the history.
    pub(crate) fn record_served(&mut self, record: &QuestionRecord, record_id: Option<String>) {
        self.used_questions.push(record.text.clone());
        self.used_topic_keys.push(record.topic_key());
        *self
            .domain_usage_counts
            .entry(record.domain.clone())
            .or_insert(0) += 1;
        self.total_generated += 1;
        self.current_question = Some(record.clone());
        self.current_question_id = record_id;
    }
}
