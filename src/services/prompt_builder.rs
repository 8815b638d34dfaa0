use crate::models::question::Difficulty;
use crate::models::session::SessionState;

/// Most recent questions listed in the avoid clause.
pub const AVOID_LIMIT: usize = 10;
/// Each avoided question is cut to this many characters.
pub const AVOID_ENTRY_CHARS: usize = 100;

const SYSTEM_PROMPT: &str = "You are an expert question setter for the Nepal Public Service \
Commission (Lok Sewa Aayog) examinations. You write precise, factual multiple-choice \
questions grounded in authoritative sources about Nepal.";

const INSTRUCTION_VARIANTS: &[&str] = &[
    "Write one factual, authoritative question about {topic} in the context of Nepal.",
    "Write one question that tests a specific fact, date or figure related to {topic}.",
    "Write one question asking which statement about {topic} is correct.",
    "Write one question about an institution, person or document connected to {topic}.",
    "Write one question comparing two closely related facts about {topic}.",
    "Write one question about the cause or consequence of an event related to {topic}.",
];

const GENERIC_GUIDANCE: &str =
    "Ask an authoritative, exam-relevant general knowledge question.";

fn domain_guidance(domain: &str) -> &'static str {
    match domain {
        "constitution" => {
            "Ask about articles, clauses, schedules, constitutional bodies and the scope of \
             fundamental rights."
        }
        "history" => {
            "Ask about historical dates (in Bikram Sambat), major treaties, dynasties and the key \
             works of rulers."
        }
        "geography" => {
            "Ask about Nepal's physical regions, rivers, national parks, and the features and \
             locations of districts."
        }
        "economics" => {
            "Use figures from the economic survey and the budget, the periodic plans and the main \
             economic indicators."
        }
        "public_service" => {
            "Ask about the Civil Service Act and Regulations, good governance and office procedure."
        }
        "science" => {
            "Cover new technology, climate change, health and scientific facts used in daily life."
        }
        "current_affairs" => {
            "Ask about recent national and international events, appointments and major awards."
        }
        _ => GENERIC_GUIDANCE,
    }
}

pub struct PromptBuilder;

impl PromptBuilder {
    pub fn variant_count() -> usize {
        INSTRUCTION_VARIANTS.len()
    }

    /// Phrasing rotates with the attempt index so retries never resend an identical prompt.
    pub fn instruction(topic: &str, attempt_index: u32) -> String {
        let variant = INSTRUCTION_VARIANTS[attempt_index as usize % INSTRUCTION_VARIANTS.len()];
        variant.replace("{topic}", topic)
    }

    pub fn build(
        domain: &str,
        topic: &str,
        difficulty: Difficulty,
        attempt_index: u32,
        session: &SessionState,
    ) -> String {
        let instruction = Self::instruction(topic, attempt_index);
        let guidance = domain_guidance(domain);
        let avoid = Self::avoid_clause(session);

        format!(
            "{SYSTEM_PROMPT}

Domain: {domain}
Topic: {topic}
Level: {difficulty} ({level})

Task: {instruction}

Rules:
1. The question must be grounded in verified facts.
2. Give exactly four options labelled A), B), C) and D). The options must be plausible and \
similar in length.
3. Exactly one option is correct.
4. Use clear, grammatical language.
5. Do not add any introduction, explanation or commentary. Output only the format below.

{guidance}
{avoid}
Output format:
Question: <the question>
A) <first option>
B) <second option>
C) <third option>
D) <fourth option>
Correct answer: <A/B/C/D>

Your question:",
            level = difficulty.description(),
        )
    }

    fn avoid_clause(session: &SessionState) -> String {
        if session.used_questions.is_empty() {
            return String::new();
        }
        let recent: Vec<String> = session
            .used_questions
            .recent(AVOID_LIMIT)
            .map(|q| q.chars().take(AVOID_ENTRY_CHARS).collect())
            .collect();
        format!(
            "Do not repeat these questions or close variants of them:\n- {}\n",
            recent.join("\n- ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embeds_format_guidance_and_topic() {
        let session = SessionState::new();
        let prompt = PromptBuilder::build("history", "unification", Difficulty::Easy, 0, &session);
        assert!(prompt.contains("Topic: unification"));
        assert!(prompt.contains("Level: easy"));
        assert!(prompt.contains("Bikram Sambat"));
        assert!(prompt.contains("Question: <the question>"));
        assert!(prompt.contains("D) <fourth option>"));
        assert!(prompt.contains("Correct answer: <A/B/C/D>"));
        assert!(!prompt.contains("Do not repeat"));
    }

    #[test]
    fn unknown_domain_gets_generic_guidance() {
        let session = SessionState::new();
        let prompt = PromptBuilder::build("astrology", "stars", Difficulty::Hard, 0, &session);
        assert!(prompt.contains(GENERIC_GUIDANCE));
    }

    #[test]
    fn phrasing_varies_by_attempt() {
        let session = SessionState::new();
        let first = PromptBuilder::build("history", "unification", Difficulty::Easy, 0, &session);
        let second = PromptBuilder::build("history", "unification", Difficulty::Easy, 1, &session);
        let wrapped = PromptBuilder::build(
            "history",
            "unification",
            Difficulty::Easy,
            PromptBuilder::variant_count() as u32,
            &session,
        );
        assert_ne!(first, second);
        assert_eq!(first, wrapped);
    }

    #[test]
    fn avoid_clause_is_bounded_and_truncated() {
        let mut session = SessionState::new();
        for i in 0..15 {
            session.used_questions.push(format!("Old question number {}?", i));
        }
        session.used_questions.push("x".repeat(250));
        let prompt =
            PromptBuilder::build("history", "unification", Difficulty::Medium, 0, &session);

        assert!(prompt.contains("Do not repeat"));
        assert!(!prompt.contains("Old question number 5?"));
        assert!(prompt.contains("Old question number 6?"));
        assert!(prompt.contains(&"x".repeat(AVOID_ENTRY_CHARS)));
        assert!(!prompt.contains(&"x".repeat(AVOID_ENTRY_CHARS + 1)));
        let listed = prompt.lines().filter(|l| l.starts_with("- ")).count();
        assert_eq!(listed, AVOID_LIMIT);
    }
}
