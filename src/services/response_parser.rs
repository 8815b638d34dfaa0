use crate::models::question::{Difficulty, OptionLabel, QuestionRecord, QuestionSource};
use rand::seq::SliceRandom;
use rand::Rng;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

const SNIPPET_CHARS: usize = 200;
/// Shortest line the positional fill will treat as an option.
const MIN_FILL_CHARS: usize = 3;

static PREAMBLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?i)^(?:here is|here's|here are|sure|certainly|of course|absolutely",
        r"|यहाँ|यस्तो छ|तपाईंको प्रश्न|निश्चित रूपमा)\b",
    ))
    .expect("preamble regex is invalid")
});
static ERROR_REPLY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^error\b").expect("error regex is invalid"));
static BULLET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[-•]\s+").expect("bullet regex is invalid"));
static QUESTION_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:question|प्रश्न)\s*\d*\s*[:.\-]\s*(.*)$")
        .expect("question regex is invalid")
});

static OPT_PAREN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Da-dकखगघ])\)\s*(.+)$").expect("option regex is invalid"));
static OPT_PERIOD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Da-dकखगघ])\.\s*(.+)$").expect("option regex is invalid"));
static OPT_DASH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Da-dकखगघ])\s*-\s*(.+)$").expect("option regex is invalid"));
static OPT_COLON: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Da-dकखगघ])\s*:\s*(.+)$").expect("option regex is invalid"));
static OPT_BRACKETED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\(([A-Da-dकखगघ])\)\s*(.+)$").expect("option regex is invalid"));

static ANS_LABELLED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?i)(?:correct|सही)\s*(?:answer|option|जवाफ|उत्तर)",
        r"\s*(?:is)?\s*[:\-]?\s*\(?([A-Dकखगघ])\b",
    ))
    .expect("answer regex is invalid")
});
static ANS_PLAIN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:answer|ans|जवाफ|उत्तर)\s*(?:is)?\s*[:\-]?\s*\(?([A-Dकखगघ])\b")
        .expect("answer regex is invalid")
});
static ANS_BARE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\(?([A-Dकखगघ])\)?\.?$").expect("answer regex is invalid"));
static ANS_OPTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:option|विकल्प)\s*\(?([A-Dकखगघ])\b").expect("answer regex is invalid")
});

/// Option line styles, tried in order on every line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionMarker {
    /// `A) text`
    Paren,
    /// `A. text`
    Period,
    /// `A - text`
    Dash,
    /// `A: text`
    Colon,
    /// `(A) text`
    Bracketed,
}

impl OptionMarker {
    pub const ORDER: [OptionMarker; 5] = [
        OptionMarker::Paren,
        OptionMarker::Period,
        OptionMarker::Dash,
        OptionMarker::Colon,
        OptionMarker::Bracketed,
    ];

    fn pattern(&self) -> &'static Regex {
        match self {
            OptionMarker::Paren => &OPT_PAREN,
            OptionMarker::Period => &OPT_PERIOD,
            OptionMarker::Dash => &OPT_DASH,
            OptionMarker::Colon => &OPT_COLON,
            OptionMarker::Bracketed => &OPT_BRACKETED,
        }
    }

    fn capture(&self, line: &str) -> Option<(OptionLabel, String)> {
        let caps = self.pattern().captures(line)?;
        let label = caps.get(1)?.as_str().chars().next().and_then(OptionLabel::from_char)?;
        let text = caps.get(2)?.as_str().trim();
        if text.is_empty() {
            return None;
        }
        Some((label, text.to_string()))
    }
}

/// Correct-answer phrasings, most specific first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerMarker {
    /// `Correct answer: B`
    Labelled,
    /// `Answer: B`
    Plain,
    /// `B` on its own line
    Bare,
    /// `Option B`
    OptionWord,
}

impl AnswerMarker {
    pub const ORDER: [AnswerMarker; 4] = [
        AnswerMarker::Labelled,
        AnswerMarker::Plain,
        AnswerMarker::Bare,
        AnswerMarker::OptionWord,
    ];

    fn pattern(&self) -> &'static Regex {
        match self {
            AnswerMarker::Labelled => &ANS_LABELLED,
            AnswerMarker::Plain => &ANS_PLAIN,
            AnswerMarker::Bare => &ANS_BARE,
            AnswerMarker::OptionWord => &ANS_OPTION,
        }
    }

    fn capture(&self, line: &str) -> Option<OptionLabel> {
        let caps = self.pattern().captures(line)?;
        caps.get(1)?.as_str().chars().next().and_then(OptionLabel::from_char)
    }

    fn matches(&self, line: &str) -> bool {
        self.capture(line).is_some()
    }
}

pub struct ResponseParser;

impl ResponseParser {
    /// Trimmed, whitespace-collapsed, non-empty lines with markdown emphasis and bullets removed
    /// and chatty preamble lines dropped.
    pub fn normalize_lines(raw_text: &str) -> Vec<String> {
        let lines: Vec<String> = raw_text
            .lines()
            .map(|line| {
                let collapsed = line.split_whitespace().collect::<Vec<_>>().join(" ");
                let unbolded = collapsed.replace("**", "").replace("__", "");
                BULLET.replace(unbolded.trim(), "").trim().to_string()
            })
            .filter(|line| !line.is_empty())
            .collect();

        let without_preamble: Vec<String> = lines
            .iter()
            .filter(|line| !(PREAMBLE.is_match(line) && !line.contains('?')))
            .cloned()
            .collect();

        if without_preamble.is_empty() {
            lines
        } else {
            without_preamble
        }
    }

    /// True when the backend answered with an error message instead of content.
    pub fn is_error_reply(raw_text: &str) -> bool {
        raw_text
            .lines()
            .map(|line| line.replace("**", ""))
            .map(|line| line.trim().to_string())
            .find(|line| !line.is_empty())
            .is_some_and(|line| ERROR_REPLY.is_match(&line))
    }

    pub fn parse<R: Rng + ?Sized>(
        raw_text: &str,
        domain: &str,
        topic: &str,
        difficulty: Difficulty,
        rng: &mut R,
    ) -> Option<QuestionRecord> {
        if Self::is_error_reply(raw_text) {
            tracing::debug!("Response is a backend error message");
            return None;
        }
        let lines = Self::normalize_lines(raw_text);
        if lines.is_empty() {
            return None;
        }

        let (question_idx, question) = Self::find_question(&lines)?;
        let options = Self::extract_options(&lines, question_idx);
        if options.len() != 4 {
            tracing::debug!(found = options.len(), "Response has fewer than four options");
            return None;
        }

        let correct_label = match Self::find_correct_label(&lines) {
            Some(label) => label,
            None => {
                // No marker at all: settle on an interior label instead of discarding the question.
                let label = *OptionLabel::INTERIOR.choose(rng)?;
                tracing::debug!(label = %label, "No correct-answer marker, picked interior label");
                label
            }
        };
        if !options.contains_key(&correct_label) {
            return None;
        }

        let normalized = lines.join("\n");
        Some(QuestionRecord {
            text: question,
            options,
            correct_label,
            domain: domain.to_string(),
            topic: topic.to_string(),
            difficulty,
            source: QuestionSource::Generated,
            raw_snippet: normalized.chars().take(SNIPPET_CHARS).collect(),
        })
    }

    /// Marker line first, then the first line that reads like a question, then the first line.
    fn find_question(lines: &[String]) -> Option<(usize, String)> {
        for (idx, line) in lines.iter().enumerate() {
            if let Some(caps) = QUESTION_MARKER.captures(line) {
                let rest = caps.get(1).map(|m| m.as_str().trim()).unwrap_or("");
                if !rest.is_empty() {
                    return Some((idx, rest.to_string()));
                }
                if let Some(next) = lines.get(idx + 1) {
                    if Self::option_on(next).is_none() {
                        return Some((idx + 1, next.clone()));
                    }
                }
            }
        }

        if let Some((idx, line)) = lines.iter().enumerate().find(|(_, l)| looks_like_question(l)) {
            return Some((idx, line.clone()));
        }

        lines.first().map(|l| (0, l.clone()))
    }

    fn option_on(line: &str) -> Option<(OptionLabel, String)> {
        OptionMarker::ORDER.iter().find_map(|m| m.capture(line))
    }

    fn extract_options(lines: &[String], question_idx: usize) -> BTreeMap<OptionLabel, String> {
        let mut options = BTreeMap::new();
        let mut marked = vec![false; lines.len()];

        for (idx, line) in lines.iter().enumerate() {
            if options.len() == 4 {
                break;
            }
            if idx == question_idx {
                continue;
            }
            if let Some((label, text)) = Self::option_on(line) {
                marked[idx] = true;
                options.entry(label).or_insert(text);
            }
        }

        // Markers caught some options: fill the gaps, in label order, from the
        // remaining substantive lines after the question.
        if !options.is_empty() && options.len() < 4 {
            let mut fill = lines
                .iter()
                .enumerate()
                .skip(question_idx + 1)
                .filter(|(idx, line)| {
                    !marked[*idx]
                        && line.chars().count() >= MIN_FILL_CHARS
                        && !AnswerMarker::ORDER.iter().any(|m| m.matches(line))
                })
                .map(|(_, line)| line.clone());
            for label in OptionLabel::ALL {
                if options.contains_key(&label) {
                    continue;
                }
                match fill.next() {
                    Some(text) => {
                        options.insert(label, text);
                    }
                    None => break,
                }
            }
        }

        options
    }

    fn find_correct_label(lines: &[String]) -> Option<OptionLabel> {
        let cleaned: Vec<String> = lines
            .iter()
            .map(|l| l.replace('*', "").trim().to_string())
            .collect();
        AnswerMarker::ORDER
            .iter()
            .find_map(|marker| cleaned.iter().find_map(|line| marker.capture(line)))
    }
}

fn looks_like_question(line: &str) -> bool {
    if line.contains('?') || line.contains('？') {
        return true;
    }
    line.split_whitespace().any(|word| {
        let word = word
            .trim_matches(|c: char| !c.is_alphanumeric())
            .to_lowercase();
        matches!(
            word.as_str(),
            "which"
                | "what"
                | "who"
                | "whom"
                | "whose"
                | "when"
                | "where"
                | "why"
                | "how"
                | "कुन"
                | "के"
                | "कति"
                | "कहाँ"
                | "कसले"
        )
    })
}
