use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

pub const MIN_QUESTION_CHARS: usize = 10;
pub const MAX_QUESTION_CHARS: usize = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum OptionLabel {
    A,
    B,
    C,
    D,
}

impl OptionLabel {
    pub const ALL: [OptionLabel; 4] = [
        OptionLabel::A,
        OptionLabel::B,
        OptionLabel::C,
        OptionLabel::D,
    ];

    /// Labels used when the backend never says which option is correct.
    pub const INTERIOR: [OptionLabel; 2] = [OptionLabel::B, OptionLabel::C];

    pub fn as_str(&self) -> &'static str {
        match self {
            OptionLabel::A => "A",
            OptionLabel::B => "B",
            OptionLabel::C => "C",
            OptionLabel::D => "D",
        }
    }

    /// Accepts Latin letters in either case and the Devanagari labels क ख ग घ.
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'A' | 'a' | 'क' => Some(OptionLabel::A),
            'B' | 'b' | 'ख' => Some(OptionLabel::B),
            'C' | 'c' | 'ग' => Some(OptionLabel::C),
            'D' | 'd' | 'घ' => Some(OptionLabel::D),
            _ => None,
        }
    }
}

impl fmt::Display for OptionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OptionLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s
            .trim()
            .trim_start_matches('(')
            .trim_end_matches(|c: char| c == ')' || c == '.' || c == ':');
        let mut chars = trimmed.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => {
                OptionLabel::from_char(c).ok_or_else(|| format!("Unknown option label: {}", s))
            }
            _ => Err(format!("Unknown option label: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Difficulty::Easy => "basic facts that a well-prepared beginner should know",
            Difficulty::Medium => "applied knowledge expected at officer-level examinations",
            Difficulty::Hard => "detailed provisions, exact figures and fine distinctions",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionSource {
    #[default]
    Generated,
    Fallback,
    Emergency,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionRecord {
    pub text: String,
    pub options: BTreeMap<OptionLabel, String>,
    pub correct_label: OptionLabel,
    pub domain: String,
    pub topic: String,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub source: QuestionSource,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub raw_snippet: String,
}

impl QuestionRecord {
    pub fn correct_text(&self) -> Option<&str> {
        self.options.get(&self.correct_label).map(String::as_str)
    }

    pub fn text_len(&self) -> usize {
        self.text.chars().count()
    }

    /// Four labels present, correct label among them, text length in bounds.
    pub fn is_structurally_valid(&self) -> bool {
        OptionLabel::ALL.iter().all(|l| self.options.contains_key(l))
            && self.options.len() == 4
            && self.options.contains_key(&self.correct_label)
            && (MIN_QUESTION_CHARS..=MAX_QUESTION_CHARS).contains(&self.text_len())
    }

    pub fn topic_key(&self) -> String {
        topic_key(&self.domain, &self.topic)
    }

    pub fn is_fallback(&self) -> bool {
        self.source != QuestionSource::Generated
    }
}

pub fn topic_key(domain: &str, topic: &str) -> String {
    format!("{}:{}", domain, topic)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> QuestionRecord {
        let options = BTreeMap::from([
            (OptionLabel::A, "Four years".to_string()),
            (OptionLabel::B, "Five years".to_string()),
            (OptionLabel::C, "Six years".to_string()),
            (OptionLabel::D, "Seven years".to_string()),
        ]);
        QuestionRecord {
            text: "What is the term of a provincial assembly?".to_string(),
            options,
            correct_label: OptionLabel::B,
            domain: "constitution".to_string(),
            topic: "provincial assembly".to_string(),
            difficulty: Difficulty::Easy,
            source: QuestionSource::Generated,
            raw_snippet: String::new(),
        }
    }

    #[test]
    fn labels_parse_from_latin_and_devanagari() {
        assert_eq!("b".parse::<OptionLabel>().unwrap(), OptionLabel::B);
        assert_eq!(" C) ".parse::<OptionLabel>().unwrap(), OptionLabel::C);
        assert_eq!("(D)".parse::<OptionLabel>().unwrap(), OptionLabel::D);
        assert_eq!("ख".parse::<OptionLabel>().unwrap(), OptionLabel::B);
        assert_eq!("घ".parse::<OptionLabel>().unwrap(), OptionLabel::D);
        assert!("E".parse::<OptionLabel>().is_err());
        assert!("AB".parse::<OptionLabel>().is_err());
        assert!("".parse::<OptionLabel>().is_err());
    }

    #[test]
    fn structural_validity() {
        let record = sample();
        assert!(record.is_structurally_valid());
        assert_eq!(record.correct_text(), Some("Five years"));
        assert_eq!(record.topic_key(), "constitution:provincial assembly");

        let mut missing = sample();
        missing.options.remove(&OptionLabel::D);
        assert!(!missing.is_structurally_valid());

        let mut short = sample();
        short.text = "Why?".to_string();
        assert!(!short.is_structurally_valid());
    }

    #[test]
    fn serializes_labels_as_letters() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["correct_label"], "B");
        assert_eq!(json["options"]["A"], "Four years");
        assert_eq!(json["difficulty"], "easy");
        assert!(json.get("raw_snippet").is_none());
    }
}
