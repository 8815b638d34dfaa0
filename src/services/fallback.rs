use crate::models::question::{Difficulty, OptionLabel, QuestionRecord, QuestionSource};
use crate::models::session::SessionState;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::BTreeMap;

pub const EMERGENCY_DOMAIN: &str = "general_knowledge";
const MAX_TOPIC_CHARS_IN_SYNTHESIS: usize = 200;

struct CannedQuestion {
    topic: &'static str,
    text: &'static str,
    options: [&'static str; 4],
    correct: OptionLabel,
}

const CONSTITUTION: &[CannedQuestion] = &[
    CannedQuestion {
        topic: "federal structure",
        text: "How many provinces does the Constitution of Nepal (2072 BS) establish?",
        options: ["Five", "Seven", "Nine", "Fourteen"],
        correct: OptionLabel::B,
    },
    CannedQuestion {
        topic: "promulgation",
        text: "On which date was the current Constitution of Nepal promulgated?",
        options: ["Asoj 3, 2072 BS", "Jestha 15, 2065 BS", "Magh 1, 2063 BS", "Kartik 23, 2047 BS"],
        correct: OptionLabel::A,
    },
    CannedQuestion {
        topic: "federal parliament",
        text: "What is the term of the House of Representatives under the Constitution of Nepal?",
        options: ["Four years", "Five years", "Six years", "Three years"],
        correct: OptionLabel::B,
    },
];

const HISTORY: &[CannedQuestion] = &[
    CannedQuestion {
        topic: "unification",
        text: "Which king began the unification of modern Nepal?",
        options: [
            "Prithvi Narayan Shah",
            "Ram Shah",
            "Rana Bahadur Shah",
            "Mahendra Bir Bikram Shah",
        ],
        correct: OptionLabel::A,
    },
    CannedQuestion {
        topic: "treaties",
        text: "Which treaty ended the Anglo-Nepal war?",
        options: [
            "Treaty of Betrawati",
            "Treaty of Sugauli",
            "Treaty of Kerung",
            "Treaty of Thapathali",
        ],
        correct: OptionLabel::B,
    },
    CannedQuestion {
        topic: "democratic movements",
        text: "In which year did the revolution that ended Rana rule in Nepal succeed?",
        options: ["2007 BS", "2015 BS", "2046 BS", "2063 BS"],
        correct: OptionLabel::A,
    },
];

const GEOGRAPHY: &[CannedQuestion] = &[
    CannedQuestion {
        topic: "rivers",
        text: "Which is the longest river flowing through Nepal?",
        options: ["Koshi", "Gandaki", "Karnali", "Bagmati"],
        correct: OptionLabel::C,
    },
    CannedQuestion {
        topic: "lakes",
        text: "Which is the largest lake in Nepal?",
        options: ["Phewa", "Begnas", "Tilicho", "Rara"],
        correct: OptionLabel::D,
    },
    CannedQuestion {
        topic: "districts",
        text: "Which district of Nepal is the largest by area?",
        options: ["Humla", "Dolpa", "Mugu", "Taplejung"],
        correct: OptionLabel::B,
    },
];

const ECONOMICS: &[CannedQuestion] = &[
    CannedQuestion {
        topic: "monetary policy",
        text: "Which institution is the central bank of Nepal?",
        options: [
            "Nepal Bank Limited",
            "Rastriya Banijya Bank",
            "Nepal Rastra Bank",
            "Agricultural Development Bank",
        ],
        correct: OptionLabel::C,
    },
    CannedQuestion {
        topic: "periodic plans",
        text: "In which year did Nepal's first five-year plan begin?",
        options: ["2013 BS", "2018 BS", "2007 BS", "2022 BS"],
        correct: OptionLabel::A,
    },
];

const PUBLIC_SERVICE: &[CannedQuestion] = &[
    CannedQuestion {
        topic: "constitutional bodies",
        text: "Which constitutional body conducts examinations for recruitment to the civil \
               service of Nepal?",
        options: [
            "Election Commission",
            "Public Service Commission",
            "National Human Rights Commission",
            "National Vigilance Centre",
        ],
        correct: OptionLabel::B,
    },
    CannedQuestion {
        topic: "civil service law",
        text: "Which act primarily governs the civil service of Nepal?",
        options: [
            "Local Government Operation Act, 2074",
            "Public Procurement Act, 2063",
            "Good Governance Act, 2064",
            "Civil Service Act, 2049",
        ],
        correct: OptionLabel::D,
    },
];

const SCIENCE: &[CannedQuestion] = &[
    CannedQuestion {
        topic: "plants",
        text: "Which gas do green plants absorb from the air for photosynthesis?",
        options: ["Oxygen", "Nitrogen", "Carbon dioxide", "Hydrogen"],
        correct: OptionLabel::C,
    },
    CannedQuestion {
        topic: "human body",
        text: "Which organ of the human body produces insulin?",
        options: ["Pancreas", "Liver", "Kidney", "Spleen"],
        correct: OptionLabel::A,
    },
];

const CURRENT_AFFAIRS: &[CannedQuestion] = &[CannedQuestion {
    topic: "regional organisations",
    text: "Which regional organisation has its secretariat in Kathmandu?",
    options: ["BIMSTEC", "ASEAN", "SAARC", "SCO"],
    correct: OptionLabel::C,
}];

const EMERGENCY: &[CannedQuestion] = &[
    CannedQuestion {
        topic: "national symbols",
        text: "What is the national animal of Nepal?",
        options: ["Cow", "One-horned rhinoceros", "Elephant", "Tiger"],
        correct: OptionLabel::A,
    },
    CannedQuestion {
        topic: "national symbols",
        text: "What is the national bird of Nepal?",
        options: ["Peacock", "Danphe", "Munal crow", "Sparrow"],
        correct: OptionLabel::B,
    },
    CannedQuestion {
        topic: "national symbols",
        text: "What is the national flower of Nepal?",
        options: ["Lotus", "Marigold", "Rhododendron", "Jasmine"],
        correct: OptionLabel::C,
    },
    CannedQuestion {
        topic: "general",
        text: "What is the capital city of Nepal?",
        options: ["Pokhara", "Biratnagar", "Lalitpur", "Kathmandu"],
        correct: OptionLabel::D,
    },
    CannedQuestion {
        topic: "general",
        text: "Which is the highest mountain in the world?",
        options: ["Sagarmatha (Everest)", "Kanchenjunga", "Lhotse", "Makalu"],
        correct: OptionLabel::A,
    },
];

fn canned_for(domain: &str) -> &'static [CannedQuestion] {
    match domain {
        "constitution" => CONSTITUTION,
        "history" => HISTORY,
        "geography" => GEOGRAPHY,
        "economics" => ECONOMICS,
        "public_service" => PUBLIC_SERVICE,
        "science" => SCIENCE,
        "current_affairs" => CURRENT_AFFAIRS,
        _ => &[],
    }
}

impl CannedQuestion {
    fn to_record(
        &self,
        domain: &str,
        topic: &str,
        difficulty: Difficulty,
        source: QuestionSource,
    ) -> QuestionRecord {
        QuestionRecord {
            text: self.text.to_string(),
            options: OptionLabel::ALL
                .iter()
                .zip(self.options.iter())
                .map(|(label, text)| (*label, text.to_string()))
                .collect(),
            correct_label: self.correct,
            domain: domain.to_string(),
            topic: topic.to_string(),
            difficulty,
            source,
            raw_snippet: String::new(),
        }
    }
}

/// Prefers entries the session has not been served yet.
fn pick_unseen<'a, R: Rng + ?Sized>(
    pool: &'a [CannedQuestion],
    session: &SessionState,
    rng: &mut R,
) -> Option<&'a CannedQuestion> {
    let unseen: Vec<&CannedQuestion> = pool
        .iter()
        .filter(|q| !session.used_questions.contains(q.text))
        .collect();
    unseen.choose(rng).copied()
}

pub struct FallbackPool;

impl FallbackPool {
    pub fn has_domain_questions(domain: &str) -> bool {
        !canned_for(domain).is_empty()
    }

    /// Canned question for the domain, or one synthesised from the topic name.
    /// Either way the record carries the selected `topic`.
    pub fn domain_fallback<R: Rng + ?Sized>(
        domain: &str,
        topic: &str,
        difficulty: Difficulty,
        session: &SessionState,
        rng: &mut R,
    ) -> QuestionRecord {
        match pick_unseen(canned_for(domain), session, rng) {
            Some(canned) => canned.to_record(domain, topic, difficulty, QuestionSource::Fallback),
            None => Self::synthesize(domain, topic, difficulty, rng),
        }
    }

    pub fn synthesize<R: Rng + ?Sized>(
        domain: &str,
        topic: &str,
        difficulty: Difficulty,
        rng: &mut R,
    ) -> QuestionRecord {
        let topic_name: String = topic.chars().take(MAX_TOPIC_CHARS_IN_SYNTHESIS).collect();
        let subject = domain.replace('_', " ");
        let mut choices = vec![
            (subject, true),
            ("Culinary arts".to_string(), false),
            ("Professional sports".to_string(), false),
            ("Fashion design".to_string(), false),
        ];
        choices.shuffle(rng);

        let mut options = BTreeMap::new();
        let mut correct_label = OptionLabel::A;
        for (label, (text, is_correct)) in OptionLabel::ALL.iter().zip(choices) {
            if is_correct {
                correct_label = *label;
            }
            options.insert(*label, text);
        }

        QuestionRecord {
            text: format!("Which subject area does the topic \"{}\" belong to?", topic_name),
            options,
            correct_label,
            domain: domain.to_string(),
            topic: topic.to_string(),
            difficulty,
            source: QuestionSource::Fallback,
            raw_snippet: String::new(),
        }
    }

    /// Domain-agnostic last resort; never fails.
    pub fn emergency<R: Rng + ?Sized>(session: &SessionState, rng: &mut R) -> QuestionRecord {
        let canned = pick_unseen(EMERGENCY, session, rng)
            .or_else(|| EMERGENCY.choose(rng))
            .unwrap_or(&EMERGENCY[0]);
        canned.to_record(
            EMERGENCY_DOMAIN,
            canned.topic,
            Difficulty::Easy,
            QuestionSource::Emergency,
        )
    }
}
