use crate::error::{Error, Result};
use crate::models::catalog::{DomainCatalog, DomainEntry};
use crate::models::question::{topic_key, Difficulty};
use crate::models::session::SessionState;
use rand::distributions::WeightedIndex;
use rand::prelude::*;

const OVERUSE_FACTOR: f64 = 2.0;
const OVERUSE_PENALTY: f64 = 0.5;
const UNUSED_BOOST: f64 = 1.5;
const TOPIC_WINDOW: usize = 40;
const EASY_UNTIL: u32 = 3;
const MEDIUM_UNTIL: u32 = 8;
const HARD_SHARE: f64 = 0.4;

#[derive(Debug, Clone, PartialEq)]
pub struct TopicSelection {
    pub domain: String,
    pub topic: String,
    pub difficulty: Difficulty,
}

pub struct TopicSelector;

impl TopicSelector {
    pub fn select<R: Rng + ?Sized>(
        session: &SessionState,
        catalog: &DomainCatalog,
        rng: &mut R,
    ) -> Result<TopicSelection> {
        let domain = Self::choose_domain(session, catalog, rng)?;
        let topic = Self::choose_topic(session, domain, rng)?;
        let difficulty = Self::difficulty_for(session.total_generated, rng);

        tracing::debug!(
            domain = %domain.name,
            topic = %topic,
            difficulty = %difficulty,
            "Selected next topic"
        );

        Ok(TopicSelection {
            domain: domain.name.clone(),
            topic,
            difficulty,
        })
    }

    /// Base weight, halved when observed share is over twice the base,
    /// boosted by half when the domain has never been served.
    pub fn adjusted_weight(entry: &DomainEntry, session: &SessionState) -> f64 {
        let usage = session.domain_usage(&entry.name);
        if usage == 0 {
            return entry.base_weight * UNUSED_BOOST;
        }
        let ratio = usage as f64 / session.total_generated.max(1) as f64;
        if ratio > OVERUSE_FACTOR * entry.base_weight {
            entry.base_weight * OVERUSE_PENALTY
        } else {
            entry.base_weight
        }
    }

    /// Normalised selection probabilities for every domain that has topics.
    pub fn domain_probabilities(
        session: &SessionState,
        catalog: &DomainCatalog,
    ) -> Vec<(String, f64)> {
        let weights: Vec<(String, f64)> = catalog
            .domains()
            .iter()
            .filter(|d| !d.topics.is_empty())
            .map(|d| (d.name.clone(), Self::adjusted_weight(d, session)))
            .collect();
        let total: f64 = weights.iter().map(|(_, w)| w).sum();
        if total <= 0.0 {
            return Vec::new();
        }
        weights.into_iter().map(|(n, w)| (n, w / total)).collect()
    }

    fn choose_domain<'a, R: Rng + ?Sized>(
        session: &SessionState,
        catalog: &'a DomainCatalog,
        rng: &mut R,
    ) -> Result<&'a DomainEntry> {
        let candidates: Vec<&DomainEntry> = catalog
            .domains()
            .iter()
            .filter(|d| !d.topics.is_empty())
            .collect();
        if candidates.is_empty() {
            return Err(Error::Catalog("No domain in the catalog has topics".to_string()));
        }

        let weights: Vec<f64> = candidates
            .iter()
            .map(|d| Self::adjusted_weight(d, session))
            .collect();
        let dist = WeightedIndex::new(&weights)
            .map_err(|e| Error::Catalog(format!("Cannot sample domains: {}", e)))?;
        Ok(candidates[dist.sample(rng)])
    }

    fn choose_topic<R: Rng + ?Sized>(
        session: &SessionState,
        domain: &DomainEntry,
        rng: &mut R,
    ) -> Result<String> {
        let usage: Vec<(&String, usize)> = domain
            .topics
            .iter()
            .map(|topic| {
                let key = topic_key(&domain.name, topic);
                let count = session
                    .used_topic_keys
                    .recent(TOPIC_WINDOW)
                    .filter(|k| **k == key)
                    .count();
                (topic, count)
            })
            .collect();

        let min = usage.iter().map(|(_, c)| *c).min().unwrap_or(0);
        let candidates: Vec<&String> = usage
            .iter()
            .filter(|(_, c)| *c <= min + 1)
            .map(|(t, _)| *t)
            .collect();

        candidates
            .choose(rng)
            .map(|t| (*t).clone())
            .ok_or_else(|| Error::Catalog(format!("Domain {} has no topics", domain.name)))
    }

    /// Non-decreasing warm-up over the session.
    pub fn difficulty_for<R: Rng + ?Sized>(total_generated: u32, rng: &mut R) -> Difficulty {
        if total_generated < EASY_UNTIL {
            Difficulty::Easy
        } else if total_generated < MEDIUM_UNTIL {
            Difficulty::Medium
        } else if rng.gen_bool(HARD_SHARE) {
            Difficulty::Hard
        } else {
            Difficulty::Medium
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::catalog::DomainEntry;
    use rand::rngs::StdRng;
    use std::collections::HashMap;

    fn catalog() -> DomainCatalog {
        DomainCatalog::new(vec![
            DomainEntry {
                name: "history".to_string(),
                base_weight: 0.5,
                topics: vec!["unification".to_string(), "treaties".to_string()],
            },
            DomainEntry {
                name: "geography".to_string(),
                base_weight: 0.3,
                topics: vec!["rivers".to_string()],
            },
            DomainEntry {
                name: "science".to_string(),
                base_weight: 0.2,
                topics: vec!["health".to_string()],
            },
        ])
        .unwrap()
    }

    #[test]
    fn unused_domains_are_boosted_and_overused_penalised() {
        let catalog = catalog();
        let mut session = SessionState::new();
        let history = catalog.get("history").unwrap();
        assert!((TopicSelector::adjusted_weight(history, &session) - 0.75).abs() < 1e-9);

        session.total_generated = 10;
        session.domain_usage_counts.insert("science".to_string(), 5);
        let science = catalog.get("science").unwrap();
        // 0.5 share > 2 * 0.2
        assert!((TopicSelector::adjusted_weight(science, &session) - 0.1).abs() < 1e-9);

        session.domain_usage_counts.insert("history".to_string(), 5);
        // 0.5 share <= 2 * 0.5
        assert!((TopicSelector::adjusted_weight(history, &session) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn frequencies_converge_to_base_weights_from_zero_usage() {
        let catalog = catalog();
        let session = SessionState::new();
        let mut rng = StdRng::seed_from_u64(7);
        let trials = 20_000;
        let mut counts: HashMap<String, usize> = HashMap::new();
        for _ in 0..trials {
            let pick = TopicSelector::select(&session, &catalog, &mut rng).unwrap();
            *counts.entry(pick.domain).or_default() += 1;
        }
        for entry in catalog.domains() {
            let observed = counts[&entry.name] as f64 / trials as f64;
            assert!(
                (observed - entry.base_weight).abs() < 0.02,
                "{} observed {} expected {}",
                entry.name,
                observed,
                entry.base_weight
            );
        }
    }

    #[test]
    fn overused_domain_loses_probability() {
        let catalog = catalog();
        let mut session = SessionState::new();
        session.total_generated = 10;
        session.domain_usage_counts.insert("history".to_string(), 4);
        session.domain_usage_counts.insert("geography".to_string(), 3);
        session.domain_usage_counts.insert("science".to_string(), 3);
        let before = TopicSelector::domain_probabilities(&session, &catalog);

        session.total_generated = 20;
        session.domain_usage_counts.insert("science".to_string(), 13);
        let after = TopicSelector::domain_probabilities(&session, &catalog);

        let p = |v: &[(String, f64)], name: &str| {
            v.iter().find(|(n, _)| n == name).map(|(_, p)| *p).unwrap()
        };
        assert!(p(&after, "science") < p(&before, "science"));
        let sum: f64 = after.iter().map(|(_, p)| p).sum();
        assert!((sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn least_used_topics_are_preferred() {
        let catalog = DomainCatalog::new(vec![DomainEntry {
            name: "history".to_string(),
            base_weight: 1.0,
            topics: vec!["a".to_string(), "b".to_string(), "c".to_string()],
        }])
        .unwrap();
        let mut session = SessionState::new();
        for _ in 0..3 {
            session.used_topic_keys.push("history:a");
        }
        session.used_topic_keys.push("history:b");
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..200 {
            let pick = TopicSelector::select(&session, &catalog, &mut rng).unwrap();
            // min usage is 0 (c); b at 1 is within tolerance; a at 3 is not
            assert_ne!(pick.topic, "a");
        }
    }

    #[test]
    fn difficulty_warms_up() {
        let mut rng = StdRng::seed_from_u64(3);
        assert_eq!(TopicSelector::difficulty_for(0, &mut rng), Difficulty::Easy);
        assert_eq!(TopicSelector::difficulty_for(2, &mut rng), Difficulty::Easy);
        assert_eq!(TopicSelector::difficulty_for(3, &mut rng), Difficulty::Medium);
        assert_eq!(TopicSelector::difficulty_for(7, &mut rng), Difficulty::Medium);
        let late: Vec<Difficulty> = (0..500)
            .map(|_| TopicSelector::difficulty_for(8, &mut rng))
            .collect();
        assert!(late.iter().all(|d| *d != Difficulty::Easy));
        let hard = late.iter().filter(|d| **d == Difficulty::Hard).count() as f64 / 500.0;
        assert!((hard - 0.4).abs() < 0.08);
    }

    #[test]
    fn catalog_without_topics_is_an_error() {
        let catalog = DomainCatalog::new(vec![DomainEntry {
            name: "history".to_string(),
            base_weight: 1.0,
            topics: vec![],
        }])
        .unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        assert!(TopicSelector::select(&SessionState::new(), &catalog, &mut rng).is_err());
    }
}
