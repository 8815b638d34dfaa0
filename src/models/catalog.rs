use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainEntry {
    pub name: String,
    pub base_weight: f64,
    pub topics: Vec<String>,
}

/// Immutable after load. Base weights always sum to 1.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DomainCatalog {
    domains: Vec<DomainEntry>,
}

impl DomainCatalog {
    pub fn new(mut domains: Vec<DomainEntry>) -> Result<Self> {
        domains.retain(|d| !d.name.trim().is_empty());
        for entry in domains.iter_mut() {
            let mut seen = std::collections::HashSet::new();
            entry.topics.retain(|t| !t.trim().is_empty() && seen.insert(t.clone()));
        }

        if domains.is_empty() {
            return Err(Error::Catalog("Domain catalog is empty".to_string()));
        }
        if domains.iter().any(|d| !d.base_weight.is_finite() || d.base_weight < 0.0) {
            return Err(Error::Catalog(
                "Domain weights must be finite and non-negative".to_string(),
            ));
        }

        let total: f64 = domains.iter().map(|d| d.base_weight).sum();
        if total <= 0.0 {
            return Err(Error::Catalog("Domain weights sum to zero".to_string()));
        }
        if (total - 1.0).abs() > 1e-6 {
            tracing::warn!(total, "Domain weights do not sum to 1, renormalising");
            for entry in domains.iter_mut() {
                entry.base_weight /= total;
            }
        }

        Ok(Self { domains })
    }

    pub fn domains(&self) -> &[DomainEntry] {
        &self.domains
    }

    pub fn get(&self, name: &str) -> Option<&DomainEntry> {
        self.domains.iter().find(|d| d.name == name)
    }

    pub fn len(&self) -> usize {
        self.domains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }
}
