use crate::error::{Error, Result};
use crate::models::catalog::{DomainCatalog, DomainEntry};
use async_trait::async_trait;
use std::path::Path;

/// Source of the static domain catalog.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogProvider: Send + Sync {
    async fn catalog(&self) -> Result<DomainCatalog>;
}

const BUILTIN: &[(&str, f64, &[&str])] = &[
    (
        "constitution",
        0.20,
        &[
            "fundamental rights",
            "federal structure",
            "federal parliament",
            "constitutional bodies",
            "judiciary",
            "directive principles",
        ],
    ),
    (
        "history",
        0.15,
        &[
            "unification",
            "treaties",
            "rana regime",
            "democratic movements",
            "ancient kingdoms",
        ],
    ),
    (
        "geography",
        0.15,
        &[
            "rivers",
            "lakes",
            "national parks",
            "districts",
            "mountains",
            "physiographic regions",
        ],
    ),
    (
        "economics",
        0.10,
        &[
            "periodic plans",
            "monetary policy",
            "federal budget",
            "foreign trade",
            "economic survey",
        ],
    ),
    (
        "public_service",
        0.15,
        &[
            "civil service law",
            "good governance",
            "constitutional bodies",
            "office procedure",
        ],
    ),
    (
        "science",
        0.10,
        &[
            "human body",
            "plants",
            "climate change",
            "information technology",
            "everyday physics",
        ],
    ),
    (
        "current_affairs",
        0.15,
        &[
            "national events",
            "international events",
            "regional organisations",
            "awards",
            "appointments",
        ],
    ),
];

/// Nepal civil-service domains used when no catalog file is configured.
pub fn builtin_catalog() -> Result<DomainCatalog> {
    DomainCatalog::new(
        BUILTIN
            .iter()
            .map(|(name, weight, topics)| DomainEntry {
                name: name.to_string(),
                base_weight: *weight,
                topics: topics.iter().map(|t| t.to_string()).collect(),
            })
            .collect(),
    )
}

#[derive(Debug, Clone)]
pub struct StaticCatalogProvider {
    catalog: DomainCatalog,
}

impl StaticCatalogProvider {
    pub fn new(catalog: DomainCatalog) -> Self {
        Self { catalog }
    }

    pub fn builtin() -> Result<Self> {
        Ok(Self::new(builtin_catalog()?))
    }

    /// Loads a JSON array of `{ "name", "base_weight", "topics" }` entries.
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path).await?;
        let catalog = Self::parse(&raw)
            .map_err(|e| Error::Catalog(format!("{}: {}", path.display(), e)))?;
        tracing::info!(path = %path.display(), domains = catalog.len(), "Loaded domain catalog");
        Ok(Self::new(catalog))
    }

    pub fn parse(raw: &str) -> Result<DomainCatalog> {
        let entries: Vec<DomainEntry> = serde_json::from_str(raw)?;
        DomainCatalog::new(entries)
    }
}

#[async_trait]
impl CatalogProvider for StaticCatalogProvider {
    async fn catalog(&self) -> Result<DomainCatalog> {
        Ok(self.catalog.clone())
    }
}
