//! Interview Domain Catalogue
//!
//! A domain describes the role being interviewed for: its label, optional
//! prompt framing, the context used for behavioural questions and the skill
//! categories a candidate can pick from. Domains are loaded before a session
//! exists; a failed load never reaches the session engine.

use crate::error::InterviewError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{debug, warn};

const DEFAULT_BEHAVIORAL_CONTEXT: &str = "their professional field";

/// A named group of skill labels, e.g. "Frameworks" → ["Axum", "Actix"].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SkillCategory {
    pub name: String,
    #[serde(default)]
    pub skills: Vec<String>,
}

/// Read-only description of an interview domain.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DomainConfig {
    pub domain_name: String,
    #[serde(default)]
    pub job_role_prompt: Option<String>,
    #[serde(default)]
    pub behavioral_question_context: Option<String>,
    #[serde(default)]
    pub skill_categories: Vec<SkillCategory>,
}

impl DomainConfig {
    pub fn new(domain_name: impl Into<String>) -> Self {
        Self {
            domain_name: domain_name.into(),
            job_role_prompt: None,
            behavioral_question_context: None,
            skill_categories: Vec::new(),
        }
    }

    /// The job role label shown to the candidate.
    pub fn job_role(&self) -> &str {
        &self.domain_name
    }

    /// Role framing for technical-question prompts, falling back to the role label.
    pub fn role_prompt(&self) -> &str {
        self.job_role_prompt
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .unwrap_or(&self.domain_name)
    }

    pub fn behavioral_context(&self) -> &str {
        self.behavioral_question_context
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .unwrap_or(DEFAULT_BEHAVIORAL_CONTEXT)
    }

    /// Every skill label across all categories, in catalogue order.
    pub fn all_skills(&self) -> Vec<&str> {
        self.skill_categories
            .iter()
            .flat_map(|c| c.skills.iter().map(String::as_str))
            .collect()
    }

    pub fn validate(&self) -> Result<(), InterviewError> {
        if self.domain_name.trim().is_empty() {
            return Err(InterviewError::configuration("domain_name is required"));
        }
        Ok(())
    }
}

/// Defines the contract for anything that can supply domain configurations.
///
/// This keeps the HTTP and CLI layers independent of where domains live
/// (a directory of JSON files, an in-memory fixture, ...).
#[async_trait]
pub trait DomainCatalog: Send + Sync {
    /// Loads the domain registered under `identifier`.
    async fn load(&self, identifier: &str) -> Result<DomainConfig, InterviewError>;

    /// Lists the identifiers this catalogue can load.
    async fn list(&self) -> Result<Vec<String>, InterviewError>;
}

/// Loads domains from `<root>/<identifier>.json` files.
pub struct FileDomainCatalog {
    root: PathBuf,
}

impl FileDomainCatalog {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, identifier: &str) -> Result<PathBuf, InterviewError> {
        let identifier = identifier.trim();
        if identifier.is_empty()
            || identifier.contains("..")
            || identifier.contains('/')
            || identifier.contains('\\')
        {
            return Err(InterviewError::configuration(format!(
                "invalid domain identifier '{identifier}'"
            )));
        }
        let file_name = if identifier.ends_with(".json") {
            identifier.to_string()
        } else {
            format!("{identifier}.json")
        };
        Ok(self.root.join(file_name))
    }
}

#[async_trait]
impl DomainCatalog for FileDomainCatalog {
    async fn load(&self, identifier: &str) -> Result<DomainConfig, InterviewError> {
        let path = self.resolve(identifier)?;
        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Domain config could not be read");
                return Err(InterviewError::DomainNotFound(identifier.to_string()));
            }
        };
        let config: DomainConfig = serde_json::from_str(&raw).map_err(|e| {
            InterviewError::configuration(format!("could not parse {}: {e}", path.display()))
        })?;
        config.validate()?;
        debug!(domain = %config.domain_name, "Domain config loaded");
        Ok(config)
    }

    async fn list(&self) -> Result<Vec<String>, InterviewError> {
        let mut entries = tokio::fs::read_dir(&self.root).await.map_err(|e| {
            InterviewError::configuration(format!(
                "could not read domain directory {}: {e}",
                self.root.display()
            ))
        })?;

        let mut names = Vec::new();
        while let Ok(Some(entry)) = entries.next_entry().await {
            let path = entry.path();
            if path.extension().and_then(|s| s.to_str()) == Some("json") {
                if let Some(name) = path.file_name().and_then(|s| s.to_str()) {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }
}

/// An in-memory catalogue for development and tests.
#[derive(Default)]
pub struct StaticDomainCatalog {
    domains: HashMap<String, DomainConfig>,
}

impl StaticDomainCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_domain(mut self, identifier: impl Into<String>, config: DomainConfig) -> Self {
        self.domains.insert(identifier.into(), config);
        self
    }
}

#[async_trait]
impl DomainCatalog for StaticDomainCatalog {
    async fn load(&self, identifier: &str) -> Result<DomainConfig, InterviewError> {
        self.domains
            .get(identifier)
            .cloned()
            .ok_or_else(|| InterviewError::DomainNotFound(identifier.to_string()))
    }

    async fn list(&self) -> Result<Vec<String>, InterviewError> {
        let mut names: Vec<String> = self.domains.keys().cloned().collect();
        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BACKEND_JSON: &str = r#"{
        "domain_name": "Backend Engineer",
        "job_role_prompt": "a backend engineer building HTTP services",
        "behavioral_question_context": "on-call incidents and API versioning",
        "skill_categories": [
            {"name": "Languages", "skills": ["Rust", "Go"]},
            {"name": "Storage", "skills": ["PostgreSQL"]}
        ]
    }"#;

    #[test]
    fn test_fallbacks_for_optional_fields() {
        let config = DomainConfig::new("Data Analyst");
        assert_eq!(config.job_role(), "Data Analyst");
        assert_eq!(config.role_prompt(), "Data Analyst");
        assert_eq!(config.behavioral_context(), "their professional field");
        assert!(config.all_skills().is_empty());
    }

    #[test]
    fn test_deserialize_full_config() {
        let config: DomainConfig = serde_json::from_str(BACKEND_JSON).unwrap();
        assert_eq!(config.role_prompt(), "a backend engineer building HTTP services");
        assert_eq!(config.all_skills(), vec!["Rust", "Go", "PostgreSQL"]);
    }

    #[test]
    fn test_blank_domain_name_is_rejected() {
        assert!(matches!(
            DomainConfig::new(" ").validate(),
            Err(InterviewError::Configuration(_))
        ));
    }

    #[tokio::test]
    async fn test_file_catalog_load_and_list() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("backend.json"), BACKEND_JSON).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let catalog = FileDomainCatalog::new(dir.path());
        let by_stem = catalog.load("backend").await.unwrap();
        let by_file = catalog.load("backend.json").await.unwrap();
        assert_eq!(by_stem, by_file);
        assert_eq!(catalog.list().await.unwrap(), vec!["backend.json".to_string()]);
    }

    #[tokio::test]
    async fn test_file_catalog_errors() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.json"), "{ not json").unwrap();
        let catalog = FileDomainCatalog::new(dir.path());

        assert!(matches!(
            catalog.load("missing").await,
            Err(InterviewError::DomainNotFound(_))
        ));
        assert!(matches!(
            catalog.load("broken").await,
            Err(InterviewError::Configuration(_))
        ));
        assert!(matches!(
            catalog.load("../etc/passwd").await,
            Err(InterviewError::Configuration(_))
        ));
    }

    #[tokio::test]
    async fn test_static_catalog() {
        let catalog =
            StaticDomainCatalog::new().with_domain("qa", DomainConfig::new("QA Engineer"));
        assert_eq!(catalog.load("qa").await.unwrap().job_role(), "QA Engineer");
        assert!(matches!(
            catalog.load("nope").await,
            Err(InterviewError::DomainNotFound(_))
        ));
        assert_eq!(catalog.list().await.unwrap(), vec!["qa".to_string()]);
    }
}
