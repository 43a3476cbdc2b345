//! Disease seed data.
//!
//! The default list ships embedded as JSON; a deployment can replace it with
//! its own file (`SEED_FILE`) when the classifier's labels change.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

const DEFAULT_SEEDS: &str = include_str!("diseases.json");

const MAX_NAME_LEN: usize = 100;
const MAX_DETAIL_LEN: usize = 500;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiseaseSeed {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub symptoms: Option<String>,
    #[serde(default)]
    pub treatment: Option<String>,
}

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("Failed to read seed file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Malformed seed data: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid seed {index}: {reason}")]
    Invalid { index: usize, reason: String },
}

/// The built-in disease list.
pub fn default_seeds() -> Result<Vec<DiseaseSeed>, SeedError> {
    parse_seeds(DEFAULT_SEEDS)
}

pub fn load_seeds(path: &Path) -> Result<Vec<DiseaseSeed>, SeedError> {
    let content = std::fs::read_to_string(path).map_err(|source| SeedError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_seeds(&content)
}

/// Seeds from `path` when given, the built-in list otherwise.
pub fn resolve_seeds(path: Option<&Path>) -> Result<Vec<DiseaseSeed>, SeedError> {
    match path {
        Some(p) => load_seeds(p),
        None => default_seeds(),
    }
}

pub fn parse_seeds(content: &str) -> Result<Vec<DiseaseSeed>, SeedError> {
    let seeds: Vec<DiseaseSeed> = serde_json::from_str(content)?;
    validate_seeds(&seeds)?;
    Ok(seeds)
}

/// Check seeds against the column limits of `diseases` before any statement runs.
pub fn validate_seeds(seeds: &[DiseaseSeed]) -> Result<(), SeedError> {
    let mut names = HashSet::new();
    for (index, seed) in seeds.iter().enumerate() {
        let invalid = |reason: String| SeedError::Invalid { index, reason };

        let name = seed.name.trim();
        if name.is_empty() {
            return Err(invalid("name is empty".to_string()));
        }
        if seed.name.chars().count() > MAX_NAME_LEN {
            return Err(invalid(format!("name exceeds {} characters", MAX_NAME_LEN)));
        }
        for (field, value) in [("symptoms", &seed.symptoms), ("treatment", &seed.treatment)] {
            if value
                .as_ref()
                .map(|v| v.chars().count() > MAX_DETAIL_LEN)
                .unwrap_or(false)
            {
                return Err(invalid(format!(
                    "{} exceeds {} characters",
                    field, MAX_DETAIL_LEN
                )));
            }
        }
        if !names.insert(name.to_lowercase()) {
            return Err(invalid(format!("duplicate name {:?}", seed.name)));
        }
    }
    Ok(())
}
