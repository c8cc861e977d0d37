// WHY: The lookup table is validated completely at load time; once constructed it is
// immutable and shared read-only by every enhancer call

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::config::EnhancementCategory;

/// Substitution candidates for one term
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Enhancements {
    #[serde(default, alias = "abbreviations")]
    pub abbreviation: Vec<String>,
    #[serde(default, alias = "acronyms")]
    pub acronym: Vec<String>,
    #[serde(default, alias = "replacements")]
    pub replacement: Vec<String>,
}

impl Enhancements {
    pub fn values(&self, category: EnhancementCategory) -> &[String] {
        match category {
            EnhancementCategory::Abbreviation => &self.abbreviation,
            EnhancementCategory::Acronym => &self.acronym,
            EnhancementCategory::Replacement => &self.replacement,
        }
    }

    fn first_blank(&self) -> Option<&'static str> {
        [
            ("abbreviation", &self.abbreviation),
            ("acronym", &self.acronym),
            ("replacement", &self.replacement),
        ]
        .into_iter()
        .find(|(_, values)| values.iter().any(|v| v.trim().is_empty()))
        .map(|(name, _)| name)
    }
}

/// Reasons an enhancement table is rejected
#[derive(Debug, Error)]
pub enum EnhancementTableError {
    #[error("Failed to read enhancement table {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Enhancement table does not match schema: {0}")]
    Schema(#[from] serde_json::Error),

    #[error("Enhancement table contains an empty key")]
    EmptyKey,

    #[error("Enhancement table keys {first:?} and {second:?} both normalize to {normalized:?}")]
    DuplicateKey {
        first: String,
        second: String,
        normalized: String,
    },

    #[error("Enhancement table entry {key:?} has a blank {category} value")]
    BlankValue { key: String, category: &'static str },
}

/// Lowercase term -> substitution candidates
#[derive(Debug, Clone, Default)]
pub struct EnhancementTable {
    entries: HashMap<String, Enhancements>,
}

impl EnhancementTable {
    /// Build a table from raw entries; keys are trimmed and lower-cased
    pub fn from_entries<I>(entries: I) -> Result<Self, EnhancementTableError>
    where
        I: IntoIterator<Item = (String, Enhancements)>,
    {
        let mut normalized: HashMap<String, (String, Enhancements)> = HashMap::new();

        for (raw_key, enhancements) in entries {
            let key = raw_key.trim().to_lowercase();
            if key.is_empty() {
                return Err(EnhancementTableError::EmptyKey);
            }
            if let Some(category) = enhancements.first_blank() {
                return Err(EnhancementTableError::BlankValue { key, category });
            }
            if let Some((first, _)) = normalized.get(&key) {
                return Err(EnhancementTableError::DuplicateKey {
                    first: first.clone(),
                    second: raw_key,
                    normalized: key,
                });
            }
            normalized.insert(key, (raw_key, enhancements));
        }

        Ok(Self {
            entries: normalized
                .into_iter()
                .map(|(key, (_, enhancements))| (key, enhancements))
                .collect(),
        })
    }

    /// Parse and validate a JSON document
    pub fn from_json_str(content: &str) -> Result<Self, EnhancementTableError> {
        let raw: BTreeMap<String, Enhancements> = serde_json::from_str(content)?;
        Self::from_entries(raw)
    }

    /// Read and validate a JSON document from disk
    pub async fn load<P: AsRef<Path>>(path: P) -> Result<Self, EnhancementTableError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| EnhancementTableError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        Self::from_json_str(&content)
    }

    /// Entry for an already lower-cased word
    pub fn get(&self, word: &str) -> Option<&Enhancements> {
        self.entries.get(word)
    }

    pub fn contains(&self, word: &str) -> bool {
        self.entries.contains_key(word)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
