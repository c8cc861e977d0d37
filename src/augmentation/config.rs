// WHY: One serde-loadable description of an augmentation run so the CLI, the event
// handler and tests all drive the operators from the same values

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Selection strategy of the deletion engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeleteMethod {
    /// Spread the budget over several words, each visited at most once
    #[default]
    Char,
    /// Concentrate the budget on one randomly chosen word
    Word,
    /// Any other method name; the deletion engine treats it as a no-op
    #[serde(other)]
    Unrecognized,
}

impl std::str::FromStr for DeleteMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "char" => Ok(Self::Char),
            "word" => Ok(Self::Word),
            other => Err(format!("unknown deletion method '{other}' (expected 'char' or 'word')")),
        }
    }
}

/// Upper bound on deletions inside a single word occurrence.
///
/// Numeric configuration maps `0` to [`PerWordCap::Unbounded`]; `Limit(0)` built in
/// code permits no deletions at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "usize", into = "usize")]
pub enum PerWordCap {
    #[default]
    Unbounded,
    Limit(usize),
}

impl PerWordCap {
    /// Clamp a requested per-word count to this cap
    pub fn clamp(self, requested: usize) -> usize {
        match self {
            Self::Unbounded => requested,
            Self::Limit(limit) => requested.min(limit),
        }
    }
}

impl From<usize> for PerWordCap {
    fn from(value: usize) -> Self {
        match value {
            0 => Self::Unbounded,
            limit => Self::Limit(limit),
        }
    }
}

impl From<PerWordCap> for usize {
    fn from(cap: PerWordCap) -> Self {
        match cap {
            PerWordCap::Unbounded => 0,
            PerWordCap::Limit(limit) => limit,
        }
    }
}

/// Category lists stored per term in the enhancement table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnhancementCategory {
    Abbreviation,
    Acronym,
    Replacement,
}

/// Which enhancement category the vocabulary enhancer draws from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnhancementType {
    Abbreviation,
    Acronym,
    Replacement,
    /// Per word, a random pick among whichever of abbreviation and replacement
    /// have values; not a uniform draw between the two categories
    #[default]
    All,
}

impl EnhancementType {
    /// Fixed category for this type, `None` for [`EnhancementType::All`]
    pub fn category(self) -> Option<EnhancementCategory> {
        match self {
            Self::Abbreviation => Some(EnhancementCategory::Abbreviation),
            Self::Acronym => Some(EnhancementCategory::Acronym),
            Self::Replacement => Some(EnhancementCategory::Replacement),
            Self::All => None,
        }
    }
}

impl std::str::FromStr for EnhancementType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "abbreviation" => Ok(Self::Abbreviation),
            "acronym" => Ok(Self::Acronym),
            "replacement" => Ok(Self::Replacement),
            "all" => Ok(Self::All),
            other => Err(format!("unknown enhancement type '{other}'")),
        }
    }
}

fn one() -> usize {
    1
}

/// One operator application with its bounds. Steps run in the order listed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    Scramble {
        #[serde(default = "one")]
        min_perms: usize,
        max_perms: usize,
    },
    Delete {
        #[serde(default)]
        method: DeleteMethod,
        #[serde(default = "one")]
        min_count: usize,
        max_count: usize,
        #[serde(default)]
        max_per_word: PerWordCap,
    },
    Insert {
        #[serde(default = "one")]
        min_inserts: usize,
        max_inserts: usize,
    },
    Enhance {
        #[serde(default)]
        enhancement_type: EnhancementType,
        #[serde(default = "one")]
        min_enhancements: usize,
        max_enhancements: usize,
    },
}

impl Step {
    /// Short operator name used in logs and stats
    pub fn name(&self) -> &'static str {
        match self {
            Self::Scramble { .. } => "scramble",
            Self::Delete { .. } => "delete",
            Self::Insert { .. } => "insert",
            Self::Enhance { .. } => "enhance",
        }
    }
}

fn default_variants() -> usize {
    5
}

/// Configuration for an augmentation run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AugmentationConfig {
    /// Seed for the random source; `None` draws one from the OS
    #[serde(default)]
    pub seed: Option<u64>,
    /// Number of independent variants generated per input term
    #[serde(default = "default_variants")]
    pub variants_per_term: usize,
    /// Operators applied in order to produce each variant
    #[serde(default = "default_steps")]
    pub steps: Vec<Step>,
}

fn default_steps() -> Vec<Step> {
    vec![
        Step::Scramble { min_perms: 1, max_perms: 2 },
        Step::Delete {
            method: DeleteMethod::Char,
            min_count: 1,
            max_count: 3,
            max_per_word: PerWordCap::Limit(2),
        },
        Step::Insert { min_inserts: 1, max_inserts: 2 },
        Step::Enhance {
            enhancement_type: EnhancementType::All,
            min_enhancements: 1,
            max_enhancements: 2,
        },
    ]
}

impl Default for AugmentationConfig {
    fn default() -> Self {
        Self {
            seed: None,
            variants_per_term: default_variants(),
            steps: default_steps(),
        }
    }
}

impl AugmentationConfig {
    /// Parse a config document, filling unspecified fields with defaults
    pub fn from_json_str(content: &str) -> Result<Self> {
        serde_json::from_str(content).context("Invalid augmentation config")
    }

    /// Load a config document from disk
    pub async fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read augmentation config {}", path.display()))?;
        Self::from_json_str(&content)
    }
}
