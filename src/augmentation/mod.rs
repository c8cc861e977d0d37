// WHY: Operators are pure functions over (text, bounds, table, rng); the Augmenter only
// owns the seeded random source and the step list that composes them

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use tracing::debug;

pub mod config;
pub mod deletion;
pub mod enhance;
pub mod enhancements;
pub mod insertion;
pub mod scramble;
pub mod spans;

pub use config::{AugmentationConfig, DeleteMethod, EnhancementCategory, EnhancementType, PerWordCap, Step};
pub use deletion::{plan_deletions, random_char_deletion, DeletionRecord};
pub use enhance::enhance_terms;
pub use enhancements::{EnhancementTable, EnhancementTableError, Enhancements};
pub use insertion::{insert_related_terms, plan_insertions, Insertion};
pub use scramble::scramble_word_order;
pub use spans::{index_words, WordIndex, WordSpan};

/// Apply a single step to `text`
pub fn apply_step<S: AsRef<str>, R: Rng + ?Sized>(
    step: &Step,
    text: &str,
    related_terms: &[S],
    table: &EnhancementTable,
    rng: &mut R,
) -> String {
    match *step {
        Step::Scramble { min_perms, max_perms } => scramble_word_order(text, min_perms, max_perms, rng),
        Step::Delete {
            method,
            min_count,
            max_count,
            max_per_word,
        } => random_char_deletion(text, min_count, max_count, max_per_word, method, rng),
        Step::Insert { min_inserts, max_inserts } => {
            insert_related_terms(text, related_terms, min_inserts, max_inserts, rng)
        }
        Step::Enhance {
            enhancement_type,
            min_enhancements,
            max_enhancements,
        } => enhance_terms(text, enhancement_type, table, min_enhancements, max_enhancements, rng),
    }
}

/// Runs the configured steps over terms with its own random source
pub struct Augmenter {
    config: AugmentationConfig,
    table: Arc<EnhancementTable>,
    rng: StdRng,
}

impl Augmenter {
    /// Create an augmenter seeded from `config.seed`, or from OS entropy when unset
    pub fn new(config: AugmentationConfig, table: Arc<EnhancementTable>) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self::with_rng(config, table, rng)
    }

    /// Create an augmenter with a caller-supplied random source
    pub fn with_rng(config: AugmentationConfig, table: Arc<EnhancementTable>, rng: StdRng) -> Self {
        Self { config, table, rng }
    }

    pub fn config(&self) -> &AugmentationConfig {
        &self.config
    }

    pub fn table(&self) -> &EnhancementTable {
        &self.table
    }

    /// Run every step in order and return the final text
    pub fn apply<S: AsRef<str>>(&mut self, text: &str, related_terms: &[S]) -> String {
        let mut current = text.to_string();
        for step in &self.config.steps {
            let next = apply_step(step, &current, related_terms, &self.table, &mut self.rng);
            if next == current {
                debug!(step = step.name(), "Step left text unchanged");
            }
            current = next;
        }
        current
    }

    /// Produce `variants_per_term` independent variants of `text`
    pub fn variants<S: AsRef<str>>(&mut self, text: &str, related_terms: &[S]) -> Vec<String> {
        (0..self.config.variants_per_term)
            .map(|_| self.apply(text, related_terms))
            .collect()
    }
}
