// WHY: Result-value classifiers need labeled examples of the short words humans type
// into result fields, with the case and typo noise those fields actually contain

use anyhow::Result;
use rand::seq::IndexedRandom;
use rand::Rng;
use serde::Serialize;
use std::io::Write;

pub const POSITIVE_WORDS: &[&str] = &[
    "positive", "detected", "reactive", "present", "abnormal", "elevated",
    "high", "found", "1+", "true", "confirmed",
];

pub const NEGATIVE_WORDS: &[&str] = &[
    "negative", "not detected", "non-reactive", "absent", "normal",
    "undetected", "clear", "false", "0", "no value",
];

const TYPO_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz";

/// Classification label written to the `label` column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultLabel {
    Positive,
    Negative,
}

impl ResultLabel {
    pub fn code(self) -> u8 {
        match self {
            Self::Positive => 1,
            Self::Negative => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabResultRow {
    pub word: String,
    pub label: u8,
}

/// Randomly upper-case, lower-case, capitalize or keep a word
pub fn random_case<R: Rng + ?Sized>(word: &str, rng: &mut R) -> String {
    match rng.random_range(0..4) {
        0 => word.to_uppercase(),
        1 => word.to_lowercase(),
        2 => {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        }
        _ => word.to_string(),
    }
}

/// Substitute, delete or insert one random lowercase letter. Words shorter than two
/// characters are returned unchanged.
pub fn introduce_typo<R: Rng + ?Sized>(word: &str, rng: &mut R) -> String {
    let mut chars: Vec<char> = word.chars().collect();
    if chars.len() < 2 {
        return word.to_string();
    }

    let idx = rng.random_range(0..chars.len());
    let letter = char::from(TYPO_ALPHABET[rng.random_range(0..TYPO_ALPHABET.len())]);
    match rng.random_range(0..3) {
        0 => chars[idx] = letter,
        1 => {
            chars.remove(idx);
        }
        _ => chars.insert(idx, letter),
    }
    chars.into_iter().collect()
}

/// Parse a probability in `[0.0, 1.0]`; used as a clap value parser
pub fn parse_probability(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .parse()
        .map_err(|_| format!("'{s}' not a floating-point literal"))?;
    if !(0.0..=1.0).contains(&value) {
        return Err(format!("'{value}' not in range [0.0, 1.0]"));
    }
    Ok(value)
}

/// Noise settings for generated rows
#[derive(Debug, Clone)]
pub struct LabResultGenerator {
    /// Probability of a random case change
    pub change_case: f64,
    /// Probability of a single-character typo
    pub introduce_typo: f64,
}

impl Default for LabResultGenerator {
    fn default() -> Self {
        Self {
            change_case: 0.5,
            introduce_typo: 0.1,
        }
    }
}

impl LabResultGenerator {
    /// Draw `count` labeled rows uniformly from both vocabularies
    pub fn generate<R: Rng + ?Sized>(&self, count: usize, rng: &mut R) -> Vec<LabResultRow> {
        let vocabulary: Vec<(&str, ResultLabel)> = POSITIVE_WORDS
            .iter()
            .map(|w| (*w, ResultLabel::Positive))
            .chain(NEGATIVE_WORDS.iter().map(|w| (*w, ResultLabel::Negative)))
            .collect();

        (0..count)
            .filter_map(|_| {
                let &(word, label) = vocabulary.choose(rng)?;
                let mut word = word.to_string();
                if rng.random_bool(self.change_case.clamp(0.0, 1.0)) {
                    word = random_case(&word, rng);
                }
                if rng.random_bool(self.introduce_typo.clamp(0.0, 1.0)) {
                    word = introduce_typo(&word, rng);
                }
                Some(LabResultRow { word, label: label.code() })
            })
            .collect()
    }
}

/// Write rows as CSV with a `word,label` header
pub fn write_csv<W: Write>(rows: &[LabResultRow], writer: W) -> Result<()> {
    // WHY: serde headers only appear with the first record; an empty run still gets a header row
    let mut csv_writer = csv::WriterBuilder::new().has_headers(false).from_writer(writer);
    csv_writer.write_record(["word", "label"])?;
    for row in rows {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}
