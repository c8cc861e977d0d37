use rand::seq::IndexedRandom;
use rand::Rng;
use tracing::debug;

use super::config::{EnhancementCategory, EnhancementType};
use super::enhancements::EnhancementTable;

/// Words this short are never looked up
const MIN_ENHANCEABLE_CHARS: usize = 3;

/// Replace eligible words with an abbreviation, acronym or synonym from `table`.
///
/// Words are lower-cased before lookup. A word is eligible when it has at least three
/// characters and is a key of `table`. Each eligible position is replaced at most once.
/// Once any replacement is attempted the result is the lower-cased words, with the
/// replacements in place, rejoined with single spaces. Returns the input untouched
/// when nothing is eligible or zero replacements are drawn.
///
/// For [`EnhancementType::All`] the category is drawn per word from those of
/// abbreviation and replacement that have values, so a word with only one populated
/// list always uses it.
pub fn enhance_terms<R: Rng + ?Sized>(
    text: &str,
    enhancement_type: EnhancementType,
    table: &EnhancementTable,
    min_enhancements: usize,
    max_enhancements: usize,
    rng: &mut R,
) -> String {
    let lowered: Vec<String> = text.split_whitespace().map(str::to_lowercase).collect();
    let mut words: Vec<&str> = lowered.iter().map(String::as_str).collect();

    let mut candidates: Vec<usize> = words
        .iter()
        .enumerate()
        .filter(|(_, word)| word.chars().count() >= MIN_ENHANCEABLE_CHARS && table.contains(word))
        .map(|(position, _)| position)
        .collect();

    if candidates.is_empty() {
        return text.to_string();
    }
    if min_enhancements > max_enhancements {
        debug!(min_enhancements, max_enhancements, "Enhance bounds inverted, skipping");
        return text.to_string();
    }

    let upper = max_enhancements.min(candidates.len());
    let lower = min_enhancements.min(upper);
    let num_enhancements = rng.random_range(lower..=upper);
    if num_enhancements == 0 {
        return text.to_string();
    }

    for _ in 0..num_enhancements {
        let position = candidates.swap_remove(rng.random_range(0..candidates.len()));
        let key = lowered[position].as_str();
        let Some(entry) = table.get(key) else {
            continue;
        };

        let values: &[String] = match enhancement_type.category() {
            Some(category) => entry.values(category),
            None => {
                let populated: Vec<&[String]> = [
                    entry.values(EnhancementCategory::Abbreviation),
                    entry.values(EnhancementCategory::Replacement),
                ]
                .into_iter()
                .filter(|values| !values.is_empty())
                .collect();
                populated.choose(rng).copied().unwrap_or_default()
            }
        };

        match values.choose(rng) {
            Some(value) => words[position] = value.as_str(),
            None => debug!(word = %key, ?enhancement_type, "No enhancement values for word"),
        }
    }

    words.join(" ")
}
