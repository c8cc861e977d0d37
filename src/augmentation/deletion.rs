// WHY: Character deletion is planned against the span table of the original text and
// applied in one pass, so every offset refers to one specific occurrence of a word

use rand::seq::index;
use rand::Rng;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use tracing::debug;

use super::config::{DeleteMethod, PerWordCap};
use super::spans::WordIndex;

/// Character offsets marked for deletion in one invocation, grouped by word index
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeletionRecord {
    marked: BTreeMap<usize, BTreeSet<usize>>,
    visited: Vec<usize>,
}

impl DeletionRecord {
    /// Total number of characters marked
    pub fn total(&self) -> usize {
        self.marked.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.marked.is_empty()
    }

    /// Byte offsets marked inside word `word_index`
    pub fn for_word(&self, word_index: usize) -> Option<&BTreeSet<usize>> {
        self.marked.get(&word_index)
    }

    /// Words that received at least one deletion
    pub fn words(&self) -> impl Iterator<Item = (usize, &BTreeSet<usize>)> {
        self.marked.iter().map(|(&word, offsets)| (word, offsets))
    }

    /// Word indices in the order they were selected, including ones that ended up
    /// with zero deletions
    pub fn visited(&self) -> &[usize] {
        &self.visited
    }

    /// Rebuild `text` without the marked characters; everything else, whitespace
    /// included, is kept in original order
    pub fn apply(&self, text: &str) -> String {
        let marked: HashSet<usize> = self.marked.values().flatten().copied().collect();
        text.char_indices()
            .filter(|(offset, _)| !marked.contains(offset))
            .map(|(_, ch)| ch)
            .collect()
    }

    fn mark_word<R: Rng + ?Sized>(
        &mut self,
        words: &WordIndex<'_>,
        word_index: usize,
        requested: usize,
        rng: &mut R,
    ) -> usize {
        self.visited.push(word_index);

        let Some(span) = words.get(word_index) else {
            return 0;
        };
        let offsets: Vec<usize> = span.char_offsets().collect();
        let count = requested.min(offsets.len());
        if count == 0 {
            return 0;
        }

        let chosen: BTreeSet<usize> = index::sample(rng, offsets.len(), count)
            .into_iter()
            .map(|i| offsets[i])
            .collect();
        self.marked.insert(word_index, chosen);
        count
    }
}

/// Decide which characters to delete without touching the text.
///
/// The budget is drawn from `min_count..=max_count` and clamped to one less than the
/// word count. Invalid bounds or an unrecognized method yield an empty record.
pub fn plan_deletions<R: Rng + ?Sized>(
    words: &WordIndex<'_>,
    min_count: usize,
    max_count: usize,
    max_per_word: PerWordCap,
    method: DeleteMethod,
    rng: &mut R,
) -> DeletionRecord {
    let mut record = DeletionRecord::default();

    if max_count == 0 || min_count > max_count {
        debug!(min_count, max_count, "Deletion bounds invalid, skipping");
        return record;
    }
    if method == DeleteMethod::Unrecognized {
        debug!("Deletion method not recognized, skipping");
        return record;
    }

    let word_count = words.len();
    let deletion_count = rng
        .random_range(min_count..=max_count)
        .min(word_count.saturating_sub(1));
    if deletion_count == 0 {
        return record;
    }

    match method {
        DeleteMethod::Word => {
            let target = rng.random_range(0..word_count);
            record.mark_word(words, target, max_per_word.clamp(deletion_count), rng);
        }
        DeleteMethod::Char => {
            let mut remaining = deletion_count;
            let mut unvisited: Vec<usize> = (0..word_count).collect();

            // WHY: each word leaves the pool when picked, so the loop runs at most word_count times
            while remaining > 0 && !unvisited.is_empty() {
                let target = unvisited.swap_remove(rng.random_range(0..unvisited.len()));
                let drawn = rng.random_range(1..=remaining);
                let applied = record.mark_word(words, target, max_per_word.clamp(drawn), rng);
                remaining -= applied;
            }
        }
        DeleteMethod::Unrecognized => {}
    }

    record
}

/// Randomly delete characters from `text` under a per-word cap.
///
/// `DeleteMethod::Char` spreads the budget over several words, visiting each word at
/// most once; `DeleteMethod::Word` concentrates it on a single word.
pub fn random_char_deletion<R: Rng + ?Sized>(
    text: &str,
    min_count: usize,
    max_count: usize,
    max_per_word: PerWordCap,
    method: DeleteMethod,
    rng: &mut R,
) -> String {
    let words = WordIndex::build(text);
    let record = plan_deletions(&words, min_count, max_count, max_per_word, method, rng);
    if record.is_empty() {
        return text.to_string();
    }
    record.apply(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const LAB_TEXT: &str = "5-Hydroxytryptophan [Measurement] in Urine";

    #[test]
    fn test_char_mode_scenario() {
        let words = WordIndex::build(LAB_TEXT);
        for seed in 0..200 {
            let mut rng = StdRng::seed_from_u64(seed);
            let record = plan_deletions(&words, 3, 8, PerWordCap::Limit(2), DeleteMethod::Char, &mut rng);
            let output = record.apply(LAB_TEXT);

            // 4 words clamp the budget to 3, and the per-word caps always have room for it
            assert_eq!(record.total(), 3, "seed {seed}");
            assert_eq!(output.chars().count(), LAB_TEXT.chars().count() - record.total());
            for (_, offsets) in record.words() {
                assert!(offsets.len() <= 2);
            }
        }
    }

    #[test]
    fn test_char_mode_visits_each_word_once() {
        let text = "Blood Blood Blood Blood Blood Blood";
        let words = WordIndex::build(text);
        for seed in 0..100 {
            let mut rng = StdRng::seed_from_u64(seed);
            let record = plan_deletions(&words, 5, 5, PerWordCap::Limit(1), DeleteMethod::Char, &mut rng);

            let mut visited = record.visited().to_vec();
            let before = visited.len();
            visited.sort_unstable();
            visited.dedup();
            assert_eq!(visited.len(), before);
            assert_eq!(record.total(), 5);
        }
    }

    #[test]
    fn test_offsets_stay_inside_their_occurrence() {
        let text = "Blood Blood in Blood";
        let words = WordIndex::build(text);
        for seed in 0..100 {
            let mut rng = StdRng::seed_from_u64(seed);
            let record = plan_deletions(&words, 1, 3, PerWordCap::Unbounded, DeleteMethod::Char, &mut rng);
            for (word, offsets) in record.words() {
                let span = words.get(word).unwrap();
                assert!(offsets.iter().all(|&o| o >= span.start && o < span.end));
            }
        }
    }

    #[test]
    fn test_word_mode_concentrates_on_one_word() {
        let words = WordIndex::build(LAB_TEXT);
        for seed in 0..100 {
            let mut rng = StdRng::seed_from_u64(seed);
            let record = plan_deletions(&words, 1, 8, PerWordCap::Limit(2), DeleteMethod::Word, &mut rng);

            assert_eq!(record.visited().len(), 1);
            assert!(record.words().count() <= 1);
            assert!(record.total() <= 2);
        }
    }

    #[test]
    fn test_word_mode_never_exceeds_word_length() {
        let text = "Hb in serum";
        let words = WordIndex::build(text);
        for seed in 0..100 {
            let mut rng = StdRng::seed_from_u64(seed);
            let record = plan_deletions(&words, 2, 2, PerWordCap::Unbounded, DeleteMethod::Word, &mut rng);
            for (word, offsets) in record.words() {
                assert!(offsets.len() <= words.get(word).unwrap().char_len());
            }
        }
    }

    #[test]
    fn test_invalid_configuration_is_identity() {
        let mut rng = StdRng::seed_from_u64(3);
        assert_eq!(random_char_deletion(LAB_TEXT, 0, 0, PerWordCap::Unbounded, DeleteMethod::Char, &mut rng), LAB_TEXT);
        assert_eq!(random_char_deletion(LAB_TEXT, 5, 2, PerWordCap::Unbounded, DeleteMethod::Char, &mut rng), LAB_TEXT);
        assert_eq!(random_char_deletion(LAB_TEXT, 1, 4, PerWordCap::Unbounded, DeleteMethod::Unrecognized, &mut rng), LAB_TEXT);
    }

    #[test]
    fn test_single_word_untouched() {
        let mut rng = StdRng::seed_from_u64(3);
        assert_eq!(random_char_deletion("Hematocrit", 1, 5, PerWordCap::Unbounded, DeleteMethod::Char, &mut rng), "Hematocrit");
    }

    #[test]
    fn test_zero_cap_limit_deletes_nothing() {
        let mut rng = StdRng::seed_from_u64(3);
        let output = random_char_deletion(LAB_TEXT, 1, 3, PerWordCap::Limit(0), DeleteMethod::Char, &mut rng);
        assert_eq!(output, LAB_TEXT);
    }

    #[test]
    fn test_whitespace_preserved() {
        let text = "Hemoglobin   A1c\tin  Blood";
        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            let output = random_char_deletion(text, 1, 3, PerWordCap::Limit(1), DeleteMethod::Char, &mut rng);
            assert_eq!(output.matches(' ').count(), text.matches(' ').count());
            assert!(output.contains('\t'));
        }
    }

    #[test]
    fn test_multibyte_characters_deleted_whole() {
        let text = "Größe naïve çà";
        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            let output = random_char_deletion(text, 2, 2, PerWordCap::Unbounded, DeleteMethod::Char, &mut rng);
            assert_eq!(output.chars().count(), text.chars().count() - 2);
        }
    }
}
