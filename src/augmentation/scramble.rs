use rand::seq::index;
use rand::Rng;
use tracing::debug;

/// Move a bounded number of words to new positions.
///
/// Draws how many words to move from `min_perms..=min(max_perms, word_count - 1)`,
/// picks that many distinct words and, from the highest index down, removes each
/// one and reinserts it anywhere except its own slot. The result is rejoined with
/// single spaces. Text with fewer than two words is returned unchanged.
pub fn scramble_word_order<R: Rng + ?Sized>(
    text: &str,
    min_perms: usize,
    max_perms: usize,
    rng: &mut R,
) -> String {
    let original: Vec<&str> = text.split_whitespace().collect();
    if original.len() < 2 {
        return text.to_string();
    }

    if min_perms > max_perms {
        debug!(min_perms, max_perms, "Scramble bounds inverted, leaving text unchanged");
        return text.to_string();
    }

    let upper = max_perms.min(original.len() - 1);
    let lower = min_perms.min(upper);
    let num_perms = rng.random_range(lower..=upper);
    if num_perms == 0 {
        return text.to_string();
    }

    let mut moves = index::sample(rng, original.len(), num_perms).into_vec();
    // WHY: descending order keeps the not-yet-processed indices valid after each removal
    moves.sort_unstable_by(|a, b| b.cmp(a));

    let mut words = original.clone();
    for idx in moves {
        let word = words.remove(idx);
        let mut new_pos = rng.random_range(0..words.len());
        if new_pos >= idx {
            new_pos += 1;
        }
        words.insert(new_pos, word);
    }

    // Later moves can undo earlier ones; rotation always changes a non-uniform sequence
    if words == original && original.iter().any(|w| *w != original[0]) {
        words.rotate_left(1);
    }

    words.join(" ")
}
