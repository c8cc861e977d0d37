use rand::seq::index;
use rand::Rng;
use tracing::debug;

/// One planned insertion: `term` goes before the word currently at `position`
/// (or after the last word when `position == word_count`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Insertion<'t> {
    pub position: usize,
    pub term: &'t str,
}

/// Choose which candidate terms go where.
///
/// Terms are distinct picks from `candidate_terms`; positions are drawn with
/// replacement from `0..=word_count` against the original word count. The plan is
/// returned sorted by descending position so it can be applied front to back.
pub fn plan_insertions<'t, R: Rng + ?Sized>(
    word_count: usize,
    candidate_terms: &[&'t str],
    min_inserts: usize,
    max_inserts: usize,
    rng: &mut R,
) -> Vec<Insertion<'t>> {
    if candidate_terms.is_empty() || word_count == 0 {
        return Vec::new();
    }
    if min_inserts > max_inserts {
        debug!(min_inserts, max_inserts, "Insert bounds inverted, skipping");
        return Vec::new();
    }

    let upper = max_inserts.min(candidate_terms.len());
    let lower = min_inserts.min(upper);
    let num_inserts = rng.random_range(lower..=upper);

    let chosen = index::sample(rng, candidate_terms.len(), num_inserts).into_vec();
    let mut plan: Vec<Insertion<'t>> = chosen
        .into_iter()
        .map(|i| Insertion {
            position: rng.random_range(0..=word_count),
            term: candidate_terms[i],
        })
        .collect();

    // WHY: inserting at the highest position first leaves every lower target slot where it was drawn
    plan.sort_by(|a, b| b.position.cmp(&a.position));
    plan
}

/// Insert randomly chosen related terms at random word positions.
///
/// Blank candidates are ignored. Returns the input unchanged when there are no usable
/// candidates, no words, or the bounds are inverted.
pub fn insert_related_terms<S: AsRef<str>, R: Rng + ?Sized>(
    text: &str,
    candidate_terms: &[S],
    min_inserts: usize,
    max_inserts: usize,
    rng: &mut R,
) -> String {
    let candidates: Vec<&str> = candidate_terms
        .iter()
        .map(|term| term.as_ref().trim())
        .filter(|term| !term.is_empty())
        .collect();
    let mut words: Vec<&str> = text.split_whitespace().collect();

    let plan = plan_insertions(words.len(), &candidates, min_inserts, max_inserts, rng);
    if plan.is_empty() {
        return text.to_string();
    }

    for insertion in plan {
        words.insert(insertion.position, insertion.term);
    }
    words.join(" ")
}
