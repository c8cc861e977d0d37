// WHY: Editing operators must address a specific occurrence of a token inside the
// original string; a repeated token claims the next unclaimed occurrence, never an earlier one

use tracing::debug;

/// One resolved occurrence of a token. `start..end` is a half-open byte range
/// into the source text, so `&text[start..end] == word`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordSpan<'a> {
    pub word: &'a str,
    pub start: usize,
    pub end: usize,
}

impl<'a> WordSpan<'a> {
    /// Length in characters, not bytes
    pub fn char_len(&self) -> usize {
        self.word.chars().count()
    }

    /// Byte offset in the source text of every character of this occurrence
    pub fn char_offsets(&self) -> impl Iterator<Item = usize> + '_ {
        self.word.char_indices().map(move |(offset, _)| self.start + offset)
    }
}

/// Ordered span table, one slot per token in split order.
///
/// A slot is empty when the token has no occurrence at or after the position
/// where the previous token ended; callers treat such words as unavailable.
#[derive(Debug, Clone, Default)]
pub struct WordIndex<'a> {
    slots: Vec<Option<WordSpan<'a>>>,
}

impl<'a> WordIndex<'a> {
    /// Index the whitespace-delimited tokens of `text`
    pub fn build(text: &'a str) -> Self {
        Self::resolve(text, text.split_whitespace())
    }

    /// Resolve externally produced tokens against `text` with an advancing cursor
    pub fn resolve<'t, I>(text: &'a str, tokens: I) -> Self
    where
        I: IntoIterator<Item = &'t str>,
    {
        let mut cursor = 0;
        let mut slots = Vec::new();

        for token in tokens {
            if token.is_empty() {
                slots.push(None);
                continue;
            }

            match text.get(cursor..).and_then(|rest| rest.find(token)) {
                Some(relative) => {
                    let start = cursor + relative;
                    let end = start + token.len();
                    slots.push(Some(WordSpan {
                        word: &text[start..end],
                        start,
                        end,
                    }));
                    cursor = end;
                }
                None => {
                    debug!(token, cursor, "Token has no further occurrence in source text");
                    slots.push(None);
                }
            }
        }

        Self { slots }
    }

    /// Number of tokens, resolved or not
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Span of the token at `index`, if it resolved
    pub fn get(&self, index: usize) -> Option<&WordSpan<'a>> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    /// All slots in token order
    pub fn slots(&self) -> &[Option<WordSpan<'a>>] {
        &self.slots
    }

    /// Resolved spans only, in token order
    pub fn spans(&self) -> impl Iterator<Item = &WordSpan<'a>> {
        self.slots.iter().flatten()
    }

    pub fn resolved_count(&self) -> usize {
        self.spans().count()
    }
}

/// Index the whitespace-delimited words of `text`
pub fn index_words(text: &str) -> WordIndex<'_> {
    WordIndex::build(text)
}
