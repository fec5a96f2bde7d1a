//! L4 Atomic Layer: Token boundaries for progressive reveal
//!
//! A boundary is the byte offset just past a token. Revealing `k` tokens
//! exposes `text[..boundaries[k - 1]]`, which keeps the original separators
//! (newlines included) intact.

/// Unit of progressive disclosure
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Granularity {
    /// Whitespace-delimited words
    #[default]
    Word,
    /// Individual characters, whitespace included
    Char,
}

/// Compute the end offset of every token in `text`
pub fn token_boundaries(text: &str, granularity: Granularity) -> Vec<usize> {
    match granularity {
        Granularity::Word => word_boundaries(text),
        Granularity::Char => text
            .char_indices()
            .map(|(idx, ch)| idx + ch.len_utf8())
            .collect(),
    }
}

fn word_boundaries(text: &str) -> Vec<usize> {
    let mut boundaries = Vec::new();
    let mut in_word = false;

    for (idx, ch) in text.char_indices() {
        if ch.is_whitespace() {
            if in_word {
                boundaries.push(idx);
                in_word = false;
            }
        } else {
            in_word = true;
        }
    }

    if in_word {
        boundaries.push(text.len());
    }

    boundaries
}
