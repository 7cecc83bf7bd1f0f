//! Recursive Text Chunker
//!
//! Splits a document into overlapping segments using a recursive separator
//! hierarchy: paragraph breaks first, then line breaks, then sentence-ending
//! punctuation, then whitespace, then a hard character cut. The coarsest
//! separator that produces pieces within the size bound wins; adjacent
//! chunks share an overlap tail so context survives a boundary.
//!
//! Pure and deterministic: same (text, chunk_size, chunk_overlap) always
//! produces the same chunks. Sizes are measured in characters, and pieces
//! are split losslessly (`split_inclusive`), so the chunks cover the whole
//! input apart from the intentional overlap duplication.

/// Separator hierarchy, coarsest first. An exhausted hierarchy falls back
/// to a hard character cut.
const SEPARATORS: [&str; 4] = ["\n\n", "\n", ". ", " "];

/// Splits text into bounded, overlapping chunks.
#[derive(Debug, Clone)]
pub struct TextChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl TextChunker {
    /// Create a chunker. `chunk_overlap` is clamped below `chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            chunk_size,
            chunk_overlap: chunk_overlap.min(chunk_size - 1),
        }
    }

    /// Split `text` into chunks of at most `chunk_size` characters.
    ///
    /// Empty or whitespace-only input produces zero chunks.
    pub fn split(&self, text: &str) -> Vec<String> {
        if text.trim().is_empty() {
            return Vec::new();
        }
        let pieces = self.split_recursive(text, &SEPARATORS);
        self.merge(pieces)
    }

    /// Break `text` into pieces no longer than `chunk_size`, preferring the
    /// coarsest separator that gets a piece under the bound.
    fn split_recursive(&self, text: &str, separators: &[&str]) -> Vec<String> {
        if char_len(text) <= self.chunk_size {
            return vec![text.to_string()];
        }
        match separators.split_first() {
            Some((separator, rest)) => {
                let mut pieces = Vec::new();
                for part in text.split_inclusive(*separator) {
                    if char_len(part) <= self.chunk_size {
                        pieces.push(part.to_string());
                    } else {
                        pieces.extend(self.split_recursive(part, rest));
                    }
                }
                pieces
            }
            None => hard_cut(text, self.chunk_size),
        }
    }

    /// Greedily pack pieces into chunks, carrying an overlap tail across
    /// each boundary. The tail shrinks when needed so every chunk stays
    /// within `chunk_size`.
    fn merge(&self, pieces: Vec<String>) -> Vec<String> {
        let mut chunks: Vec<String> = Vec::new();
        let mut current = String::new();
        let mut current_len = 0usize;

        for piece in pieces {
            let piece_len = char_len(&piece);
            if current_len > 0 && current_len + piece_len > self.chunk_size {
                let budget = self
                    .chunk_overlap
                    .min(self.chunk_size.saturating_sub(piece_len));
                let tail = tail_chars(&current, budget);
                chunks.push(std::mem::take(&mut current));
                current_len = char_len(&tail);
                current = tail;
            }
            current.push_str(&piece);
            current_len += piece_len;
        }

        if !current.trim().is_empty() {
            chunks.push(current);
        }
        chunks
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Last `n` characters of `s`, on a character boundary.
fn tail_chars(s: &str, n: usize) -> String {
    if n == 0 {
        return String::new();
    }
    let total = char_len(s);
    if total <= n {
        return s.to_string();
    }
    let start = s
        .char_indices()
        .nth(total - n)
        .map(|(i, _)| i)
        .unwrap_or(0);
    s[start..].to_string()
}

/// Cut `text` into consecutive blocks of exactly `size` characters (the
/// last block may be shorter).
fn hard_cut(text: &str, size: usize) -> Vec<String> {
    let mut blocks = Vec::new();
    let mut current = String::new();
    let mut count = 0usize;
    for ch in text.chars() {
        current.push(ch);
        count += 1;
        if count == size {
            blocks.push(std::mem::take(&mut current));
            count = 0;
        }
    }
    if !current.is_empty() {
        blocks.push(current);
    }
    blocks
}
