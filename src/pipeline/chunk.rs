//! Fixed-width text chunking.
//!
//! Windows are counted in characters, not bytes, so a chunk never splits a
//! multi-byte code point. Sentence and paragraph boundaries are ignored: a
//! question generator only needs "enough context", and fixed windows keep
//! the number of provider calls predictable (`ceil(len / chunk_size)`).

/// Characters per chunk unless configured otherwise.
pub const DEFAULT_CHUNK_SIZE: usize = 3000;

/// An immutable, 0-indexed slice of the source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChunk {
    index: usize,
    content: String,
    size: usize,
}

impl TextChunk {
    pub fn new(index: usize, content: impl Into<String>) -> Self {
        let content = content.into();
        let size = content.chars().count();
        Self {
            index,
            content,
            size,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Length of `content` in characters.
    pub fn size(&self) -> usize {
        self.size
    }
}

/// Split `text` into contiguous windows of at most `chunk_size` characters.
///
/// Concatenating every chunk's content in order reproduces `text` exactly.
/// A `chunk_size` of 0 is treated as 1.
pub fn chunk_text(text: &str, chunk_size: usize) -> Vec<TextChunk> {
    let chunk_size = chunk_size.max(1);
    let mut chunks = Vec::new();
    let mut start = 0;
    let mut count = 0;

    for (byte_idx, _) in text.char_indices() {
        if count == chunk_size {
            chunks.push(TextChunk {
                index: chunks.len(),
                content: text[start..byte_idx].to_string(),
                size: count,
            });
            start = byte_idx;
            count = 0;
        }
        count += 1;
    }

    if count > 0 {
        chunks.push(TextChunk {
            index: chunks.len(),
            content: text[start..].to_string(),
            size: count,
        });
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_yields_no_chunks() {
        assert!(chunk_text("", 3000).is_empty());
    }

    #[test]
    fn seven_thousand_chars_split_three_ways() {
        let text = "a".repeat(7000);
        let chunks = chunk_text(&text, 3000);
        let sizes: Vec<usize> = chunks.iter().map(|c| c.size()).collect();
        assert_eq!(sizes, vec![3000, 3000, 1000]);
        let indices: Vec<usize> = chunks.iter().map(|c| c.index()).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn concatenation_reproduces_input() {
        let text = "The mitochondria is the powerhouse of the cell. ".repeat(37);
        for size in [1, 7, 64, 3000, 10_000] {
            let chunks = chunk_text(&text, size);
            let joined: String = chunks.iter().map(|c| c.content()).collect();
            assert_eq!(joined, text, "chunk_size {size}");

            let expected = text.chars().count().div_ceil(size);
            assert_eq!(chunks.len(), expected, "chunk_size {size}");

            for c in &chunks[..chunks.len() - 1] {
                assert_eq!(c.size(), size);
                assert_eq!(c.content().chars().count(), size);
            }
        }
    }

    #[test]
    fn exact_multiple_has_no_empty_tail() {
        let chunks = chunk_text(&"x".repeat(6000), 3000);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[1].size(), 3000);
    }

    #[test]
    fn multibyte_characters_are_not_split() {
        let text = "été→ü😀".repeat(10);
        let chunks = chunk_text(&text, 4);
        let joined: String = chunks.iter().map(|c| c.content()).collect();
        assert_eq!(joined, text);
        assert!(chunks.iter().all(|c| c.size() <= 4));
    }

    #[test]
    fn zero_chunk_size_is_treated_as_one() {
        let chunks = chunk_text("abc", 0);
        assert_eq!(chunks.len(), 3);
    }

    #[test]
    fn new_counts_chars() {
        let c = TextChunk::new(4, "héllo");
        assert_eq!(c.index(), 4);
        assert_eq!(c.size(), 5);
    }
}
