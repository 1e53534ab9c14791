use crate::rag::tokenizer::Tokenizer;
use crate::types::{AppError, Result};
use std::ops::Range;
use std::sync::Arc;

/// Splits text into overlapping windows of at most `chunk_size` tokens.
///
/// Adjacent chunks share exactly `chunk_overlap` tokens, except that the
/// last chunk may be shorter. Windows are cut on token boundaries and
/// decoded back to text, never sliced out of the raw string.
///
/// A window edge never splits a multi-byte character across two tokens:
/// edges that would land inside one move back to the character's first
/// token, so no bytes are lost between chunks. Such a window is shorter by
/// the moved tokens and its successor overlaps it by up to as many more.
#[derive(Clone)]
pub struct TextChunker {
    tokenizer: Arc<dyn Tokenizer>,
    chunk_size: usize,
    chunk_overlap: usize,
}

impl TextChunker {
    /// Create a chunker.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Configuration` unless `chunk_size > 0` and
    /// `chunk_overlap < chunk_size`; any other combination would never
    /// advance through the token sequence.
    pub fn new(
        tokenizer: Arc<dyn Tokenizer>,
        chunk_size: usize,
        chunk_overlap: usize,
    ) -> Result<Self> {
        validate_window(chunk_size, chunk_overlap)?;
        Ok(Self {
            tokenizer,
            chunk_size,
            chunk_overlap,
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    pub fn chunk(&self, text: &str) -> Vec<String> {
        let (tokens, offsets) = self.tokenizer.encode_with_offsets(text);
        if tokens.is_empty() {
            return Vec::new();
        }
        if tokens.len() <= self.chunk_size {
            return vec![text.to_string()];
        }

        let on_char_boundary = |i: usize| {
            offsets
                .get(i)
                .is_none_or(|&offset| text.is_char_boundary(offset))
        };

        aligned_windows(
            tokens.len(),
            self.chunk_size,
            self.chunk_overlap,
            on_char_boundary,
        )
        .into_iter()
        .map(|window| self.tokenizer.decode(&tokens[window]))
        .collect()
    }
}

/// Chunk `text` with a one-off chunker.
pub fn chunk_text(
    tokenizer: Arc<dyn Tokenizer>,
    text: &str,
    chunk_size: usize,
    overlap: usize,
) -> Result<Vec<String>> {
    Ok(TextChunker::new(tokenizer, chunk_size, overlap)?.chunk(text))
}

pub(crate) fn validate_window(chunk_size: usize, chunk_overlap: usize) -> Result<()> {
    if chunk_size == 0 {
        return Err(AppError::Configuration(
            "chunk_size must be greater than 0".to_string(),
        ));
    }
    if chunk_overlap >= chunk_size {
        return Err(AppError::Configuration(format!(
            "overlap ({}) must be smaller than chunk_size ({})",
            chunk_overlap, chunk_size
        )));
    }
    Ok(())
}

/// Token ranges covered by each chunk of a `len`-token sequence.
///
/// Windows start every `chunk_size - chunk_overlap` tokens and the sequence
/// stops at the first window that reaches the end, which yields
/// `ceil((len - overlap) / (chunk_size - overlap))` windows when
/// `len > chunk_size` and a single window otherwise.
pub fn token_windows(len: usize, chunk_size: usize, chunk_overlap: usize) -> Vec<Range<usize>> {
    if len == 0 || chunk_size == 0 || chunk_overlap >= chunk_size {
        return Vec::new();
    }

    let step = chunk_size - chunk_overlap;
    let mut windows = Vec::with_capacity(len.saturating_sub(chunk_overlap).div_ceil(step));
    let mut start = 0;
    loop {
        let end = (start + chunk_size).min(len);
        windows.push(start..end);
        if end == len {
            break;
        }
        start += step;
    }
    windows
}

/// Token windows whose edges all satisfy `is_edge`.
///
/// Follows the [`token_windows`] plan and moves an edge back to the nearest
/// earlier position accepted by `is_edge`; positions `0` and `len` are
/// always accepted. When every position is accepted the result equals
/// `token_windows(len, chunk_size, chunk_overlap)`. Windows never exceed
/// `chunk_size` tokens unless no accepted edge exists within `chunk_size`
/// tokens of a window's start, in which case that window runs to the next
/// accepted edge.
pub fn aligned_windows(
    len: usize,
    chunk_size: usize,
    chunk_overlap: usize,
    is_edge: impl Fn(usize) -> bool,
) -> Vec<Range<usize>> {
    if len == 0 || chunk_size == 0 || chunk_overlap >= chunk_size {
        return Vec::new();
    }

    let accepts = |i: usize| i == 0 || i >= len || is_edge(i);
    let snap_back = |mut i: usize| {
        while !accepts(i) {
            i -= 1;
        }
        i
    };
    let snap_forward = |mut i: usize| {
        while !accepts(i) {
            i += 1;
        }
        i.min(len)
    };

    let mut windows = Vec::new();
    let mut start = 0;
    loop {
        let mut end = snap_back((start + chunk_size).min(len));
        if end <= start {
            end = snap_forward(start + 1);
        }
        windows.push(start..end);
        if end == len {
            break;
        }

        let next = snap_back(end.saturating_sub(chunk_overlap));
        start = if next > start { next } else { end };
    }
    windows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rag::tokenizer::TiktokenTokenizer;

    fn tokenizer() -> Arc<dyn Tokenizer> {
        Arc::new(TiktokenTokenizer::cl100k().unwrap())
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(matches!(
            TextChunker::new(tokenizer(), 0, 0),
            Err(AppError::Configuration(_))
        ));
        assert!(matches!(
            TextChunker::new(tokenizer(), 10, 10),
            Err(AppError::Configuration(_))
        ));
        assert!(TextChunker::new(tokenizer(), 10, 9).is_ok());
    }

    #[test]
    fn test_short_text_is_single_chunk() {
        let chunker = TextChunker::new(tokenizer(), 512, 64).unwrap();
        let chunks = chunker.chunk("Ethereum gas fees dropped.");
        assert_eq!(chunks, vec!["Ethereum gas fees dropped.".to_string()]);
    }

    #[test]
    fn test_empty_text_has_no_chunks() {
        let chunker = TextChunker::new(tokenizer(), 512, 64).unwrap();
        assert!(chunker.chunk("").is_empty());
    }

    #[test]
    fn test_windows_layout() {
        assert_eq!(token_windows(1000, 512, 64), vec![0..512, 448..960, 896..1000]);
        assert_eq!(token_windows(960, 512, 64), vec![0..512, 448..960]);
        assert_eq!(token_windows(512, 512, 64), vec![0..512]);
        assert_eq!(token_windows(5, 2, 0), vec![0..2, 2..4, 4..5]);
        assert!(token_windows(0, 512, 64).is_empty());
    }

    #[test]
    fn test_aligned_windows_match_plan_when_every_edge_is_accepted() {
        assert_eq!(
            aligned_windows(1000, 512, 64, |_| true),
            token_windows(1000, 512, 64)
        );
        assert_eq!(aligned_windows(5, 2, 0, |_| true), token_windows(5, 2, 0));
    }

    #[test]
    fn test_aligned_windows_move_edges_back() {
        // Positions 3 and 4 sit inside a character spanning tokens 2..5.
        let is_edge = |i: usize| i != 3 && i != 4;
        assert_eq!(aligned_windows(8, 4, 0, is_edge), vec![0..2, 2..6, 6..8]);
        assert_eq!(aligned_windows(8, 4, 1, is_edge), vec![0..2, 1..5, 2..6, 5..8]);
    }

    #[test]
    fn test_aligned_windows_widen_when_no_edge_fits() {
        let is_edge = |i: usize| i % 3 == 0;
        assert_eq!(aligned_windows(7, 2, 0, is_edge), vec![0..3, 3..6, 6..7]);
    }

    #[test]
    fn test_split_characters_are_not_dropped() {
        let text = "比特币价格今天上涨了。🚀".repeat(5);
        for size in [2, 3, 5, 7] {
            let chunker = TextChunker::new(tokenizer(), size, 0).unwrap();
            assert_eq!(chunker.chunk(&text).concat(), text, "chunk_size {}", size);
        }
    }

    #[test]
    fn test_long_text_chunks_stay_within_size() {
        let chunker = TextChunker::new(tokenizer(), 50, 10).unwrap();
        let text = "The quick brown fox jumps over the lazy dog. ".repeat(40);
        let chunks = chunker.chunk(&text);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(tokenizer().count(chunk) <= 50);
        }
    }
}
