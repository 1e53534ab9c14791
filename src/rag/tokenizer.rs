//! Token accounting shared by the chunker and the prompt budgeter.
//!
//! Both components must agree on what a "token" is, otherwise chunk sizes
//! and prompt budgets drift apart. The tokenizer is constructed once and
//! injected into each of them.

use crate::types::{AppError, Result};
use tiktoken_rs::CoreBPE;
use tracing::trace;

/// Byte-pair tokenizer abstraction.
pub trait Tokenizer: Send + Sync {
    /// Encode text into token ids. Special-token markup in the input is
    /// treated as ordinary text.
    fn encode(&self, text: &str) -> Vec<u32>;

    /// Encode text and report the byte offset in `text` at which each
    /// token starts. Offsets that are not `char` boundaries mark tokens
    /// holding part of a multi-byte character.
    fn encode_with_offsets(&self, text: &str) -> (Vec<u32>, Vec<usize>);

    /// Decode a token slice back to text.
    ///
    /// Slices cut at arbitrary positions may split a multi-byte character;
    /// implementations drop the dangling tokens at either edge instead of
    /// emitting invalid text, so the result never carries more tokens than
    /// the input slice.
    fn decode(&self, tokens: &[u32]) -> String;

    /// Number of tokens in `text`.
    fn count(&self, text: &str) -> usize {
        self.encode(text).len()
    }

    /// Encoding name, e.g. `cl100k_base`.
    fn name(&self) -> &str;
}

/// [`Tokenizer`] backed by OpenAI's tiktoken encodings.
pub struct TiktokenTokenizer {
    bpe: CoreBPE,
    name: String,
}

/// Maximum number of tokens trimmed from each edge when a slice does not
/// decode to valid UTF-8. A single character spans at most four bytes.
const MAX_EDGE_TRIM: usize = 3;

impl TiktokenTokenizer {
    /// Load an encoding by name (`cl100k_base`, `o200k_base`, `p50k_base`, `r50k_base`).
    pub fn new(encoding: &str) -> Result<Self> {
        let bpe = match encoding {
            "cl100k_base" => tiktoken_rs::cl100k_base(),
            "o200k_base" => tiktoken_rs::o200k_base(),
            "p50k_base" => tiktoken_rs::p50k_base(),
            "r50k_base" => tiktoken_rs::r50k_base(),
            other => {
                return Err(AppError::Configuration(format!(
                    "Unknown tokenizer encoding: {}",
                    other
                )))
            }
        }
        .map_err(|e| AppError::Internal(format!("Failed to load {}: {}", encoding, e)))?;

        Ok(Self {
            bpe,
            name: encoding.to_string(),
        })
    }

    /// The default `cl100k_base` encoding.
    pub fn cl100k() -> Result<Self> {
        Self::new("cl100k_base")
    }

    fn try_decode(&self, tokens: &[u32]) -> Option<String> {
        self.bpe
            .decode(tokens.iter().map(|&t| t as _).collect())
            .ok()
    }
}

impl Tokenizer for TiktokenTokenizer {
    fn encode(&self, text: &str) -> Vec<u32> {
        self.bpe
            .encode_ordinary(text)
            .into_iter()
            .map(|t| t as u32)
            .collect()
    }

    fn encode_with_offsets(&self, text: &str) -> (Vec<u32>, Vec<usize>) {
        let ranks = self.bpe.encode_ordinary(text);
        let mut offsets = Vec::with_capacity(ranks.len());
        let mut offset = 0;
        for bytes in self.bpe._decode_native_and_split(ranks.clone()) {
            offsets.push(offset);
            offset += bytes.len();
        }
        (ranks.into_iter().map(|t| t as u32).collect(), offsets)
    }

    fn decode(&self, tokens: &[u32]) -> String {
        if let Some(text) = self.try_decode(tokens) {
            return text;
        }

        for lead in 0..=MAX_EDGE_TRIM.min(tokens.len()) {
            for trail in 0..=MAX_EDGE_TRIM.min(tokens.len() - lead) {
                if lead == 0 && trail == 0 {
                    continue;
                }
                if let Some(text) = self.try_decode(&tokens[lead..tokens.len() - trail]) {
                    trace!(lead, trail, "Trimmed partial characters while decoding");
                    return text;
                }
            }
        }

        String::new()
    }

    fn name(&self) -> &str {
        &self.name
    }
}
