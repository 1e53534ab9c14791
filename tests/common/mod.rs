//! Shared helpers for integration tests.

#![allow(dead_code)]

pub mod mocks;

use newsrag::rag::tokenizer::{TiktokenTokenizer, Tokenizer};
use std::sync::Arc;

/// The real `cl100k_base` tokenizer.
pub fn cl100k() -> Arc<dyn Tokenizer> {
    Arc::new(TiktokenTokenizer::cl100k().expect("cl100k_base is bundled"))
}
