//! Retrieval Augmented Generation (RAG) Pipeline
//!
//! This module holds the core of the system: everything between a list of
//! raw text fragments and a generated answer.
//!
//! # Module Structure
//!
//! - [`rag::tokenizer`](crate::rag::tokenizer) - Shared BPE token accounting
//! - [`rag::normalize`](crate::rag::normalize) - Stopword removal before chunking
//! - [`rag::chunker`](crate::rag::chunker) - Overlapping token-bounded chunks
//! - [`rag::embeddings`](crate::rag::embeddings) - Dense embedding adapters
//! - [`rag::prompt`](crate::rag::prompt) - Token-budgeted prompt assembly
//! - [`rag::pipeline`](crate::rag::pipeline) - Build and query orchestration
//!
//! # RAG Pipeline
//!
//! 1. **Build** - Fragments are normalized, chunked, embedded and indexed
//! 2. **Retrieval** - The question is embedded and its nearest chunks found
//! 3. **Budgeting** - Question and chunks are packed into a bounded prompt
//! 4. **Generation** - The generator completes the prompt
//!
//! # Example
//!
//! ```ignore
//! use newsrag::rag::pipeline::{RagPipeline, RagSettings};
//! use newsrag::rag::tokenizer::TiktokenTokenizer;
//! use std::sync::Arc;
//!
//! let pipeline = RagPipeline::new(
//!     Arc::new(TiktokenTokenizer::cl100k()?),
//!     embedder,
//!     generator,
//!     RagSettings::default(),
//! )?;
//!
//! pipeline.build_index(fragments).await?;
//! let answer = pipeline.query("What happened to gas fees?", 3).await?;
//! ```

pub mod chunker;
pub mod embeddings;
pub mod normalize;
pub mod pipeline;
pub mod prompt;
pub mod tokenizer;
