//! # newsrag
//!
//! Crawl news sites into a local fragment store and answer questions about
//! them with retrieval-augmented generation.
//!
//! ## Overview
//!
//! newsrag can be used in two ways:
//!
//! 1. **As a command-line tool** - Run the `newsrag` binary (`crawl`, `ask`)
//! 2. **As a library** - Drive the [`RagPipeline`] from your own code
//!
//! ## Quick Start (Library Usage)
//!
//! ```rust,ignore
//! use newsrag::rag::pipeline::{RagPipeline, RagSettings};
//! use newsrag::rag::tokenizer::TiktokenTokenizer;
//! use newsrag::{EmbedderProvider, GeneratorProvider};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let embedder = EmbedderProvider::Ollama {
//!         base_url: "http://localhost:11434".to_string(),
//!         model: "all-minilm".to_string(),
//!     }
//!     .create_embedder()?;
//!     let generator = GeneratorProvider::Ollama {
//!         base_url: "http://localhost:11434".to_string(),
//!         model: "zephyr".to_string(),
//!     }
//!     .create_generator()?;
//!
//!     let pipeline = RagPipeline::new(
//!         Arc::new(TiktokenTokenizer::cl100k()?),
//!         embedder,
//!         generator,
//!         RagSettings::default(),
//!     )?;
//!
//!     pipeline
//!         .build_index(vec![
//!             "Bitcoin price rose today.".to_string(),
//!             "Ethereum gas fees dropped.".to_string(),
//!         ])
//!         .await?;
//!
//!     let answer = pipeline.query("What happened to gas fees?", 1).await?;
//!     println!("{}", answer);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `ollama` | Ollama embeddings and generation (default) |
//! | `llamacpp` | Direct GGUF model loading |
//! | `local-embeddings` | fastembed ONNX embeddings |
//! | `local` | `llamacpp` + `local-embeddings` |
//! | `full` | Every backend |
//!
//! ## Modules
//!
//! - [`rag`] - Chunking, embedding, prompt budgeting and the pipeline
//! - [`llm`] - Generator backends
//! - [`db`] - Fragment stores
//! - [`crawl`] - Fetching and HTML extraction
//! - [`utils`] - TOML configuration
//! - [`types`] - Common types and error handling

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(rustdoc::missing_crate_level_docs)]

/// Command-line parsing and output.
pub mod cli;
/// Fetching news sources and extracting their text.
pub mod crawl;
/// Fragment stores (in-memory, libsql).
pub mod db;
/// Generator backends.
pub mod llm;
/// Retrieval Augmented Generation (RAG) components.
pub mod rag;
/// Core types (documents, answers, errors).
pub mod types;
/// Configuration utilities.
pub mod utils;

// Re-export commonly used types
pub use db::{FragmentStore, LibsqlFragmentStore, MemoryFragmentStore};
pub use llm::{Generator, GeneratorProvider};
pub use rag::embeddings::{Embedder, EmbedderProvider};
pub use rag::pipeline::{RagPipeline, RagSettings};
pub use types::{AppError, Result};
pub use utils::toml_config::NewsragConfig;
