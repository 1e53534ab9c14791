//! Generator Backends
//!
//! This module turns a finished, budgeted prompt into completion text. The
//! pipeline depends only on the [`Generator`] trait; concrete backends are
//! chosen at runtime through [`GeneratorProvider`] and compiled in via
//! Cargo features.
//!
//! # Supported Backends
//!
//! - `llamacpp` - GGUF models loaded in-process with llama.cpp
//! - `ollama` - Local Ollama server (default feature)
//!
//! # Example
//!
//! ```ignore
//! use newsrag::llm::GeneratorProvider;
//! use newsrag::types::GenerationParams;
//!
//! let generator = GeneratorProvider::Ollama {
//!     base_url: "http://localhost:11434".to_string(),
//!     model: "zephyr".to_string(),
//! }
//! .create_generator()?;
//!
//! let text = generator.generate("What is 2+2?", &GenerationParams::default()).await?;
//! ```

/// Core generator trait and provider selection.
pub mod client;

#[cfg(feature = "llamacpp")]
pub mod llamacpp;

#[cfg(feature = "ollama")]
pub mod ollama;

pub use client::{Generator, GeneratorProvider};
