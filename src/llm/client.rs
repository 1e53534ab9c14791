//! Generator abstraction and backend selection
//!
//! This module provides the interface the pipeline uses to turn a finished
//! prompt into completion text:
//! - **LlamaCpp**: GGUF models loaded in-process through llama.cpp
//! - **Ollama**: completion endpoint of a local Ollama server

use crate::types::{AppError, GenerationParams, Result};
use async_trait::async_trait;
use std::sync::Arc;

/// Bounded-context text generator.
///
/// Implementations must not retain state between calls that could be
/// corrupted by a failed generation; a failure affects only the call that
/// produced it.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Complete `prompt` with the given sampling controls.
    async fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<String>;

    /// Get the model name/identifier
    fn model_name(&self) -> &str;
}

/// Generator backend selection
///
/// | Provider | Feature | Notes |
/// |----------|---------|-------|
/// | LlamaCpp | `llamacpp` | In-process GGUF inference |
/// | Ollama | `ollama` (default) | Requires a running Ollama server |
#[derive(Debug, Clone, PartialEq)]
pub enum GeneratorProvider {
    /// Direct GGUF model loading via llama.cpp
    ///
    /// # Example
    /// ```rust,ignore
    /// let provider = GeneratorProvider::LlamaCpp {
    ///     model_path: "/models/zephyr-7b-alpha.Q4_K_M.gguf".to_string(),
    ///     context_length: 4096,
    ///     threads: 4,
    /// };
    /// ```
    LlamaCpp {
        model_path: String,
        context_length: u32,
        threads: u32,
    },

    /// Ollama local LLM provider
    Ollama { base_url: String, model: String },
}

impl GeneratorProvider {
    /// Create a generator instance for this provider
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The provider's Cargo feature is not compiled in (`Configuration`)
    /// - The model cannot be loaded (`Generation`)
    pub fn create_generator(&self) -> Result<Arc<dyn Generator>> {
        match self {
            #[cfg(feature = "llamacpp")]
            GeneratorProvider::LlamaCpp {
                model_path,
                context_length,
                threads,
            } => Ok(Arc::new(super::llamacpp::LlamaCppGenerator::new(
                model_path,
                *context_length,
                *threads,
            )?)),

            #[cfg(not(feature = "llamacpp"))]
            GeneratorProvider::LlamaCpp { model_path, .. } => Err(AppError::Configuration(
                format!(
                    "Generator model '{}' needs the `llamacpp` feature",
                    model_path
                ),
            )),

            #[cfg(feature = "ollama")]
            GeneratorProvider::Ollama { base_url, model } => Ok(Arc::new(
                super::ollama::OllamaGenerator::new(base_url, model),
            )),

            #[cfg(not(feature = "ollama"))]
            GeneratorProvider::Ollama { model, .. } => Err(AppError::Configuration(format!(
                "Generator '{}' needs the `ollama` feature",
                model
            ))),
        }
    }

    /// Check if this provider's backend is compiled in
    pub fn is_available(&self) -> bool {
        match self {
            GeneratorProvider::LlamaCpp { .. } => cfg!(feature = "llamacpp"),
            GeneratorProvider::Ollama { .. } => cfg!(feature = "ollama"),
        }
    }

    /// Get a human-readable name for this provider
    pub fn name(&self) -> &'static str {
        match self {
            GeneratorProvider::LlamaCpp { .. } => "LlamaCpp",
            GeneratorProvider::Ollama { .. } => "Ollama",
        }
    }
}
