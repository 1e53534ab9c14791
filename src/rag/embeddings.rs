//! Dense embedding adapters.
//!
//! The pipeline only sees the [`Embedder`] trait: an order- and
//! length-preserving map from texts to fixed-dimension vectors. Backends
//! are selected through [`EmbedderProvider`] and compiled in via Cargo
//! features.

use crate::types::{AppError, Result};
use async_trait::async_trait;
use std::sync::Arc;

/// Maps texts to dense vectors.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a batch of texts. The output has one vector per input, in
    /// input order.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Embed a single text.
    ///
    /// Fails with `AppError::Embedding` unless the backend returns exactly
    /// one vector.
    async fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        let vectors = ensure_aligned(1, self.embed(&[text.to_string()]).await?)?;
        vectors
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Embedding("embedder returned no vector".to_string()))
    }

    /// Model identifier
    fn model_name(&self) -> &str;
}

/// Reject backend output that does not line up with its input batch.
pub fn ensure_aligned(inputs: usize, vectors: Vec<Vec<f32>>) -> Result<Vec<Vec<f32>>> {
    if vectors.len() != inputs {
        return Err(AppError::Embedding(format!(
            "embedder returned {} vectors for {} texts",
            vectors.len(),
            inputs
        )));
    }
    Ok(vectors)
}

/// Embedding backend selection.
#[derive(Debug, Clone, PartialEq)]
pub enum EmbedderProvider {
    /// Local ONNX model through fastembed, addressed by model code
    /// (e.g. `sentence-transformers/all-MiniLM-L6-v2`).
    FastEmbed { model: String },

    /// Ollama server embedding endpoint.
    Ollama { base_url: String, model: String },
}

impl EmbedderProvider {
    /// Instantiate the backend.
    ///
    /// # Errors
    ///
    /// `AppError::Configuration` if the backend's Cargo feature is not
    /// compiled in, `AppError::Embedding` if the model cannot be loaded.
    pub fn create_embedder(&self) -> Result<Arc<dyn Embedder>> {
        match self {
            #[cfg(feature = "local-embeddings")]
            EmbedderProvider::FastEmbed { model } => Ok(Arc::new(FastEmbedder::new(model)?)),

            #[cfg(not(feature = "local-embeddings"))]
            EmbedderProvider::FastEmbed { model } => Err(AppError::Configuration(format!(
                "Embedder '{}' needs the `local-embeddings` feature",
                model
            ))),

            #[cfg(feature = "ollama")]
            EmbedderProvider::Ollama { base_url, model } => {
                Ok(Arc::new(OllamaEmbedder::new(base_url, model)))
            }

            #[cfg(not(feature = "ollama"))]
            EmbedderProvider::Ollama { model, .. } => Err(AppError::Configuration(format!(
                "Embedder '{}' needs the `ollama` feature",
                model
            ))),
        }
    }

    /// Whether the backend is compiled into this build.
    pub fn is_available(&self) -> bool {
        match self {
            EmbedderProvider::FastEmbed { .. } => cfg!(feature = "local-embeddings"),
            EmbedderProvider::Ollama { .. } => cfg!(feature = "ollama"),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            EmbedderProvider::FastEmbed { .. } => "fastembed",
            EmbedderProvider::Ollama { .. } => "ollama",
        }
    }
}

#[cfg(feature = "local-embeddings")]
pub use self::fastembed_backend::FastEmbedder;

#[cfg(feature = "local-embeddings")]
mod fastembed_backend {
    use super::{ensure_aligned, Embedder};
    use crate::types::{AppError, Result};
    use async_trait::async_trait;
    use fastembed::{InitOptions, TextEmbedding};
    use parking_lot::Mutex;
    use std::sync::Arc;
    use tracing::info;

    /// Local ONNX embeddings via fastembed.
    pub struct FastEmbedder {
        model: Arc<Mutex<TextEmbedding>>,
        model_code: String,
        dimensions: usize,
    }

    impl FastEmbedder {
        /// Load a model by its code. Matching ignores case, and the
        /// organisation prefix may be omitted (`all-MiniLM-L6-v2`).
        pub fn new(model_code: &str) -> Result<Self> {
            let wanted = model_code.to_lowercase();
            let info = TextEmbedding::list_supported_models()
                .into_iter()
                .find(|m| {
                    let code = m.model_code.to_lowercase();
                    code == wanted || code.rsplit('/').next() == Some(wanted.as_str())
                })
                .ok_or_else(|| {
                    AppError::Configuration(format!(
                        "Unsupported fastembed model: {}",
                        model_code
                    ))
                })?;

            info!(model = %info.model_code, dim = info.dim, "Loading embedding model");

            let model = TextEmbedding::try_new(
                InitOptions::new(info.model.clone()).with_show_download_progress(true),
            )
            .map_err(|e| AppError::Embedding(e.to_string()))?;

            Ok(Self {
                model: Arc::new(Mutex::new(model)),
                model_code: info.model_code.clone(),
                dimensions: info.dim,
            })
        }

        pub fn dimensions(&self) -> usize {
            self.dimensions
        }
    }

    #[async_trait]
    impl Embedder for FastEmbedder {
        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            if texts.is_empty() {
                return Ok(Vec::new());
            }
            let model = self.model.clone();
            let batch = texts.to_vec();
            let vectors = tokio::task::spawn_blocking(move || model.lock().embed(batch, None))
                .await
                .map_err(|e| AppError::Embedding(format!("embedding task failed: {}", e)))?
                .map_err(|e| AppError::Embedding(e.to_string()))?;
            ensure_aligned(texts.len(), vectors)
        }

        fn model_name(&self) -> &str {
            &self.model_code
        }
    }
}

#[cfg(feature = "ollama")]
pub use self::ollama_backend::OllamaEmbedder;

#[cfg(feature = "ollama")]
mod ollama_backend {
    use super::{ensure_aligned, Embedder};
    use crate::llm::ollama::connect;
    use crate::types::{AppError, Result};
    use async_trait::async_trait;
    use ollama_rs::generation::embeddings::request::{EmbeddingsInput, GenerateEmbeddingsRequest};
    use ollama_rs::Ollama;

    /// Embeddings from an Ollama server (e.g. `all-minilm`).
    pub struct OllamaEmbedder {
        client: Ollama,
        model: String,
    }

    impl OllamaEmbedder {
        pub fn new(base_url: &str, model: &str) -> Self {
            Self {
                client: connect(base_url),
                model: model.to_string(),
            }
        }
    }

    #[async_trait]
    impl Embedder for OllamaEmbedder {
        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            if texts.is_empty() {
                return Ok(Vec::new());
            }
            let request = GenerateEmbeddingsRequest::new(
                self.model.clone(),
                EmbeddingsInput::Multiple(texts.to_vec()),
            );
            let response = self
                .client
                .generate_embeddings(request)
                .await
                .map_err(|e| AppError::Embedding(format!("Ollama error: {}", e)))?;
            ensure_aligned(texts.len(), response.embeddings)
        }

        fn model_name(&self) -> &str {
            &self.model
        }
    }
}
