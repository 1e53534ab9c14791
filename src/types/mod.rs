use serde::{Deserialize, Serialize};

// ============= RAG Types =============

/// An immutable indexed text unit, addressed by its position in the
/// document collection of the index build that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub position: usize,
    pub content: String,
}

/// A document returned by retrieval together with its squared L2 distance
/// to the query embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedDocument {
    pub document: Document,
    pub distance: f32,
}

/// Retrieved documents ordered closest first.
pub type RetrievedContext = Vec<RetrievedDocument>;

/// The result of a full query: the generated text plus what it was grounded on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagAnswer {
    pub answer: String,
    pub prompt_tokens: usize,
    pub context: RetrievedContext,
}

/// Sampling controls passed to the generator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    /// Upper bound on generated tokens.
    pub max_tokens: usize,
    /// 0 means greedy decoding. Valid range `[0, 2]`.
    pub temperature: f32,
    /// Nucleus sampling mass. Valid range `(0, 1]`.
    pub top_p: f32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_tokens: 3500,
            temperature: 0.7,
            top_p: 0.9,
        }
    }
}

impl GenerationParams {
    pub fn validate(&self) -> Result<()> {
        if self.max_tokens == 0 {
            return Err(AppError::Configuration(
                "max_tokens must be greater than 0".to_string(),
            ));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(AppError::Configuration(format!(
                "temperature must be within [0, 2], got {}",
                self.temperature
            )));
        }
        if !(self.top_p > 0.0 && self.top_p <= 1.0) {
            return Err(AppError::Configuration(format!(
                "top_p must be within (0, 1], got {}",
                self.top_p
            )));
        }
        Ok(())
    }

    /// Whether sampling collapses to greedy decoding.
    pub fn is_greedy(&self) -> bool {
        self.temperature == 0.0
    }
}

// ============= Error Types =============

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Empty input: {0}")]
    EmptyInput(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Prompt header needs {header_tokens} tokens but the budget is {max_tokens}")]
    BudgetExceeded {
        header_tokens: usize,
        max_tokens: usize,
    },

    #[error("Index not initialized. Call build_index() first")]
    NotReady,

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Fetch error: {0}")]
    Fetch(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<newsrag_vector::Error> for AppError {
    fn from(err: newsrag_vector::Error) -> Self {
        match err {
            newsrag_vector::Error::EmptyInput => {
                AppError::EmptyInput("no embeddings to index".to_string())
            }
            other => AppError::Embedding(other.to_string()),
        }
    }
}

impl From<libsql::Error> for AppError {
    fn from(err: libsql::Error) -> Self {
        AppError::Store(err.to_string())
    }
}

impl From<crate::utils::toml_config::ConfigError> for AppError {
    fn from(err: crate::utils::toml_config::ConfigError) -> Self {
        AppError::Configuration(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
