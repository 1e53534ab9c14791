//! Build and query orchestration.
//!
//! [`RagPipeline`] wires the chunker, embedder, vector index, prompt
//! budgeter and generator together. The document collection and the index
//! built over it live in one immutable [`IndexSnapshot`]; a build produces a
//! fresh snapshot and swaps it in only once every step has succeeded, so a
//! query always sees a matching pair and a failed build leaves the previous
//! one in place.

use crate::llm::client::Generator;
use crate::rag::chunker::{validate_window, TextChunker};
use crate::rag::embeddings::{ensure_aligned, Embedder};
use crate::rag::normalize::{IdentityNormalizer, TextNormalizer};
use crate::rag::prompt::{BudgetedPrompt, PromptBudgeter};
use crate::rag::tokenizer::Tokenizer;
use crate::types::{
    AppError, Document, GenerationParams, RagAnswer, Result, RetrievedContext, RetrievedDocument,
};
use arc_swap::ArcSwapOption;
use newsrag_vector::FlatIndex;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Tunables of the build and query phases.
#[derive(Debug, Clone, PartialEq)]
pub struct RagSettings {
    /// Chunk length in tokens.
    pub chunk_size: usize,
    /// Tokens shared by adjacent chunks.
    pub chunk_overlap: usize,
    /// Default number of documents retrieved per question.
    pub top_k: usize,
    /// Ceiling on the assembled prompt, in tokens.
    pub max_tokens: usize,
    pub generation: GenerationParams,
}

impl Default for RagSettings {
    fn default() -> Self {
        Self {
            chunk_size: 512,
            chunk_overlap: 64,
            top_k: 3,
            max_tokens: 3500,
            generation: GenerationParams::default(),
        }
    }
}

impl RagSettings {
    pub fn validate(&self) -> Result<()> {
        validate_window(self.chunk_size, self.chunk_overlap)?;
        if self.top_k == 0 {
            return Err(AppError::Configuration(
                "top_k must be at least 1".to_string(),
            ));
        }
        if self.max_tokens == 0 {
            return Err(AppError::Configuration(
                "max_tokens must be greater than 0".to_string(),
            ));
        }
        self.generation.validate()
    }
}

/// Documents together with the index built over their embeddings.
///
/// Position `i` in the index always refers to `documents[i]`.
#[derive(Debug)]
pub struct IndexSnapshot {
    documents: Vec<Document>,
    index: FlatIndex,
}

impl IndexSnapshot {
    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn index(&self) -> &FlatIndex {
        &self.index
    }
}

/// Retrieval-augmented question answering over an in-memory index.
pub struct RagPipeline {
    chunker: TextChunker,
    budgeter: PromptBudgeter,
    normalizer: Arc<dyn TextNormalizer>,
    embedder: Arc<dyn Embedder>,
    generator: Arc<dyn Generator>,
    settings: RagSettings,
    snapshot: ArcSwapOption<IndexSnapshot>,
}

impl RagPipeline {
    /// Create a pipeline with no index.
    ///
    /// The same tokenizer drives chunking and prompt budgeting.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Configuration` if `settings` does not validate.
    pub fn new(
        tokenizer: Arc<dyn Tokenizer>,
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn Generator>,
        settings: RagSettings,
    ) -> Result<Self> {
        settings.validate()?;
        let chunker = TextChunker::new(
            tokenizer.clone(),
            settings.chunk_size,
            settings.chunk_overlap,
        )?;

        Ok(Self {
            chunker,
            budgeter: PromptBudgeter::new(tokenizer),
            normalizer: Arc::new(IdentityNormalizer),
            embedder,
            generator,
            settings,
            snapshot: ArcSwapOption::empty(),
        })
    }

    /// Normalize fragments with `normalizer` before chunking them.
    pub fn with_normalizer(mut self, normalizer: Arc<dyn TextNormalizer>) -> Self {
        self.normalizer = normalizer;
        self
    }

    pub fn settings(&self) -> &RagSettings {
        &self.settings
    }

    /// Turn raw fragments into documents: normalize, then chunk. Fragments
    /// that normalize to nothing produce no documents.
    pub fn prepare_documents<S: AsRef<str>>(&self, fragments: &[S]) -> Vec<String> {
        let documents: Vec<String> = fragments
            .iter()
            .map(|fragment| self.normalizer.normalize(fragment.as_ref()))
            .flat_map(|text| self.chunker.chunk(&text))
            .filter(|chunk| !chunk.trim().is_empty())
            .collect();

        debug!(
            fragments = fragments.len(),
            documents = documents.len(),
            "Prepared documents"
        );
        documents
    }

    /// Replace the document collection and its index.
    ///
    /// Returns the number of indexed documents.
    ///
    /// # Errors
    ///
    /// - `AppError::EmptyInput` if `documents` is empty; the embedder is not called
    /// - `AppError::Embedding` if embedding fails or returns misaligned vectors
    ///
    /// On error the previously built index, if any, stays in service.
    #[instrument(skip(self, documents), fields(documents = documents.len()))]
    pub async fn build_index(&self, documents: Vec<String>) -> Result<usize> {
        if documents.is_empty() {
            return Err(AppError::EmptyInput(
                "cannot build an index over zero documents".to_string(),
            ));
        }

        let vectors = self.embedder.embed(&documents).await?;
        let vectors = ensure_aligned(documents.len(), vectors)?;
        let index = FlatIndex::build(&vectors)?;

        let documents: Vec<Document> = documents
            .into_iter()
            .enumerate()
            .map(|(position, content)| Document { position, content })
            .collect();
        let count = documents.len();

        self.snapshot
            .store(Some(Arc::new(IndexSnapshot { documents, index })));

        info!(
            documents = count,
            dimensions = vectors.first().map(Vec::len).unwrap_or_default(),
            model = self.embedder.model_name(),
            "Index built"
        );
        Ok(count)
    }

    /// Prepare `fragments` and index the result.
    ///
    /// # Errors
    ///
    /// As [`build_index`](Self::build_index); `AppError::EmptyInput` also
    /// when every fragment normalizes away.
    pub async fn build_from_fragments<S: AsRef<str>>(&self, fragments: &[S]) -> Result<usize> {
        let documents = self.prepare_documents(fragments);
        self.build_index(documents).await
    }

    /// Find the `top_k` documents closest to `question`, closest first.
    ///
    /// `top_k` is clamped to `[1, document_count]`.
    ///
    /// # Errors
    ///
    /// `AppError::NotReady` before the first successful build, otherwise
    /// whatever the embedder reports.
    #[instrument(skip(self))]
    pub async fn retrieve(&self, question: &str, top_k: usize) -> Result<RetrievedContext> {
        let snapshot = self.snapshot.load_full().ok_or(AppError::NotReady)?;

        let query = self.embedder.embed_one(question).await?;
        let neighbors = snapshot.index.search(&query, top_k)?;

        let context: RetrievedContext = neighbors
            .into_iter()
            .filter_map(|neighbor| {
                snapshot
                    .documents
                    .get(neighbor.position)
                    .map(|document| RetrievedDocument {
                        document: document.clone(),
                        distance: neighbor.distance,
                    })
            })
            .collect();

        debug!(
            positions = ?context.iter().map(|r| r.document.position).collect::<Vec<_>>(),
            "Retrieved context"
        );
        Ok(context)
    }

    /// Assemble the budgeted prompt for `question` over `context`.
    pub fn build_prompt(&self, question: &str, context: &RetrievedContext) -> Result<BudgetedPrompt> {
        let fragments: Vec<&str> = context
            .iter()
            .map(|retrieved| retrieved.document.content.as_str())
            .collect();
        self.budgeter
            .format_prompt(question, &fragments, self.settings.max_tokens)
    }

    /// Answer `question` and report what the answer was grounded on.
    ///
    /// # Errors
    ///
    /// `AppError::NotReady` before the first build, then the error of
    /// whichever stage fails (`Embedding`, `BudgetExceeded`, `Generation`).
    /// A failure never touches the index.
    #[instrument(skip(self))]
    pub async fn answer(&self, question: &str, top_k: usize) -> Result<RagAnswer> {
        let context = self.retrieve(question, top_k).await?;
        let prompt = self.build_prompt(question, &context)?;

        debug!(
            prompt_tokens = prompt.tokens,
            fragments_used = prompt.fragments_used,
            truncated = prompt.truncated,
            "Prompt assembled"
        );

        let answer = self
            .generator
            .generate(&prompt.text, &self.settings.generation)
            .await?;

        Ok(RagAnswer {
            answer,
            prompt_tokens: prompt.tokens,
            context,
        })
    }

    /// Answer `question` with the generated text only.
    pub async fn query(&self, question: &str, top_k: usize) -> Result<String> {
        Ok(self.answer(question, top_k).await?.answer)
    }

    /// Number of documents in the current index, 0 before the first build.
    pub fn document_count(&self) -> usize {
        self.snapshot
            .load()
            .as_ref()
            .map(|snapshot| snapshot.documents.len())
            .unwrap_or(0)
    }

    pub fn is_ready(&self) -> bool {
        self.snapshot.load().is_some()
    }

    /// The current snapshot, if an index has been built.
    pub fn snapshot(&self) -> Option<Arc<IndexSnapshot>> {
        self.snapshot.load_full()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_validate() {
        assert!(RagSettings::default().validate().is_ok());
    }

    #[test]
    fn test_settings_reject_bad_window() {
        let settings = RagSettings {
            chunk_size: 64,
            chunk_overlap: 64,
            ..Default::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(AppError::Configuration(_))
        ));
    }

    #[test]
    fn test_settings_reject_zero_top_k() {
        let settings = RagSettings {
            top_k: 0,
            ..Default::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(AppError::Configuration(_))
        ));
    }

    #[test]
    fn test_settings_reject_bad_sampling() {
        let settings = RagSettings {
            generation: GenerationParams {
                top_p: 0.0,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }
}
