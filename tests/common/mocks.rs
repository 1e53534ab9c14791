//! Mock implementations for testing.
//!
//! Deterministic stand-ins for the embedding and generation backends so the
//! pipeline can be exercised without model files or a running server.

use async_trait::async_trait;
use newsrag::llm::Generator;
use newsrag::rag::embeddings::Embedder;
use newsrag::types::{AppError, GenerationParams, Result};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

pub const MOCK_DIMENSIONS: usize = 384;

/// Bag-of-words embedder.
///
/// Every lowercase alphanumeric word is hashed (FNV-1a) into one of
/// [`MOCK_DIMENSIONS`] buckets and the counts are L2-normalized, so texts
/// sharing words end up close together.
///
/// # Examples
///
/// ```ignore
/// let embedder = MockEmbedder::new();
/// let failing = MockEmbedder::failing_on("poison");
/// ```
#[derive(Default)]
pub struct MockEmbedder {
    calls: AtomicUsize,
    fail_marker: Option<String>,
    drop_last: bool,
}

impl MockEmbedder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail any batch containing a text that contains `marker`.
    pub fn failing_on(marker: &str) -> Self {
        Self {
            fail_marker: Some(marker.to_string()),
            ..Self::default()
        }
    }

    /// Return one vector fewer than requested.
    pub fn misaligned() -> Self {
        Self {
            drop_last: true,
            ..Self::default()
        }
    }

    /// Number of `embed` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn vector(text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; MOCK_DIMENSIONS];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let bucket = fnv1a(&word.to_lowercase()) as usize % MOCK_DIMENSIONS;
            vector[bucket] += 1.0;
        }
        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|v| *v /= norm);
        }
        vector
    }
}

fn fnv1a(word: &str) -> u64 {
    word.bytes().fold(0xcbf29ce484222325, |hash, byte| {
        (hash ^ byte as u64).wrapping_mul(0x100000001b3)
    })
}

#[async_trait]
impl Embedder for MockEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(marker) = &self.fail_marker {
            if texts.iter().any(|t| t.contains(marker.as_str())) {
                return Err(AppError::Embedding("Mock embedding failure".to_string()));
            }
        }

        let mut vectors: Vec<Vec<f32>> = texts.iter().map(|t| Self::vector(t)).collect();
        if self.drop_last {
            vectors.pop();
        }
        Ok(vectors)
    }

    fn model_name(&self) -> &str {
        "mock-bag-of-words"
    }
}

enum Reply {
    Fixed(String),
    Echo,
    Fail,
}

/// Generator that records every prompt it receives.
pub struct MockGenerator {
    reply: Reply,
    prompts: Mutex<Vec<String>>,
    params: Mutex<Vec<GenerationParams>>,
}

impl MockGenerator {
    fn with_reply(reply: Reply) -> Self {
        Self {
            reply,
            prompts: Mutex::new(Vec::new()),
            params: Mutex::new(Vec::new()),
        }
    }

    /// Always answer `response`.
    pub fn new(response: &str) -> Self {
        Self::with_reply(Reply::Fixed(response.to_string()))
    }

    /// Answer with the prompt itself.
    pub fn echo() -> Self {
        Self::with_reply(Reply::Echo)
    }

    /// Always fail with `AppError::Generation`.
    pub fn failing() -> Self {
        Self::with_reply(Reply::Fail)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().last().cloned()
    }

    pub fn last_params(&self) -> Option<GenerationParams> {
        self.params.lock().last().copied()
    }
}

#[async_trait]
impl Generator for MockGenerator {
    async fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<String> {
        self.prompts.lock().push(prompt.to_string());
        self.params.lock().push(*params);

        match &self.reply {
            Reply::Fixed(response) => Ok(response.clone()),
            Reply::Echo => Ok(prompt.to_string()),
            Reply::Fail => Err(AppError::Generation("Mock generation failure".to_string())),
        }
    }

    fn model_name(&self) -> &str {
        "mock-generator"
    }
}
