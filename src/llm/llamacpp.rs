use crate::llm::client::Generator;
use crate::types::{AppError, GenerationParams, Result};
use async_trait::async_trait;
use llama_cpp_2::context::params::LlamaContextParams;
use llama_cpp_2::llama_backend::LlamaBackend;
use llama_cpp_2::llama_batch::LlamaBatch;
use llama_cpp_2::model::params::LlamaModelParams;
use llama_cpp_2::model::{AddBos, LlamaModel, Special};
use llama_cpp_2::sampling::LlamaSampler;
use std::num::NonZeroU32;
use std::sync::Arc;
use tracing::{debug, info};

/// In-process GGUF inference through llama.cpp.
///
/// The model weights are loaded once; every call gets a fresh context, so a
/// failed or overflowing generation leaves nothing behind.
pub struct LlamaCppGenerator {
    backend: Arc<LlamaBackend>,
    model: Arc<LlamaModel>,
    model_path: String,
    context_length: u32,
    threads: i32,
}

fn generation_error<E: std::fmt::Display>(stage: &'static str) -> impl Fn(E) -> AppError {
    move |e| AppError::Generation(format!("llama.cpp {} failed: {}", stage, e))
}

impl LlamaCppGenerator {
    pub fn new(model_path: &str, context_length: u32, threads: u32) -> Result<Self> {
        let backend = LlamaBackend::init().map_err(generation_error("backend init"))?;

        info!(model_path, context_length, threads, "Loading GGUF model");
        let model = LlamaModel::load_from_file(&backend, model_path, &LlamaModelParams::default())
            .map_err(generation_error("model load"))?;

        Ok(Self {
            backend: Arc::new(backend),
            model: Arc::new(model),
            model_path: model_path.to_string(),
            context_length,
            threads: threads.max(1) as i32,
        })
    }
}

#[async_trait]
impl Generator for LlamaCppGenerator {
    async fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<String> {
        let backend = self.backend.clone();
        let model = self.model.clone();
        let prompt = prompt.to_string();
        let params = *params;
        let context_length = self.context_length;
        let threads = self.threads;

        tokio::task::spawn_blocking(move || {
            complete(&backend, &model, &prompt, &params, context_length, threads)
        })
        .await
        .map_err(|e| AppError::Generation(format!("generation task failed: {}", e)))?
    }

    fn model_name(&self) -> &str {
        &self.model_path
    }
}

fn complete(
    backend: &LlamaBackend,
    model: &LlamaModel,
    prompt: &str,
    params: &GenerationParams,
    context_length: u32,
    threads: i32,
) -> Result<String> {
    let ctx_params = LlamaContextParams::default()
        .with_n_ctx(NonZeroU32::new(context_length))
        .with_n_threads(threads)
        .with_n_threads_batch(threads);
    let mut ctx = model
        .new_context(backend, ctx_params)
        .map_err(generation_error("context creation"))?;

    let tokens = model
        .str_to_token(prompt, AddBos::Always)
        .map_err(generation_error("tokenization"))?;

    let n_ctx = context_length as usize;
    if tokens.len() >= n_ctx {
        return Err(AppError::Generation(format!(
            "prompt has {} tokens but the context holds only {}",
            tokens.len(),
            n_ctx
        )));
    }
    let budget = params.max_tokens.min(n_ctx - tokens.len());
    debug!(prompt_tokens = tokens.len(), budget, "Starting llama.cpp completion");

    let mut batch = LlamaBatch::new(tokens.len(), 1);
    let last = tokens.len() as i32 - 1;
    for (i, token) in (0_i32..).zip(tokens.into_iter()) {
        batch
            .add(token, i, &[0], i == last)
            .map_err(generation_error("batch"))?;
    }
    ctx.decode(&mut batch).map_err(generation_error("prompt decode"))?;

    let mut sampler = if params.is_greedy() {
        LlamaSampler::greedy()
    } else {
        LlamaSampler::chain_simple([
            LlamaSampler::top_p(params.top_p, 1),
            LlamaSampler::temp(params.temperature),
            LlamaSampler::dist(chrono::Utc::now().timestamp_subsec_nanos()),
        ])
    };

    let mut output = String::new();
    let mut n_cur = batch.n_tokens();
    for _ in 0..budget {
        let token = sampler.sample(&ctx, batch.n_tokens() - 1);
        sampler.accept(token);

        if model.is_eog_token(token) {
            break;
        }

        let piece = model
            .token_to_str(token, Special::Tokenize)
            .map_err(generation_error("detokenization"))?;
        output.push_str(&piece);

        batch.clear();
        batch
            .add(token, n_cur, &[0], true)
            .map_err(generation_error("batch"))?;
        n_cur += 1;
        ctx.decode(&mut batch).map_err(generation_error("decode"))?;
    }

    Ok(output)
}
