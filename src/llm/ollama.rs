use crate::llm::client::Generator;
use crate::types::{AppError, GenerationParams, Result};
use async_trait::async_trait;
use ollama_rs::generation::completion::request::GenerationRequest;
use ollama_rs::models::ModelOptions;
use ollama_rs::Ollama;

const DEFAULT_OLLAMA_PORT: u16 = 11434;

/// Split an Ollama base URL into the `scheme://host` and port pair the
/// client constructor expects.
pub(crate) fn split_base_url(base_url: &str) -> (String, u16) {
    let (scheme, rest) = base_url.split_once("://").unwrap_or(("http", base_url));
    let rest = rest.trim_end_matches('/');
    let (host, port) = match rest.rsplit_once(':') {
        Some((host, port)) => (host, port.parse().unwrap_or(DEFAULT_OLLAMA_PORT)),
        None => (rest, DEFAULT_OLLAMA_PORT),
    };
    let host = if host.is_empty() { "localhost" } else { host };
    (format!("{}://{}", scheme, host), port)
}

/// Build an Ollama client from a base URL such as `http://localhost:11434`.
pub fn connect(base_url: &str) -> Ollama {
    let (host, port) = split_base_url(base_url);
    Ollama::new(host, port)
}

/// Completions from an Ollama server.
pub struct OllamaGenerator {
    client: Ollama,
    model: String,
}

impl OllamaGenerator {
    pub fn new(base_url: &str, model: &str) -> Self {
        Self {
            client: connect(base_url),
            model: model.to_string(),
        }
    }
}

#[async_trait]
impl Generator for OllamaGenerator {
    async fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<String> {
        let options = ModelOptions::default()
            .temperature(params.temperature)
            .top_p(params.top_p)
            .num_predict(params.max_tokens.min(i32::MAX as usize) as i32);

        let request = GenerationRequest::new(self.model.clone(), prompt.to_string()).options(options);

        let response = self
            .client
            .generate(request)
            .await
            .map_err(|e| AppError::Generation(format!("Ollama error: {}", e)))?;

        Ok(response.response)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
