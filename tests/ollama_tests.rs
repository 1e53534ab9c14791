//! Ollama adapters against a mocked Ollama server.

#![cfg(feature = "ollama")]

use newsrag::llm::ollama::OllamaGenerator;
use newsrag::llm::Generator;
use newsrag::rag::embeddings::{Embedder, OllamaEmbedder};
use newsrag::types::{AppError, GenerationParams};
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ============= Helper Functions =============

fn mock_generate_response(text: &str) -> serde_json::Value {
    json!({
        "model": "zephyr",
        "created_at": "2024-01-01T00:00:00Z",
        "response": text,
        "done": true,
        "context": [1, 2, 3],
        "total_duration": 1000,
        "load_duration": 100,
        "prompt_eval_count": 10,
        "prompt_eval_duration": 100,
        "eval_count": 5,
        "eval_duration": 100
    })
}

// ============= Generator =============

#[tokio::test]
async fn test_generator_passes_sampling_options() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(body_partial_json(json!({
            "model": "zephyr",
            "prompt": "Question: gas?",
            "options": { "num_predict": 128 }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(mock_generate_response("Fees fell.")))
        .expect(1)
        .mount(&server)
        .await;

    let generator = OllamaGenerator::new(&server.uri(), "zephyr");
    let params = GenerationParams {
        max_tokens: 128,
        temperature: 0.0,
        top_p: 1.0,
    };

    let text = generator.generate("Question: gas?", &params).await.unwrap();

    assert_eq!(text, "Fees fell.");
    assert_eq!(generator.model_name(), "zephyr");
}

#[tokio::test]
async fn test_generator_server_error_is_generation_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(500).set_body_string("model not loaded"))
        .mount(&server)
        .await;

    let generator = OllamaGenerator::new(&server.uri(), "zephyr");
    let err = generator
        .generate("anything", &GenerationParams::default())
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Generation(_)));
}

// ============= Embedder =============

#[tokio::test]
async fn test_embedder_returns_one_vector_per_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "all-minilm",
            "embeddings": [[0.1, 0.2, 0.3], [0.4, 0.5, 0.6]]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let embedder = OllamaEmbedder::new(&server.uri(), "all-minilm");
    let vectors = embedder
        .embed(&["first".to_string(), "second".to_string()])
        .await
        .unwrap();

    assert_eq!(vectors.len(), 2);
    assert_eq!(vectors[1], vec![0.4, 0.5, 0.6]);
}

#[tokio::test]
async fn test_embedder_rejects_short_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "all-minilm",
            "embeddings": [[0.1, 0.2, 0.3]]
        })))
        .mount(&server)
        .await;

    let embedder = OllamaEmbedder::new(&server.uri(), "all-minilm");
    let err = embedder
        .embed(&["first".to_string(), "second".to_string()])
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Embedding(_)));
}

#[tokio::test]
async fn test_embedding_empty_batch_skips_server() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let embedder = OllamaEmbedder::new(&server.uri(), "all-minilm");
    assert!(embedder.embed(&[]).await.unwrap().is_empty());
}
