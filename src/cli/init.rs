//! Init command implementation
//!
//! Writes a commented `newsrag.toml`, a `.env.example` and the data
//! directory the fragment store lives in.

use super::output::Output;
use crate::utils::toml_config::DEFAULT_CONFIG_FILE;
use std::fs;
use std::path::{Path, PathBuf};

/// Result of the init operation
#[derive(Debug, PartialEq, Eq)]
pub enum InitResult {
    /// Initialization completed successfully
    Success,
    /// A configuration file already exists and `--force` was not given
    AlreadyExists,
    /// An error occurred during initialization
    Error(String),
}

/// Run the init command
pub fn run(path: &Path, force: bool, output: &Output) -> InitResult {
    output.header("Initializing newsrag");

    let config_path = path.join(DEFAULT_CONFIG_FILE);
    if config_path.exists() && !force {
        output.warning(&format!("{} already exists!", DEFAULT_CONFIG_FILE));
        output.hint("Use --force to overwrite existing files");
        return InitResult::AlreadyExists;
    }

    let data_dir: PathBuf = path.join("data");
    if !data_dir.exists() {
        if let Err(e) = fs::create_dir_all(&data_dir) {
            output.error(&format!("Failed to create data/: {}", e));
            return InitResult::Error(e.to_string());
        }
        output.created("directory", "data");
    } else {
        output.skipped("data", "already exists");
    }

    let files = [
        (DEFAULT_CONFIG_FILE, generate_newsrag_toml(), true),
        (".env.example", generate_env_example(), force),
    ];
    for (name, content, overwrite) in files {
        let file_path = path.join(name);
        if file_path.exists() && !overwrite {
            output.skipped(name, "already exists");
            continue;
        }
        if let Err(e) = fs::write(&file_path, content) {
            output.error(&format!("Failed to create {}: {}", name, e));
            return InitResult::Error(e.to_string());
        }
        output.created("file", name);
    }

    output.success("newsrag initialized");
    output.hint("Next: `newsrag crawl`, then `newsrag ask \"your question\"`");
    InitResult::Success
}

fn generate_newsrag_toml() -> String {
    format!(
        r#"# newsrag configuration
# Every value below is the default; delete what you do not change.

log_level = "info"

[nlp]
tokenizer = "cl100k_base"
chunk_size = 512
overlap = 64
# Remove stopwords before chunking
normalize = true
# Fragments this short or shorter are discarded at extraction
min_fragment_chars = 100

[rag]
context_length = 4096
# Ceiling for the prompt and for the generated text
max_tokens = 3500
temperature = 0.7
top_p = 0.9
top_k = 3
# threads = 8  # defaults to max(cpus / 2, 4)

[models.embedder]
{embedder}
[models.generator]
{generator}
[store]
url = "./data/newsrag.db"

[crawler]
sources = [
    "https://www.coindesk.com",
    "https://cointelegraph.com",
    "https://www.newsbtc.com",
    "https://cryptoslate.com",
]
timeout_secs = 10
"#,
        embedder = embedder_section(),
        generator = generator_section(),
    )
}

/// The embedder this build can run, with the alternative commented out.
fn embedder_section() -> &'static str {
    if cfg!(feature = "local-embeddings") {
        r#"type = "fastembed"
model = "sentence-transformers/all-MiniLM-L6-v2"
# type = "ollama"
# base_url = "http://localhost:11434"
# model = "all-minilm"
"#
    } else {
        r#"type = "ollama"
base_url = "http://localhost:11434"
model = "all-minilm"
# Needs the `local-embeddings` feature:
# type = "fastembed"
# model = "sentence-transformers/all-MiniLM-L6-v2"
"#
    }
}

fn generator_section() -> &'static str {
    if cfg!(feature = "llamacpp") {
        r#"type = "llamacpp"
model_path = "~/models/zephyr-7b-alpha.Q4_K_M.gguf"
# type = "ollama"
# base_url = "http://localhost:11434"
# model = "zephyr"
"#
    } else {
        r#"type = "ollama"
base_url = "http://localhost:11434"
model = "zephyr"
# Needs the `llamacpp` feature:
# type = "llamacpp"
# model_path = "~/models/zephyr-7b-alpha.Q4_K_M.gguf"
"#
    }
}

fn generate_env_example() -> String {
    r#"# newsrag environment overrides
# Copy this file to .env and uncomment what you need.

# Logging filter (overrides log_level)
# RUST_LOG=info,newsrag=debug

# NEWSRAG_STORE_URL=./data/newsrag.db
# NEWSRAG_GENERATOR_MODEL=~/models/zephyr-7b-alpha.Q4_K_M.gguf
# NEWSRAG_EMBEDDER_MODEL=sentence-transformers/all-MiniLM-L6-v2
"#
    .to_string()
}
