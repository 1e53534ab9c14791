use anyhow::{bail, Context};
use newsrag::cli::init::{self, InitResult};
use newsrag::cli::output::Output;
use newsrag::cli::{Cli, Commands};
use newsrag::crawl::{Crawler, SiteFetcher, SiteOutcome};
use newsrag::db::{FragmentStore, LibsqlFragmentStore};
use newsrag::rag::normalize::{IdentityNormalizer, StopwordNormalizer, TextNormalizer};
use newsrag::rag::pipeline::RagPipeline;
use newsrag::rag::tokenizer::TiktokenTokenizer;
use newsrag::NewsragConfig;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse_args();
    let output = if cli.no_color {
        Output::no_color()
    } else {
        Output::new()
    };

    match cli.command {
        Commands::Init { path, force } => {
            init_tracing("info", cli.verbose);
            match init::run(&path, force, &output) {
                InitResult::Success | InitResult::AlreadyExists => Ok(()),
                InitResult::Error(e) => bail!(e),
            }
        }
        Commands::Config { validate } => show_config(&cli.config, validate, cli.verbose, &output),
        Commands::Crawl => {
            let config = load_config(&cli.config, cli.verbose)?;
            crawl(&config, &output).await
        }
        Commands::Ask {
            question,
            top_k,
            show_context,
        } => {
            let config = load_config(&cli.config, cli.verbose)?;
            let top_k = top_k.unwrap_or(config.rag.top_k);
            ask(&config, &question, top_k, show_context, &output).await
        }
    }
}

/// `--verbose` forces debug; otherwise `RUST_LOG` wins over the configured level.
fn init_tracing(log_level: &str, verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_config(path: &Path, verbose: bool) -> anyhow::Result<NewsragConfig> {
    let config = NewsragConfig::load_or_default(path)
        .with_context(|| format!("Failed to load {}", path.display()))?;
    init_tracing(&config.log_level, verbose);
    if !path.exists() {
        info!(path = %path.display(), "No configuration file, using defaults");
    }
    Ok(config)
}

fn show_config(path: &Path, validate: bool, verbose: bool, output: &Output) -> anyhow::Result<()> {
    let config = if validate {
        let config = NewsragConfig::load(path)
            .with_context(|| format!("Invalid configuration {}", path.display()))?;
        init_tracing(&config.log_level, verbose);
        output.success(&format!("{} is valid", path.display()));
        config
    } else {
        load_config(path, verbose)?
    };

    output.header("Effective configuration");
    output.kv("embedder", config.embedder_provider().name());
    output.kv("generator", config.generator_provider().name());
    output.kv("store", &config.store.url);
    output.kv("sources", &config.crawler.sources.len().to_string());
    println!("\n{}", config.to_toml_string()?);
    Ok(())
}

async fn open_store(config: &NewsragConfig) -> anyhow::Result<Arc<dyn FragmentStore>> {
    let store = LibsqlFragmentStore::open(&config.store.url)
        .await
        .with_context(|| format!("Failed to open store {}", config.store.url))?;
    Ok(Arc::new(store))
}

async fn crawl(config: &NewsragConfig, output: &Output) -> anyhow::Result<()> {
    output.header("Crawling sources");

    let fetcher = SiteFetcher::new(
        Duration::from_secs(config.crawler.timeout_secs),
        &config.crawler.user_agent,
    )?;
    let crawler = Crawler::new(fetcher, open_store(config).await?, config.nlp.min_fragment_chars);

    let mut stored = 0;
    for (url, outcome) in crawler.process_all(&config.crawler.sources).await {
        match &outcome {
            SiteOutcome::Stored(n) => {
                stored += n;
                output.success(&format!("{}: {}", url, outcome));
            }
            SiteOutcome::Skipped => output.skipped(&url, "already stored"),
            SiteOutcome::Empty => output.warning(&format!("{}: {}", url, outcome)),
            SiteOutcome::Failed(_) => output.error(&format!("{}: {}", url, outcome)),
        }
    }

    output.info(&format!("{} new fragments stored", stored));
    Ok(())
}

async fn ask(
    config: &NewsragConfig,
    question: &str,
    top_k: usize,
    show_context: bool,
    output: &Output,
) -> anyhow::Result<()> {
    output.step(1, 3, "Loading fragments");
    let fragments = open_store(config).await?.all_fragments().await?;
    if fragments.is_empty() {
        bail!("No fragments stored yet. Run `newsrag crawl` first.");
    }

    let tokenizer = Arc::new(TiktokenTokenizer::new(&config.nlp.tokenizer)?);
    let embedder = config.embedder_provider().create_embedder()?;
    let generator = config.generator_provider().create_generator()?;
    let normalizer: Arc<dyn TextNormalizer> = if config.nlp.normalize {
        Arc::new(StopwordNormalizer::new())
    } else {
        Arc::new(IdentityNormalizer)
    };

    let pipeline = RagPipeline::new(tokenizer, embedder, generator, config.rag_settings())?
        .with_normalizer(normalizer);

    output.step(2, 3, &format!("Indexing {} fragments", fragments.len()));
    let documents = pipeline.build_from_fragments(&fragments).await?;
    info!(documents, "Index ready");

    output.step(3, 3, "Generating answer");
    let answer = pipeline.answer(question, top_k).await?;

    output.answer(&answer.answer);
    if show_context {
        output.header("Retrieved context");
        for (rank, retrieved) in answer.context.iter().enumerate() {
            output.context_entry(rank + 1, retrieved.distance, &retrieved.document.content);
        }
        output.kv("prompt tokens", &answer.prompt_tokens.to_string());
    }
    Ok(())
}
