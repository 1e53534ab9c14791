use super::extract::extract_content;
use super::fetch::SiteFetcher;
use crate::db::FragmentStore;
use crate::types::{AppError, Result};
use reqwest::Url;
use std::fmt;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// What happened to one source during a crawl.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SiteOutcome {
    /// The store already had fragments for this source.
    Skipped,
    /// This many fragments were stored.
    Stored(usize),
    /// The page was fetched but yielded no fragments.
    Empty,
    /// Fetching or storing failed; the message says why.
    Failed(String),
}

impl fmt::Display for SiteOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SiteOutcome::Skipped => write!(f, "skipped (already stored)"),
            SiteOutcome::Stored(n) => write!(f, "stored {} fragments", n),
            SiteOutcome::Empty => write!(f, "no fragments"),
            SiteOutcome::Failed(reason) => write!(f, "failed: {}", reason),
        }
    }
}

/// Fetches sources and records their fragments, once per source.
pub struct Crawler {
    fetcher: SiteFetcher,
    store: Arc<dyn FragmentStore>,
    min_fragment_chars: usize,
}

impl Crawler {
    pub fn new(fetcher: SiteFetcher, store: Arc<dyn FragmentStore>, min_fragment_chars: usize) -> Self {
        Self {
            fetcher,
            store,
            min_fragment_chars,
        }
    }

    /// Fetch `url` unless it is already stored, and store its fragments.
    ///
    /// Fetch failures only fail this source and come back as
    /// [`SiteOutcome::Failed`]. Errors from the store itself are returned.
    #[instrument(skip(self))]
    pub async fn process_site(&self, url: &str) -> Result<SiteOutcome> {
        if self.store.has_fragments(url).await? {
            info!("Skipping already processed source");
            return Ok(SiteOutcome::Skipped);
        }

        let base_url = Url::parse(url)
            .map_err(|e| AppError::Configuration(format!("Invalid source URL {}: {}", url, e)))?;

        let html = match self.fetcher.fetch(url).await {
            Ok(html) => html,
            Err(e) => {
                warn!(error = %e, "Fetch failed");
                return Ok(SiteOutcome::Failed(e.to_string()));
            }
        };

        let page = extract_content(&html, &base_url, self.min_fragment_chars);
        if page.fragments.is_empty() {
            warn!(links = page.links.len(), "No fragments extracted");
            return Ok(SiteOutcome::Empty);
        }

        if !self.store.put_fragments(url, &page.fragments).await? {
            return Ok(SiteOutcome::Skipped);
        }
        info!(
            fragments = page.fragments.len(),
            links = page.links.len(),
            "Stored fragments"
        );
        Ok(SiteOutcome::Stored(page.fragments.len()))
    }

    /// Process every source in order. A source whose URL does not parse or
    /// whose store write fails is reported as failed; the rest still run.
    pub async fn process_all(&self, sources: &[String]) -> Vec<(String, SiteOutcome)> {
        let mut outcomes = Vec::with_capacity(sources.len());
        for url in sources {
            let outcome = match self.process_site(url).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!(url = %url, error = %e, "Source failed");
                    SiteOutcome::Failed(e.to_string())
                }
            };
            outcomes.push((url.clone(), outcome));
        }
        outcomes
    }
}
