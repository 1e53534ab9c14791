//! Fragment store abstraction
//!
//! The crawler records the text fragments it extracts per source; the
//! pipeline reads them back to build its index. Sources that already have
//! fragments are never fetched again.
//!
//! # Example
//!
//! ```rust,ignore
//! use newsrag::db::{FragmentStore, LibsqlFragmentStore};
//!
//! let store = LibsqlFragmentStore::open("./data/newsrag.db").await?;
//! if !store.has_fragments("https://www.coindesk.com/").await? {
//!     store.put_fragments("https://www.coindesk.com/", &fragments).await?;
//! }
//! ```

use crate::types::Result;
use async_trait::async_trait;

/// Append-only list store keyed by source identifier.
#[async_trait]
pub trait FragmentStore: Send + Sync {
    /// Whether `source_id` has any stored fragments.
    async fn has_fragments(&self, source_id: &str) -> Result<bool>;

    /// Fragments of `source_id` in insertion order; empty if none.
    async fn get_fragments(&self, source_id: &str) -> Result<Vec<String>>;

    /// Store `fragments` for `source_id` as one batch.
    ///
    /// Returns `false` and writes nothing if the source already has
    /// fragments or the batch is empty. Otherwise the whole batch becomes
    /// visible at once.
    async fn put_fragments(&self, source_id: &str, fragments: &[String]) -> Result<bool>;

    /// Every source with stored fragments, sorted.
    async fn sources(&self) -> Result<Vec<String>>;

    /// Fragments of every source, sources in sorted order.
    async fn all_fragments(&self) -> Result<Vec<String>> {
        let mut fragments = Vec::new();
        for source in self.sources().await? {
            fragments.extend(self.get_fragments(&source).await?);
        }
        Ok(fragments)
    }
}
