//! Content acquisition.
//!
//! Fetches each configured news source, extracts its text fragments and
//! records them in a [`FragmentStore`](crate::db::FragmentStore). A source
//! that already has fragments is never fetched again.

pub mod extract;
pub mod fetch;
pub mod site;

pub use extract::{extract_content, is_valid_link, ExtractedLink, ExtractedPage};
pub use fetch::{SiteFetcher, DEFAULT_USER_AGENT};
pub use site::{Crawler, SiteOutcome};
