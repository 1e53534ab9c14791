//! # newsrag-vector
//!
//! An exact nearest-neighbor index over dense embeddings, ranked by squared
//! Euclidean (L2) distance.
//!
//! ## Quick Start
//!
//! ```rust
//! use newsrag_vector::FlatIndex;
//!
//! let embeddings = vec![vec![0.0f32, 1.0], vec![1.0, 0.0]];
//! let index = FlatIndex::build(&embeddings)?;
//!
//! let hits = index.search(&[0.9, 0.1], 1)?;
//! assert_eq!(hits[0].position, 1);
//! # Ok::<(), newsrag_vector::Error>(())
//! ```
//!
//! ## Guarantees
//!
//! - An index is never empty; building from zero vectors fails.
//! - `search(q, k)` returns `min(max(k, 1), len)` hits sorted by
//!   non-decreasing distance, ties ordered by position.
//! - The index is immutable after construction and safe to share across
//!   threads.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod distance;
pub mod error;
pub mod index;
pub mod types;

// Re-exports for convenience
pub use error::{Error, Result};
pub use index::FlatIndex;
pub use types::Neighbor;
