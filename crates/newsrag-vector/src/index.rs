//! Exact (brute-force) L2 index.
//!
//! Every query scans all stored vectors. For the collection sizes a single
//! crawl produces this is fast enough and, unlike an approximate graph
//! index, returns the true nearest neighbors.

use crate::distance::squared_euclidean;
use crate::error::{Error, Result};
use crate::types::Neighbor;
use std::cmp::Ordering;
use tracing::{debug, trace};

/// Immutable exact nearest-neighbor index over a set of embeddings.
///
/// The index owns a copy of the vectors, stored contiguously in row-major
/// order. It has no interior mutability: once built it can be shared
/// across threads (e.g. behind an `Arc`) and queried concurrently.
/// Rebuilding means constructing a new `FlatIndex`.
#[derive(Debug, Clone)]
pub struct FlatIndex {
    data: Vec<f32>,
    dimensions: usize,
    len: usize,
}

impl FlatIndex {
    /// Build an index from a non-empty set of equal-length vectors.
    ///
    /// # Errors
    ///
    /// - [`Error::EmptyInput`] if `embeddings` is empty.
    /// - [`Error::InvalidVector`] if the first vector is zero-length or any
    ///   vector contains a non-finite value.
    /// - [`Error::DimensionMismatch`] if vectors differ in length.
    pub fn build<V: AsRef<[f32]>>(embeddings: &[V]) -> Result<Self> {
        let first = embeddings.first().ok_or(Error::EmptyInput)?;
        let dimensions = first.as_ref().len();
        if dimensions == 0 {
            return Err(Error::InvalidVector("Dimensions must be > 0".to_string()));
        }

        let mut data = Vec::with_capacity(dimensions * embeddings.len());
        for (position, vector) in embeddings.iter().enumerate() {
            let vector = vector.as_ref();
            if vector.len() != dimensions {
                return Err(Error::DimensionMismatch {
                    position,
                    expected: dimensions,
                    actual: vector.len(),
                });
            }
            if vector.iter().any(|v| !v.is_finite()) {
                return Err(Error::InvalidVector(format!(
                    "vector at position {} contains a non-finite value",
                    position
                )));
            }
            data.extend_from_slice(vector);
        }

        debug!(len = embeddings.len(), dimensions, "Built flat index");

        Ok(Self {
            data,
            dimensions,
            len: embeddings.len(),
        })
    }

    /// Number of indexed vectors.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Always false: an index cannot be built empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Vector dimensionality.
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Get the stored vector at `position`.
    pub fn vector(&self, position: usize) -> Option<&[f32]> {
        if position >= self.len {
            return None;
        }
        let start = position * self.dimensions;
        Some(&self.data[start..start + self.dimensions])
    }

    /// Find the `top_k` nearest stored vectors to `query`.
    ///
    /// `top_k` is clamped to `[1, len]`, so the result always holds
    /// `min(max(top_k, 1), len)` neighbors. Results are sorted by ascending
    /// squared L2 distance; equal distances are ordered by ascending
    /// position.
    ///
    /// # Errors
    ///
    /// Returns an error if the query has the wrong dimensionality or
    /// contains a non-finite value.
    pub fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<Neighbor>> {
        if query.len() != self.dimensions {
            return Err(Error::DimensionMismatch {
                position: 0,
                expected: self.dimensions,
                actual: query.len(),
            });
        }
        if query.iter().any(|v| !v.is_finite()) {
            return Err(Error::InvalidVector(
                "query contains a non-finite value".to_string(),
            ));
        }

        let k = top_k.clamp(1, self.len);

        let mut scored: Vec<Neighbor> = self
            .data
            .chunks_exact(self.dimensions)
            .enumerate()
            .map(|(position, vector)| Neighbor::new(position, squared_euclidean(query, vector)))
            .collect();

        if k < scored.len() {
            scored.select_nth_unstable_by(k - 1, compare_neighbors);
            scored.truncate(k);
        }
        scored.sort_by(compare_neighbors);

        trace!(k, best = ?scored.first(), "Flat index search");
        Ok(scored)
    }
}

fn compare_neighbors(a: &Neighbor, b: &Neighbor) -> Ordering {
    a.distance
        .total_cmp(&b.distance)
        .then_with(|| a.position.cmp(&b.position))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> FlatIndex {
        FlatIndex::build(&[
            vec![0.0, 0.0],
            vec![1.0, 0.0],
            vec![0.0, 2.0],
            vec![3.0, 3.0],
        ])
        .unwrap()
    }

    #[test]
    fn test_build_rejects_empty() {
        let empty: Vec<Vec<f32>> = vec![];
        assert_eq!(FlatIndex::build(&empty).unwrap_err(), Error::EmptyInput);
    }

    #[test]
    fn test_build_rejects_ragged_vectors() {
        let err = FlatIndex::build(&[vec![1.0, 2.0], vec![1.0]]).unwrap_err();
        assert_eq!(
            err,
            Error::DimensionMismatch {
                position: 1,
                expected: 2,
                actual: 1
            }
        );
    }

    #[test]
    fn test_build_rejects_nan() {
        let err = FlatIndex::build(&[vec![1.0, f32::NAN]]).unwrap_err();
        assert!(matches!(err, Error::InvalidVector(_)));
    }

    #[test]
    fn test_search_orders_by_distance() {
        let index = sample();
        let hits = index.search(&[0.9, 0.1], 4).unwrap();
        let positions: Vec<usize> = hits.iter().map(|n| n.position).collect();
        assert_eq!(positions, vec![1, 0, 2, 3]);
        assert!((hits[0].distance - 0.02).abs() < 1e-5);
    }

    #[test]
    fn test_search_clamps_top_k() {
        let index = sample();
        assert_eq!(index.search(&[0.0, 0.0], 0).unwrap().len(), 1);
        assert_eq!(index.search(&[0.0, 0.0], 100).unwrap().len(), 4);
    }

    #[test]
    fn test_ties_broken_by_position() {
        let index = FlatIndex::build(&[vec![1.0], vec![-1.0], vec![1.0]]).unwrap();
        let hits = index.search(&[0.0], 3).unwrap();
        let positions: Vec<usize> = hits.iter().map(|n| n.position).collect();
        assert_eq!(positions, vec![0, 1, 2]);

        let hits = index.search(&[0.0], 2).unwrap();
        let positions: Vec<usize> = hits.iter().map(|n| n.position).collect();
        assert_eq!(positions, vec![0, 1]);
    }

    #[test]
    fn test_query_dimension_mismatch() {
        let index = sample();
        assert!(matches!(
            index.search(&[1.0, 2.0, 3.0], 1),
            Err(Error::DimensionMismatch { expected: 2, actual: 3, .. })
        ));
    }

    #[test]
    fn test_vector_lookup() {
        let index = sample();
        assert_eq!(index.vector(2), Some(&[0.0, 2.0][..]));
        assert_eq!(index.vector(4), None);
        assert_eq!(index.dimensions(), 2);
        assert_eq!(index.len(), 4);
        assert!(!index.is_empty());
    }
}
