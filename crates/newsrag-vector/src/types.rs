//! Common types for newsrag-vector.

/// One search hit: the position of a stored vector and its distance to the query.
///
/// Positions are the order in which vectors were handed to
/// [`FlatIndex::build`](crate::FlatIndex::build), so callers can map them
/// back onto their own document collection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    /// Position of the vector in the build input.
    pub position: usize,
    /// Squared Euclidean distance to the query (lower is closer).
    pub distance: f32,
}

impl Neighbor {
    /// Create a new neighbor.
    pub fn new(position: usize, distance: f32) -> Self {
        Self { position, distance }
    }
}
