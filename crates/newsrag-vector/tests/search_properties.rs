//! Randomised checks of the flat index against a naive scan.

use newsrag_vector::distance::squared_euclidean;
use newsrag_vector::FlatIndex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random_vectors(rng: &mut StdRng, count: usize, dims: usize) -> Vec<Vec<f32>> {
    (0..count)
        .map(|_| (0..dims).map(|_| rng.random_range(-1.0f32..1.0)).collect())
        .collect()
}

#[test]
fn test_search_matches_naive_scan() {
    let mut rng = StdRng::seed_from_u64(42);
    let vectors = random_vectors(&mut rng, 200, 16);
    let index = FlatIndex::build(&vectors).unwrap();

    for _ in 0..20 {
        let query: Vec<f32> = (0..16).map(|_| rng.random_range(-1.0f32..1.0)).collect();
        let hits = index.search(&query, 5).unwrap();

        let mut naive: Vec<(usize, f32)> = vectors
            .iter()
            .enumerate()
            .map(|(i, v)| (i, squared_euclidean(&query, v)))
            .collect();
        naive.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));

        let expected: Vec<usize> = naive.iter().take(5).map(|(i, _)| *i).collect();
        let actual: Vec<usize> = hits.iter().map(|n| n.position).collect();
        assert_eq!(actual, expected);
    }
}

#[test]
fn test_results_sorted_and_in_range() {
    let mut rng = StdRng::seed_from_u64(7);
    for n in [1usize, 2, 3, 10, 57] {
        let vectors = random_vectors(&mut rng, n, 8);
        let index = FlatIndex::build(&vectors).unwrap();
        let query: Vec<f32> = (0..8).map(|_| rng.random_range(-1.0f32..1.0)).collect();

        for top_k in [1usize, 3, 5, 100] {
            let hits = index.search(&query, top_k).unwrap();
            assert_eq!(hits.len(), top_k.min(n));
            assert!(hits.iter().all(|h| h.position < n));
            assert!(hits.windows(2).all(|w| w[0].distance <= w[1].distance));
        }
    }
}

#[test]
fn test_stored_vector_is_its_own_nearest_neighbor() {
    let mut rng = StdRng::seed_from_u64(1234);
    let vectors = random_vectors(&mut rng, 50, 32);
    let index = FlatIndex::build(&vectors).unwrap();

    for (i, v) in vectors.iter().enumerate() {
        let hits = index.search(v, 1).unwrap();
        assert_eq!(hits[0].position, i);
        assert_eq!(hits[0].distance, 0.0);
    }
}
