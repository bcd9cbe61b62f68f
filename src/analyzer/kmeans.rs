//! Seeded K-Means over TF-IDF vectors.
//!
//! Lloyd's algorithm with deterministic initialization: all randomness
//! comes from the caller's seed, assignment ties keep the lowest
//! centroid index, and an emptied cluster is re-seeded from the same
//! generator. Equal (data, k, seed) always yields equal assignments.

use rand::{Rng, SeedableRng, rngs::StdRng, seq::index::sample};

pub(crate) struct KMeans {
    pub(crate) centroids: Vec<Vec<f32>>,
    pub(crate) assignments: Vec<usize>,
}

impl KMeans {
    pub(crate) fn with_seed(data: &[Vec<f32>], k: usize, max_iterations: usize, seed: u64) -> Self {
        if data.is_empty() || k == 0 {
            return Self {
                centroids: vec![],
                assignments: vec![],
            };
        }

        let k = k.min(data.len());
        let dim = data[0].len();
        let mut rng = StdRng::seed_from_u64(seed);

        let mut centroids: Vec<Vec<f32>> = sample(&mut rng, data.len(), k)
            .into_iter()
            .map(|i| data[i].clone())
            .collect();

        let mut assignments = vec![0; data.len()];
        let mut changed = true;
        let mut iterations = 0;

        while changed && iterations < max_iterations {
            changed = false;
            iterations += 1;

            // E-step: nearest centroid, lowest index on ties
            let mut next_assignments = vec![0; data.len()];
            for (i, point) in data.iter().enumerate() {
                let mut min_dist_sq = f32::MAX;
                let mut best_cluster = 0;

                for (j, centroid) in centroids.iter().enumerate() {
                    let dist_sq = distance_sq(point, centroid);
                    if dist_sq < min_dist_sq {
                        min_dist_sq = dist_sq;
                        best_cluster = j;
                    }
                }
                next_assignments[i] = best_cluster;
            }

            if next_assignments != assignments {
                assignments = next_assignments;
                changed = true;
            }

            // M-step: recompute centroids
            let mut sums = vec![vec![0.0_f32; dim]; k];
            let mut counts = vec![0_usize; k];

            for (i, &cluster) in assignments.iter().enumerate() {
                for (j, value) in data[i].iter().enumerate() {
                    sums[cluster][j] += value;
                }
                counts[cluster] += 1;
            }

            for j in 0..k {
                if counts[j] > 0 {
                    for l in 0..dim {
                        centroids[j][l] = sums[j][l] / counts[j] as f32;
                    }
                } else {
                    // Emptied cluster: re-seed from the data
                    let replacement = rng.random_range(0..data.len());
                    centroids[j].clone_from(&data[replacement]);
                }
            }
        }

        Self {
            centroids,
            assignments,
        }
    }
}

fn distance_sq(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum()
}
