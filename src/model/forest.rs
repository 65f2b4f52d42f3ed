//! Isolation forest over normalized feature rows.
//!
//! Trees are grown from bootstrap subsamples with uniformly random splits.
//! A point's anomaly score derives from its average isolation depth across
//! trees: points that isolate quickly score close to 1, points deep in the
//! data's bulk score closer to 0. Scoring is read-only and deterministic for
//! a fitted forest.

use rand::Rng;
use serde::{Deserialize, Serialize};

const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

/// Subsample size per tree, capped by the training set size.
const MAX_SAMPLE_SIZE: usize = 256;

/// Expected path length of an unsuccessful BST search over `n` points.
/// Normalizes raw isolation depths into comparable scores.
pub fn average_path_length(n: usize) -> f64 {
    if n <= 1 {
        return 0.0;
    }
    let n = n as f64;
    2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        size: usize,
    },
}

/// One randomly-split isolation tree, nodes stored as an index arena with
/// the root at 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IsolationTree {
    nodes: Vec<Node>,
}

impl IsolationTree {
    fn grow<R: Rng>(data: &[Vec<f64>], sample: &[usize], height_limit: usize, rng: &mut R) -> Self {
        let mut nodes = Vec::new();
        build_node(data, sample, 0, height_limit, rng, &mut nodes);
        Self { nodes }
    }

    /// Isolation depth of `point`, including the expected remaining depth
    /// at the reached leaf.
    fn path_length(&self, point: &[f64]) -> f64 {
        let mut idx = 0;
        let mut depth = 0.0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { size } => return depth + average_path_length(*size),
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if point[*feature] < *threshold {
                        *left
                    } else {
                        *right
                    };
                    depth += 1.0;
                }
            }
        }
    }
}

fn build_node<R: Rng>(
    data: &[Vec<f64>],
    sample: &[usize],
    depth: usize,
    height_limit: usize,
    rng: &mut R,
    nodes: &mut Vec<Node>,
) -> usize {
    if depth >= height_limit || sample.len() <= 1 {
        nodes.push(Node::Leaf { size: sample.len() });
        return nodes.len() - 1;
    }

    // Only split on features that still have spread within this node.
    let dim = data[0].len();
    let splittable: Vec<(usize, f64, f64)> = (0..dim)
        .filter_map(|f| {
            let mut lo = f64::INFINITY;
            let mut hi = f64::NEG_INFINITY;
            for &i in sample {
                lo = lo.min(data[i][f]);
                hi = hi.max(data[i][f]);
            }
            (hi > lo).then_some((f, lo, hi))
        })
        .collect();

    if splittable.is_empty() {
        nodes.push(Node::Leaf { size: sample.len() });
        return nodes.len() - 1;
    }

    let (feature, lo, hi) = splittable[rng.gen_range(0..splittable.len())];
    let threshold = rng.gen_range(lo..hi);

    let (left_sample, right_sample): (Vec<usize>, Vec<usize>) = sample
        .iter()
        .copied()
        .partition(|&i| data[i][feature] < threshold);

    let node_idx = nodes.len();
    nodes.push(Node::Leaf { size: 0 }); // placeholder, replaced below
    let left = build_node(data, &left_sample, depth + 1, height_limit, rng, nodes);
    let right = build_node(data, &right_sample, depth + 1, height_limit, rng, nodes);
    nodes[node_idx] = Node::Split {
        feature,
        threshold,
        left,
        right,
    };
    node_idx
}

/// Ensemble of isolation trees fitted on one training matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IsolationForest {
    trees: Vec<IsolationTree>,
    sample_size: usize,
}

impl IsolationForest {
    /// Fit `tree_count` trees on bootstrap subsamples of `data`.
    ///
    /// `data` must be non-empty with equal-length rows.
    pub fn fit<R: Rng>(data: &[Vec<f64>], tree_count: usize, rng: &mut R) -> Self {
        let n = data.len();
        let sample_size = n.min(MAX_SAMPLE_SIZE);
        let height_limit = (sample_size as f64).log2().ceil().max(1.0) as usize;

        let trees = (0..tree_count.max(1))
            .map(|_| {
                let sample: Vec<usize> = (0..sample_size).map(|_| rng.gen_range(0..n)).collect();
                IsolationTree::grow(data, &sample, height_limit, rng)
            })
            .collect();

        Self { trees, sample_size }
    }

    pub fn tree_count(&self) -> usize {
        self.trees.len()
    }

    /// Average isolation depth of `point` across the ensemble.
    pub fn mean_path_length(&self, point: &[f64]) -> f64 {
        let total: f64 = self.trees.iter().map(|t| t.path_length(point)).sum();
        total / self.trees.len() as f64
    }

    /// Anomaly score in (0, 1]: `2^(-E[h(x)] / c(ψ))`. Higher means more
    /// anomalous.
    pub fn score(&self, point: &[f64]) -> f64 {
        let norm = average_path_length(self.sample_size).max(f64::EPSILON);
        2f64.powf(-self.mean_path_length(point) / norm)
    }
}

/// Decision threshold from training scores: at most
/// `floor(contamination * n)` training points score strictly above it.
pub fn score_threshold(scores: &[f64], contamination: f64) -> f64 {
    if scores.is_empty() {
        return f64::INFINITY;
    }
    let mut sorted = scores.to_vec();
    sorted.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));
    let k = (contamination.clamp(0.0, 1.0) * sorted.len() as f64).floor() as usize;
    sorted[k.min(sorted.len() - 1)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// A tight 2-d cluster around the origin plus helpers.
    fn cluster(n: usize) -> Vec<Vec<f64>> {
        (0..n)
            .map(|i| {
                let x = (i % 10) as f64 * 0.05;
                let y = (i / 10) as f64 * 0.05;
                vec![x, y]
            })
            .collect()
    }

    #[test]
    fn test_average_path_length_known_values() {
        assert_eq!(average_path_length(0), 0.0);
        assert_eq!(average_path_length(1), 0.0);
        // c(2) = 2(ln 1 + gamma) - 1
        let expected = 2.0 * EULER_GAMMA - 1.0;
        assert!((average_path_length(2) - expected).abs() < 1e-9);
        assert!(average_path_length(256) > average_path_length(32));
    }

    #[test]
    fn test_outlier_scores_higher_than_cluster() {
        let data = cluster(100);
        let mut rng = StdRng::seed_from_u64(7);
        let forest = IsolationForest::fit(&data, 100, &mut rng);

        let inlier_score = forest.score(&[0.2, 0.2]);
        let outlier_score = forest.score(&[50.0, -50.0]);
        assert!(
            outlier_score > inlier_score,
            "outlier {outlier_score} vs inlier {inlier_score}"
        );
    }

    #[test]
    fn test_scoring_is_deterministic_for_fitted_forest() {
        let data = cluster(50);
        let mut rng = StdRng::seed_from_u64(42);
        let forest = IsolationForest::fit(&data, 50, &mut rng);

        let point = [0.1, 0.3];
        assert_eq!(forest.score(&point), forest.score(&point));

        let mut rng2 = StdRng::seed_from_u64(42);
        let forest2 = IsolationForest::fit(&data, 50, &mut rng2);
        assert_eq!(forest.score(&point), forest2.score(&point));
    }

    #[test]
    fn test_serde_round_trip_preserves_scores() {
        let data = cluster(50);
        let mut rng = StdRng::seed_from_u64(3);
        let forest = IsolationForest::fit(&data, 25, &mut rng);

        let json = serde_json::to_string(&forest).unwrap();
        let reloaded: IsolationForest = serde_json::from_str(&json).unwrap();
        assert_eq!(forest.score(&[0.1, 0.1]), reloaded.score(&[0.1, 0.1]));
        assert_eq!(forest, reloaded);
    }

    #[test]
    fn test_threshold_bounds_flagged_fraction() {
        let data = cluster(100);
        let mut rng = StdRng::seed_from_u64(11);
        let forest = IsolationForest::fit(&data, 100, &mut rng);

        let scores: Vec<f64> = data.iter().map(|p| forest.score(p)).collect();
        for contamination in [0.38, 0.05] {
            let threshold = score_threshold(&scores, contamination);
            let flagged = scores.iter().filter(|s| **s > threshold).count();
            let max_flagged = (contamination * scores.len() as f64).floor() as usize;
            assert!(
                flagged <= max_flagged,
                "contamination {contamination}: {flagged} > {max_flagged}"
            );
        }
    }

    #[test]
    fn test_constant_data_yields_leaf_trees() {
        let data = vec![vec![1.0, 1.0]; 20];
        let mut rng = StdRng::seed_from_u64(5);
        let forest = IsolationForest::fit(&data, 10, &mut rng);
        // No splittable feature: every point takes the same path.
        assert_eq!(forest.score(&[1.0, 1.0]), forest.score(&[1.0, 1.0]));
        assert!(forest.score(&[1.0, 1.0]).is_finite());
    }
}
