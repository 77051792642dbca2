use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Meta estimator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForestConfig {
    /// Number of trees in the ensemble
    pub n_trees: usize,
    /// Maximum tree depth
    pub max_depth: usize,
    /// Minimum samples per leaf
    pub min_leaf: usize,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: 500,
            max_depth: 16,
            min_leaf: 1,
        }
    }
}

/// One node of a decision tree over the one-dimensional recalibration input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TreeNode {
    Leaf {
        probability: f64,
    },
    Split {
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
}

impl TreeNode {
    fn predict(&self, value: f64) -> f64 {
        match self {
            TreeNode::Leaf { probability } => *probability,
            TreeNode::Split {
                threshold,
                left,
                right,
            } => {
                if value <= *threshold {
                    left.predict(value)
                } else {
                    right.predict(value)
                }
            }
        }
    }
}

/// Entropy-split random forest recalibrating the base estimator's output.
///
/// Each tree trains on a class-balanced bootstrap of the (probability,
/// label) pairs, which counteracts the severe minority of known targets.
/// Tree `i` draws from an RNG seeded with `seed + i`, so parallel fitting
/// cannot influence the result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntropyForest {
    n_trees: usize,
    trees: Vec<TreeNode>,
}

impl EntropyForest {
    /// Fit the forest on base-estimator probabilities and true labels.
    pub fn fit(values: &[f64], labels: &[u8], config: &ForestConfig, seed: u64) -> Self {
        debug_assert_eq!(values.len(), labels.len());

        let positives: Vec<usize> = (0..labels.len()).filter(|&i| labels[i] == 1).collect();
        let negatives: Vec<usize> = (0..labels.len()).filter(|&i| labels[i] == 0).collect();
        let base_rate = positives.len() as f64 / labels.len().max(1) as f64;
        let per_class = (values.len() / 2).max(1);

        info!(
            "Fitting {} entropy trees on {} samples ({} positive)",
            config.n_trees,
            values.len(),
            positives.len()
        );

        let trees: Vec<TreeNode> = (0..config.n_trees)
            .into_par_iter()
            .map(|tree_index| {
                if positives.is_empty() || negatives.is_empty() {
                    return TreeNode::Leaf {
                        probability: base_rate,
                    };
                }

                let mut rng = ChaCha8Rng::seed_from_u64(seed.wrapping_add(tree_index as u64));
                let mut samples = Vec::with_capacity(per_class * 2);
                for _ in 0..per_class {
                    let i = positives[rng.gen_range(0..positives.len())];
                    samples.push((values[i], labels[i]));
                }
                for _ in 0..per_class {
                    let i = negatives[rng.gen_range(0..negatives.len())];
                    samples.push((values[i], labels[i]));
                }

                samples.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap());
                build_tree(&samples, 0, config)
            })
            .collect();

        debug!("Forest fitting complete");
        Self {
            n_trees: config.n_trees,
            trees,
        }
    }

    /// Calibrated score for one base probability.
    pub fn predict(&self, value: f64) -> f64 {
        if self.trees.is_empty() {
            return 0.0;
        }
        let total: f64 = self.trees.iter().map(|t| t.predict(value)).sum();
        total / self.trees.len() as f64
    }

    /// Calibrated scores for a batch of base probabilities.
    pub fn scores(&self, values: &[f64]) -> Vec<f64> {
        values.iter().map(|&v| self.predict(v)).collect()
    }

    pub fn n_trees(&self) -> usize {
        self.n_trees
    }
}

/// Binary entropy of a positive fraction, in bits.
fn entropy(p: f64) -> f64 {
    if p <= 0.0 || p >= 1.0 {
        return 0.0;
    }
    -p * p.log2() - (1.0 - p) * (1.0 - p).log2()
}

/// Grow a tree on samples sorted ascending by value.
fn build_tree(samples: &[(f64, u8)], depth: usize, config: &ForestConfig) -> TreeNode {
    let n = samples.len();
    let positives = samples.iter().filter(|(_, y)| *y == 1).count();
    let probability = positives as f64 / n as f64;

    if depth >= config.max_depth
        || n < 2 * config.min_leaf.max(1)
        || positives == 0
        || positives == n
    {
        return TreeNode::Leaf { probability };
    }

    let parent_entropy = entropy(probability);

    // Scan every boundary between distinct values with running counts
    let mut best: Option<(f64, usize, f64)> = None;
    let mut left_positives = 0usize;
    for i in 0..n - 1 {
        if samples[i].1 == 1 {
            left_positives += 1;
        }
        if samples[i].0 == samples[i + 1].0 {
            continue;
        }
        let left_n = i + 1;
        let right_n = n - left_n;
        if left_n < config.min_leaf || right_n < config.min_leaf {
            continue;
        }

        let left_entropy = entropy(left_positives as f64 / left_n as f64);
        let right_entropy = entropy((positives - left_positives) as f64 / right_n as f64);
        let weighted =
            (left_n as f64 * left_entropy + right_n as f64 * right_entropy) / n as f64;
        let gain = parent_entropy - weighted;

        let threshold = (samples[i].0 + samples[i + 1].0) / 2.0;
        if best.map(|(_, _, g)| gain > g).unwrap_or(gain > 1e-12) {
            best = Some((threshold, left_n, gain));
        }
    }

    match best {
        Some((threshold, split_at, _)) => TreeNode::Split {
            threshold,
            left: Box::new(build_tree(&samples[..split_at], depth + 1, config)),
            right: Box::new(build_tree(&samples[split_at..], depth + 1, config)),
        },
        None => TreeNode::Leaf { probability },
    }
}
