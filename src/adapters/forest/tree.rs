//! Monotone regression tree (CART, variance reduction).
//!
//! Every feature is treated as "more is worse": a split is only accepted when
//! the left (smaller) side has a mean no larger than the right side, and the
//! children inherit value bounds so that no leaf on the left of a split can
//! exceed any leaf on its right. The fitted function is therefore
//! non-decreasing in every feature.

use rand::seq::index;
use rand::Rng;

/// Growth limits for a single tree.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TreeParams {
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Features considered per split
    pub max_features: usize,
}

#[derive(Debug, Clone)]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    feature: usize,
    threshold: f64,
    gain: f64,
    left_mean: f64,
    right_mean: f64,
}

/// Training data borrowed for the duration of one fit.
struct FitContext<'a> {
    rows: &'a [Vec<f64>],
    targets: &'a [f64],
    params: TreeParams,
    n_features: usize,
}

#[derive(Debug, Clone)]
pub(crate) struct RegressionTree {
    nodes: Vec<Node>,
}

impl RegressionTree {
    /// Fit a tree on the rows selected by `indices` (duplicates allowed, as
    /// produced by bootstrap sampling).
    ///
    /// Variance reduction of every accepted split is added to
    /// `importance[feature]`.
    pub fn fit<R: Rng + ?Sized>(
        rows: &[Vec<f64>],
        targets: &[f64],
        mut indices: Vec<usize>,
        params: TreeParams,
        rng: &mut R,
        importance: &mut [f64],
    ) -> Self {
        let n_features = rows.first().map_or(0, Vec::len);
        let ctx = FitContext {
            rows,
            targets,
            params: TreeParams {
                max_features: params.max_features.clamp(1, n_features.max(1)),
                ..params
            },
            n_features,
        };

        let mut tree = Self { nodes: Vec::new() };
        if indices.is_empty() || n_features == 0 {
            tree.nodes.push(Node::Leaf { value: 0.0 });
            return tree;
        }
        tree.grow(
            &ctx,
            &mut indices,
            0,
            f64::NEG_INFINITY,
            f64::INFINITY,
            rng,
            importance,
        );
        tree
    }

    /// Predict the target for one encoded row.
    #[must_use]
    pub fn predict(&self, row: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { value } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    let x = row.get(*feature).copied().unwrap_or(0.0);
                    idx = if x <= *threshold { *left } else { *right };
                }
            }
        }
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[allow(clippy::too_many_arguments)]
    fn grow<R: Rng + ?Sized>(
        &mut self,
        ctx: &FitContext<'_>,
        indices: &mut [usize],
        depth: usize,
        lower: f64,
        upper: f64,
        rng: &mut R,
        importance: &mut [f64],
    ) -> usize {
        let n = indices.len();
        let (sum, sum_sq) = indices.iter().fold((0.0, 0.0), |(s, sq), &i| {
            let y = ctx.targets[i];
            (s + y, sq + y * y)
        });
        let mean = sum / n as f64;
        let sse = sum_sq - sum * sum / n as f64;

        let node_idx = self.nodes.len();
        self.nodes.push(Node::Leaf {
            value: mean.clamp(lower, upper),
        });

        if depth >= ctx.params.max_depth || n < ctx.params.min_samples_split || sse <= 1e-12 {
            return node_idx;
        }

        let Some(best) = Self::best_split(ctx, indices, sum, sum_sq, rng) else {
            return node_idx;
        };

        importance[best.feature] += best.gain;

        // In-place partition: left rows first.
        let mut boundary = 0;
        for k in 0..n {
            if ctx.rows[indices[k]][best.feature] <= best.threshold {
                indices.swap(boundary, k);
                boundary += 1;
            }
        }
        let (left_idx, right_idx) = indices.split_at_mut(boundary);

        let mid = ((best.left_mean + best.right_mean) / 2.0).clamp(lower, upper);
        let left = self.grow(ctx, left_idx, depth + 1, lower, mid, rng, importance);
        let right = self.grow(ctx, right_idx, depth + 1, mid, upper, rng, importance);

        self.nodes[node_idx] = Node::Split {
            feature: best.feature,
            threshold: best.threshold,
            left,
            right,
        };
        node_idx
    }

    fn best_split<R: Rng + ?Sized>(
        ctx: &FitContext<'_>,
        indices: &[usize],
        sum: f64,
        sum_sq: f64,
        rng: &mut R,
    ) -> Option<Candidate> {
        let n = indices.len();
        let min_leaf = ctx.params.min_samples_leaf.max(1);
        let parent_sse = sum_sq - sum * sum / n as f64;
        let mut best: Option<Candidate> = None;
        let mut pairs: Vec<(f64, f64)> = Vec::with_capacity(n);

        for feature in index::sample(rng, ctx.n_features, ctx.params.max_features).into_iter() {
            pairs.clear();
            pairs.extend(
                indices
                    .iter()
                    .map(|&i| (ctx.rows[i][feature], ctx.targets[i])),
            );
            pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

            let mut left_sum = 0.0;
            let mut left_sq = 0.0;
            for k in 0..n - 1 {
                let (x, y) = pairs[k];
                left_sum += y;
                left_sq += y * y;

                let next_x = pairs[k + 1].0;
                if x == next_x {
                    continue;
                }
                let left_n = k + 1;
                let right_n = n - left_n;
                if left_n < min_leaf || right_n < min_leaf {
                    continue;
                }

                let right_sum = sum - left_sum;
                let right_sq = sum_sq - left_sq;
                let left_mean = left_sum / left_n as f64;
                let right_mean = right_sum / right_n as f64;
                if left_mean > right_mean {
                    continue;
                }

                let left_sse = left_sq - left_sum * left_sum / left_n as f64;
                let right_sse = right_sq - right_sum * right_sum / right_n as f64;
                let gain = parent_sse - left_sse - right_sse;

                if gain > 1e-12 && best.map_or(true, |b| gain > b.gain) {
                    best = Some(Candidate {
                        feature,
                        threshold: (x + next_x) / 2.0,
                        gain,
                        left_mean,
                        right_mean,
                    });
                }
            }
        }

        best
    }
}
