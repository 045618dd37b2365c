//! Random forest adapter: Implementation of StressModel.
//!
//! The forest is trained once, at startup, on synthetic data (see
//! [`synthetic`]) and is read-only afterwards.
//!
//! # Encoding
//!
//! The model never sees raw values. Each numeric parameter becomes two
//! non-negative features (distance below and above its normal range) and the
//! symptom severity stays an ordinal. Every encoded feature means "further from
//! healthy", and every tree is fitted with monotone constraints on all of them,
//! so moving one parameter further from its normal range can never lower the
//! ensemble score or the tier.
//!
//! # Tiers and probabilities
//!
//! The internal score is the mean tree prediction on the ordinal label scale
//! (0 = Low .. 2 = High). Tier cut points are the 1/3 and 2/3 quantiles of the
//! training-set scores.
//!
//! Probabilities come from the same score. It is mapped piecewise-linearly onto
//! a calibrated position: the lowest training score goes to 0, the cut points
//! to 0.5 and 1.5, the highest training score to 2. The position splits one
//! vote between the two neighbouring classes. Inside a tier's interval that
//! tier always holds at least half the vote, so the tier is the most probable
//! class and stays monotone in the score.

mod synthetic;
mod tree;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

use crate::domain::{
    ClassificationResult, FeatureImportance, FeatureVector, Parameter, ReferenceTable, StressTier,
    FEATURE_COUNT, FEATURE_NAMES,
};
use crate::ports::{ClassifierError, StressModel};

pub use synthetic::TrainingError;
use tree::{RegressionTree, TreeParams};

/// Minimum number of trees in a production forest.
pub const MIN_TREES: usize = 100;

/// Number of encoded features seen by the trees.
const ENCODED_COUNT: usize = 9;

/// Raw feature each encoded feature derives from.
const ENCODED_PARENT: [usize; ENCODED_COUNT] = [0, 0, 1, 1, 2, 2, 3, 3, 4];

/// Configuration for forest training.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForestConfig {
    /// Number of trees
    pub n_trees: usize,

    /// Maximum depth of each tree
    pub max_depth: usize,

    /// A node with fewer samples becomes a leaf
    pub min_samples_split: usize,

    /// Minimum samples on each side of a split
    pub min_samples_leaf: usize,

    /// Synthetic samples generated per stress cohort
    pub samples_per_cohort: usize,

    /// Seed for data generation and bootstrap sampling
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: MIN_TREES,
            max_depth: 8,
            min_samples_split: 5,
            min_samples_leaf: 2,
            samples_per_cohort: 1000,
            seed: 42,
        }
    }
}

fn parse_env<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.trim().parse::<T>().ok())
}

impl ForestConfig {
    /// Load config overrides from environment (best-effort).
    ///
    /// Supported:
    /// - STRESSGAUGE_FOREST_TREES (at least 100)
    /// - STRESSGAUGE_FOREST_MAX_DEPTH
    /// - STRESSGAUGE_FOREST_SAMPLES (per cohort)
    /// - STRESSGAUGE_FOREST_SEED
    #[must_use]
    pub fn from_env_or_default() -> Self {
        let mut cfg = Self::default();

        if let Some(n) = parse_env::<usize>("STRESSGAUGE_FOREST_TREES") {
            if n >= MIN_TREES {
                cfg.n_trees = n;
            } else {
                tracing::warn!(
                    "Ignoring STRESSGAUGE_FOREST_TREES={} (minimum is {})",
                    n,
                    MIN_TREES
                );
            }
        }

        if let Some(d) = parse_env::<usize>("STRESSGAUGE_FOREST_MAX_DEPTH") {
            if (1..=32).contains(&d) {
                cfg.max_depth = d;
            }
        }

        if let Some(s) = parse_env::<usize>("STRESSGAUGE_FOREST_SAMPLES") {
            if s > 0 {
                cfg.samples_per_cohort = s;
            }
        }

        if let Some(seed) = parse_env::<u64>("STRESSGAUGE_FOREST_SEED") {
            cfg.seed = seed;
        }

        cfg
    }

    fn tree_params(&self) -> TreeParams {
        TreeParams {
            max_depth: self.max_depth,
            min_samples_split: self.min_samples_split,
            min_samples_leaf: self.min_samples_leaf,
            max_features: (ENCODED_COUNT as f64).sqrt().round() as usize,
        }
    }
}

/// Map raw features to the monotone "distance from healthy" encoding.
fn encode(raw: &[f64], table: &ReferenceTable) -> Vec<f64> {
    let mut out = Vec::with_capacity(ENCODED_COUNT);
    for (i, parameter) in Parameter::ALL.iter().enumerate() {
        let value = raw[i];
        if *parameter == Parameter::Symptoms {
            out.push(value.max(0.0));
        } else {
            let range = table.range(*parameter);
            out.push(range.deficit(value));
            out.push(range.excess(value));
        }
    }
    out
}

/// Spread one ordinal prediction over the two neighbouring classes.
fn ordinal_votes(prediction: f64) -> [f64; 3] {
    let p = prediction.clamp(0.0, 2.0);
    let lower = p.floor().min(1.0);
    let frac = p - lower;
    let mut votes = [0.0; 3];
    let i = lower as usize;
    votes[i] += 1.0 - frac;
    votes[i + 1] += frac;
    votes
}

struct TrainedForest {
    trees: Vec<RegressionTree>,
    min_score: f64,
    low_cut: f64,
    high_cut: f64,
    max_score: f64,
    importance: Vec<FeatureImportance>,
}

impl TrainedForest {
    fn score(&self, encoded: &[f64]) -> f64 {
        let total: f64 = self.trees.iter().map(|t| t.predict(encoded)).sum();
        total / self.trees.len().max(1) as f64
    }

    /// Piecewise-linear map of a score onto [0, 2], cut points at 0.5 and 1.5.
    fn calibrate(&self, score: f64) -> f64 {
        let knots = [
            (self.min_score, 0.0),
            (self.low_cut, 0.5),
            (self.high_cut, 1.5),
            (self.max_score, 2.0),
        ];
        if score <= knots[0].0 {
            return 0.0;
        }
        for w in knots.windows(2) {
            let ((x0, y0), (x1, y1)) = (w[0], w[1]);
            if score <= x1 {
                if x1 - x0 <= 0.0 {
                    return y1;
                }
                return y0 + (y1 - y0) * (score - x0) / (x1 - x0);
            }
        }
        2.0
    }

    fn probabilities(&self, score: f64) -> [f64; 3] {
        ordinal_votes(self.calibrate(score))
    }

    fn tier_for(&self, score: f64) -> StressTier {
        if score <= self.low_cut {
            StressTier::Low
        } else if score <= self.high_cut {
            StressTier::Medium
        } else {
            StressTier::High
        }
    }
}

/// Random forest stress model.
///
/// Created untrained; [`fit`](Self::fit) trains it in place. Once shared behind
/// an `Arc` it can no longer be retrained.
pub struct RandomForestModel {
    config: ForestConfig,
    table: ReferenceTable,
    forest: Option<TrainedForest>,
}

impl RandomForestModel {
    /// Create an untrained model.
    #[must_use]
    pub fn new(config: ForestConfig) -> Self {
        Self {
            config,
            table: ReferenceTable::ADULT,
            forest: None,
        }
    }

    /// Create and train a model.
    ///
    /// # Errors
    /// Returns error if the training set cannot be generated.
    pub fn trained(config: ForestConfig) -> Result<Self, TrainingError> {
        let mut model = Self::new(config);
        model.fit()?;
        Ok(model)
    }

    #[must_use]
    pub fn config(&self) -> &ForestConfig {
        &self.config
    }

    /// Tier cut points on the internal score, once trained.
    #[must_use]
    pub fn thresholds(&self) -> Option<(f64, f64)> {
        self.forest.as_ref().map(|f| (f.low_cut, f.high_cut))
    }

    /// Generate synthetic data and train the forest.
    ///
    /// Deterministic for a given config: the same seed yields the same trees.
    ///
    /// # Errors
    /// Returns `TrainingError` if the training set is empty or a cohort
    /// distribution is invalid.
    pub fn fit(&mut self) -> Result<(), TrainingError> {
        tracing::info!(
            "Training stress forest: {} trees, depth {}, {} samples per cohort",
            self.config.n_trees,
            self.config.max_depth,
            self.config.samples_per_cohort
        );

        let mut data_rng = ChaCha20Rng::seed_from_u64(self.config.seed);
        let data = synthetic::generate(&mut data_rng, self.config.samples_per_cohort)?;
        tracing::debug!("Synthetic label balance: {:?}", data.label_counts());

        let encoded: Vec<Vec<f64>> = data.rows.iter().map(|r| encode(r, &self.table)).collect();
        let n = encoded.len();
        let params = self.config.tree_params();
        let mut raw_importance = [0.0; ENCODED_COUNT];

        let trees: Vec<RegressionTree> = (0..self.config.n_trees.max(1))
            .map(|t| {
                let mut rng =
                    ChaCha20Rng::seed_from_u64(self.config.seed.wrapping_add(1 + t as u64));
                let bootstrap: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
                RegressionTree::fit(
                    &encoded,
                    &data.labels,
                    bootstrap,
                    params,
                    &mut rng,
                    &mut raw_importance,
                )
            })
            .collect();

        let total_nodes: usize = trees.iter().map(RegressionTree::node_count).sum();
        tracing::debug!(
            "Grew {} trees, {:.1} nodes on average",
            trees.len(),
            total_nodes as f64 / trees.len().max(1) as f64
        );

        let mut forest = TrainedForest {
            trees,
            min_score: 0.0,
            low_cut: 0.0,
            high_cut: 0.0,
            max_score: 0.0,
            importance: fold_importance(&raw_importance),
        };

        let mut scores: Vec<f64> = encoded.iter().map(|r| forest.score(r)).collect();
        scores.sort_by(f64::total_cmp);
        forest.min_score = scores.first().copied().unwrap_or_default();
        forest.max_score = scores.last().copied().unwrap_or_default();
        forest.low_cut = synthetic::quantile(&scores, 1.0 / 3.0);
        forest.high_cut = synthetic::quantile(&scores, 2.0 / 3.0);

        tracing::info!(
            "Stress forest ready: cut points {:.3}/{:.3}, top feature {}",
            forest.low_cut,
            forest.high_cut,
            forest.importance.first().map_or("-", |f| f.feature)
        );

        self.forest = Some(forest);
        Ok(())
    }
}

/// Fold encoded-feature importances into raw features, normalize, sort.
fn fold_importance(raw: &[f64; ENCODED_COUNT]) -> Vec<FeatureImportance> {
    let mut folded = [0.0; FEATURE_COUNT];
    for (value, parent) in raw.iter().zip(ENCODED_PARENT) {
        folded[parent] += value;
    }
    let total: f64 = folded.iter().sum();

    let mut importance: Vec<FeatureImportance> = FEATURE_NAMES
        .iter()
        .zip(folded)
        .map(|(name, value)| FeatureImportance {
            feature: *name,
            importance: if total > 0.0 { value / total } else { 0.0 },
        })
        .collect();
    // Stable: ties keep pipeline order.
    importance.sort_by(|a, b| b.importance.total_cmp(&a.importance));
    importance
}

impl StressModel for RandomForestModel {
    fn classify(&self, features: &FeatureVector) -> Result<ClassificationResult, ClassifierError> {
        let forest = self.forest.as_ref().ok_or(ClassifierError::ModelNotReady)?;
        if features.len() != FEATURE_COUNT {
            return Err(ClassifierError::InvalidFeatureVector {
                expected: FEATURE_COUNT,
                got: features.len(),
            });
        }

        let encoded = encode(features.as_slice(), &self.table);
        let score = forest.score(&encoded);
        let tier = forest.tier_for(score);
        let probabilities = forest.probabilities(score);

        tracing::debug!("Forest score {:.3} -> {}", score, tier);

        Ok(ClassificationResult {
            tier,
            confidence: probabilities[tier.index()],
            probabilities,
            score,
            feature_importance: forest.importance.clone(),
        })
    }

    fn is_ready(&self) -> bool {
        self.forest.is_some()
    }

    fn feature_importance(&self) -> &[FeatureImportance] {
        self.forest
            .as_ref()
            .map(|f| f.importance.as_slice())
            .unwrap_or_default()
    }
}

/// One default-config forest per test binary; training is the slow part.
#[cfg(test)]
pub(crate) fn shared_test_model() -> std::sync::Arc<RandomForestModel> {
    use std::sync::{Arc, OnceLock};
    static MODEL: OnceLock<Arc<RandomForestModel>> = OnceLock::new();
    MODEL
        .get_or_init(|| {
            Arc::new(RandomForestModel::trained(ForestConfig::default()).expect("Should train"))
        })
        .clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(model: &RandomForestModel, values: [f64; 5]) -> ClassificationResult {
        model
            .classify(&FeatureVector::from_values(values.to_vec()))
            .expect("Should classify")
    }

    #[test]
    fn test_untrained_model_not_ready() {
        let model = RandomForestModel::new(ForestConfig::default());
        assert!(!model.is_ready());
        assert!(model.feature_importance().is_empty());
        let err = model
            .classify(&FeatureVector::from_values(vec![72.0, 118.0, 76.0, 8.0, 0.0]))
            .unwrap_err();
        assert_eq!(err, ClassifierError::ModelNotReady);
    }

    #[test]
    fn test_wrong_arity_rejected() {
        let model = shared_test_model();
        let err = model
            .classify(&FeatureVector::from_values(vec![72.0, 118.0]))
            .unwrap_err();
        assert_eq!(
            err,
            ClassifierError::InvalidFeatureVector {
                expected: 5,
                got: 2
            }
        );
    }

    #[test]
    fn test_default_forest_size() {
        let model = shared_test_model();
        assert!(model.config().n_trees >= MIN_TREES);
        let (low, high) = model.thresholds().expect("Should be trained");
        assert!(low <= high);
    }

    #[test]
    fn test_healthy_reading_is_low() {
        let model = shared_test_model();
        let result = classify(&model, [72.0, 118.0, 76.0, 8.0, 0.0]);
        assert_eq!(result.tier, StressTier::Low);
        assert!(result.confidence > 0.0 && result.confidence <= 1.0);
    }

    #[test]
    fn test_stressed_reading_is_high() {
        let model = shared_test_model();
        let result = classify(&model, [115.0, 150.0, 95.0, 4.5, 3.0]);
        assert_eq!(result.tier, StressTier::High);
    }

    #[test]
    fn test_probabilities_sum_to_one() {
        let model = shared_test_model();
        for values in [
            [72.0, 118.0, 76.0, 8.0, 0.0],
            [90.0, 132.0, 86.0, 6.0, 1.0],
            [140.0, 190.0, 110.0, 2.0, 3.0],
        ] {
            let result = classify(&model, values);
            let sum: f64 = result.probabilities.iter().sum();
            assert!((sum - 1.0).abs() < 1e-9);
            assert!(
                (result.confidence - result.probabilities[result.tier.index()]).abs() < 1e-12
            );
        }
    }

    #[test]
    fn test_tier_is_most_probable_class() {
        let model = shared_test_model();
        let mut checked = 0;
        for hr in [45.0, 60.0, 75.0, 95.0, 110.0, 130.0] {
            for sys in [85.0, 118.0, 135.0, 145.0, 170.0] {
                for sleep in [3.0, 4.5, 6.0, 8.0, 10.0] {
                    for symptoms in [0.0, 1.0, 2.0, 3.0] {
                        let result = classify(&model, [hr, sys, 70.0, sleep, symptoms]);
                        let best = result
                            .probabilities
                            .iter()
                            .copied()
                            .fold(f64::MIN, f64::max);
                        assert!(
                            result.confidence >= best - 1e-12,
                            "tier {} is not the most probable class at \
                             hr={hr} sys={sys} sleep={sleep} symptoms={symptoms}: {:?}",
                            result.tier,
                            result.probabilities
                        );
                        checked += 1;
                    }
                }
            }
        }
        assert_eq!(checked, 600);
    }

    #[test]
    fn test_calibration_knots() {
        let model = shared_test_model();
        let forest = model.forest.as_ref().expect("Should be trained");
        assert_eq!(forest.calibrate(forest.min_score - 1.0), 0.0);
        assert_eq!(forest.calibrate(forest.max_score + 1.0), 2.0);
        assert!(forest.calibrate(forest.low_cut) <= 0.5);
        assert!(forest.calibrate(forest.high_cut) <= 1.5);
        assert!(forest.calibrate(forest.high_cut) > 0.5 || forest.low_cut == forest.high_cut);
    }

    #[test]
    fn test_importance_normalized_and_stable() {
        let model = shared_test_model();
        let importance = model.feature_importance();
        assert_eq!(importance.len(), FEATURE_COUNT);
        let total: f64 = importance.iter().map(|f| f.importance).sum();
        assert!((total - 1.0).abs() < 1e-9);
        assert!(importance
            .windows(2)
            .all(|w| w[0].importance >= w[1].importance));

        let a = classify(&model, [72.0, 118.0, 76.0, 8.0, 0.0]);
        let b = classify(&model, [120.0, 160.0, 100.0, 3.0, 3.0]);
        assert_eq!(a.feature_importance, b.feature_importance);
    }

    #[test]
    fn test_tier_monotone_in_heart_rate() {
        let model = shared_test_model();
        let mut prev = StressTier::Low;
        for hr in (100..=220).step_by(5) {
            let tier = classify(&model, [f64::from(hr), 118.0, 76.0, 8.0, 0.0]).tier;
            assert!(tier >= prev, "tier fell at {hr} bpm");
            prev = tier;
        }
        let mut prev = StressTier::Low;
        for hr in (30..=60).rev().step_by(5) {
            let tier = classify(&model, [f64::from(hr), 118.0, 76.0, 8.0, 0.0]).tier;
            assert!(tier >= prev, "tier fell at {hr} bpm");
            prev = tier;
        }
    }

    #[test]
    fn test_training_is_deterministic() {
        let config = ForestConfig {
            n_trees: 5,
            samples_per_cohort: 100,
            ..ForestConfig::default()
        };
        let a = RandomForestModel::trained(config.clone()).expect("Should train");
        let b = RandomForestModel::trained(config).expect("Should train");
        assert_eq!(a.thresholds(), b.thresholds());
        let fv = FeatureVector::from_values(vec![95.0, 135.0, 88.0, 6.0, 1.0]);
        assert_eq!(
            a.classify(&fv).expect("Should classify"),
            b.classify(&fv).expect("Should classify")
        );
    }

    #[test]
    fn test_ordinal_votes() {
        assert_eq!(ordinal_votes(0.0), [1.0, 0.0, 0.0]);
        assert_eq!(ordinal_votes(2.0), [0.0, 0.0, 1.0]);
        let v = ordinal_votes(1.25);
        assert!((v[1] - 0.75).abs() < 1e-12 && (v[2] - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_encode_two_sided() {
        let encoded = encode(&[50.0, 130.0, 70.0, 10.0, 2.0], &ReferenceTable::ADULT);
        assert_eq!(
            encoded,
            vec![10.0, 0.0, 0.0, 10.0, 0.0, 0.0, 0.0, 1.0, 2.0]
        );
    }
}
