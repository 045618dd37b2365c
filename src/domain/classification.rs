//! Classifier input and output types.
//!
//! A [`FeatureVector`] is what the stress model consumes; a
//! [`ClassificationResult`] is what it produces.

use serde::Serialize;

use super::vitals::{Parameter, ValidatedInput};

/// Feature names in model order.
pub const FEATURE_NAMES: [&str; 5] = [
    "heart_rate",
    "systolic_bp",
    "diastolic_bp",
    "sleep_duration",
    "symptom_severity",
];

/// Number of features the model expects.
pub const FEATURE_COUNT: usize = FEATURE_NAMES.len();

/// Three-tier stress classification. Ordered Low < Medium < High.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum StressTier {
    /// No significant stress indicators
    Low,
    /// Some indicators, monitoring recommended
    Medium,
    /// Strong indicators, intervention recommended
    High,
}

impl StressTier {
    pub const ALL: [StressTier; 3] = [Self::Low, Self::Medium, Self::High];

    /// Ordinal class index (0, 1, 2).
    #[must_use]
    pub fn index(&self) -> usize {
        match self {
            Self::Low => 0,
            Self::Medium => 1,
            Self::High => 2,
        }
    }

    /// Get a human-readable description.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Low => "Low stress - No significant indicators",
            Self::Medium => "Medium stress - Follow-up recommended",
            Self::High => "High stress - Intervention recommended",
        }
    }
}

impl std::fmt::Display for StressTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "LOW"),
            Self::Medium => write!(f, "MEDIUM"),
            Self::High => write!(f, "HIGH"),
        }
    }
}

/// Ordered numeric encoding of one reading.
///
/// Immutable once built. Arity is not enforced here so that a malformed vector
/// can reach the model and be rejected there.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureVector {
    values: Vec<f64>,
}

impl FeatureVector {
    /// Encode a validated reading. Order matches [`FEATURE_NAMES`].
    #[must_use]
    pub fn from_input(input: &ValidatedInput) -> Self {
        Self {
            values: Parameter::ALL.iter().map(|p| input.value(*p)).collect(),
        }
    }

    /// Wrap raw values without checking them.
    #[must_use]
    pub fn from_values(values: Vec<f64>) -> Self {
        Self { values }
    }

    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Global importance of one feature.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureImportance {
    pub feature: &'static str,
    pub importance: f64,
}

/// Output of the stress model for one feature vector.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationResult {
    pub tier: StressTier,

    /// Probability of the winning tier (0.0 to 1.0)
    pub confidence: f64,

    /// Probability per tier, indexed by [`StressTier::index`]
    pub probabilities: [f64; 3],

    /// The model's internal ordinal score
    pub score: f64,

    /// Global feature importances, most important first
    pub feature_importance: Vec<FeatureImportance>,
}

impl ClassificationResult {
    /// Importance of a named feature, 0.0 if unknown.
    #[must_use]
    pub fn importance_of(&self, feature: &str) -> f64 {
        self.feature_importance
            .iter()
            .find(|f| f.feature == feature)
            .map_or(0.0, |f| f.importance)
    }

    #[must_use]
    pub fn probability(&self, tier: StressTier) -> f64 {
        self.probabilities[tier.index()]
    }
}
