//! Stress model port: Trait for the trained classifier.
//!
//! This trait abstracts the model implementation (random forest) from the
//! pipeline, so tests can inject fixed or failing models.

use crate::domain::{ClassificationResult, FeatureImportance, FeatureVector};

/// Errors that can occur during classification.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClassifierError {
    #[error("Stress model is not trained yet")]
    ModelNotReady,

    #[error("Invalid feature vector: expected {expected} features, got {got}")]
    InvalidFeatureVector { expected: usize, got: usize },
}

/// Trait for stress classification.
///
/// Implementations must be read-only after initialization: `classify` takes
/// `&self` and may be called from many threads at once.
pub trait StressModel: Send + Sync {
    /// Classify a feature vector into a stress tier.
    ///
    /// # Errors
    /// Returns `ClassifierError::ModelNotReady` if the model is not trained.
    /// Returns `ClassifierError::InvalidFeatureVector` if the arity is wrong.
    fn classify(&self, features: &FeatureVector) -> Result<ClassificationResult, ClassifierError>;

    /// Whether the model can classify.
    fn is_ready(&self) -> bool;

    /// Global feature importances computed at training time, most important first.
    ///
    /// Empty if the model is not trained.
    fn feature_importance(&self) -> &[FeatureImportance];
}
