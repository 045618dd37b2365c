//! Pipeline: Composes the stages for one reading.
//!
//! validate -> analyze -> encode -> classify -> insights, strictly in order.
//! The first failure short-circuits. The model is injected, never looked up.

use std::sync::Arc;

use serde::Serialize;

use super::{DataValidator, InsightsEngine, ParameterAnalyzer};
use crate::domain::{
    BandSummary, ClassificationResult, FeatureVector, InsightSet, MedicalPriority, Parameter,
    ParameterBands, RiskAssessment, ValidatedInput, VitalSigns,
};
use crate::ports::StressModel;
use crate::Result;

/// Everything derived from one reading.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineOutput {
    pub input: ValidatedInput,
    pub bands: ParameterBands,
    pub risk: RiskAssessment,
    pub summary: BandSummary,
    pub classification: ClassificationResult,
    pub insights: InsightSet,
    /// Parameter driving the result most, `None` when all bands are Normal
    pub primary_factor: Option<Parameter>,
    /// Parameters in their optimal sub-range, in pipeline order
    pub protective_factors: Vec<&'static str>,
    pub priority: MedicalPriority,
}

/// Stress assessment pipeline over a shared, read-only model.
pub struct Pipeline<M>
where
    M: StressModel,
{
    validator: DataValidator,
    analyzer: ParameterAnalyzer,
    insights: InsightsEngine,
    model: Arc<M>,
}

impl<M> Clone for Pipeline<M>
where
    M: StressModel,
{
    fn clone(&self) -> Self {
        Self {
            validator: self.validator,
            analyzer: self.analyzer.clone(),
            insights: self.insights,
            model: Arc::clone(&self.model),
        }
    }
}

impl<M> Pipeline<M>
where
    M: StressModel,
{
    /// Create a pipeline with the default (adult) reference table.
    pub fn new(model: Arc<M>) -> Self {
        Self::with_analyzer(model, ParameterAnalyzer::new())
    }

    /// Create a pipeline with a custom analyzer.
    pub fn with_analyzer(model: Arc<M>, analyzer: ParameterAnalyzer) -> Self {
        Self {
            validator: DataValidator::new(),
            analyzer,
            insights: InsightsEngine::new(),
            model,
        }
    }

    #[must_use]
    pub fn model(&self) -> &Arc<M> {
        &self.model
    }

    /// Run every stage on one reading.
    ///
    /// Deterministic: the same reading always yields the same output.
    ///
    /// # Errors
    /// Returns `PipelineError::Validation` if the reading is rejected, or
    /// `PipelineError::Classifier` if the model cannot classify.
    pub fn run(&self, vitals: &VitalSigns) -> Result<PipelineOutput> {
        let input = self.validator.validate(vitals)?;
        tracing::debug!("Reading validated ({} warnings)", input.warnings().len());

        let bands = self.analyzer.analyze(&input);
        let risk = self.analyzer.assess_risk(&bands);
        let summary = self.analyzer.summarize(&bands);
        tracing::debug!(
            "Bands: {} normal, {} out of range, risk {:.2}",
            summary.normal,
            bands.len() - summary.normal,
            risk.score
        );

        let features = FeatureVector::from_input(&input);
        let classification = self.model.classify(&features)?;

        let insights = self.insights.generate(&classification, &bands);
        let primary_factor = self.insights.primary_factor(&classification, &bands);
        let protective_factors = self.insights.protective_factors(&input);
        let priority = MedicalPriority::determine(classification.tier, risk.score);

        tracing::info!(
            "Assessment complete: tier {} (confidence {:.2}), priority {}",
            classification.tier,
            classification.confidence,
            priority
        );

        Ok(PipelineOutput {
            input,
            bands,
            risk,
            summary,
            classification,
            insights,
            primary_factor,
            protective_factors,
            priority,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::forest::shared_test_model;
    use crate::domain::{
        Band, FeatureImportance, StressTier, SymptomSeverity, ValidationError, FEATURE_NAMES,
    };
    use crate::ports::ClassifierError;
    use crate::PipelineError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Returns a fixed tier and counts calls.
    struct FixedModel {
        tier: StressTier,
        calls: AtomicUsize,
        importance: Vec<FeatureImportance>,
    }

    impl FixedModel {
        fn new(tier: StressTier) -> Self {
            Self {
                tier,
                calls: AtomicUsize::new(0),
                importance: FEATURE_NAMES
                    .iter()
                    .map(|&feature| FeatureImportance {
                        feature,
                        importance: 0.2,
                    })
                    .collect(),
            }
        }
    }

    impl StressModel for FixedModel {
        fn classify(
            &self,
            _features: &FeatureVector,
        ) -> std::result::Result<ClassificationResult, ClassifierError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut probabilities = [0.0; 3];
            probabilities[self.tier.index()] = 1.0;
            Ok(ClassificationResult {
                tier: self.tier,
                confidence: 1.0,
                probabilities,
                score: self.tier.index() as f64,
                feature_importance: self.importance.clone(),
            })
        }

        fn is_ready(&self) -> bool {
            true
        }

        fn feature_importance(&self) -> &[FeatureImportance] {
            &self.importance
        }
    }

    struct UntrainedModel;

    impl StressModel for UntrainedModel {
        fn classify(
            &self,
            _features: &FeatureVector,
        ) -> std::result::Result<ClassificationResult, ClassifierError> {
            Err(ClassifierError::ModelNotReady)
        }

        fn is_ready(&self) -> bool {
            false
        }

        fn feature_importance(&self) -> &[FeatureImportance] {
            &[]
        }
    }

    fn healthy() -> VitalSigns {
        VitalSigns::new(72, 118, 76, 8.0, SymptomSeverity::None)
    }

    fn stressed() -> VitalSigns {
        VitalSigns::new(115, 150, 95, 4.5, SymptomSeverity::Severe)
    }

    #[test]
    fn test_healthy_scenario() {
        let pipeline = Pipeline::new(shared_test_model());
        let output = pipeline.run(&healthy()).expect("Should run");

        assert!(output.bands.values().all(|b| b.band == Band::Normal));
        assert_eq!(output.classification.tier, StressTier::Low);
        assert_eq!(output.primary_factor, None);
        assert_eq!(output.priority, MedicalPriority::Low);
        assert_eq!(output.insights.len(), 1);
        // 118 mmHg is normal but above the optimal systolic range.
        assert_eq!(output.protective_factors.len(), 2);
    }

    #[test]
    fn test_stressed_scenario() {
        let pipeline = Pipeline::new(shared_test_model());
        let output = pipeline.run(&stressed()).expect("Should run");

        let severe = output
            .bands
            .values()
            .filter(|b| b.band >= Band::Abnormal)
            .count();
        assert!(severe >= 2);
        assert_eq!(output.classification.tier, StressTier::High);
        assert_eq!(output.priority, MedicalPriority::High);
        assert!(output.primary_factor.is_some());
        assert!(output.insights.len() > 1);
        assert!(output.protective_factors.is_empty());
    }

    #[test]
    fn test_invalid_bp_short_circuits() {
        let model = Arc::new(FixedModel::new(StressTier::High));
        let pipeline = Pipeline::new(Arc::clone(&model));

        let err = pipeline
            .run(&VitalSigns::new(72, 100, 95, 7.0, SymptomSeverity::None))
            .unwrap_err();
        match err {
            PipelineError::Validation(e) => {
                assert!(matches!(e, ValidationError::PulsePressure { .. }));
                assert!(e.fields().contains(&Parameter::Systolic));
                assert!(e.fields().contains(&Parameter::Diastolic));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_untrained_model_propagates() {
        let pipeline = Pipeline::new(Arc::new(UntrainedModel));
        let err = pipeline.run(&healthy()).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Classifier(ClassifierError::ModelNotReady)
        ));
    }

    #[test]
    fn test_mock_model_drives_priority() {
        let pipeline = Pipeline::new(Arc::new(FixedModel::new(StressTier::High)));
        let output = pipeline.run(&healthy()).expect("Should run");
        assert_eq!(output.classification.tier, StressTier::High);
        // Rule-based risk stays at zero: the two scores are never merged.
        assert_eq!(output.risk.score, 0.0);
        assert_eq!(output.priority, MedicalPriority::High);
    }

    #[test]
    fn test_run_is_deterministic() {
        let pipeline = Pipeline::new(shared_test_model());
        let reading = VitalSigns::new(98, 135, 88, 6.5, SymptomSeverity::Mild);
        let first = pipeline.run(&reading).expect("Should run");
        let second = pipeline.run(&reading).expect("Should run");
        assert_eq!(first, second);
    }

    #[test]
    fn test_shared_model_across_threads() {
        let pipeline = Pipeline::new(shared_test_model());
        let expected = pipeline.run(&stressed()).expect("Should run");

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let p = pipeline.clone();
                std::thread::spawn(move || p.run(&stressed()).expect("Should run"))
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().expect("Thread should finish"), expected);
        }
    }
}
