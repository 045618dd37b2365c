//! Domain layer: Core types of the stress assessment.
//!
//! This module contains plain data types with no I/O.
//! Everything here is created fresh per reading and never mutated afterwards.

mod band;
mod classification;
mod insight;
mod risk;
mod vitals;

pub use band::{
    Band, BandSummary, OverallStatus, ParameterBand, ParameterBands, ReferenceRange,
    ReferenceTable, Side,
};
pub use classification::{
    ClassificationResult, FeatureImportance, FeatureVector, StressTier, FEATURE_COUNT,
    FEATURE_NAMES,
};
pub use insight::{Insight, InsightSet, InsightSource};
pub use risk::{MedicalPriority, RiskAssessment, RiskCategory};
pub use vitals::{Parameter, SymptomSeverity, ValidatedInput, ValidationError, VitalSigns};
