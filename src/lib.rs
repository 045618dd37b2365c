//! # stressgauge
//!
//! Stress classification from self-reported vital signs.
//!
//! One reading (heart rate, blood pressure, sleep, symptom severity) flows
//! through a fixed pipeline:
//! - validation against physiological bounds
//! - banding against clinical reference ranges, with a rule-based risk score
//! - classification into Low / Medium / High stress by a random forest
//! - recommendations from a static knowledge base
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Core types (vitals, bands, classification, insights)
//! - `ports`: The `StressModel` trait
//! - `adapters`: Random forest model, log sanitization
//! - `application`: Pipeline stages, the pipeline and the session log
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use stressgauge::adapters::forest::{ForestConfig, RandomForestModel};
//! use stressgauge::application::Pipeline;
//! use stressgauge::domain::{SymptomSeverity, VitalSigns};
//!
//! let model = RandomForestModel::trained(ForestConfig::default())?;
//! let pipeline = Pipeline::new(Arc::new(model));
//! let output = pipeline.run(&VitalSigns::new(72, 118, 76, 8.0, SymptomSeverity::None))?;
//! println!("{}", output.classification.tier);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod adapters;
pub mod application;
pub mod domain;
pub mod ports;

pub use application::{Pipeline, PipelineOutput};
pub use domain::{StressTier, SymptomSeverity, VitalSigns};

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Main error type for a pipeline run
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PipelineError {
    #[error("Invalid reading: {0}")]
    Validation(#[from] domain::ValidationError),

    #[error("Classification failed: {0}")]
    Classifier(#[from] ports::ClassifierError),
}
