//! Application layer: Pipeline stages and their composition.
//!
//! Each stage is a pure function over domain types. The pipeline wires them
//! together around an injected `StressModel`.

mod analyzer;
mod insights;
mod pipeline;
mod session;
mod validator;

pub use analyzer::{clinical_weight, ParameterAnalyzer};
pub use insights::{InsightsEngine, CRITICAL_TEXT};
pub use pipeline::{Pipeline, PipelineOutput};
pub use session::{
    Prognosis, SessionEntry, SessionLog, TrendAnalysis, TrendDirection, TrendSummary,
};
pub use validator::{DataValidator, MIN_PULSE_PRESSURE};
