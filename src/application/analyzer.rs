//! Parameter analyzer: Bands each validated parameter against reference ranges.
//!
//! This is the explainable, rule-based path. It never consults the classifier.

use crate::domain::{
    Band, BandSummary, OverallStatus, Parameter, ParameterBand, ParameterBands, ReferenceTable,
    RiskAssessment, RiskCategory, Side, ValidatedInput,
};

/// Clinical significance of each parameter. Sums to 1.0.
#[must_use]
pub fn clinical_weight(parameter: Parameter) -> f64 {
    match parameter {
        Parameter::HeartRate => 0.35,
        Parameter::Systolic => 0.25,
        Parameter::Diastolic => 0.20,
        Parameter::Sleep => 0.15,
        Parameter::Symptoms => 0.05,
    }
}

/// Analyzer over a reference table (adult ranges by default).
#[derive(Debug, Clone, Default)]
pub struct ParameterAnalyzer {
    table: ReferenceTable,
}

impl ParameterAnalyzer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom table, e.g. age- or sex-specific ranges.
    #[must_use]
    pub fn with_table(table: ReferenceTable) -> Self {
        Self { table }
    }

    #[must_use]
    pub fn table(&self) -> &ReferenceTable {
        &self.table
    }

    /// Assign a band to every parameter of the reading.
    #[must_use]
    pub fn analyze(&self, input: &ValidatedInput) -> ParameterBands {
        Parameter::ALL
            .iter()
            .map(|&parameter| {
                let value = input.value(parameter);
                let (band, side) = self.table.range(parameter).classify(value);
                (
                    parameter,
                    ParameterBand {
                        parameter,
                        value,
                        band,
                        side,
                        risk: band.risk_weight(),
                        clinical_weight: clinical_weight(parameter),
                    },
                )
            })
            .collect()
    }

    /// Weighted band score with one risk factor per out-of-range parameter.
    #[must_use]
    pub fn assess_risk(&self, bands: &ParameterBands) -> RiskAssessment {
        let score: f64 = bands.values().map(ParameterBand::contribution).sum();
        let score = score.clamp(0.0, 1.0);

        let risk_factors = bands
            .values()
            .filter(|b| !b.is_normal())
            .map(describe_factor)
            .collect();

        RiskAssessment {
            score,
            category: RiskCategory::from_score(score),
            risk_factors,
        }
    }

    /// Count bands and derive the overall status.
    #[must_use]
    pub fn summarize(&self, bands: &ParameterBands) -> BandSummary {
        let count = |band: Band| bands.values().filter(|b| b.band == band).count();
        let normal = count(Band::Normal);
        let borderline = count(Band::Borderline);
        let abnormal = count(Band::Abnormal);
        let critical = count(Band::Critical);

        let critical_parameters: Vec<Parameter> = bands
            .values()
            .filter(|b| b.band == Band::Critical)
            .map(|b| b.parameter)
            .collect();

        let out_of_range = bands.len() - normal;
        let overall = if critical > 0 {
            OverallStatus::Critical
        } else if out_of_range * 2 > bands.len() {
            OverallStatus::Concerning
        } else if out_of_range > 0 {
            OverallStatus::Caution
        } else {
            OverallStatus::Normal
        };

        BandSummary {
            normal,
            borderline,
            abnormal,
            critical,
            critical_parameters,
            overall,
        }
    }
}

fn describe_factor(band: &ParameterBand) -> String {
    let direction = match (band.parameter, band.side) {
        (Parameter::Sleep, Some(Side::Low)) => "too short",
        (Parameter::Sleep, _) => "too long",
        (Parameter::Symptoms, _) => "reported",
        (_, Some(Side::Low)) => "low",
        (_, _) => "elevated",
    };
    format!(
        "{} {} ({})",
        band.parameter.label(),
        direction,
        band.band.to_string().to_lowercase()
    )
}
