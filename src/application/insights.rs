//! Insights engine: Selects recommendations from a static knowledge base.
//!
//! Output order is fixed: the tier recommendation, then one entry per
//! out-of-range parameter in pipeline order. Repeated text is emitted once.
//! Protective factors are listed separately and never affect the tier.

use crate::domain::{
    Band, ClassificationResult, Insight, InsightSet, InsightSource, Parameter, ParameterBands,
    Side, StressTier, ValidatedInput,
};

/// Shared by every Critical band regardless of parameter.
pub const CRITICAL_TEXT: &str = "Seek immediate medical attention";

/// Used when the knowledge base has no entry for a band.
const FALLBACK_TEXT: &str = "Consult a healthcare provider";

struct Entry {
    parameter: Parameter,
    side: Side,
    band: Band,
    text: &'static str,
}

const fn entry(parameter: Parameter, side: Side, band: Band, text: &'static str) -> Entry {
    Entry {
        parameter,
        side,
        band,
        text,
    }
}

#[rustfmt::skip]
static KNOWLEDGE_BASE: &[Entry] = &[
    entry(Parameter::HeartRate, Side::High, Band::Borderline, "Practice relaxation techniques such as slow breathing"),
    entry(Parameter::HeartRate, Side::High, Band::Abnormal, "Practice relaxation techniques; consider cardiovascular evaluation"),
    entry(Parameter::HeartRate, Side::Low, Band::Borderline, "Monitor for dizziness or fatigue"),
    entry(Parameter::HeartRate, Side::Low, Band::Abnormal, "Monitor for symptoms; consider cardiac evaluation if symptomatic"),
    entry(Parameter::Systolic, Side::High, Band::Borderline, "Reduce sodium intake and increase physical activity"),
    entry(Parameter::Systolic, Side::High, Band::Abnormal, "Reduce sodium intake; monitor blood pressure regularly"),
    entry(Parameter::Systolic, Side::Low, Band::Borderline, "Increase fluid intake; monitor for dizziness"),
    entry(Parameter::Systolic, Side::Low, Band::Abnormal, "Increase fluid intake; monitor for dizziness"),
    entry(Parameter::Diastolic, Side::High, Band::Borderline, "Reduce sodium intake and increase physical activity"),
    entry(Parameter::Diastolic, Side::High, Band::Abnormal, "Lifestyle modifications; monitor blood pressure regularly"),
    entry(Parameter::Diastolic, Side::Low, Band::Borderline, "Ensure adequate hydration"),
    entry(Parameter::Diastolic, Side::Low, Band::Abnormal, "Monitor for symptoms; ensure adequate hydration"),
    entry(Parameter::Sleep, Side::Low, Band::Borderline, "Improve sleep hygiene; establish a regular sleep schedule"),
    entry(Parameter::Sleep, Side::Low, Band::Abnormal, "Aim for 7-9 hours of sleep; limit screens and caffeine before bed"),
    entry(Parameter::Sleep, Side::High, Band::Borderline, "Maintain a regular sleep schedule"),
    entry(Parameter::Sleep, Side::High, Band::Abnormal, "Evaluate for sleep disorders; maintain a regular schedule"),
    entry(Parameter::Symptoms, Side::High, Band::Borderline, "Monitor symptoms and practice stress reduction techniques"),
    entry(Parameter::Symptoms, Side::High, Band::Abnormal, "Implement stress management strategies and consider professional support"),
];

/// Optimal sub-ranges (inclusive) that count in the person's favour.
#[rustfmt::skip]
static PROTECTIVE_RANGES: &[(Parameter, f64, f64, &str)] = &[
    (Parameter::HeartRate, 60.0, 80.0, "Resting heart rate within optimal range"),
    (Parameter::Systolic, 90.0, 115.0, "Blood pressure within optimal range"),
    (Parameter::Sleep, 7.0, 9.0, "Adequate sleep duration supports stress resilience"),
];

fn tier_text(tier: StressTier) -> &'static str {
    match tier {
        StressTier::Low => "Continue current wellness practices",
        StressTier::Medium => "Schedule a follow-up and practice daily stress reduction",
        StressTier::High => "Consult a healthcare provider about stress management soon",
    }
}

fn parameter_text(parameter: Parameter, side: Side, band: Band) -> &'static str {
    if band == Band::Critical {
        return CRITICAL_TEXT;
    }
    KNOWLEDGE_BASE
        .iter()
        .find(|e| e.parameter == parameter && e.side == side && e.band == band)
        .map_or(FALLBACK_TEXT, |e| e.text)
}

/// Stateless recommendation selector.
#[derive(Debug, Clone, Copy, Default)]
pub struct InsightsEngine;

impl InsightsEngine {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Build the ordered, duplicate-free recommendations for one reading.
    #[must_use]
    pub fn generate(&self, result: &ClassificationResult, bands: &ParameterBands) -> InsightSet {
        let mut insights = InsightSet::new();
        insights.push(Insight {
            source: InsightSource::Tier(result.tier),
            text: tier_text(result.tier),
        });

        // BTreeMap iteration is pipeline order.
        for band in bands.values().filter(|b| !b.is_normal()) {
            let side = band.side.unwrap_or(Side::High);
            let added = insights.push(Insight {
                source: InsightSource::Parameter {
                    parameter: band.parameter,
                    band: band.band,
                    side: band.side,
                },
                text: parameter_text(band.parameter, side, band.band),
            });
            if !added {
                tracing::debug!("Skipped repeated recommendation for {}", band.parameter);
            }
        }

        insights
    }

    /// The out-of-range parameter with the largest band weight times model
    /// importance. Ties go to the earlier parameter.
    #[must_use]
    pub fn primary_factor(
        &self,
        result: &ClassificationResult,
        bands: &ParameterBands,
    ) -> Option<Parameter> {
        let mut best: Option<(Parameter, f64)> = None;
        for band in bands.values().filter(|b| !b.is_normal()) {
            let weight = band.risk * result.importance_of(band.parameter.name());
            if best.map_or(true, |(_, w)| weight > w) {
                best = Some((band.parameter, weight));
            }
        }
        best.map(|(parameter, _)| parameter)
    }

    /// Parameters sitting in their optimal sub-range, in pipeline order.
    #[must_use]
    pub fn protective_factors(&self, input: &ValidatedInput) -> Vec<&'static str> {
        PROTECTIVE_RANGES
            .iter()
            .filter(|(parameter, lo, hi, _)| (*lo..=*hi).contains(&input.value(*parameter)))
            .map(|&(_, _, _, text)| text)
            .collect()
    }
}
