//! Synthetic training data for the stress forest.
//!
//! Three cohorts (low, medium, high stress) are drawn from normal
//! distributions, then labelled by a deterministic rule: a weighted sum of
//! normalized deviations from the normal range, cut at its tertiles. The
//! forest therefore learns a smoothed version of that rule.

use rand::Rng;
use rand_distr::{Distribution, Poisson, StandardNormal};

use crate::domain::{Parameter, ReferenceTable, SymptomSeverity, FEATURE_COUNT};

/// Label weights per parameter (pipeline order).
const LABEL_WEIGHTS: [f64; FEATURE_COUNT] = [0.30, 0.25, 0.20, 0.15, 0.10];

/// Deviation (in natural units) that counts as one unit of concern.
const DEVIATION_SCALE: [f64; FEATURE_COUNT] = [20.0, 20.0, 10.0, 2.0, 3.0];

/// Normalized deviations are capped so one extreme value cannot dominate.
const DEVIATION_CAP: f64 = 3.0;

/// Distribution parameters of one synthetic cohort.
#[derive(Debug, Clone, Copy)]
struct Cohort {
    heart_rate: (f64, f64),
    systolic: (f64, f64),
    diastolic: (f64, f64),
    sleep: (f64, f64),
    /// Poisson rate of reported symptoms
    symptom_rate: f64,
}

const COHORTS: [Cohort; 3] = [
    Cohort {
        heart_rate: (72.0, 8.0),
        systolic: (115.0, 10.0),
        diastolic: (75.0, 8.0),
        sleep: (8.0, 1.0),
        symptom_rate: 0.5,
    },
    Cohort {
        heart_rate: (85.0, 10.0),
        systolic: (130.0, 12.0),
        diastolic: (85.0, 10.0),
        sleep: (6.0, 1.5),
        symptom_rate: 2.0,
    },
    Cohort {
        heart_rate: (105.0, 15.0),
        systolic: (145.0, 15.0),
        diastolic: (95.0, 12.0),
        sleep: (4.0, 1.5),
        symptom_rate: 4.0,
    },
];

/// Errors while generating training data.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TrainingError {
    #[error("Training set is empty (samples per cohort must be > 0)")]
    EmptyTrainingSet,

    #[error("Invalid cohort distribution: {0}")]
    InvalidDistribution(String),
}

/// Generated rows (raw feature order) with ordinal labels 0, 1, 2.
#[derive(Debug, Clone)]
pub(crate) struct TrainingSet {
    pub rows: Vec<[f64; FEATURE_COUNT]>,
    pub labels: Vec<f64>,
}

impl TrainingSet {
    /// Number of rows per label.
    #[must_use]
    pub fn label_counts(&self) -> [usize; 3] {
        let mut counts = [0; 3];
        for &label in &self.labels {
            counts[(label as usize).min(2)] += 1;
        }
        counts
    }
}

fn normal<R: Rng + ?Sized>(rng: &mut R, (mean, sd): (f64, f64)) -> f64 {
    let z: f64 = rng.sample(StandardNormal);
    mean + sd * z
}

fn draw_row<R: Rng + ?Sized>(
    rng: &mut R,
    cohort: &Cohort,
    symptoms: &Poisson<f64>,
) -> [f64; FEATURE_COUNT] {
    let heart_rate = normal(rng, cohort.heart_rate).round().clamp(50.0, 180.0);
    let systolic = normal(rng, cohort.systolic).round().clamp(90.0, 200.0);
    let diastolic = normal(rng, cohort.diastolic)
        .round()
        .clamp(60.0, 120.0)
        .min(systolic - 10.0);
    let sleep = normal(rng, cohort.sleep).clamp(2.0, 12.0);
    let count = symptoms.sample(rng).min(7.0) as u32;
    let severity = SymptomSeverity::from_symptom_count(count);

    [
        heart_rate,
        systolic,
        diastolic,
        sleep,
        f64::from(severity.ordinal()),
    ]
}

/// Weighted sum of capped, normalized deviations from the normal range.
#[must_use]
pub(crate) fn rule_score(row: &[f64; FEATURE_COUNT]) -> f64 {
    let table = ReferenceTable::ADULT;
    Parameter::ALL
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let range = table.range(*p);
            let deviation = range.deficit(row[i]) + range.excess(row[i]);
            LABEL_WEIGHTS[i] * (deviation / DEVIATION_SCALE[i]).min(DEVIATION_CAP)
        })
        .sum()
}

/// Value at quantile `q` of an ascending slice.
pub(crate) fn quantile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let pos = ((sorted.len() - 1) as f64 * q).round() as usize;
    sorted[pos.min(sorted.len() - 1)]
}

/// Generate `per_cohort` rows for each cohort and label them.
///
/// # Errors
/// Returns `TrainingError::EmptyTrainingSet` if `per_cohort` is 0.
pub(crate) fn generate<R: Rng + ?Sized>(
    rng: &mut R,
    per_cohort: usize,
) -> Result<TrainingSet, TrainingError> {
    if per_cohort == 0 {
        return Err(TrainingError::EmptyTrainingSet);
    }

    let mut rows = Vec::with_capacity(per_cohort * COHORTS.len());
    for cohort in &COHORTS {
        let symptoms = Poisson::new(cohort.symptom_rate)
            .map_err(|e| TrainingError::InvalidDistribution(e.to_string()))?;
        for _ in 0..per_cohort {
            rows.push(draw_row(rng, cohort, &symptoms));
        }
    }

    let scores: Vec<f64> = rows.iter().map(rule_score).collect();
    let mut sorted = scores.clone();
    sorted.sort_by(f64::total_cmp);
    let low_cut = quantile(&sorted, 1.0 / 3.0);
    let high_cut = quantile(&sorted, 2.0 / 3.0);

    let labels = scores
        .iter()
        .map(|&s| {
            if s <= low_cut {
                0.0
            } else if s <= high_cut {
                1.0
            } else {
                2.0
            }
        })
        .collect();

    Ok(TrainingSet { rows, labels })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    #[test]
    fn test_rule_score_anchors() {
        assert_eq!(rule_score(&[72.0, 118.0, 76.0, 8.0, 0.0]), 0.0);
        let stressed = rule_score(&[115.0, 150.0, 95.0, 4.5, 3.0]);
        assert!((stressed - 1.1875).abs() < 1e-9);
    }

    #[test]
    fn test_generation_is_reproducible() {
        let a = generate(&mut ChaCha20Rng::seed_from_u64(42), 50).expect("Should generate");
        let b = generate(&mut ChaCha20Rng::seed_from_u64(42), 50).expect("Should generate");
        assert_eq!(a.rows, b.rows);
        assert_eq!(a.labels, b.labels);
    }

    #[test]
    fn test_rows_respect_bounds() {
        let set = generate(&mut ChaCha20Rng::seed_from_u64(3), 200).expect("Should generate");
        assert_eq!(set.rows.len(), 600);
        for row in &set.rows {
            assert!((50.0..=180.0).contains(&row[0]));
            assert!(row[1] >= row[2] + 10.0);
            assert!((2.0..=12.0).contains(&row[3]));
            assert!((0.0..=3.0).contains(&row[4]));
        }
    }

    #[test]
    fn test_labels_roughly_balanced() {
        let set = generate(&mut ChaCha20Rng::seed_from_u64(42), 500).expect("Should generate");
        let counts = set.label_counts();
        for count in counts {
            assert!(count > 350 && count < 650, "unbalanced labels: {counts:?}");
        }
    }

    #[test]
    fn test_empty_set_rejected() {
        let err = generate(&mut ChaCha20Rng::seed_from_u64(1), 0).unwrap_err();
        assert!(matches!(err, TrainingError::EmptyTrainingSet));
    }
}
