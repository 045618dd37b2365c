use std::collections::HashSet;
use std::sync::{Arc, OnceLock};

use proptest::prelude::*;
use stressgauge::adapters::forest::{ForestConfig, RandomForestModel};
use stressgauge::domain::{StressTier, SymptomSeverity, ValidationError, VitalSigns};
use stressgauge::{Pipeline, PipelineError};

fn pipeline() -> Pipeline<RandomForestModel> {
    static MODEL: OnceLock<Arc<RandomForestModel>> = OnceLock::new();
    let model = MODEL.get_or_init(|| {
        Arc::new(RandomForestModel::trained(ForestConfig::default()).expect("Should train"))
    });
    Pipeline::new(Arc::clone(model))
}

fn severity() -> impl Strategy<Value = SymptomSeverity> {
    prop::sample::select(SymptomSeverity::ALL.to_vec())
}

/// Readings that pass validation.
fn valid_reading() -> impl Strategy<Value = VitalSigns> {
    (30u16..=150)
        .prop_flat_map(|dia| {
            (
                30u16..=220,
                (dia + 10).max(60)..=260,
                Just(dia),
                0.0f64..=24.0,
                severity(),
            )
        })
        .prop_map(|(hr, sys, dia, sleep, symptoms)| VitalSigns::new(hr, sys, dia, sleep, symptoms))
}

fn tier(p: &Pipeline<RandomForestModel>, vitals: &VitalSigns) -> StressTier {
    p.run(vitals).expect("Should run").classification.tier
}

#[test]
fn run_is_deterministic() {
    let p = pipeline();
    proptest!(|(reading in valid_reading())| {
        let first = p.run(&reading).expect("Should run");
        let second = p.run(&reading).expect("Should run");
        prop_assert_eq!(first, second);
    });
}

#[test]
fn higher_heart_rate_never_lowers_tier() {
    let p = pipeline();
    proptest!(|(reading in valid_reading(), hr in 100u16..=215, step in 1u16..=5)| {
        let base = VitalSigns { heart_rate: hr, ..reading };
        let worse = VitalSigns { heart_rate: hr + step, ..reading };
        prop_assert!(tier(&p, &worse) >= tier(&p, &base));
    });
}

#[test]
fn lower_heart_rate_never_lowers_tier() {
    let p = pipeline();
    proptest!(|(reading in valid_reading(), hr in 35u16..=60, step in 1u16..=5)| {
        let base = VitalSigns { heart_rate: hr, ..reading };
        let worse = VitalSigns { heart_rate: hr - step, ..reading };
        prop_assert!(tier(&p, &worse) >= tier(&p, &base));
    });
}

#[test]
fn higher_systolic_never_lowers_tier() {
    let p = pipeline();
    proptest!(|(reading in valid_reading(), step in 1u16..=20)| {
        prop_assume!(reading.systolic >= 120 && reading.systolic + step <= 260);
        let worse = VitalSigns { systolic: reading.systolic + step, ..reading };
        prop_assert!(tier(&p, &worse) >= tier(&p, &reading));
    });
}

#[test]
fn lower_systolic_never_lowers_tier() {
    let p = pipeline();
    proptest!(|(reading in valid_reading(), sys in 65u16..=90, step in 1u16..=5)| {
        let diastolic = reading.diastolic.min(sys - step - 10);
        let base = VitalSigns { systolic: sys, diastolic, ..reading };
        let worse = VitalSigns { systolic: sys - step, diastolic, ..reading };
        prop_assert!(tier(&p, &worse) >= tier(&p, &base));
    });
}

#[test]
fn higher_diastolic_never_lowers_tier() {
    let p = pipeline();
    proptest!(|(reading in valid_reading(), dia in 80u16..=140, step in 1u16..=10)| {
        let systolic = reading.systolic.max(dia + step + 10);
        let base = VitalSigns { systolic, diastolic: dia, ..reading };
        let worse = VitalSigns { systolic, diastolic: dia + step, ..reading };
        prop_assert!(tier(&p, &worse) >= tier(&p, &base));
    });
}

#[test]
fn lower_diastolic_never_lowers_tier() {
    let p = pipeline();
    proptest!(|(reading in valid_reading(), dia in 35u16..=60, step in 1u16..=5)| {
        let systolic = reading.systolic.max(dia + 10);
        let base = VitalSigns { systolic, diastolic: dia, ..reading };
        let worse = VitalSigns { systolic, diastolic: dia - step, ..reading };
        prop_assert!(tier(&p, &worse) >= tier(&p, &base));
    });
}

#[test]
fn longer_sleep_never_lowers_tier() {
    let p = pipeline();
    proptest!(|(reading in valid_reading(), sleep in 9.0f64..=23.5, step in 0.1f64..=0.5)| {
        let base = VitalSigns { sleep_hours: sleep, ..reading };
        let worse = VitalSigns { sleep_hours: sleep + step, ..reading };
        prop_assert!(tier(&p, &worse) >= tier(&p, &base));
    });
}

#[test]
fn tier_is_most_probable_class() {
    let p = pipeline();
    proptest!(|(reading in valid_reading())| {
        let c = p.run(&reading).expect("Should run").classification;
        let best = c.probabilities.iter().copied().fold(f64::MIN, f64::max);
        prop_assert!(c.confidence >= best - 1e-12, "{:?} vs {:?}", c.tier, c.probabilities);
    });
}

#[test]
fn shorter_sleep_never_lowers_tier() {
    let p = pipeline();
    proptest!(|(reading in valid_reading(), sleep in 0.5f64..=7.0, step in 0.1f64..=0.5)| {
        let base = VitalSigns { sleep_hours: sleep, ..reading };
        let worse = VitalSigns { sleep_hours: sleep - step, ..reading };
        prop_assert!(tier(&p, &worse) >= tier(&p, &base));
    });
}

#[test]
fn worse_symptoms_never_lower_tier() {
    let p = pipeline();
    proptest!(|(reading in valid_reading(), a in severity(), b in severity())| {
        let (mild, severe) = if a <= b { (a, b) } else { (b, a) };
        let base = VitalSigns { symptoms: mild, ..reading };
        let worse = VitalSigns { symptoms: severe, ..reading };
        prop_assert!(tier(&p, &worse) >= tier(&p, &base));
    });
}

#[test]
fn insights_are_unique_and_stable() {
    let p = pipeline();
    proptest!(|(reading in valid_reading())| {
        let output = p.run(&reading).expect("Should run");
        let texts: Vec<&str> = output.insights.texts().collect();
        let unique: HashSet<&str> = texts.iter().copied().collect();
        prop_assert_eq!(unique.len(), texts.len());

        let again = p.run(&reading).expect("Should run");
        prop_assert_eq!(output.insights, again.insights);
    });
}

#[test]
fn narrow_pulse_pressure_is_rejected() {
    let p = pipeline();
    proptest!(|(dia in 70u16..=150, offset in -10i32..10, reading in valid_reading())| {
        let sys = u16::try_from(i32::from(dia) + offset).expect("Should fit");
        let vitals = VitalSigns { systolic: sys, diastolic: dia, ..reading };
        let err = p.run(&vitals).unwrap_err();
        prop_assert!(
            matches!(err, PipelineError::Validation(ValidationError::PulsePressure { .. })),
            "unexpected error: {}", err
        );
    });
}
