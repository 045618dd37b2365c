//! Data validator: First pipeline stage.
//!
//! Checks hard physiological bounds in a fixed field order, then the
//! blood-pressure cross-field rule. The first failure wins. Readings that pass
//! may still carry relationship warnings.

use crate::domain::{Parameter, SymptomSeverity, ValidatedInput, ValidationError, VitalSigns};

/// Minimum gap between systolic and diastolic pressure, in mmHg.
pub const MIN_PULSE_PRESSURE: u16 = 10;

/// Hard (sanity) bounds per parameter. These are not clinical ranges.
const HEART_RATE_BOUNDS: (f64, f64) = (30.0, 220.0);
const SYSTOLIC_BOUNDS: (f64, f64) = (60.0, 260.0);
const DIASTOLIC_BOUNDS: (f64, f64) = (30.0, 160.0);
const SLEEP_BOUNDS: (f64, f64) = (0.0, 24.0);

/// Stateless validator for raw readings.
#[derive(Debug, Clone, Copy, Default)]
pub struct DataValidator;

impl DataValidator {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Validate a raw reading.
    ///
    /// # Errors
    /// Returns the first `ValidationError` in field order (heart rate,
    /// systolic, diastolic, sleep, symptoms), then the pulse pressure rule.
    pub fn validate(&self, vitals: &VitalSigns) -> Result<ValidatedInput, ValidationError> {
        check_range(
            Parameter::HeartRate,
            f64::from(vitals.heart_rate),
            HEART_RATE_BOUNDS,
        )?;
        check_range(
            Parameter::Systolic,
            f64::from(vitals.systolic),
            SYSTOLIC_BOUNDS,
        )?;
        check_range(
            Parameter::Diastolic,
            f64::from(vitals.diastolic),
            DIASTOLIC_BOUNDS,
        )?;

        if !vitals.sleep_hours.is_finite() {
            return Err(ValidationError::NotFinite {
                field: Parameter::Sleep,
            });
        }
        check_range(Parameter::Sleep, vitals.sleep_hours, SLEEP_BOUNDS)?;

        // Severity is a closed enum: every value that reached here is valid.

        if u32::from(vitals.systolic) < u32::from(vitals.diastolic) + u32::from(MIN_PULSE_PRESSURE)
        {
            return Err(ValidationError::PulsePressure {
                systolic: vitals.systolic,
                diastolic: vitals.diastolic,
                min_gap: MIN_PULSE_PRESSURE,
            });
        }

        let warnings = relationship_warnings(vitals);
        for warning in &warnings {
            tracing::debug!("Validation warning: {}", warning);
        }

        Ok(ValidatedInput::new(*vitals, warnings))
    }
}

fn check_range(field: Parameter, value: f64, (min, max): (f64, f64)) -> Result<(), ValidationError> {
    if value < min || value > max {
        return Err(ValidationError::OutOfRange {
            field,
            value,
            min,
            max,
        });
    }
    Ok(())
}

/// Plausible but unusual combinations. Never fatal.
fn relationship_warnings(vitals: &VitalSigns) -> Vec<String> {
    let mut warnings = Vec::new();

    let pulse_pressure = vitals.pulse_pressure();
    if pulse_pressure > 80 {
        warnings.push(format!(
            "Wide pulse pressure ({pulse_pressure} mmHg) may indicate arterial stiffness"
        ));
    }

    if vitals.heart_rate > 100 && vitals.systolic < 90 {
        warnings.push("High heart rate with low blood pressure".to_string());
    }

    if vitals.heart_rate < 60 && vitals.systolic > 140 {
        warnings.push("Low heart rate with high blood pressure".to_string());
    }

    if vitals.sleep_hours < 6.0 && vitals.symptoms == SymptomSeverity::None {
        warnings.push("Short sleep reported without any stress symptoms".to_string());
    }

    if vitals.sleep_hours > 9.0 && vitals.symptoms >= SymptomSeverity::Moderate {
        warnings.push("Long sleep with moderate or severe symptoms".to_string());
    }

    warnings
}
