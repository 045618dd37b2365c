//! Self-reported vital signs and their validated form.
//!
//! Five parameters feed the pipeline: heart rate, systolic and diastolic blood
//! pressure, sleep duration and stress-symptom severity.

use serde::{Deserialize, Serialize};

/// One of the five input parameters, in the fixed pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Parameter {
    HeartRate,
    Systolic,
    Diastolic,
    Sleep,
    Symptoms,
}

impl Parameter {
    /// All parameters in the order used throughout the pipeline.
    pub const ALL: [Parameter; 5] = [
        Self::HeartRate,
        Self::Systolic,
        Self::Diastolic,
        Self::Sleep,
        Self::Symptoms,
    ];

    /// Stable machine-readable name (also the feature name).
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::HeartRate => "heart_rate",
            Self::Systolic => "systolic_bp",
            Self::Diastolic => "diastolic_bp",
            Self::Sleep => "sleep_duration",
            Self::Symptoms => "symptom_severity",
        }
    }

    /// Human-readable label.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::HeartRate => "Heart rate",
            Self::Systolic => "Systolic blood pressure",
            Self::Diastolic => "Diastolic blood pressure",
            Self::Sleep => "Sleep duration",
            Self::Symptoms => "Stress symptoms",
        }
    }

    #[must_use]
    pub fn unit(&self) -> &'static str {
        match self {
            Self::HeartRate => "bpm",
            Self::Systolic | Self::Diastolic => "mmHg",
            Self::Sleep => "hours",
            Self::Symptoms => "severity",
        }
    }
}

impl std::fmt::Display for Parameter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Self-reported stress-symptom severity.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum SymptomSeverity {
    #[default]
    None,
    Mild,
    Moderate,
    Severe,
}

impl SymptomSeverity {
    pub const ALL: [SymptomSeverity; 4] = [Self::None, Self::Mild, Self::Moderate, Self::Severe];

    /// Ordinal encoding (0 = None .. 3 = Severe).
    #[must_use]
    pub fn ordinal(&self) -> u8 {
        match self {
            Self::None => 0,
            Self::Mild => 1,
            Self::Moderate => 2,
            Self::Severe => 3,
        }
    }

    /// Inverse of [`ordinal`](Self::ordinal). Values above 3 saturate to `Severe`.
    #[must_use]
    pub fn from_ordinal(ordinal: u8) -> Self {
        match ordinal {
            0 => Self::None,
            1 => Self::Mild,
            2 => Self::Moderate,
            _ => Self::Severe,
        }
    }

    /// Bucket a count of reported symptoms into a severity.
    ///
    /// 0 → None, 1-2 → Mild, 3-4 → Moderate, 5+ → Severe.
    #[must_use]
    pub fn from_symptom_count(count: u32) -> Self {
        match count {
            0 => Self::None,
            1..=2 => Self::Mild,
            3..=4 => Self::Moderate,
            _ => Self::Severe,
        }
    }
}

impl std::fmt::Display for SymptomSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "None"),
            Self::Mild => write!(f, "Mild"),
            Self::Moderate => write!(f, "Moderate"),
            Self::Severe => write!(f, "Severe"),
        }
    }
}

impl std::str::FromStr for SymptomSeverity {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "mild" => Ok(Self::Mild),
            "moderate" => Ok(Self::Moderate),
            "severe" => Ok(Self::Severe),
            _ => Err(ValidationError::UnknownSeverity(s.trim().to_string())),
        }
    }
}

/// Raw user-supplied input. Nothing is checked until it passes the validator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VitalSigns {
    /// Resting heart rate in bpm
    pub heart_rate: u16,

    /// Systolic blood pressure in mmHg
    pub systolic: u16,

    /// Diastolic blood pressure in mmHg
    pub diastolic: u16,

    /// Sleep duration in hours (last night)
    pub sleep_hours: f64,

    /// Self-reported stress-symptom severity
    #[serde(default)]
    pub symptoms: SymptomSeverity,
}

impl VitalSigns {
    #[must_use]
    pub fn new(
        heart_rate: u16,
        systolic: u16,
        diastolic: u16,
        sleep_hours: f64,
        symptoms: SymptomSeverity,
    ) -> Self {
        Self {
            heart_rate,
            systolic,
            diastolic,
            sleep_hours,
            symptoms,
        }
    }

    /// Numeric value of one parameter (severity as its ordinal).
    #[must_use]
    pub fn value(&self, parameter: Parameter) -> f64 {
        match parameter {
            Parameter::HeartRate => f64::from(self.heart_rate),
            Parameter::Systolic => f64::from(self.systolic),
            Parameter::Diastolic => f64::from(self.diastolic),
            Parameter::Sleep => self.sleep_hours,
            Parameter::Symptoms => f64::from(self.symptoms.ordinal()),
        }
    }

    /// Pulse pressure (systolic minus diastolic) in mmHg. Negative if inverted.
    #[must_use]
    pub fn pulse_pressure(&self) -> i32 {
        i32::from(self.systolic) - i32::from(self.diastolic)
    }
}

/// Input that passed every domain and cross-field check.
///
/// Only the validator can construct one, so holding a `ValidatedInput` is proof
/// that the bounds hold.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidatedInput {
    vitals: VitalSigns,
    warnings: Vec<String>,
}

impl ValidatedInput {
    pub(crate) fn new(vitals: VitalSigns, warnings: Vec<String>) -> Self {
        Self { vitals, warnings }
    }

    #[must_use]
    pub fn vitals(&self) -> &VitalSigns {
        &self.vitals
    }

    /// Non-fatal relationship warnings raised during validation.
    #[must_use]
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    #[must_use]
    pub fn value(&self, parameter: Parameter) -> f64 {
        self.vitals.value(parameter)
    }
}

/// Structured rejection of a raw input.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field} value {value} is outside the allowed range [{min}, {max}]")]
    OutOfRange {
        field: Parameter,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("{field} must be a finite number")]
    NotFinite { field: Parameter },

    #[error("unknown symptom severity {0:?} (expected none, mild, moderate or severe)")]
    UnknownSeverity(String),

    #[error(
        "systolic pressure {systolic} mmHg must exceed diastolic pressure {diastolic} mmHg by at least {min_gap} mmHg"
    )]
    PulsePressure {
        systolic: u16,
        diastolic: u16,
        min_gap: u16,
    },
}

impl ValidationError {
    /// The fields this rejection refers to, in pipeline order.
    #[must_use]
    pub fn fields(&self) -> Vec<Parameter> {
        match self {
            Self::OutOfRange { field, .. } | Self::NotFinite { field } => vec![*field],
            Self::UnknownSeverity(_) => vec![Parameter::Symptoms],
            Self::PulsePressure { .. } => vec![Parameter::Systolic, Parameter::Diastolic],
        }
    }

    /// The first (primary) field this rejection refers to.
    #[must_use]
    pub fn field(&self) -> Parameter {
        match self {
            Self::OutOfRange { field, .. } | Self::NotFinite { field } => *field,
            Self::UnknownSeverity(_) => Parameter::Symptoms,
            Self::PulsePressure { .. } => Parameter::Systolic,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_parse() {
        assert_eq!("none".parse::<SymptomSeverity>(), Ok(SymptomSeverity::None));
        assert_eq!(" Severe ".parse::<SymptomSeverity>(), Ok(SymptomSeverity::Severe));
        assert_eq!("MODERATE".parse::<SymptomSeverity>(), Ok(SymptomSeverity::Moderate));

        let err = "extreme".parse::<SymptomSeverity>().unwrap_err();
        assert_eq!(err.field(), Parameter::Symptoms);
    }

    #[test]
    fn test_severity_ordering() {
        assert!(SymptomSeverity::None < SymptomSeverity::Mild);
        assert!(SymptomSeverity::Moderate < SymptomSeverity::Severe);
        for s in SymptomSeverity::ALL {
            assert_eq!(SymptomSeverity::from_ordinal(s.ordinal()), s);
        }
    }

    #[test]
    fn test_symptom_count_buckets() {
        assert_eq!(SymptomSeverity::from_symptom_count(0), SymptomSeverity::None);
        assert_eq!(SymptomSeverity::from_symptom_count(2), SymptomSeverity::Mild);
        assert_eq!(SymptomSeverity::from_symptom_count(3), SymptomSeverity::Moderate);
        assert_eq!(SymptomSeverity::from_symptom_count(7), SymptomSeverity::Severe);
    }

    #[test]
    fn test_vitals_json() {
        let json = r#"{"heart_rate":72,"systolic":118,"diastolic":76,"sleep_hours":8.0,"symptoms":"mild"}"#;
        let vitals: VitalSigns = serde_json::from_str(json).expect("Should parse");
        assert_eq!(vitals.symptoms, SymptomSeverity::Mild);
        assert_eq!(vitals.pulse_pressure(), 42);

        let no_symptoms = r#"{"heart_rate":72,"systolic":118,"diastolic":76,"sleep_hours":8.0}"#;
        let vitals: VitalSigns = serde_json::from_str(no_symptoms).expect("Should parse");
        assert_eq!(vitals.symptoms, SymptomSeverity::None);
    }

    #[test]
    fn test_pulse_pressure_error_fields() {
        let err = ValidationError::PulsePressure {
            systolic: 100,
            diastolic: 95,
            min_gap: 10,
        };
        assert_eq!(err.fields(), vec![Parameter::Systolic, Parameter::Diastolic]);
        assert!(err.to_string().contains("100"));
    }
}
