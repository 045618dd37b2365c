//! Clinical reference ranges and per-parameter bands.

use std::collections::BTreeMap;

use serde::Serialize;

use super::vitals::Parameter;

/// Qualitative classification of a single value against its reference range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Band {
    Normal,
    Borderline,
    Abnormal,
    Critical,
}

impl Band {
    /// Fixed risk weight of the band, in [0, 1].
    #[must_use]
    pub fn risk_weight(&self) -> f64 {
        match self {
            Self::Normal => 0.0,
            Self::Borderline => 0.35,
            Self::Abnormal => 0.7,
            Self::Critical => 1.0,
        }
    }
}

impl std::fmt::Display for Band {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Normal => write!(f, "NORMAL"),
            Self::Borderline => write!(f, "BORDERLINE"),
            Self::Abnormal => write!(f, "ABNORMAL"),
            Self::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// Which side of the normal range a value fell on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Side {
    Low,
    High,
}

/// Band boundaries for one parameter.
///
/// `normal_low..=normal_high` is Normal. Every other boundary belongs to the
/// outer band: a value equal to `high_abnormal` is Abnormal, equal to
/// `high_critical` is Critical (mirrored on the low side).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReferenceRange {
    pub low_critical: f64,
    pub low_abnormal: f64,
    pub normal_low: f64,
    pub normal_high: f64,
    pub high_abnormal: f64,
    pub high_critical: f64,
}

impl ReferenceRange {
    #[must_use]
    pub const fn new(
        low_critical: f64,
        low_abnormal: f64,
        normal_low: f64,
        normal_high: f64,
        high_abnormal: f64,
        high_critical: f64,
    ) -> Self {
        Self {
            low_critical,
            low_abnormal,
            normal_low,
            normal_high,
            high_abnormal,
            high_critical,
        }
    }

    /// Locate `value` in the boundary table.
    #[must_use]
    pub fn classify(&self, value: f64) -> (Band, Option<Side>) {
        if value > self.normal_high {
            let band = if value >= self.high_critical {
                Band::Critical
            } else if value >= self.high_abnormal {
                Band::Abnormal
            } else {
                Band::Borderline
            };
            (band, Some(Side::High))
        } else if value < self.normal_low {
            let band = if value <= self.low_critical {
                Band::Critical
            } else if value <= self.low_abnormal {
                Band::Abnormal
            } else {
                Band::Borderline
            };
            (band, Some(Side::Low))
        } else {
            (Band::Normal, None)
        }
    }

    /// Distance below `normal_low` (0 inside or above the normal range).
    #[must_use]
    pub fn deficit(&self, value: f64) -> f64 {
        (self.normal_low - value).max(0.0)
    }

    /// Distance above `normal_high` (0 inside or below the normal range).
    #[must_use]
    pub fn excess(&self, value: f64) -> f64 {
        (value - self.normal_high).max(0.0)
    }
}

/// Reference ranges for all five parameters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReferenceTable {
    pub heart_rate: ReferenceRange,
    pub systolic: ReferenceRange,
    pub diastolic: ReferenceRange,
    pub sleep: ReferenceRange,
    pub symptoms: ReferenceRange,
}

impl ReferenceTable {
    /// Resting adult ranges.
    pub const ADULT: ReferenceTable = ReferenceTable {
        heart_rate: ReferenceRange::new(40.0, 50.0, 60.0, 100.0, 120.0, 150.0),
        systolic: ReferenceRange::new(80.0, 85.0, 90.0, 120.0, 140.0, 180.0),
        diastolic: ReferenceRange::new(40.0, 50.0, 60.0, 80.0, 90.0, 120.0),
        sleep: ReferenceRange::new(4.0, 6.0, 7.0, 9.0, 11.0, 15.0),
        // Ordinal severity: Mild is borderline, Moderate abnormal, Severe critical.
        symptoms: ReferenceRange::new(0.0, 0.0, 0.0, 0.0, 2.0, 3.0),
    };

    #[must_use]
    pub fn range(&self, parameter: Parameter) -> &ReferenceRange {
        match parameter {
            Parameter::HeartRate => &self.heart_rate,
            Parameter::Systolic => &self.systolic,
            Parameter::Diastolic => &self.diastolic,
            Parameter::Sleep => &self.sleep,
            Parameter::Symptoms => &self.symptoms,
        }
    }
}

impl Default for ReferenceTable {
    fn default() -> Self {
        Self::ADULT
    }
}

/// Band assigned to one parameter of one reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ParameterBand {
    pub parameter: Parameter,

    /// The raw value that was banded
    pub value: f64,

    pub band: Band,

    /// Side of the normal range, `None` when Normal
    pub side: Option<Side>,

    /// Band risk weight in [0, 1]
    pub risk: f64,

    /// Clinical significance weight of the parameter
    pub clinical_weight: f64,
}

impl ParameterBand {
    /// Contribution to the rule-based risk score.
    #[must_use]
    pub fn contribution(&self) -> f64 {
        self.risk * self.clinical_weight
    }

    #[must_use]
    pub fn is_normal(&self) -> bool {
        self.band == Band::Normal
    }
}

/// Bands of one reading, keyed (and iterated) in pipeline order.
pub type ParameterBands = BTreeMap<Parameter, ParameterBand>;

/// Overall status derived from band counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OverallStatus {
    Normal,
    Caution,
    Concerning,
    Critical,
}

impl OverallStatus {
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Normal => "All parameters within acceptable range",
            Self::Caution => "Some parameters need attention",
            Self::Concerning => "Multiple parameters outside normal range",
            Self::Critical => "Immediate medical attention required",
        }
    }
}

/// Band counts of one reading.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BandSummary {
    pub normal: usize,
    pub borderline: usize,
    pub abnormal: usize,
    pub critical: usize,
    pub critical_parameters: Vec<Parameter>,
    pub overall: OverallStatus,
}
