//! Session log: In-memory history of assessed readings with trend analysis.
//!
//! Nothing here is persisted. Entries are append-only until `clear`.

use serde::Serialize;

use super::PipelineOutput;
use crate::domain::VitalSigns;

/// Heart rate slope (bpm per reading) that counts as a trend.
const HEART_RATE_TREND: f64 = 2.0;

/// Systolic slope (mmHg per reading) that counts as a trend.
const SYSTOLIC_TREND: f64 = 3.0;

/// One assessed reading.
#[derive(Debug, Clone, Serialize)]
pub struct SessionEntry {
    /// Random v4 id
    pub id: String,
    pub recorded_at: chrono::DateTime<chrono::Utc>,
    pub vitals: VitalSigns,
    pub output: PipelineOutput,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TrendDirection {
    Increasing,
    Decreasing,
    Stable,
}

impl TrendDirection {
    fn from_slope(slope: f64, threshold: f64) -> Self {
        if slope > threshold {
            Self::Increasing
        } else if slope < -threshold {
            Self::Decreasing
        } else {
            Self::Stable
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Prognosis {
    Favorable,
    Concerning,
    Stable,
}

impl Prognosis {
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Favorable => "Improving trends; current interventions appear to help",
            Self::Concerning => "Worsening trends; intervention recommended",
            Self::Stable => "Mixed or flat trends; continue monitoring",
        }
    }
}

/// Trends over a session with at least two readings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendSummary {
    pub readings: usize,
    /// First vs last stress tier
    pub stress: TrendDirection,
    pub heart_rate: TrendDirection,
    /// Least-squares slope in bpm per reading
    pub heart_rate_slope: f64,
    pub systolic: TrendDirection,
    /// Least-squares slope in mmHg per reading
    pub systolic_slope: f64,
    pub prognosis: Prognosis,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum TrendAnalysis {
    InsufficientData { readings: usize },
    Available(TrendSummary),
}

impl TrendAnalysis {
    #[must_use]
    pub fn summary(&self) -> Option<&TrendSummary> {
        match self {
            Self::Available(summary) => Some(summary),
            Self::InsufficientData { .. } => None,
        }
    }
}

/// Ordered log of assessed readings.
#[derive(Debug, Clone, Default)]
pub struct SessionLog {
    entries: Vec<SessionEntry>,
}

impl SessionLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a reading and its assessment.
    pub fn record(&mut self, vitals: VitalSigns, output: PipelineOutput) -> &SessionEntry {
        let entry = SessionEntry {
            id: uuid_v4(),
            recorded_at: chrono::Utc::now(),
            vitals,
            output,
        };
        tracing::debug!("Recorded session entry {}", entry.id);
        self.entries.push(entry);
        &self.entries[self.entries.len() - 1]
    }

    #[must_use]
    pub fn entries(&self) -> &[SessionEntry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn latest(&self) -> Option<&SessionEntry> {
        self.entries.last()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Direction of stress and vitals across the session.
    #[must_use]
    pub fn trend(&self) -> TrendAnalysis {
        let (Some(first), Some(last)) = (self.entries.first(), self.entries.last()) else {
            return TrendAnalysis::InsufficientData { readings: 0 };
        };
        if self.entries.len() < 2 {
            return TrendAnalysis::InsufficientData {
                readings: self.entries.len(),
            };
        }

        let first_tier = first.output.classification.tier;
        let last_tier = last.output.classification.tier;
        let stress = match last_tier.cmp(&first_tier) {
            std::cmp::Ordering::Greater => TrendDirection::Increasing,
            std::cmp::Ordering::Less => TrendDirection::Decreasing,
            std::cmp::Ordering::Equal => TrendDirection::Stable,
        };

        let heart_rates: Vec<f64> = self
            .entries
            .iter()
            .map(|e| f64::from(e.vitals.heart_rate))
            .collect();
        let systolic: Vec<f64> = self
            .entries
            .iter()
            .map(|e| f64::from(e.vitals.systolic))
            .collect();

        let heart_rate_slope = slope(&heart_rates);
        let systolic_slope = slope(&systolic);
        let heart_rate = TrendDirection::from_slope(heart_rate_slope, HEART_RATE_TREND);
        let systolic_dir = TrendDirection::from_slope(systolic_slope, SYSTOLIC_TREND);

        let signals = [stress, heart_rate, systolic_dir];
        let improving = signals
            .iter()
            .filter(|d| **d == TrendDirection::Decreasing)
            .count();
        let worsening = signals
            .iter()
            .filter(|d| **d == TrendDirection::Increasing)
            .count();
        let prognosis = match improving.cmp(&worsening) {
            std::cmp::Ordering::Greater => Prognosis::Favorable,
            std::cmp::Ordering::Less => Prognosis::Concerning,
            std::cmp::Ordering::Equal => Prognosis::Stable,
        };

        TrendAnalysis::Available(TrendSummary {
            readings: self.entries.len(),
            stress,
            heart_rate,
            heart_rate_slope,
            systolic: systolic_dir,
            systolic_slope,
            prognosis,
        })
    }
}

/// Least-squares slope of `values` against their index.
fn slope(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    if values.len() < 2 {
        return 0.0;
    }
    let mean_x = (n - 1.0) / 2.0;
    let mean_y = values.iter().sum::<f64>() / n;
    let (num, den) = values
        .iter()
        .enumerate()
        .fold((0.0, 0.0), |(num, den), (i, &y)| {
            let dx = i as f64 - mean_x;
            (num + dx * (y - mean_y), den + dx * dx)
        });
    if den == 0.0 {
        0.0
    } else {
        num / den
    }
}

/// Generate a random (v4) UUID string.
///
/// Uses ChaCha20Rng seeded from OS entropy.
fn uuid_v4() -> String {
    use rand::Rng;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    let mut rng = ChaCha20Rng::from_entropy();
    let bytes: [u8; 16] = rng.gen();

    format!(
        "{:02x}{:02x}{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}{:02x}{:02x}{:02x}{:02x}",
        bytes[0], bytes[1], bytes[2], bytes[3],
        bytes[4], bytes[5],
        (bytes[6] & 0x0f) | 0x40, bytes[7],
        (bytes[8] & 0x3f) | 0x80, bytes[9],
        bytes[10], bytes[11], bytes[12], bytes[13], bytes[14], bytes[15]
    )
}
