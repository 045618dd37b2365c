//! Rule-based risk assessment and triage priority.
//!
//! The risk score here is computed from band weights alone. It exists next to
//! the classifier's output, never in place of it.

use serde::Serialize;

use super::classification::StressTier;

/// Category of the rule-based risk score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum RiskCategory {
    Low,
    Moderate,
    High,
}

impl RiskCategory {
    /// Score ≤ 0.4 is Low, ≤ 0.7 Moderate, above that High.
    #[must_use]
    pub fn from_score(score: f64) -> Self {
        if score <= 0.4 {
            Self::Low
        } else if score <= 0.7 {
            Self::Moderate
        } else {
            Self::High
        }
    }
}

impl std::fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "Low Risk"),
            Self::Moderate => write!(f, "Moderate Risk"),
            Self::High => write!(f, "High Risk"),
        }
    }
}

/// Explainable risk score derived from parameter bands.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskAssessment {
    /// Weighted band score in [0, 1]
    pub score: f64,
    pub category: RiskCategory,
    /// One entry per out-of-range parameter, in pipeline order
    pub risk_factors: Vec<String>,
}

/// Triage label combining the stress tier with the rule-based score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum MedicalPriority {
    Low,
    Medium,
    High,
    Critical,
}

impl MedicalPriority {
    #[must_use]
    pub fn determine(tier: StressTier, risk_score: f64) -> Self {
        if tier == StressTier::High && risk_score > 0.7 {
            Self::Critical
        } else if tier == StressTier::High || risk_score > 0.5 {
            Self::High
        } else if tier == StressTier::Medium || risk_score > 0.3 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    #[must_use]
    pub fn action_required(&self) -> &'static str {
        match self {
            Self::Critical => "Immediate medical attention required",
            Self::High => "Urgent medical consultation recommended",
            Self::Medium => "Medical follow-up advised",
            Self::Low => "Continue monitoring",
        }
    }
}

impl std::fmt::Display for MedicalPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "LOW"),
            Self::Medium => write!(f, "MEDIUM"),
            Self::High => write!(f, "HIGH"),
            Self::Critical => write!(f, "CRITICAL"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_risk_category_thresholds() {
        assert_eq!(RiskCategory::from_score(0.0), RiskCategory::Low);
        assert_eq!(RiskCategory::from_score(0.4), RiskCategory::Low);
        assert_eq!(RiskCategory::from_score(0.5), RiskCategory::Moderate);
        assert_eq!(RiskCategory::from_score(0.71), RiskCategory::High);
    }

    #[test]
    fn test_priority_matrix() {
        assert_eq!(
            MedicalPriority::determine(StressTier::High, 0.8),
            MedicalPriority::Critical
        );
        assert_eq!(
            MedicalPriority::determine(StressTier::High, 0.2),
            MedicalPriority::High
        );
        assert_eq!(
            MedicalPriority::determine(StressTier::Low, 0.6),
            MedicalPriority::High
        );
        assert_eq!(
            MedicalPriority::determine(StressTier::Medium, 0.0),
            MedicalPriority::Medium
        );
        assert_eq!(
            MedicalPriority::determine(StressTier::Low, 0.1),
            MedicalPriority::Low
        );
    }
}
