//! Recommendations selected from the static knowledge base.

use serde::Serialize;

use super::band::{Band, Side};
use super::classification::StressTier;
use super::vitals::Parameter;

/// What caused an insight to be selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum InsightSource {
    Tier(StressTier),
    Parameter {
        parameter: Parameter,
        band: Band,
        side: Option<Side>,
    },
}

/// One recommendation. The text borrows from the knowledge base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Insight {
    pub source: InsightSource,
    pub text: &'static str,
}

/// Ordered, duplicate-free recommendations for one reading.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InsightSet {
    entries: Vec<Insight>,
}

impl InsightSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append unless the same text is already present. Returns whether it was added.
    pub fn push(&mut self, insight: Insight) -> bool {
        if self.entries.iter().any(|e| e.text == insight.text) {
            return false;
        }
        self.entries.push(insight);
        true
    }

    #[must_use]
    pub fn entries(&self) -> &[Insight] {
        &self.entries
    }

    pub fn texts(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|e| e.text)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
