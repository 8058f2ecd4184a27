//! Result tables produced by the intensity engine

use serde::{Deserialize, Serialize};

use crate::cohort::CohortKey;
use crate::error::AnalysisError;

/// One cohort's estimate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntensityRow {
    /// (rating, issue year, planned duration)
    pub key: CohortKey,

    /// One-year cumulative default probability implied by the cohort's
    /// average monthly hazard; in [0, 1)
    pub annual_default_intensity: f64,

    /// Recovered share of defaulted exposure; `None` when the cohort has no
    /// defaulted exposure (presented as "n/a", never as 0)
    pub recovery_rate: Option<f64>,

    /// Loans behind the estimate, defaulted or not
    pub population: u32,
}

/// A cohort the engine could not estimate, with the fault that excluded it
#[derive(Debug, Clone)]
pub struct SkippedCohort {
    pub key: CohortKey,
    pub population: u32,
    pub fault: AnalysisError,
}

/// Complete output of an intensity run
#[derive(Debug, Clone, Default)]
pub struct IntensityReport {
    /// Estimated cohorts in (rating, issue year, duration) order
    pub rows: Vec<IntensityRow>,

    /// Cohorts excluded per-cohort; never aborts the rest of the run
    pub skipped: Vec<SkippedCohort>,
}

impl IntensityReport {
    /// Total loans behind the estimated rows
    pub fn total_population(&self) -> u32 {
        self.rows.iter().map(|row| row.population).sum()
    }

    pub fn find(&self, key: &CohortKey) -> Option<&IntensityRow> {
        self.rows.iter().find(|row| &row.key == key)
    }
}
