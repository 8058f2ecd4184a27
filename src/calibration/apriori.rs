//! A-priori default-probability diagnostics
//!
//! Summarizes the lender's quoted probabilities of default and measures how
//! far the realized intensities drift from them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::cohort::CohortKey;
use crate::intensity::IntensityReport;
use crate::loan::{LoanRecord, Rating};

/// Summary statistics of quoted PDs within one group
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PdSummary {
    pub min: f64,
    pub median: f64,
    pub mean: f64,
    pub max: f64,

    /// Sample standard deviation; `None` below two observations
    pub std_dev: Option<f64>,

    pub count: u32,
}

impl PdSummary {
    /// Summarize a non-empty sample.
    fn from_sample(mut values: Vec<f64>) -> Self {
        values.sort_by(|a, b| a.total_cmp(b));
        let n = values.len();

        let mean = values.iter().sum::<f64>() / n as f64;
        let median = if n % 2 == 1 {
            values[n / 2]
        } else {
            (values[n / 2 - 1] + values[n / 2]) / 2.0
        };
        let std_dev = if n >= 2 {
            let variance =
                values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
            Some(variance.sqrt())
        } else {
            None
        };

        Self {
            min: values[0],
            median,
            mean,
            max: values[n - 1],
            std_dev,
            count: n as u32,
        }
    }
}

/// Quoted-PD summaries per (rating, issue year), ratings in domain order.
pub fn summarize_by_vintage<'a, I>(records: I) -> BTreeMap<(Rating, i32), PdSummary>
where
    I: IntoIterator<Item = &'a LoanRecord>,
{
    let mut samples: BTreeMap<(Rating, i32), Vec<f64>> = BTreeMap::new();
    for record in records {
        samples
            .entry((record.rating, record.issue_year()))
            .or_default()
            .push(record.a_priori_pd);
    }

    samples
        .into_iter()
        .map(|(group, values)| (group, PdSummary::from_sample(values)))
        .collect()
}

/// Mean quoted PD per full cohort key.
pub fn mean_by_cohort<'a, I>(records: I) -> BTreeMap<CohortKey, f64>
where
    I: IntoIterator<Item = &'a LoanRecord>,
{
    let mut sums: BTreeMap<CohortKey, (f64, u32)> = BTreeMap::new();
    for record in records {
        let entry = sums.entry(CohortKey::of(record)).or_insert((0.0, 0));
        entry.0 += record.a_priori_pd;
        entry.1 += 1;
    }

    sums.into_iter()
        .map(|(key, (sum, count))| (key, sum / f64::from(count)))
        .collect()
}

/// Gap between realized intensity and mean quoted PD per cohort.
///
/// Positive values mean the lender underestimated the default risk. Cohorts
/// with an undefined intensity or no quoted PDs are skipped, never treated
/// as zero.
pub fn underestimate(
    report: &IntensityReport,
    mean_pd: &BTreeMap<CohortKey, f64>,
) -> BTreeMap<CohortKey, f64> {
    report
        .rows
        .iter()
        .filter_map(|row| {
            mean_pd
                .get(&row.key)
                .map(|pd| (row.key, row.annual_default_intensity - pd))
        })
        .collect()
}
