//! Life-table estimation of cohort default intensities
//!
//! Converts per-month default/survival-exit counts into one annualized
//! default intensity per cohort using the discrete-time actuarial method:
//! monthly hazards from the run-out of the risk set, summed past the
//! seasoning window, divided by the vintage's observation span, and mapped
//! to a one-year probability under an exponential survival assumption.

use chrono::{Datelike, NaiveDate};

use super::report::{IntensityReport, IntensityRow, SkippedCohort};
use crate::cohort::{CohortBuckets, CohortIndex, CohortKey};
use crate::error::AnalysisError;

/// Elapsed months excluded from the hazard sum while a loan seasons.
/// Matches the population filter: loans observed for fewer months carry no
/// hazard information.
pub const DEFAULT_SEASONING_MONTHS: u32 = 3;

/// Configuration for an intensity run
#[derive(Debug, Clone)]
pub struct IntensityConfig {
    /// Analysis date; fixes observation windows and the annualization
    /// divisor. An explicit parameter so repeated runs are reproducible.
    pub as_of: NaiveDate,

    /// Seasoning window in months
    pub seasoning_months: u32,
}

impl IntensityConfig {
    pub fn new(as_of: NaiveDate) -> Self {
        Self {
            as_of,
            seasoning_months: DEFAULT_SEASONING_MONTHS,
        }
    }
}

/// Cohort default-intensity estimator
pub struct IntensityEngine {
    config: IntensityConfig,
}

impl IntensityEngine {
    pub fn new(config: IntensityConfig) -> Self {
        Self { config }
    }

    /// Estimate annual default intensities for every cohort in the index.
    ///
    /// Cohort-level faults (no survival exits, vintage too recent) land in
    /// the skipped list with the cohort's population; the remaining cohorts
    /// are always finished.
    pub fn estimate(&self, index: &CohortIndex) -> IntensityReport {
        let mut report = IntensityReport::default();

        for (key, buckets) in index.iter() {
            match self.estimate_cohort(key, buckets) {
                Ok(row) => report.rows.push(row),
                Err(fault) => report.skipped.push(SkippedCohort {
                    key: *key,
                    population: buckets.population,
                    fault,
                }),
            }
        }

        report
    }

    /// Life-table computation for a single cohort.
    fn estimate_cohort(
        &self,
        key: &CohortKey,
        buckets: &CohortBuckets,
    ) -> Result<IntensityRow, AnalysisError> {
        let max_month = buckets
            .max_exit_month()
            .ok_or(AnalysisError::EmptyCohort(*key))?;
        let divisor = self.annualization_divisor(key)?;

        let at_risk = at_risk_runout(&buckets.surviving_exits[..=max_month]);

        // Hazard at month m is conditional on surviving to the start of m:
        // the denominator holds loans that will later exit alive plus those
        // defaulting exactly at m. Months with no recorded defaults
        // contribute zero. Defaults recorded past the last survival exit
        // fall outside the life table.
        let mut cumulative_hazard = 0.0f64;
        for month in self.config.seasoning_months as usize..=max_month {
            let defaulted = buckets.defaulted_at(month);
            if defaulted == 0 {
                continue;
            }
            let denominator = at_risk[month] + defaulted;
            if denominator > 0 {
                cumulative_hazard += f64::from(defaulted) / f64::from(denominator);
            }
        }

        let avg_monthly_hazard = cumulative_hazard / f64::from(divisor);
        let annual_default_intensity = 1.0 - (-12.0 * avg_monthly_hazard).exp();

        Ok(IntensityRow {
            key: *key,
            annual_default_intensity,
            recovery_rate: None,
            population: buckets.population,
        })
    }

    /// Cohort-months of observation for a vintage, net of seasoning.
    ///
    /// A vintage issued in a past year has been observable for
    /// `12 * (full years between) + (12 - seasoning) + current month`
    /// months; the current-year vintage for `current month - seasoning`.
    /// With the default seasoning of 3 these are the familiar
    /// `... + 9 + month` and `month - 3` spans.
    fn annualization_divisor(&self, key: &CohortKey) -> Result<u32, AnalysisError> {
        let current_year = self.config.as_of.year();
        let current_month = self.config.as_of.month() as i32;
        let seasoning = self.config.seasoning_months as i32;

        let divisor = if key.issue_year < current_year {
            12 * (current_year - key.issue_year - 1) + (12 - seasoning) + current_month
        } else if key.issue_year == current_year {
            current_month - seasoning
        } else {
            // Vintage dated after the analysis date: nothing observed
            0
        };

        if divisor <= 0 {
            return Err(AnalysisError::TooRecentVintage { key: *key, divisor });
        }
        Ok(divisor as u32)
    }
}

/// Number at risk per month from the survival-exit counts: loans exiting
/// alive at or after month `m` are still at risk at `m`. One descending
/// pass, reusing the running sum.
fn at_risk_runout(surviving_exits: &[u32]) -> Vec<u32> {
    let mut at_risk = vec![0u32; surviving_exits.len()];
    let mut alive = 0u32;
    for month in (0..surviving_exits.len()).rev() {
        alive += surviving_exits[month];
        at_risk[month] = alive;
    }
    at_risk
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loan::{Country, LoanRecord, Rating, RawLoan};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn loan(
        id: u32,
        rating: Rating,
        issue: NaiveDate,
        default: Option<NaiveDate>,
        end: Option<NaiveDate>,
        as_of: NaiveDate,
    ) -> LoanRecord {
        LoanRecord::normalize(
            RawLoan {
                loan_id: format!("L{id}"),
                rating,
                country: Country::EE,
                issue_date: issue,
                default_date: default,
                contract_end_date: end,
                planned_duration_months: 36,
                a_priori_pd: 0.08,
                exposure_at_default: 0.0,
                amount_recovered: 0.0,
            },
            as_of,
        )
        .unwrap()
    }

    fn engine(as_of: NaiveDate) -> IntensityEngine {
        IntensityEngine::new(IntensityConfig::new(as_of))
    }

    #[test]
    fn test_at_risk_runout_is_non_increasing() {
        let at_risk = at_risk_runout(&[0, 3, 0, 5, 2, 0, 1]);

        assert_eq!(at_risk, vec![11, 11, 8, 8, 3, 1, 1]);
        for window in at_risk.windows(2) {
            assert!(window[0] >= window[1]);
        }
    }

    #[test]
    fn test_single_cohort_life_table() {
        // 100 loans issued Jan 2018: 10 default at month 6, 90 exit alive at
        // month 40 (contract ends May 2021, observed July 2021 = month 42)
        let as_of = date(2021, 7, 20);
        let issue = date(2018, 1, 10);
        let mut records = Vec::new();
        for id in 0..10 {
            records.push(loan(id, Rating::B, issue, Some(date(2018, 7, 5)), None, as_of));
        }
        for id in 10..100 {
            records.push(loan(id, Rating::B, issue, None, Some(date(2021, 5, 5)), as_of));
        }

        let index = CohortIndex::build(&records);
        let report = engine(as_of).estimate(&index);

        assert_eq!(report.rows.len(), 1);
        assert!(report.skipped.is_empty());

        let row = &report.rows[0];
        assert_eq!(row.population, 100);

        // h[6] = 10 / (90 + 10) = 0.10, all other months zero.
        // Divisor for the 2018 vintage seen from July 2021:
        // 12 * (2021 - 2018 - 1) + 9 + 7 = 40
        let expected = 1.0 - (-12.0 * 0.10 / 40.0f64).exp();
        assert!(
            (row.annual_default_intensity - expected).abs() < 1e-12,
            "intensity {} != {}",
            row.annual_default_intensity,
            expected
        );
        assert!((row.annual_default_intensity - 0.029554).abs() < 1e-6);
    }

    #[test]
    fn test_seasoning_window_excludes_early_defaults() {
        // Defaults only in months 0-2 are burn-in and never enter the sum
        let as_of = date(2021, 7, 20);
        let issue = date(2019, 3, 10);
        let mut records = vec![
            loan(0, Rating::D, issue, Some(date(2019, 3, 25)), None, as_of),
            loan(1, Rating::D, issue, Some(date(2019, 4, 25)), None, as_of),
            loan(2, Rating::D, issue, Some(date(2019, 5, 25)), None, as_of),
        ];
        for id in 3..20 {
            records.push(loan(id, Rating::D, issue, None, None, as_of));
        }

        let index = CohortIndex::build(&records);
        let report = engine(as_of).estimate(&index);

        assert_eq!(report.rows.len(), 1);
        assert_eq!(report.rows[0].annual_default_intensity, 0.0);
        assert_eq!(report.rows[0].population, 20);
    }

    #[test]
    fn test_zero_defaults_mean_zero_intensity() {
        let as_of = date(2021, 7, 20);
        let records: Vec<_> = (0..50)
            .map(|id| loan(id, Rating::AA, date(2017, 2, 1), None, None, as_of))
            .collect();

        let index = CohortIndex::build(&records);
        let report = engine(as_of).estimate(&index);

        assert_eq!(report.rows[0].annual_default_intensity, 0.0);
    }

    #[test]
    fn test_intensity_stays_below_one() {
        // Half the cohort defaults at every observed month
        let as_of = date(2021, 7, 20);
        let issue = date(2018, 1, 10);
        let mut records = Vec::new();
        for id in 0..40 {
            let default_month = 4 + (id % 8);
            records.push(loan(
                id,
                Rating::HR,
                issue,
                Some(date(2018, 1 + default_month, 5)),
                None,
                as_of,
            ));
        }
        for id in 40..50 {
            records.push(loan(id, Rating::HR, issue, None, None, as_of));
        }

        let index = CohortIndex::build(&records);
        let report = engine(as_of).estimate(&index);

        let intensity = report.rows[0].annual_default_intensity;
        assert!(intensity > 0.0 && intensity < 1.0);
    }

    #[test]
    fn test_cohort_without_survival_exits_is_skipped() {
        // Every loan defaulted: no survival exits to anchor a life table
        let as_of = date(2021, 7, 20);
        let records: Vec<_> = (0..5)
            .map(|id| loan(id, Rating::F, date(2018, 1, 10), Some(date(2019, 1, 5)), None, as_of))
            .collect();

        let index = CohortIndex::build(&records);
        let report = engine(as_of).estimate(&index);

        assert!(report.rows.is_empty());
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].population, 5);
        assert!(matches!(report.skipped[0].fault, AnalysisError::EmptyCohort(_)));
    }

    #[test]
    fn test_too_recent_vintage_is_flagged_not_divided() {
        // Current-year vintage in March: divisor would be 3 - 3 = 0
        let as_of = date(2021, 3, 25);
        let records: Vec<_> = (0..5)
            .map(|id| loan(id, Rating::B, date(2021, 1, 4), None, None, as_of))
            .collect();

        let index = CohortIndex::build(&records);
        let report = engine(as_of).estimate(&index);

        assert!(report.rows.is_empty());
        assert_eq!(report.skipped.len(), 1);
        assert!(matches!(
            report.skipped[0].fault,
            AnalysisError::TooRecentVintage { divisor: 0, .. }
        ));
    }

    #[test]
    fn test_current_year_divisor() {
        // 2021 vintage seen from October 2021: divisor = 10 - 3 = 7
        let as_of = date(2021, 10, 15);
        let issue = date(2021, 1, 10);
        let mut records = vec![loan(0, Rating::C, issue, Some(date(2021, 6, 1)), None, as_of)];
        for id in 1..10 {
            records.push(loan(id, Rating::C, issue, None, None, as_of));
        }

        let index = CohortIndex::build(&records);
        let report = engine(as_of).estimate(&index);

        // h[5] = 1/10, divisor 7
        let expected = 1.0 - (-12.0_f64 * (0.1 / 7.0)).exp();
        assert!((report.rows[0].annual_default_intensity - expected).abs() < 1e-12);
    }

    #[test]
    fn test_faults_do_not_abort_other_cohorts() {
        let as_of = date(2021, 7, 20);
        let mut records: Vec<_> = (0..5)
            .map(|id| loan(id, Rating::F, date(2018, 1, 10), Some(date(2019, 1, 5)), None, as_of))
            .collect();
        for id in 5..15 {
            records.push(loan(id, Rating::A, date(2018, 1, 10), None, None, as_of));
        }

        let index = CohortIndex::build(&records);
        let report = engine(as_of).estimate(&index);

        assert_eq!(report.rows.len(), 1);
        assert_eq!(report.rows[0].key.rating, Rating::A);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].key.rating, Rating::F);
    }
}
