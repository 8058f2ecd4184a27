//! Cohort recovery-rate aggregation over defaulted loans

use std::collections::BTreeMap;

use crate::cohort::CohortKey;
use crate::loan::LoanRecord;

/// Exposure and recovery totals for one cohort's defaulted loans
#[derive(Debug, Clone, Copy, Default)]
pub struct RecoveryTotals {
    pub exposure_at_default: f64,
    pub amount_recovered: f64,
}

impl RecoveryTotals {
    /// Recovered share of exposure; `None` when the cohort carries no
    /// defaulted exposure. The marker stays `None` downstream, never 0.
    pub fn rate(&self) -> Option<f64> {
        if self.exposure_at_default > 0.0 {
            Some(self.amount_recovered / self.exposure_at_default)
        } else {
            None
        }
    }
}

/// Sum exposure-at-default and recoveries per cohort, defaulted loans only.
pub fn aggregate_recoveries<'a, I>(records: I) -> BTreeMap<CohortKey, RecoveryTotals>
where
    I: IntoIterator<Item = &'a LoanRecord>,
{
    let mut totals: BTreeMap<CohortKey, RecoveryTotals> = BTreeMap::new();

    for record in records.into_iter().filter(|r| r.is_defaulted()) {
        let entry = totals.entry(CohortKey::of(record)).or_default();
        entry.exposure_at_default += record.exposure_at_default;
        entry.amount_recovered += record.amount_recovered;
    }

    totals
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loan::{Country, Rating, RawLoan};
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn loan(id: &str, default: Option<NaiveDate>, ead: f64, recovered: f64) -> LoanRecord {
        LoanRecord::normalize(
            RawLoan {
                loan_id: id.to_string(),
                rating: Rating::C,
                country: Country::EE,
                issue_date: date(2018, 1, 10),
                default_date: default,
                contract_end_date: None,
                planned_duration_months: 36,
                a_priori_pd: 0.1,
                exposure_at_default: ead,
                amount_recovered: recovered,
            },
            date(2021, 7, 20),
        )
        .unwrap()
    }

    #[test]
    fn test_recovery_rate_from_defaulted_loans_only() {
        let records = vec![
            loan("L1", Some(date(2019, 1, 5)), 600.0, 150.0),
            loan("L2", Some(date(2019, 4, 5)), 400.0, 100.0),
            // Survivors carry no exposure into the aggregate
            loan("L3", None, 999.0, 999.0),
        ];

        let totals = aggregate_recoveries(&records);
        assert_eq!(totals.len(), 1);

        let cohort_totals = totals.values().next().unwrap();
        assert_eq!(cohort_totals.exposure_at_default, 1000.0);
        assert_eq!(cohort_totals.amount_recovered, 250.0);
        assert_eq!(cohort_totals.rate(), Some(0.25));
    }

    #[test]
    fn test_zero_exposure_has_no_rate() {
        let records = vec![loan("L1", Some(date(2019, 1, 5)), 0.0, 0.0)];

        let totals = aggregate_recoveries(&records);
        let cohort_totals = totals.values().next().unwrap();

        assert_eq!(cohort_totals.rate(), None);
    }
}
