//! Loan records with the derived month durations used by the estimators

use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;

/// Credit rating grade of a loan.
///
/// Declaration order is the domain order: `AA` is the best grade and must
/// sort before `A`, which lexicographic sorting gets wrong. Every grouped
/// output iterates grades through the derived `Ord`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Rating {
    AA,
    A,
    B,
    C,
    D,
    E,
    F,
    HR,
}

impl Rating {
    /// All grades, best to worst.
    pub const ALL: [Rating; 8] = [
        Rating::AA,
        Rating::A,
        Rating::B,
        Rating::C,
        Rating::D,
        Rating::E,
        Rating::F,
        Rating::HR,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Rating::AA => "AA",
            Rating::A => "A",
            Rating::B => "B",
            Rating::C => "C",
            Rating::D => "D",
            Rating::E => "E",
            Rating::F => "F",
            Rating::HR => "HR",
        }
    }

    pub fn parse(s: &str) -> Result<Self, AnalysisError> {
        match s {
            "AA" => Ok(Rating::AA),
            "A" => Ok(Rating::A),
            "B" => Ok(Rating::B),
            "C" => Ok(Rating::C),
            "D" => Ok(Rating::D),
            "E" => Ok(Rating::E),
            "F" => Ok(Rating::F),
            "HR" => Ok(Rating::HR),
            other => Err(AnalysisError::UnknownRating(other.to_string())),
        }
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Country a loan was issued in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Country {
    /// Estonia
    EE,
    /// Finland
    FI,
    /// Spain
    ES,
    /// Slovakia (excluded from the analysis population)
    SK,
}

impl Country {
    pub fn as_str(&self) -> &'static str {
        match self {
            Country::EE => "EE",
            Country::FI => "FI",
            Country::ES => "ES",
            Country::SK => "SK",
        }
    }

    pub fn parse(s: &str) -> Result<Self, AnalysisError> {
        match s {
            "EE" => Ok(Country::EE),
            "FI" => Ok(Country::FI),
            "ES" => Ok(Country::ES),
            "SK" => Ok(Country::SK),
            other => Err(AnalysisError::UnknownCountry(other.to_string())),
        }
    }
}

impl fmt::Display for Country {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whole calendar months from `from` to `to` (day-of-month is ignored).
///
/// Negative when `to` falls in an earlier month than `from`.
pub fn months_between(from: NaiveDate, to: NaiveDate) -> i32 {
    12 * (to.year() - from.year()) + to.month() as i32 - from.month() as i32
}

/// A loan as it arrives from the normalized tape, before duration derivation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawLoan {
    pub loan_id: String,
    pub rating: Rating,
    pub country: Country,
    pub issue_date: NaiveDate,
    pub default_date: Option<NaiveDate>,
    pub contract_end_date: Option<NaiveDate>,
    pub planned_duration_months: u32,
    pub a_priori_pd: f64,
    pub exposure_at_default: f64,
    pub amount_recovered: f64,
}

/// A single loan of the analysis population, immutable after normalization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanRecord {
    /// Unique loan identifier
    pub loan_id: String,

    /// Rating grade assigned at origination
    pub rating: Rating,

    /// Country the loan was issued in
    pub country: Country,

    /// Origination date
    pub issue_date: NaiveDate,

    /// Date the loan defaulted, if it did
    pub default_date: Option<NaiveDate>,

    /// Date the contract ended, if it has
    pub contract_end_date: Option<NaiveDate>,

    /// Contractually stated loan term in months
    pub planned_duration_months: u32,

    /// Lender-quoted probability of default at origination, in [0, 1]
    pub a_priori_pd: f64,

    /// Outstanding exposure at default (meaningful for defaulted loans only)
    pub exposure_at_default: f64,

    /// Amount recovered after default (meaningful for defaulted loans only)
    pub amount_recovered: f64,

    /// Whole months from issue to default
    pub months_to_default: Option<u32>,

    /// Whole months from issue to contract end
    pub months_to_contract_end: Option<u32>,

    /// Whole months from issue to the analysis date
    pub months_observed: u32,

    /// Whole months the loan is known to have survived without defaulting:
    /// `min(months_to_contract_end, months_observed)` when the contract has
    /// a defined end, else `months_observed`
    pub effective_horizon: u32,
}

impl LoanRecord {
    /// Normalize a raw loan against the analysis date.
    ///
    /// Derives the four month durations once; they are treated as part of
    /// the record from then on. The analysis date is an explicit parameter
    /// so that repeated runs over the same snapshot are reproducible.
    ///
    /// Fails with `InconsistentTimeline` when a default or contract-end date
    /// precedes the issue date, or when the loan was issued after `as_of`.
    pub fn normalize(raw: RawLoan, as_of: NaiveDate) -> Result<Self, AnalysisError> {
        let observed = months_between(raw.issue_date, as_of);
        if observed < 0 {
            return Err(AnalysisError::InconsistentTimeline {
                loan_id: raw.loan_id,
                event: "as-of",
                date: as_of,
                issue_date: raw.issue_date,
            });
        }
        let months_observed = observed as u32;

        let months_to_default =
            derive_months(&raw.loan_id, raw.issue_date, raw.default_date, "default")?;
        let months_to_contract_end =
            derive_months(&raw.loan_id, raw.issue_date, raw.contract_end_date, "contract end")?;

        let effective_horizon = match months_to_contract_end {
            Some(ttce) => months_observed.min(ttce),
            None => months_observed,
        };

        Ok(Self {
            loan_id: raw.loan_id,
            rating: raw.rating,
            country: raw.country,
            issue_date: raw.issue_date,
            default_date: raw.default_date,
            contract_end_date: raw.contract_end_date,
            planned_duration_months: raw.planned_duration_months,
            a_priori_pd: raw.a_priori_pd,
            exposure_at_default: raw.exposure_at_default,
            amount_recovered: raw.amount_recovered,
            months_to_default,
            months_to_contract_end,
            months_observed,
            effective_horizon,
        })
    }

    pub fn is_defaulted(&self) -> bool {
        self.months_to_default.is_some()
    }

    /// Loans observed for fewer whole months than the seasoning window carry
    /// no hazard information yet.
    pub fn is_seasoned(&self, seasoning_months: u32) -> bool {
        self.months_observed >= seasoning_months
    }

    pub fn issue_year(&self) -> i32 {
        self.issue_date.year()
    }
}

fn derive_months(
    loan_id: &str,
    issue_date: NaiveDate,
    event_date: Option<NaiveDate>,
    event: &'static str,
) -> Result<Option<u32>, AnalysisError> {
    match event_date {
        Some(date) => {
            let months = months_between(issue_date, date);
            if months < 0 {
                return Err(AnalysisError::InconsistentTimeline {
                    loan_id: loan_id.to_string(),
                    event,
                    date,
                    issue_date,
                });
            }
            Ok(Some(months as u32))
        }
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn raw(issue: NaiveDate, default: Option<NaiveDate>, end: Option<NaiveDate>) -> RawLoan {
        RawLoan {
            loan_id: "L1".to_string(),
            rating: Rating::B,
            country: Country::EE,
            issue_date: issue,
            default_date: default,
            contract_end_date: end,
            planned_duration_months: 36,
            a_priori_pd: 0.08,
            exposure_at_default: 0.0,
            amount_recovered: 0.0,
        }
    }

    #[test]
    fn test_months_between() {
        assert_eq!(months_between(date(2018, 1, 15), date(2018, 7, 2)), 6);
        assert_eq!(months_between(date(2018, 1, 31), date(2018, 2, 1)), 1);
        assert_eq!(months_between(date(2018, 11, 1), date(2021, 5, 28)), 30);
        assert_eq!(months_between(date(2018, 3, 1), date(2018, 2, 27)), -1);
    }

    #[test]
    fn test_rating_domain_order() {
        // AA sorts before A, the rest follow grade quality
        assert!(Rating::AA < Rating::A);
        assert!(Rating::A < Rating::B);
        assert!(Rating::F < Rating::HR);

        let mut shuffled = vec![Rating::HR, Rating::A, Rating::AA, Rating::C];
        shuffled.sort();
        assert_eq!(shuffled, vec![Rating::AA, Rating::A, Rating::C, Rating::HR]);
    }

    #[test]
    fn test_rating_parse_roundtrip() {
        for rating in Rating::ALL {
            assert_eq!(Rating::parse(rating.as_str()).unwrap(), rating);
        }
        assert!(matches!(
            Rating::parse("ZZ"),
            Err(AnalysisError::UnknownRating(_))
        ));
    }

    #[test]
    fn test_normalize_defaulted_loan() {
        let record = LoanRecord::normalize(
            raw(date(2018, 1, 15), Some(date(2018, 7, 3)), None),
            date(2021, 7, 20),
        )
        .unwrap();

        assert_eq!(record.months_to_default, Some(6));
        assert_eq!(record.months_to_contract_end, None);
        assert_eq!(record.months_observed, 42);
        assert_eq!(record.effective_horizon, 42);
        assert!(record.is_defaulted());
    }

    #[test]
    fn test_effective_horizon_caps_at_contract_end() {
        let record = LoanRecord::normalize(
            raw(date(2018, 1, 15), None, Some(date(2021, 5, 10))),
            date(2021, 7, 20),
        )
        .unwrap();

        assert_eq!(record.months_to_contract_end, Some(40));
        assert_eq!(record.months_observed, 42);
        assert_eq!(record.effective_horizon, 40);
        assert!(!record.is_defaulted());
    }

    #[test]
    fn test_effective_horizon_open_contract() {
        // Contract end in the future: censored at the observation date
        let record = LoanRecord::normalize(
            raw(date(2020, 3, 1), None, Some(date(2023, 3, 1))),
            date(2021, 7, 20),
        )
        .unwrap();

        assert_eq!(record.months_observed, 16);
        assert_eq!(record.effective_horizon, 16);
    }

    #[test]
    fn test_default_before_issue_is_a_fault() {
        let err = LoanRecord::normalize(
            raw(date(2018, 6, 15), Some(date(2018, 2, 1)), None),
            date(2021, 7, 20),
        )
        .unwrap_err();

        assert!(matches!(err, AnalysisError::InconsistentTimeline { event: "default", .. }));
    }

    #[test]
    fn test_seasoning_filter() {
        let young = LoanRecord::normalize(raw(date(2021, 6, 1), None, None), date(2021, 8, 20)).unwrap();
        assert_eq!(young.months_observed, 2);
        assert!(!young.is_seasoned(3));

        let seasoned =
            LoanRecord::normalize(raw(date(2021, 5, 1), None, None), date(2021, 8, 20)).unwrap();
        assert_eq!(seasoned.months_observed, 3);
        assert!(seasoned.is_seasoned(3));
    }
}
