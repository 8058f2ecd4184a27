//! Error taxonomy for the analysis engine

use chrono::NaiveDate;
use thiserror::Error;

use crate::cohort::CohortKey;

/// Faults raised while normalizing records or estimating cohorts.
///
/// Cohort-level faults never abort a run: the engine finishes the remaining
/// cohorts and reports each fault next to its cohort key.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    /// Cohort has no survival-exit buckets, so no life table can be built.
    #[error("cohort {0} has no survival exits to anchor a life table")]
    EmptyCohort(CohortKey),

    /// Vintage too recent: the annualization divisor would be non-positive.
    #[error("cohort {key} spans {divisor} cohort-months of observation, cannot annualize")]
    TooRecentVintage { key: CohortKey, divisor: i32 },

    /// An event date precedes the loan's issue date.
    #[error("loan {loan_id}: {event} date {date} precedes issue date {issue_date}")]
    InconsistentTimeline {
        loan_id: String,
        event: &'static str,
        date: NaiveDate,
        issue_date: NaiveDate,
    },

    /// Unrecognized rating grade in the input tape.
    #[error("unknown rating grade: {0}")]
    UnknownRating(String),

    /// Unrecognized country code in the input tape.
    #[error("unknown country code: {0}")]
    UnknownCountry(String),
}
