//! Default Analytics - cohort default-intensity and recovery estimation for
//! consumer loan portfolios
//!
//! This library provides:
//! - Loan-record normalization against an explicit analysis date
//! - Cohort bucketing by (rating, issue year, planned duration)
//! - Life-table (actuarial) estimation of annualized default intensities
//! - Recovery-rate aggregation over defaulted exposure
//! - Calibration diagnostics against lender-quoted default probabilities

pub mod analysis;
pub mod calibration;
pub mod cohort;
pub mod error;
pub mod intensity;
pub mod loan;

// Re-export commonly used types
pub use analysis::{AnalysisQuery, PortfolioAnalyzer};
pub use cohort::{CohortIndex, CohortKey};
pub use error::AnalysisError;
pub use intensity::{IntensityConfig, IntensityEngine, IntensityReport, IntensityRow};
pub use loan::{Country, LoanRecord, Rating};
