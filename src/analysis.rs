//! Portfolio analyzer for running queries over one loan snapshot
//!
//! Holds the normalized records and the analysis date once, then answers
//! intensity, a-priori and calibration queries without re-reading the tape.

use std::collections::BTreeMap;
use std::error::Error;
use std::path::Path;

use chrono::NaiveDate;

use crate::calibration::{self, DefaultIncidence, PdBucket, PdSummary};
use crate::cohort::{CohortIndex, CohortKey};
use crate::intensity::{
    aggregate_recoveries, IntensityConfig, IntensityEngine, IntensityReport,
};
use crate::loan::{self, Country, LoanRecord, Rating};

/// Filters selecting the analysis population for one query
#[derive(Debug, Clone)]
pub struct AnalysisQuery {
    /// Country the loans were issued in
    pub country: Country,

    /// Earliest issue year included
    pub start_year: i32,

    /// Inclusive cap on planned duration; `None` = no limit
    pub max_duration_months: Option<u32>,

    /// Rating grades included
    pub ratings: Vec<Rating>,
}

impl AnalysisQuery {
    /// Query over every grade with no duration cap.
    pub fn new(country: Country, start_year: i32) -> Self {
        Self {
            country,
            start_year,
            max_duration_months: None,
            ratings: Rating::ALL.to_vec(),
        }
    }

    pub fn with_max_duration(mut self, months: u32) -> Self {
        self.max_duration_months = Some(months);
        self
    }

    pub fn with_ratings(mut self, ratings: &[Rating]) -> Self {
        self.ratings = ratings.to_vec();
        self
    }

    fn matches(&self, record: &LoanRecord) -> bool {
        record.country == self.country
            && record.issue_year() >= self.start_year
            && self
                .max_duration_months
                .map_or(true, |max| record.planned_duration_months <= max)
            && self.ratings.contains(&record.rating)
    }
}

/// Pre-loaded analyzer for running many queries over one snapshot
#[derive(Debug, Clone)]
pub struct PortfolioAnalyzer {
    records: Vec<LoanRecord>,
    config: IntensityConfig,
}

impl PortfolioAnalyzer {
    /// Analyzer over an already-normalized record snapshot.
    pub fn new(records: Vec<LoanRecord>, as_of: NaiveDate) -> Self {
        Self {
            records,
            config: IntensityConfig::new(as_of),
        }
    }

    /// Load the snapshot from a tape CSV.
    pub fn from_tape<P: AsRef<Path>>(path: P, as_of: NaiveDate) -> Result<Self, Box<dyn Error>> {
        let records = loan::load_records(path, as_of)?;
        Ok(Self::new(records, as_of))
    }

    pub fn records(&self) -> &[LoanRecord] {
        &self.records
    }

    pub fn as_of(&self) -> NaiveDate {
        self.config.as_of
    }

    fn filtered<'a>(&'a self, query: &'a AnalysisQuery) -> impl Iterator<Item = &'a LoanRecord> {
        self.records.iter().filter(move |record| query.matches(record))
    }

    /// Annual default intensity, recovery rate and population per cohort.
    pub fn default_intensities(&self, query: &AnalysisQuery) -> IntensityReport {
        let selected: Vec<&LoanRecord> = self.filtered(query).collect();

        let index = CohortIndex::build(selected.iter().copied());
        let engine = IntensityEngine::new(self.config.clone());
        let mut report = engine.estimate(&index);

        let recoveries = aggregate_recoveries(selected.iter().copied());
        for row in &mut report.rows {
            row.recovery_rate = recoveries.get(&row.key).and_then(|totals| totals.rate());
        }

        report
    }

    /// Quoted-PD summary statistics per (rating, issue year).
    pub fn apriori_summary(&self, query: &AnalysisQuery) -> BTreeMap<(Rating, i32), PdSummary> {
        calibration::summarize_by_vintage(self.filtered(query))
    }

    /// Realized-minus-quoted gap per cohort; positive = lender underestimated.
    pub fn apriori_underestimate(&self, query: &AnalysisQuery) -> BTreeMap<CohortKey, f64> {
        let report = self.default_intensities(query);
        let means = calibration::mean_by_cohort(self.filtered(query));
        calibration::underestimate(&report, &means)
    }

    /// Realized default frequency per (PD bucket, rating, issue year) for
    /// one country's loans.
    pub fn calibration_check(
        &self,
        country: Country,
    ) -> BTreeMap<(PdBucket, Rating, i32), DefaultIncidence> {
        calibration::check_calibration(
            self.records.iter().filter(move |record| record.country == country),
        )
    }
}
