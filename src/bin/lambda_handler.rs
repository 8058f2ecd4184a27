//! AWS Lambda handler for running intensity analyses
//!
//! Accepts query parameters and normalized loan records via JSON and returns
//! the estimated cohort table. Supports Lambda Function URLs for direct HTTP
//! access.

use chrono::NaiveDate;
use lambda_http::{run, service_fn, Body, Error, Request, Response};
use serde::{Deserialize, Serialize};

use default_analytics::intensity::{IntensityRow, DEFAULT_SEASONING_MONTHS};
use default_analytics::loan::RawLoan;
use default_analytics::{AnalysisQuery, Country, LoanRecord, PortfolioAnalyzer, Rating};

/// Input for one analysis request
#[derive(Debug, Deserialize)]
pub struct AnalysisRequest {
    /// Country to analyze
    pub country: Country,

    /// Earliest issue year included (default: 2015)
    #[serde(default = "default_start_year")]
    pub start_year: i32,

    /// Inclusive cap on planned duration in months
    #[serde(default)]
    pub max_duration_months: Option<u32>,

    /// Rating grades to include (default: all)
    #[serde(default)]
    pub ratings: Option<Vec<Rating>>,

    /// Analysis date (YYYY-MM-DD)
    pub as_of: NaiveDate,

    /// Normalized loan records to analyze
    pub records: Vec<RawLoan>,

    /// Also run the PD-bucket calibration check
    #[serde(default)]
    pub include_calibration: bool,
}

fn default_start_year() -> i32 {
    2015
}

/// Output for one analysis request
#[derive(Debug, Serialize)]
pub struct AnalysisResponse {
    pub rows: Vec<IntensityRow>,
    pub skipped: Vec<SkippedSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calibration: Option<Vec<CalibrationCell>>,
}

/// A cohort the engine could not estimate
#[derive(Debug, Serialize)]
pub struct SkippedSummary {
    pub cohort: String,
    pub population: u32,
    pub fault: String,
}

/// One calibration cell: quoted-PD bucket vs realized default frequency
#[derive(Debug, Serialize)]
pub struct CalibrationCell {
    pub bucket: String,
    pub rating: Rating,
    pub issue_year: i32,
    pub frequency: f64,
    pub defaulted: u32,
    pub total: u32,
}

async fn handle(event: Request) -> Result<Response<Body>, Error> {
    let request: AnalysisRequest = match serde_json::from_slice(event.body()) {
        Ok(request) => request,
        Err(err) => {
            return Ok(Response::builder()
                .status(400)
                .body(Body::from(format!("invalid request: {err}")))?)
        }
    };

    // Same population rules as the tape loader: no SK loans, no loans
    // younger than the seasoning window, timeline faults skipped per record
    let mut records: Vec<LoanRecord> = Vec::with_capacity(request.records.len());
    for raw in request.records {
        if raw.country == Country::SK {
            continue;
        }
        match LoanRecord::normalize(raw, request.as_of) {
            Ok(record) if record.is_seasoned(DEFAULT_SEASONING_MONTHS) => records.push(record),
            Ok(_) => {}
            Err(err) => log::warn!("skipping loan: {err}"),
        }
    }

    let analyzer = PortfolioAnalyzer::new(records, request.as_of);

    let mut query = AnalysisQuery::new(request.country, request.start_year);
    if let Some(months) = request.max_duration_months {
        query = query.with_max_duration(months);
    }
    if let Some(ratings) = &request.ratings {
        query = query.with_ratings(ratings);
    }

    let report = analyzer.default_intensities(&query);
    let calibration = request.include_calibration.then(|| {
        analyzer
            .calibration_check(request.country)
            .into_iter()
            .map(|((bucket, rating, issue_year), incidence)| CalibrationCell {
                bucket: bucket.to_string(),
                rating,
                issue_year,
                frequency: incidence.frequency,
                defaulted: incidence.defaulted,
                total: incidence.total,
            })
            .collect()
    });

    let response = AnalysisResponse {
        rows: report.rows,
        skipped: report
            .skipped
            .iter()
            .map(|skipped| SkippedSummary {
                cohort: skipped.key.to_string(),
                population: skipped.population,
                fault: skipped.fault.to_string(),
            })
            .collect(),
        calibration,
    };

    Ok(Response::builder()
        .status(200)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(&response)?))?)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    env_logger::init();
    run(service_fn(handle)).await
}
