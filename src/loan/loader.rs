//! Load loan records from a normalized tape CSV

use std::error::Error;
use std::path::Path;

use chrono::NaiveDate;
use csv::Reader;

use super::{Country, LoanRecord, RawLoan, Rating};
use crate::intensity::DEFAULT_SEASONING_MONTHS;

/// Raw CSV row matching the loan tape columns
#[derive(Debug, serde::Deserialize)]
struct CsvRow {
    #[serde(rename = "LoanId")]
    loan_id: String,
    #[serde(rename = "Rating")]
    rating: String,
    #[serde(rename = "Country")]
    country: String,
    #[serde(rename = "LoanDate")]
    loan_date: String,
    #[serde(rename = "LoanDuration")]
    loan_duration: u32,
    #[serde(rename = "ProbabilityOfDefault")]
    probability_of_default: f64,
    #[serde(rename = "DefaultDate")]
    default_date: String,
    #[serde(rename = "ContractEndDate")]
    contract_end_date: String,
    #[serde(rename = "ExposureAtDefault")]
    exposure_at_default: f64,
    #[serde(rename = "AmountRecovered")]
    amount_recovered: f64,
}

impl CsvRow {
    fn to_raw(self) -> Result<RawLoan, Box<dyn Error>> {
        let issue_date = parse_date(&self.loan_date)?
            .ok_or_else(|| format!("loan {}: missing LoanDate", self.loan_id))?;

        Ok(RawLoan {
            rating: Rating::parse(&self.rating)?,
            country: Country::parse(&self.country)?,
            issue_date,
            default_date: parse_date(&self.default_date)?,
            contract_end_date: parse_date(&self.contract_end_date)?,
            planned_duration_months: self.loan_duration,
            a_priori_pd: self.probability_of_default,
            exposure_at_default: self.exposure_at_default,
            amount_recovered: self.amount_recovered,
            loan_id: self.loan_id,
        })
    }
}

/// Empty cell = no date (loan has not defaulted / contract still open)
fn parse_date(s: &str) -> Result<Option<NaiveDate>, Box<dyn Error>> {
    if s.is_empty() {
        return Ok(None);
    }
    Ok(Some(NaiveDate::parse_from_str(s, "%Y-%m-%d")?))
}

/// Load the analysis population from a tape CSV.
///
/// Drops SK loans and loans younger than the seasoning window. Rows with an
/// inconsistent timeline are skipped with a warning instead of failing the
/// whole load; malformed rows (bad dates, unknown grades) are hard errors.
pub fn load_records<P: AsRef<Path>>(
    path: P,
    as_of: NaiveDate,
) -> Result<Vec<LoanRecord>, Box<dyn Error>> {
    let reader = Reader::from_path(path)?;
    collect_records(reader, as_of)
}

/// Load records from any reader (e.g., string buffer, network stream)
pub fn load_records_from_reader<R: std::io::Read>(
    reader: R,
    as_of: NaiveDate,
) -> Result<Vec<LoanRecord>, Box<dyn Error>> {
    collect_records(Reader::from_reader(reader), as_of)
}

fn collect_records<R: std::io::Read>(
    mut reader: Reader<R>,
    as_of: NaiveDate,
) -> Result<Vec<LoanRecord>, Box<dyn Error>> {
    let mut records = Vec::new();
    let mut faulted = 0usize;

    for result in reader.deserialize() {
        let row: CsvRow = result?;
        let raw = row.to_raw()?;
        if raw.country == Country::SK {
            continue;
        }
        match LoanRecord::normalize(raw, as_of) {
            Ok(record) => {
                if record.is_seasoned(DEFAULT_SEASONING_MONTHS) {
                    records.push(record);
                }
            }
            Err(err) => {
                log::warn!("skipping loan: {err}");
                faulted += 1;
            }
        }
    }

    if faulted > 0 {
        log::warn!("{faulted} loans skipped for inconsistent timelines");
    }

    Ok(records)
}
