//! Run the full analysis battery over a loan tape
//!
//! Mirrors the standing reporting run: a-priori summaries for Estonia,
//! intensity tables for Estonia and Finland in parallel, and the
//! calibration check. Writes the intensity tables to CSV.

use std::error::Error;
use std::fs::File;
use std::io::Write;
use std::time::Instant;

use chrono::{Local, NaiveDate};
use clap::Parser;
use rayon::prelude::*;

use default_analytics::intensity::IntensityReport;
use default_analytics::{AnalysisQuery, Country, PortfolioAnalyzer, Rating};

#[derive(Debug, Parser)]
#[command(name = "run_tape", about = "Full multi-country analysis run over a loan tape")]
struct Args {
    /// Path to the normalized loan tape CSV
    #[arg(long, default_value = "loan_tape.csv")]
    tape: String,

    /// Analysis date YYYY-MM-DD (defaults to today)
    #[arg(long)]
    as_of: Option<NaiveDate>,
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let args = Args::parse();
    let as_of = args.as_of.unwrap_or_else(|| Local::now().date_naive());

    let start = Instant::now();
    println!("Loading loan tape from {}...", args.tape);
    let analyzer = PortfolioAnalyzer::from_tape(&args.tape, as_of)?;
    println!("Loaded {} records in {:?}", analyzer.records().len(), start.elapsed());

    // A-priori summaries for Estonia: the full book since 2015, then the
    // top grades since 2018, then the same restricted to short loans
    print_apriori(&analyzer, &AnalysisQuery::new(Country::EE, 2015).with_max_duration(60));
    print_apriori(
        &analyzer,
        &AnalysisQuery::new(Country::EE, 2018)
            .with_ratings(&[Rating::AA, Rating::A])
            .with_max_duration(60),
    );
    print_apriori(
        &analyzer,
        &AnalysisQuery::new(Country::EE, 2018)
            .with_ratings(&[Rating::AA, Rating::A])
            .with_max_duration(12),
    );

    // Intensity tables per country, in parallel
    println!("\nEstimating default intensities...");
    let estimate_start = Instant::now();
    let queries = vec![
        AnalysisQuery::new(Country::EE, 2015),
        AnalysisQuery::new(Country::FI, 2015),
    ];
    let reports: Vec<(Country, IntensityReport)> = queries
        .par_iter()
        .map(|query| (query.country, analyzer.default_intensities(query)))
        .collect();
    println!("Estimates complete in {:?}", estimate_start.elapsed());

    for (country, report) in &reports {
        let path = format!("intensity_{country}.csv");
        write_intensity_csv(&path, report)?;
        println!(
            "{country}: {} cohorts estimated ({} loans), {} skipped -> {path}",
            report.rows.len(),
            report.total_population(),
            report.skipped.len(),
        );
        for skipped in &report.skipped {
            log::debug!("{country}: {}", skipped.fault);
        }
    }

    // Calibration check for Estonia
    println!("\nCalibration check (EE): quoted PD bucket vs realized frequency");
    println!(
        "{:<16} {:<6} {:>6} {:>10} {:>10} {:>8}",
        "Bucket", "Rating", "Year", "Realized", "Defaults", "#"
    );
    println!("{}", "-".repeat(62));
    for ((bucket, rating, year), incidence) in analyzer.calibration_check(Country::EE) {
        println!(
            "{:<16} {:<6} {:>6} {:>10.4} {:>10} {:>8}",
            bucket.to_string(),
            rating.to_string(),
            year,
            incidence.frequency,
            incidence.defaulted,
            incidence.total,
        );
    }

    println!("\nTotal time: {:?}", start.elapsed());
    Ok(())
}

fn print_apriori(analyzer: &PortfolioAnalyzer, query: &AnalysisQuery) {
    let grades: Vec<String> = query.ratings.iter().map(Rating::to_string).collect();
    println!(
        "\nA-priori PD ({}, {}+, duration <= {}, grades {}):",
        query.country,
        query.start_year,
        query
            .max_duration_months
            .map_or_else(|| "any".to_string(), |months| format!("{months}m")),
        grades.join("/"),
    );
    println!(
        "{:<6} {:>6} {:>10} {:>10} {:>10} {:>10} {:>10} {:>8}",
        "Rating", "Year", "Min", "Median", "Mean", "Max", "Std", "#"
    );
    println!("{}", "-".repeat(78));
    for ((rating, year), summary) in analyzer.apriori_summary(query) {
        println!(
            "{:<6} {:>6} {:>10.4} {:>10.4} {:>10.4} {:>10.4} {:>10} {:>8}",
            rating.to_string(),
            year,
            summary.min,
            summary.median,
            summary.mean,
            summary.max,
            summary
                .std_dev
                .map_or_else(|| "n/a".to_string(), |std| format!("{std:.4}")),
            summary.count,
        );
    }
}

fn write_intensity_csv(path: &str, report: &IntensityReport) -> Result<(), Box<dyn Error>> {
    let mut file = File::create(path)?;

    writeln!(file, "Rating,IssueYear,DurationMonths,AnnualDefaultIntensity,RecoveryRate,Count")?;
    for row in &report.rows {
        writeln!(
            file,
            "{},{},{},{:.8},{},{}",
            row.key.rating,
            row.key.issue_year,
            row.key.duration_months,
            row.annual_default_intensity,
            row.recovery_rate
                .map_or_else(String::new, |rate| format!("{rate:.8}")),
            row.population,
        )?;
    }

    Ok(())
}
