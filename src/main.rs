//! Default Analytics CLI
//!
//! Runs one intensity analysis over a loan tape and prints the cohort table
//! alongside the a-priori summary

use std::error::Error;

use chrono::{Local, NaiveDate};
use clap::Parser;

use default_analytics::{AnalysisQuery, Country, PortfolioAnalyzer, Rating};

#[derive(Debug, Parser)]
#[command(name = "default_analytics", about = "Cohort default-intensity analysis of a loan tape")]
struct Args {
    /// Path to the normalized loan tape CSV
    #[arg(long, default_value = "loan_tape.csv")]
    tape: String,

    /// Country to analyze (EE, FI, ES)
    #[arg(long, default_value = "EE")]
    country: String,

    /// Earliest issue year to include
    #[arg(long, default_value_t = 2015)]
    start_year: i32,

    /// Inclusive cap on planned duration in months
    #[arg(long)]
    max_duration: Option<u32>,

    /// Comma-separated rating grades to include (default: all)
    #[arg(long, value_delimiter = ',')]
    ratings: Option<Vec<String>>,

    /// Analysis date YYYY-MM-DD (defaults to today)
    #[arg(long)]
    as_of: Option<NaiveDate>,
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let args = Args::parse();
    let as_of = args.as_of.unwrap_or_else(|| Local::now().date_naive());
    let country = Country::parse(&args.country)?;

    println!("Default Analytics v0.1.0");
    println!("========================\n");

    let analyzer = PortfolioAnalyzer::from_tape(&args.tape, as_of)?;
    println!(
        "Loaded {} records from {} (as of {})\n",
        analyzer.records().len(),
        args.tape,
        as_of
    );

    let mut query = AnalysisQuery::new(country, args.start_year);
    if let Some(months) = args.max_duration {
        query = query.with_max_duration(months);
    }
    if let Some(grades) = &args.ratings {
        let ratings = grades
            .iter()
            .map(|grade| Rating::parse(grade))
            .collect::<Result<Vec<_>, _>>()?;
        query = query.with_ratings(&ratings);
    }

    let report = analyzer.default_intensities(&query);

    println!("Annual default intensities ({country}, {}+):", args.start_year);
    println!(
        "{:<6} {:>6} {:>9} {:>24} {:>14} {:>8}",
        "Rating", "Year", "Duration", "AnnualDefaultIntensity", "RecoveryRate", "#"
    );
    println!("{}", "-".repeat(72));
    for row in &report.rows {
        println!(
            "{:<6} {:>6} {:>8}m {:>24.6} {:>14} {:>8}",
            row.key.rating.to_string(),
            row.key.issue_year,
            row.key.duration_months,
            row.annual_default_intensity,
            row.recovery_rate
                .map_or_else(|| "n/a".to_string(), |rate| format!("{rate:.4}")),
            row.population,
        );
    }
    for skipped in &report.skipped {
        println!(
            "  (skipped {} with {} loans: {})",
            skipped.key, skipped.population, skipped.fault
        );
    }

    println!("\nA-priori PD by rating and vintage:");
    println!(
        "{:<6} {:>6} {:>10} {:>10} {:>10} {:>10} {:>10} {:>8}",
        "Rating", "Year", "Min", "Median", "Mean", "Max", "Std", "#"
    );
    println!("{}", "-".repeat(78));
    for ((rating, year), summary) in analyzer.apriori_summary(&query) {
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

    Ok(())
}
