//! Calibration check of quoted PDs against realized default frequency

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::loan::{LoanRecord, Rating};

/// Width of a quoted-PD calibration bucket
pub const PD_BUCKET_WIDTH: f64 = 0.025;

const BUCKET_COUNT: u32 = 40;

/// A fixed-width quoted-PD interval `[lower, lower + width)` spanning [0, 1].
///
/// A PD of exactly 1.0 lands in the final bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PdBucket(u32);

impl PdBucket {
    pub fn of(pd: f64) -> Self {
        // The nudge counteracts binary rounding at interval edges, where
        // k * width divided by width can land a hair below k
        let index = (pd / PD_BUCKET_WIDTH + 1e-9).floor() as u32;
        PdBucket(index.min(BUCKET_COUNT - 1))
    }

    pub fn lower(&self) -> f64 {
        f64::from(self.0) * PD_BUCKET_WIDTH
    }

    pub fn upper(&self) -> f64 {
        f64::from(self.0 + 1) * PD_BUCKET_WIDTH
    }
}

impl fmt::Display for PdBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:.3}, {:.3})", self.lower(), self.upper())
    }
}

/// Realized default incidence within one calibration cell
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DefaultIncidence {
    /// defaulted / total
    pub frequency: f64,
    pub defaulted: u32,
    pub total: u32,
}

/// Realized default frequency per (PD bucket, rating, issue year).
///
/// Loans quoted at PD in [x, x + 0.025) are expected to default at a rate
/// near x; the returned cells make the comparison directly readable.
pub fn check_calibration<'a, I>(records: I) -> BTreeMap<(PdBucket, Rating, i32), DefaultIncidence>
where
    I: IntoIterator<Item = &'a LoanRecord>,
{
    let mut cells: BTreeMap<(PdBucket, Rating, i32), (u32, u32)> = BTreeMap::new();

    for record in records {
        let key = (
            PdBucket::of(record.a_priori_pd),
            record.rating,
            record.issue_year(),
        );
        let cell = cells.entry(key).or_insert((0, 0));
        cell.1 += 1;
        if record.is_defaulted() {
            cell.0 += 1;
        }
    }

    cells
        .into_iter()
        .map(|(key, (defaulted, total))| {
            (
                key,
                DefaultIncidence {
                    frequency: f64::from(defaulted) / f64::from(total),
                    defaulted,
                    total,
                },
            )
        })
        .collect()
}
