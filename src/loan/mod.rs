//! Loan record data structures and tape loading

mod data;
pub mod loader;

pub use data::{months_between, Country, LoanRecord, Rating, RawLoan};
pub use loader::{load_records, load_records_from_reader};
