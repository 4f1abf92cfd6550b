/// Error types for loading the OWID table
use chrono::NaiveDate;
use thiserror::Error;

/// Main error type for OWID data loading
#[derive(Error, Debug)]
pub enum OwidError {
    /// The header row lacks one or more required columns
    #[error("Source table is missing required columns: {}", missing.join(", "))]
    MissingColumns { missing: Vec<String> },

    /// A `date` cell could not be parsed as YYYY-MM-DD
    #[error("Invalid date {value:?} on line {line}")]
    InvalidDate { line: u64, value: String },

    /// A row has an empty `location` cell
    #[error("Empty location on line {line}")]
    EmptyLocation { line: u64 },

    /// The same (location, date) key appears twice
    #[error("Duplicate observation for {location} on {date}")]
    DuplicateObservation { location: String, date: NaiveDate },

    /// Failed to read CSV data
    #[error("Failed to parse CSV: {0}")]
    Csv(#[from] csv::Error),

    /// Failed to open the source file
    #[error("Failed to read source: {0}")]
    Io(#[from] std::io::Error),
}

/// Type alias for Results using OwidError
pub type Result<T> = std::result::Result<T, OwidError>;
