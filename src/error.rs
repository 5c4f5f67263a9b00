use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("failed to open dataset {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("malformed row at line {line}: {source}")]
    Row {
        line: u64,
        #[source]
        source: csv::Error,
    },
    #[error("invalid {field} at line {line}: {value:?}")]
    Field {
        line: u64,
        field: &'static str,
        value: String,
    },
}

#[derive(Debug, Error, PartialEq)]
pub enum SelectionError {
    #[error("date range start {start} is after end {end}")]
    InvertedRange { start: NaiveDate, end: NaiveDate },
    #[error("date range {start}..={end} falls outside {min}..={max}")]
    RangeOutOfBounds {
        start: NaiveDate,
        end: NaiveDate,
        min: NaiveDate,
        max: NaiveDate,
    },
    #[error("top countries must be between {min} and {max}, got {value}")]
    TopCountries { value: usize, min: usize, max: usize },
    #[error("year must be between {min} and {max}, got {value}")]
    Year { value: i32, min: i32, max: i32 },
}
