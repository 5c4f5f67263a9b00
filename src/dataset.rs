use std::collections::BTreeSet;
use std::path::Path;

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::Deserialize;
use tracing::debug;

use crate::error::DatasetError;
use crate::models::{quarter_label, LayoffRecord};

/// The cleaned layoff table. Column order is irrelevant; the unnamed
/// index column pandas writes in front is ignored along with any other
/// column not listed here.
#[derive(Debug, Deserialize)]
struct CsvRow {
    company: String,
    location: String,
    country: String,
    #[serde(default)]
    latitude: String,
    #[serde(default)]
    longitude: String,
    #[serde(default)]
    industry: String,
    date: String,
    #[serde(default)]
    total_laid_off: String,
    #[serde(default)]
    funds_raised: String,
    #[serde(default)]
    year: String,
    #[serde(default)]
    quarter: String,
}

impl CsvRow {
    fn into_record(self, line: u64) -> Result<LayoffRecord, DatasetError> {
        let date = parse_date(&self.date).ok_or_else(|| DatasetError::Field {
            line,
            field: "date",
            value: self.date.clone(),
        })?;
        let latitude = parse_coordinate(&self.latitude, 90.0).ok_or_else(|| DatasetError::Field {
            line,
            field: "latitude",
            value: self.latitude.clone(),
        })?;
        let longitude =
            parse_coordinate(&self.longitude, 180.0).ok_or_else(|| DatasetError::Field {
                line,
                field: "longitude",
                value: self.longitude.clone(),
            })?;
        let total_laid_off = parse_count(&self.total_laid_off).ok_or_else(|| DatasetError::Field {
            line,
            field: "total_laid_off",
            value: self.total_laid_off.clone(),
        })?;
        let funds_raised = parse_funds(&self.funds_raised).ok_or_else(|| DatasetError::Field {
            line,
            field: "funds_raised",
            value: self.funds_raised.clone(),
        })?;
        let year = parse_year(&self.year, date).ok_or_else(|| DatasetError::Field {
            line,
            field: "year",
            value: self.year.clone(),
        })?;
        let quarter = normalize_quarter(&self.quarter, year, date);

        Ok(LayoffRecord {
            company: self.company,
            location: self.location,
            country: self.country,
            latitude,
            longitude,
            industry: self.industry,
            date,
            total_laid_off,
            funds_raised,
            year,
            quarter,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct Dataset {
    records: Vec<LayoffRecord>,
}

impl Dataset {
    pub fn from_records(records: Vec<LayoffRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[LayoffRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Earliest and latest record dates, or `None` for an empty dataset.
    pub fn date_bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = self.records.iter().map(|r| r.date).min()?;
        let last = self.records.iter().map(|r| r.date).max()?;
        Some((first, last))
    }

    pub fn total_laid_off(&self) -> u64 {
        self.records.iter().map(|r| r.total_laid_off).sum()
    }

    pub fn countries(&self) -> Vec<String> {
        self.records
            .iter()
            .map(|r| r.country.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

pub fn load_csv(path: &Path) -> Result<Dataset, DatasetError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|source| DatasetError::Open {
            path: path.to_path_buf(),
            source,
        })?;
    let headers = reader
        .headers()
        .map_err(|source| DatasetError::Open {
            path: path.to_path_buf(),
            source,
        })?
        .clone();

    let mut records = Vec::new();
    for result in reader.records() {
        let row = result.map_err(|source| DatasetError::Row {
            line: source.position().map(|p| p.line()).unwrap_or(0),
            source,
        })?;
        let line = row.position().map(|p| p.line()).unwrap_or(0);
        let parsed: CsvRow = row
            .deserialize(Some(&headers))
            .map_err(|source| DatasetError::Row { line, source })?;
        records.push(parsed.into_record(line)?);
    }

    debug!(path = %path.display(), rows = records.len(), "loaded layoff dataset");
    Ok(Dataset::from_records(records))
}

pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(date);
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(stamp) = NaiveDateTime::parse_from_str(value, format) {
            return Some(stamp.date());
        }
    }
    NaiveDate::parse_from_str(value, "%m/%d/%Y").ok()
}

/// Blank means "not reported" and counts as zero. Pandas writes float
/// columns as `120.0`, so whole floats are accepted too.
fn parse_count(value: &str) -> Option<u64> {
    if value.is_empty() {
        return Some(0);
    }
    if let Ok(count) = value.parse::<u64>() {
        return Some(count);
    }
    let float = value.parse::<f64>().ok()?;
    if float.is_nan() {
        return Some(0);
    }
    if !float.is_finite() || float < 0.0 || float.fract() != 0.0 {
        return None;
    }
    Some(float as u64)
}

fn parse_funds(value: &str) -> Option<Option<f64>> {
    if value.is_empty() {
        return Some(None);
    }
    let funds = value.parse::<f64>().ok()?;
    if funds.is_nan() {
        return Some(None);
    }
    (funds.is_finite() && funds >= 0.0).then_some(Some(funds))
}

/// Blank or NaN means "not geocoded"; anything else must be a finite
/// value within `limit` degrees.
fn parse_coordinate(value: &str, limit: f64) -> Option<Option<f64>> {
    if value.is_empty() {
        return Some(None);
    }
    let coordinate = value.parse::<f64>().ok()?;
    if coordinate.is_nan() {
        return Some(None);
    }
    (coordinate.is_finite() && coordinate.abs() <= limit).then_some(Some(coordinate))
}

fn parse_year(value: &str, date: NaiveDate) -> Option<i32> {
    if value.is_empty() {
        return Some(date.year());
    }
    if let Ok(year) = value.parse::<i32>() {
        return Some(year);
    }
    let float = value.parse::<f64>().ok()?;
    (float.is_finite() && float.fract() == 0.0).then_some(float as i32)
}

fn normalize_quarter(value: &str, year: i32, date: NaiveDate) -> String {
    if value.is_empty() {
        return quarter_label(date);
    }
    match value.trim_start_matches(['Q', 'q']).parse::<u32>() {
        Ok(n @ 1..=4) => format!("{year}-Q{n}"),
        _ => value.to_string(),
    }
}
