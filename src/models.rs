use chrono::{Datelike, NaiveDate};
use serde::Serialize;

/// One reported layoff event. Loaded once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoffRecord {
    pub company: String,
    pub location: String,
    pub country: String,
    /// Absent when the source has no geocode; such records stay off the map.
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub industry: String,
    pub date: NaiveDate,
    pub total_laid_off: u64,
    /// Millions of USD; absent when the source left it blank.
    pub funds_raised: Option<f64>,
    pub year: i32,
    pub quarter: String,
}

pub fn quarter_label(date: NaiveDate) -> String {
    format!("{}-Q{}", date.year(), (date.month0() / 3) + 1)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyTotal {
    pub date: NaiveDate,
    pub total_laid_off: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountryDailyTotal {
    pub date: NaiveDate,
    pub country: String,
    pub total_laid_off: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearTotal {
    pub year: i32,
    pub total_laid_off: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuarterTotal {
    pub quarter: String,
    pub total_laid_off: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationTotal {
    pub latitude: f64,
    pub longitude: f64,
    pub location: String,
    pub country: String,
    pub total_laid_off: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountryTotal {
    pub country: String,
    pub total_laid_off: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompanyTotal {
    pub company: String,
    pub total_laid_off: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompanyIndustryTotal {
    pub company: String,
    pub industry: String,
    pub total_laid_off: u64,
}

/// Company with the most layoffs in a given year, compared with its
/// total in the previous year when one exists.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearLeader {
    pub year: i32,
    pub company: String,
    pub location: String,
    pub industry: String,
    pub total_laid_off: u64,
    pub previous_total: Option<u64>,
    pub delta_percent: Option<f64>,
}

impl YearLeader {
    pub fn title(&self) -> String {
        format!("{} | {} | {}", self.company, self.location, self.industry)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FundPoint {
    pub company: String,
    pub date: NaiveDate,
    pub total_laid_off: u64,
    pub funds_raised: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quarter_label_uses_calendar_quarters() {
        let jan = NaiveDate::from_ymd_opt(2022, 1, 31).unwrap();
        let jun = NaiveDate::from_ymd_opt(2022, 6, 30).unwrap();
        let oct = NaiveDate::from_ymd_opt(2023, 10, 1).unwrap();
        assert_eq!(quarter_label(jan), "2022-Q1");
        assert_eq!(quarter_label(jun), "2022-Q2");
        assert_eq!(quarter_label(oct), "2023-Q4");
    }

    #[test]
    fn leader_title_joins_fields() {
        let leader = YearLeader {
            year: 2023,
            company: "Google".to_string(),
            location: "SF Bay Area".to_string(),
            industry: "Consumer".to_string(),
            total_laid_off: 12000,
            previous_total: None,
            delta_percent: None,
        };
        assert_eq!(leader.title(), "Google | SF Bay Area | Consumer");
    }
}
