use std::fmt;

use chrono::NaiveDate;
use clap::ValueEnum;
use serde::Serialize;

use crate::error::SelectionError;
use crate::region::Region;

pub const FOCUS_COUNTRY: &str = "United States";
pub const TOP_COMPANIES: usize = 10;
pub const TOP_COUNTRIES_MIN: usize = 3;
pub const TOP_COUNTRIES_MAX: usize = 10;
pub const FIRST_YEAR: i32 = 2020;
pub const LAST_YEAR: i32 = 2023;

pub fn slider_min() -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 3, 11).unwrap_or_default()
}

pub fn slider_max() -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 11, 3).unwrap_or_default()
}

/// Inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, SelectionError> {
        if start > end {
            return Err(SelectionError::InvertedRange { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

impl Default for DateRange {
    fn default() -> Self {
        Self {
            start: NaiveDate::from_ymd_opt(2021, 6, 1).unwrap_or_default(),
            end: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap_or_default(),
        }
    }
}

/// Country compared against the U.S. in the overview panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize)]
pub enum CompareCountry {
    #[default]
    Canada,
    China,
    India,
    Germany,
    Netherlands,
    #[value(name = "uk")]
    Uk,
}

impl CompareCountry {
    /// Country value as it appears in the dataset.
    pub fn dataset_name(self) -> &'static str {
        match self {
            CompareCountry::Canada => "Canada",
            CompareCountry::China => "China",
            CompareCountry::India => "India",
            CompareCountry::Germany => "Germany",
            CompareCountry::Netherlands => "Netherlands",
            CompareCountry::Uk => "United Kingdom",
        }
    }

    pub fn compared_set(self) -> Vec<String> {
        vec![FOCUS_COUNTRY.to_string(), self.dataset_name().to_string()]
    }
}

impl fmt::Display for CompareCountry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompareCountry::Uk => f.write_str("UK"),
            other => f.write_str(other.dataset_name()),
        }
    }
}

/// Current widget state. Each dashboard build reads it once.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Selection {
    pub date_range: DateRange,
    pub compare: CompareCountry,
    pub region: Region,
    pub top_countries: usize,
    pub leader_year: i32,
}

impl Default for Selection {
    fn default() -> Self {
        Self {
            date_range: DateRange::default(),
            compare: CompareCountry::default(),
            region: Region::default(),
            top_countries: 5,
            leader_year: FIRST_YEAR,
        }
    }
}

impl Selection {
    pub fn validate(&self) -> Result<(), SelectionError> {
        let DateRange { start, end } = self.date_range;
        if start > end {
            return Err(SelectionError::InvertedRange { start, end });
        }
        let (min, max) = (slider_min(), slider_max());
        if start < min || end > max {
            return Err(SelectionError::RangeOutOfBounds {
                start,
                end,
                min,
                max,
            });
        }
        if !(TOP_COUNTRIES_MIN..=TOP_COUNTRIES_MAX).contains(&self.top_countries) {
            return Err(SelectionError::TopCountries {
                value: self.top_countries,
                min: TOP_COUNTRIES_MIN,
                max: TOP_COUNTRIES_MAX,
            });
        }
        if !(FIRST_YEAR..=LAST_YEAR).contains(&self.leader_year) {
            return Err(SelectionError::Year {
                value: self.leader_year,
                min: FIRST_YEAR,
                max: LAST_YEAR,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn defaults_are_valid() {
        let selection = Selection::default();
        assert_eq!(selection.validate(), Ok(()));
        assert_eq!(selection.date_range.start, date(2021, 6, 1));
        assert_eq!(selection.date_range.end, date(2023, 1, 1));
        assert_eq!(selection.top_countries, 5);
    }

    #[test]
    fn range_is_inclusive() {
        let range = DateRange::new(date(2022, 1, 1), date(2022, 1, 31)).unwrap();
        assert!(range.contains(date(2022, 1, 1)));
        assert!(range.contains(date(2022, 1, 31)));
        assert!(!range.contains(date(2022, 2, 1)));
    }

    #[test]
    fn inverted_range_rejected() {
        let err = DateRange::new(date(2023, 1, 1), date(2022, 1, 1)).unwrap_err();
        assert!(matches!(err, SelectionError::InvertedRange { .. }));
    }

    #[test]
    fn out_of_bounds_selection_rejected() {
        let mut selection = Selection::default();
        selection.date_range = DateRange::new(date(2019, 1, 1), date(2022, 1, 1)).unwrap();
        assert!(matches!(
            selection.validate(),
            Err(SelectionError::RangeOutOfBounds { .. })
        ));

        let mut selection = Selection::default();
        selection.top_countries = 11;
        assert!(matches!(
            selection.validate(),
            Err(SelectionError::TopCountries { value: 11, .. })
        ));

        let mut selection = Selection::default();
        selection.leader_year = 2024;
        assert!(matches!(
            selection.validate(),
            Err(SelectionError::Year { value: 2024, .. })
        ));
    }

    #[test]
    fn uk_maps_to_dataset_name() {
        assert_eq!(
            CompareCountry::Uk.compared_set(),
            vec!["United States".to_string(), "United Kingdom".to_string()]
        );
        assert_eq!(CompareCountry::Uk.to_string(), "UK");
        assert_eq!(CompareCountry::Netherlands.to_string(), "Netherlands");
    }
}
