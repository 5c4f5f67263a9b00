//! Filter and group-by steps behind each dashboard panel.
//!
//! Every function takes the base records by reference and returns a fresh
//! aggregation. Rankings sort descending by total with a stable sort over
//! groups already ordered by key, so ties come out in ascending key order.

use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDate;

use crate::models::{
    CompanyIndustryTotal, CompanyTotal, CountryDailyTotal, CountryTotal, DailyTotal, FundPoint,
    LayoffRecord, LocationTotal, QuarterTotal, YearLeader, YearTotal,
};
use crate::selection::{DateRange, FIRST_YEAR};

pub fn filter_date_range(records: &[LayoffRecord], range: DateRange) -> Vec<LayoffRecord> {
    records
        .iter()
        .filter(|r| range.contains(r.date))
        .cloned()
        .collect()
}

pub fn filter_countries(records: &[LayoffRecord], countries: &[String]) -> Vec<LayoffRecord> {
    let wanted: HashSet<&str> = countries.iter().map(String::as_str).collect();
    records
        .iter()
        .filter(|r| wanted.contains(r.country.as_str()))
        .cloned()
        .collect()
}

pub fn daily_totals(records: &[LayoffRecord]) -> Vec<DailyTotal> {
    let mut totals: BTreeMap<NaiveDate, u64> = BTreeMap::new();
    for record in records {
        *totals.entry(record.date).or_insert(0) += record.total_laid_off;
    }
    totals
        .into_iter()
        .map(|(date, total_laid_off)| DailyTotal {
            date,
            total_laid_off,
        })
        .collect()
}

pub fn country_daily_totals(
    records: &[LayoffRecord],
    countries: &[String],
) -> Vec<CountryDailyTotal> {
    let mut totals: BTreeMap<(NaiveDate, String), u64> = BTreeMap::new();
    for record in filter_countries(records, countries) {
        *totals.entry((record.date, record.country)).or_insert(0) += record.total_laid_off;
    }
    totals
        .into_iter()
        .map(|((date, country), total_laid_off)| CountryDailyTotal {
            date,
            country,
            total_laid_off,
        })
        .collect()
}

pub fn yearly_totals(records: &[LayoffRecord]) -> Vec<YearTotal> {
    let mut totals: BTreeMap<i32, u64> = BTreeMap::new();
    for record in records {
        *totals.entry(record.year).or_insert(0) += record.total_laid_off;
    }
    totals
        .into_iter()
        .map(|(year, total_laid_off)| YearTotal {
            year,
            total_laid_off,
        })
        .collect()
}

pub fn quarterly_totals(records: &[LayoffRecord]) -> Vec<QuarterTotal> {
    let mut totals: BTreeMap<&str, u64> = BTreeMap::new();
    for record in records {
        *totals.entry(record.quarter.as_str()).or_insert(0) += record.total_laid_off;
    }
    totals
        .into_iter()
        .map(|(quarter, total_laid_off)| QuarterTotal {
            quarter: quarter.to_string(),
            total_laid_off,
        })
        .collect()
}

/// Records without coordinates have no place on the map and are skipped.
pub fn location_totals(records: &[LayoffRecord]) -> Vec<LocationTotal> {
    // f64 is not Ord; the bit pattern keeps identical coordinates together.
    let mut totals: BTreeMap<(&str, &str, u64, u64), (f64, f64, u64)> = BTreeMap::new();
    for record in records {
        let (Some(latitude), Some(longitude)) = (record.latitude, record.longitude) else {
            continue;
        };
        let key = (
            record.country.as_str(),
            record.location.as_str(),
            latitude.to_bits(),
            longitude.to_bits(),
        );
        let entry = totals.entry(key).or_insert((latitude, longitude, 0));
        entry.2 += record.total_laid_off;
    }
    totals
        .into_iter()
        .map(
            |((country, location, _, _), (latitude, longitude, total_laid_off))| LocationTotal {
                latitude,
                longitude,
                location: location.to_string(),
                country: country.to_string(),
                total_laid_off,
            },
        )
        .collect()
}

pub fn top_countries(locations: &[LocationTotal], n: usize) -> Vec<CountryTotal> {
    let mut totals: BTreeMap<&str, u64> = BTreeMap::new();
    for point in locations {
        *totals.entry(point.country.as_str()).or_insert(0) += point.total_laid_off;
    }
    let mut ranked: Vec<CountryTotal> = totals
        .into_iter()
        .map(|(country, total_laid_off)| CountryTotal {
            country: country.to_string(),
            total_laid_off,
        })
        .collect();
    ranked.sort_by(|a, b| b.total_laid_off.cmp(&a.total_laid_off));
    ranked.truncate(n);
    ranked
}

pub fn top_companies(records: &[LayoffRecord], country: &str, n: usize) -> Vec<CompanyTotal> {
    let mut totals: BTreeMap<&str, u64> = BTreeMap::new();
    for record in records.iter().filter(|r| r.country == country) {
        *totals.entry(record.company.as_str()).or_insert(0) += record.total_laid_off;
    }
    let mut ranked: Vec<CompanyTotal> = totals
        .into_iter()
        .map(|(company, total_laid_off)| CompanyTotal {
            company: company.to_string(),
            total_laid_off,
        })
        .collect();
    ranked.sort_by(|a, b| b.total_laid_off.cmp(&a.total_laid_off));
    ranked.truncate(n);
    ranked
}

/// Per-industry split of the given companies' layoffs within one country.
pub fn company_industry_breakdown(
    records: &[LayoffRecord],
    country: &str,
    companies: &[CompanyTotal],
) -> Vec<CompanyIndustryTotal> {
    let wanted: HashSet<&str> = companies.iter().map(|c| c.company.as_str()).collect();
    let mut totals: BTreeMap<(&str, &str), u64> = BTreeMap::new();
    for record in records
        .iter()
        .filter(|r| r.country == country && wanted.contains(r.company.as_str()))
    {
        *totals
            .entry((record.company.as_str(), record.industry.as_str()))
            .or_insert(0) += record.total_laid_off;
    }
    totals
        .into_iter()
        .map(|((company, industry), total_laid_off)| CompanyIndustryTotal {
            company: company.to_string(),
            industry: industry.to_string(),
            total_laid_off,
        })
        .collect()
}

pub fn year_leader(records: &[LayoffRecord], country: &str, year: i32) -> Option<YearLeader> {
    let mut totals: BTreeMap<(&str, &str, &str), u64> = BTreeMap::new();
    for record in records
        .iter()
        .filter(|r| r.country == country && r.year == year)
    {
        *totals
            .entry((
                record.company.as_str(),
                record.location.as_str(),
                record.industry.as_str(),
            ))
            .or_insert(0) += record.total_laid_off;
    }

    let mut ranked: Vec<_> = totals.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    let ((company, location, industry), total_laid_off) = ranked.into_iter().next()?;

    let previous_total = if year > FIRST_YEAR {
        let mut previous = records
            .iter()
            .filter(|r| r.country == country && r.year == year - 1 && r.company == company)
            .peekable();
        previous
            .peek()
            .is_some()
            .then(|| previous.map(|r| r.total_laid_off).sum::<u64>())
    } else {
        None
    };
    let delta_percent = previous_total
        .filter(|prev| *prev > 0)
        .map(|prev| (total_laid_off as f64 - prev as f64) / prev as f64 * 100.0);

    Some(YearLeader {
        year,
        company: company.to_string(),
        location: location.to_string(),
        industry: industry.to_string(),
        total_laid_off,
        previous_total,
        delta_percent,
    })
}

/// Records with a reported layoff count, for the funds scatter.
pub fn fund_points(records: &[LayoffRecord]) -> Vec<FundPoint> {
    records
        .iter()
        .filter(|r| r.total_laid_off > 0)
        .map(|r| FundPoint {
            company: r.company.clone(),
            date: r.date,
            total_laid_off: r.total_laid_off,
            funds_raised: r.funds_raised,
        })
        .collect()
}

pub fn cumulative_totals<I>(totals: I) -> Vec<u64>
where
    I: IntoIterator<Item = u64>,
{
    totals
        .into_iter()
        .scan(0u64, |running, value| {
            *running += value;
            Some(*running)
        })
        .collect()
}
