use anyhow::Context;
use sqlx::{PgPool, Row};
use tracing::{info, warn};
use uuid::Uuid;

use crate::dataset::{self, Dataset};
use crate::models::LayoffRecord;

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Stable per-event key so re-importing the same CSV inserts nothing new.
/// Covers every sourced field; coordinates, year and quarter follow from
/// location and date.
pub fn source_key(record: &LayoffRecord) -> String {
    let funds = record
        .funds_raised
        .map(|f| f.to_string())
        .unwrap_or_default();
    let natural = format!(
        "{}|{}|{}|{}|{}|{}|{}",
        record.company,
        record.location,
        record.country,
        record.industry,
        record.date,
        record.total_laid_off,
        funds
    );
    Uuid::new_v5(&Uuid::NAMESPACE_OID, natural.as_bytes()).to_string()
}

pub async fn import_csv(pool: &PgPool, csv_path: &std::path::Path) -> anyhow::Result<usize> {
    let dataset = dataset::load_csv(csv_path)
        .with_context(|| format!("failed to load {}", csv_path.display()))?;
    let mut inserted = 0usize;

    for record in dataset.records() {
        let total_laid_off =
            i64::try_from(record.total_laid_off).context("layoff count exceeds BIGINT")?;
        let key = source_key(record);
        let result = sqlx::query(
            r#"
            INSERT INTO layoffs.records
            (id, source_key, company, location, country, latitude, longitude,
             industry, occurred_on, total_laid_off, funds_raised, year, quarter)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&key)
        .bind(&record.company)
        .bind(&record.location)
        .bind(&record.country)
        .bind(record.latitude)
        .bind(record.longitude)
        .bind(&record.industry)
        .bind(record.date)
        .bind(total_laid_off)
        .bind(record.funds_raised)
        .bind(record.year)
        .bind(&record.quarter)
        .execute(pool)
        .await?;

        if result.rows_affected() > 0 {
            inserted += 1;
        } else {
            warn!(
                company = %record.company,
                date = %record.date,
                source_key = %key,
                "record already imported; skipped"
            );
        }
    }

    info!(
        path = %csv_path.display(),
        rows = dataset.len(),
        inserted,
        "imported layoff records"
    );
    Ok(inserted)
}

pub async fn fetch_records(pool: &PgPool) -> anyhow::Result<Dataset> {
    let rows = sqlx::query(
        "SELECT company, location, country, latitude, longitude, industry, \
         occurred_on, total_laid_off, funds_raised, year, quarter \
         FROM layoffs.records \
         ORDER BY occurred_on, company",
    )
    .fetch_all(pool)
    .await?;

    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        let total_laid_off: i64 = row.get("total_laid_off");
        records.push(LayoffRecord {
            company: row.get("company"),
            location: row.get("location"),
            country: row.get("country"),
            latitude: row.get("latitude"),
            longitude: row.get("longitude"),
            industry: row.get("industry"),
            date: row.get("occurred_on"),
            total_laid_off: u64::try_from(total_laid_off)
                .context("negative layoff count in database")?,
            funds_raised: row.get("funds_raised"),
            year: row.get("year"),
            quarter: row.get("quarter"),
        });
    }

    Ok(Dataset::from_records(records))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::quarter_label;
    use chrono::NaiveDate;

    fn record(laid_off: u64) -> LayoffRecord {
        let date = NaiveDate::from_ymd_opt(2023, 1, 20).unwrap();
        LayoffRecord {
            company: "Google".to_string(),
            location: "SF Bay Area".to_string(),
            country: "United States".to_string(),
            latitude: Some(37.77),
            longitude: Some(-122.41),
            industry: "Consumer".to_string(),
            date,
            total_laid_off: laid_off,
            funds_raised: Some(26.0),
            year: 2023,
            quarter: quarter_label(date),
        }
    }

    #[test]
    fn source_key_is_deterministic() {
        assert_eq!(source_key(&record(12000)), source_key(&record(12000)));
        assert_ne!(source_key(&record(12000)), source_key(&record(6000)));
    }

    #[test]
    fn source_key_separates_rows_differing_in_country() {
        let mut us = record(0);
        us.company = "Acme".to_string();
        us.location = "Remote".to_string();
        let mut canada = us.clone();
        canada.country = "Canada".to_string();
        assert_ne!(source_key(&us), source_key(&canada));

        let mut other_funds = us.clone();
        other_funds.funds_raised = Some(40.0);
        assert_ne!(source_key(&us), source_key(&other_funds));

        let mut other_industry = us.clone();
        other_industry.industry = "Other".to_string();
        assert_ne!(source_key(&us), source_key(&other_industry));
    }

    #[test]
    fn source_key_ignores_derived_fields() {
        let mut other = record(12000);
        other.latitude = None;
        other.quarter = "2023-Q1".to_string();
        assert_eq!(source_key(&record(12000)), source_key(&other));
    }
}
