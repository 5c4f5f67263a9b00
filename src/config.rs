use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, ValueEnum};

use crate::error::SelectionError;
use crate::region::Region;
use crate::selection::{CompareCountry, DateRange, Selection, FIRST_YEAR};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Source {
    #[default]
    Csv,
    Postgres,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Markdown,
    Json,
}

/// Where records come from.
#[derive(Debug, Clone, Args)]
pub struct DataArgs {
    #[arg(long, env = "LAYOFFS_CSV", default_value = "layoff_clean.csv")]
    pub csv: PathBuf,
    #[arg(long, value_enum, default_value_t = Source::Csv)]
    pub source: Source,
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: Option<String>,
}

impl DataArgs {
    pub fn label(&self) -> String {
        match self.source {
            Source::Csv => self.csv.display().to_string(),
            Source::Postgres => "postgres".to_string(),
        }
    }
}

/// Widget state as flags. Defaults mirror the dashboard's initial state.
#[derive(Debug, Clone, Args)]
pub struct SelectionArgs {
    #[arg(long, default_value = "2021-06-01")]
    pub from: NaiveDate,
    #[arg(long, default_value = "2023-01-01")]
    pub to: NaiveDate,
    #[arg(long, value_enum, default_value_t = CompareCountry::Canada)]
    pub compare: CompareCountry,
    #[arg(long, value_enum, default_value_t = Region::World)]
    pub region: Region,
    #[arg(long, default_value_t = 5)]
    pub top_countries: usize,
    #[arg(long, default_value_t = FIRST_YEAR)]
    pub year: i32,
}

impl Default for SelectionArgs {
    fn default() -> Self {
        let selection = Selection::default();
        Self {
            from: selection.date_range.start,
            to: selection.date_range.end,
            compare: selection.compare,
            region: selection.region,
            top_countries: selection.top_countries,
            year: selection.leader_year,
        }
    }
}

impl SelectionArgs {
    pub fn to_selection(&self) -> Result<Selection, SelectionError> {
        let selection = Selection {
            date_range: DateRange::new(self.from, self.to)?,
            compare: self.compare,
            region: self.region,
            top_countries: self.top_countries,
            leader_year: self.year,
        };
        selection.validate()?;
        Ok(selection)
    }
}

#[derive(Debug, Clone, Args)]
pub struct OutputArgs {
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
    /// Write to this file instead of stdout.
    #[arg(long)]
    pub out: Option<PathBuf>,
}
