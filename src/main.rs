use std::io;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod chart;
mod config;
mod dashboard;
mod dataset;
mod db;
mod error;
mod models;
mod pipeline;
mod region;
mod report;
mod selection;

use config::{DataArgs, OutputArgs, OutputFormat, SelectionArgs, Source};
use dashboard::DashboardView;
use dataset::Dataset;

#[derive(Parser)]
#[command(name = "layoff-dashboard")]
#[command(about = "Tech industry layoffs (2020-2023) dashboard", long_about = None)]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the Postgres schema
    InitDb {
        #[command(flatten)]
        data: DataArgs,
    },
    /// Copy the CSV dataset into Postgres
    Import {
        #[command(flatten)]
        data: DataArgs,
    },
    /// Layoffs per day in the date range, U.S. against one other country
    Overview {
        #[command(flatten)]
        data: DataArgs,
        #[command(flatten)]
        selection: SelectionArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Layoffs per year and per quarter
    Trends {
        #[command(flatten)]
        data: DataArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Map scope and countries ranked by layoffs
    Geo {
        #[command(flatten)]
        data: DataArgs,
        #[command(flatten)]
        selection: SelectionArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Top U.S. companies and the company with the most layoffs in a year
    Companies {
        #[command(flatten)]
        data: DataArgs,
        #[command(flatten)]
        selection: SelectionArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Layoff counts against funds raised
    Funds {
        #[command(flatten)]
        data: DataArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Every panel for one selection
    Dashboard {
        #[command(flatten)]
        data: DataArgs,
        #[command(flatten)]
        selection: SelectionArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Generate a markdown report
    Report {
        #[command(flatten)]
        data: DataArgs,
        #[command(flatten)]
        selection: SelectionArgs,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
    /// Render panels as SVG charts
    Charts {
        #[command(flatten)]
        data: DataArgs,
        #[command(flatten)]
        selection: SelectionArgs,
        #[arg(long, default_value = "charts")]
        dir: PathBuf,
        /// Render only this panel
        #[arg(long, value_enum)]
        panel: Option<chart::Panel>,
    },
}

async fn connect(data: &DataArgs) -> anyhow::Result<PgPool> {
    let database_url = data
        .database_url
        .as_deref()
        .context("DATABASE_URL must be set to a Postgres instance")?;
    PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await
        .context("failed to connect to Postgres")
}

async fn load(data: &DataArgs) -> anyhow::Result<Dataset> {
    let dataset = match data.source {
        Source::Csv => dataset::load_csv(&data.csv)
            .with_context(|| format!("failed to load {}", data.csv.display()))?,
        Source::Postgres => {
            let pool = connect(data).await?;
            db::fetch_records(&pool).await?
        }
    };
    if dataset.is_empty() {
        warn!(source = %data.label(), "dataset has no records");
    } else if let Some((first, last)) = dataset.date_bounds() {
        info!(
            source = %data.label(),
            records = dataset.len(),
            laid_off = dataset.total_laid_off(),
            countries = dataset.countries().len(),
            %first,
            %last,
            "dataset ready"
        );
    }
    Ok(dataset)
}

fn emit<T: Serialize>(output: &OutputArgs, text: String, value: &T) -> anyhow::Result<()> {
    let body = match output.format {
        OutputFormat::Json => serde_json::to_string_pretty(value)?,
        OutputFormat::Text | OutputFormat::Markdown => text,
    };
    match &output.out {
        Some(path) => {
            std::fs::write(path, body)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("Written to {}.", path.display());
        }
        None => print!("{body}"),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    match cli.command {
        Commands::InitDb { data } => {
            let pool = connect(&data).await?;
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Import { data } => {
            let pool = connect(&data).await?;
            let inserted = db::import_csv(&pool, &data.csv).await?;
            println!("Inserted {inserted} records from {}.", data.csv.display());
        }
        Commands::Overview {
            data,
            selection,
            output,
        } => {
            let selection = selection.to_selection()?;
            let dataset = load(&data).await?;
            let panel = dashboard::overview(&dataset, &selection);
            emit(&output, report::overview_text(&panel), &panel)?;
        }
        Commands::Trends { data, output } => {
            let dataset = load(&data).await?;
            let panel = dashboard::trends(&dataset);
            emit(&output, report::trends_text(&panel), &panel)?;
        }
        Commands::Geo {
            data,
            selection,
            output,
        } => {
            let selection = selection.to_selection()?;
            let dataset = load(&data).await?;
            let panel = dashboard::geo(&dataset, &selection);
            emit(&output, report::geo_text(&panel), &panel)?;
        }
        Commands::Companies {
            data,
            selection,
            output,
        } => {
            let selection = selection.to_selection()?;
            let dataset = load(&data).await?;
            let panel = dashboard::companies(&dataset, &selection);
            emit(&output, report::companies_text(&panel), &panel)?;
        }
        Commands::Funds { data, output } => {
            let dataset = load(&data).await?;
            let panel = dashboard::funds(&dataset);
            emit(&output, report::funds_text(&panel), &panel)?;
        }
        Commands::Dashboard {
            data,
            selection,
            output,
        } => {
            let selection = selection.to_selection()?;
            let dataset = load(&data).await?;
            let view = DashboardView::build(&dataset, &selection)?;
            let text = match output.format {
                OutputFormat::Markdown => report::render_markdown(&view, &data.label()),
                _ => report::render_text(&view),
            };
            emit(&output, text, &view)?;
        }
        Commands::Report {
            data,
            selection,
            out,
        } => {
            let selection = selection.to_selection()?;
            let dataset = load(&data).await?;
            let view = DashboardView::build(&dataset, &selection)?;
            let report = report::render_markdown(&view, &data.label());
            std::fs::write(&out, report)?;
            println!("Report written to {}.", out.display());
        }
        Commands::Charts {
            data,
            selection,
            dir,
            panel,
        } => {
            let selection = selection.to_selection()?;
            let dataset = load(&data).await?;
            let view = DashboardView::build(&dataset, &selection)?;
            match panel {
                Some(panel) => {
                    std::fs::create_dir_all(&dir)?;
                    let path = dir.join(format!("{}.svg", panel.name()));
                    std::fs::write(&path, chart::render_svg(panel, &view)?)?;
                    println!("Chart written to {}.", path.display());
                }
                None => {
                    let written = chart::write_all(&view, &dir)?;
                    println!("{} charts written to {}.", written.len(), dir.display());
                }
            }
        }
    }

    Ok(())
}
