use std::fmt::Write;

use crate::dashboard::{
    CompaniesPanel, DashboardView, FundsPanel, GeoPanel, OverviewPanel, TrendsPanel,
};
use crate::models::YearLeader;
use crate::pipeline;

pub fn leader_line(leader: &YearLeader) -> String {
    match leader.delta_percent {
        Some(delta) => format!(
            "{}: {} laid off in {} ({:+.2}% vs {})",
            leader.title(),
            leader.total_laid_off,
            leader.year,
            delta,
            leader.year - 1
        ),
        None => format!(
            "{}: {} laid off in {}",
            leader.title(),
            leader.total_laid_off,
            leader.year
        ),
    }
}

pub fn overview_text(panel: &OverviewPanel) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "Overview");
    let _ = writeln!(output, "  total laid off in range: {}", panel.total_laid_off);
    if panel.daily.is_empty() {
        let _ = writeln!(output, "  no layoffs reported in this range");
    }
    for point in panel.daily.iter() {
        let _ = writeln!(output, "  {}  {:>8}", point.date, point.total_laid_off);
    }
    let _ = writeln!(output, "  compared: {}", panel.compared_countries.join(" vs "));
    for country in panel.compared_countries.iter() {
        let total: u64 = panel
            .by_country
            .iter()
            .filter(|p| &p.country == country)
            .map(|p| p.total_laid_off)
            .sum();
        let _ = writeln!(output, "  - {country}: {total}");
    }
    output
}

pub fn trends_text(panel: &TrendsPanel) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "Layoffs by year");
    for year in panel.yearly.iter() {
        let _ = writeln!(output, "  {}  {:>8}", year.year, year.total_laid_off);
    }
    let _ = writeln!(output, "Layoffs by quarter");
    for quarter in panel.quarterly.iter() {
        let _ = writeln!(output, "  {}  {:>8}", quarter.quarter, quarter.total_laid_off);
    }
    output
}

pub fn geo_text(panel: &GeoPanel) -> String {
    let mut output = String::new();
    let _ = writeln!(
        output,
        "Map: {} ({} of {} locations in view, {} laid off overall)",
        panel.map.region,
        panel.map.visible_points,
        panel.map.points.len(),
        panel.map.total_laid_off
    );
    let _ = writeln!(output, "Top {} countries", panel.top_countries.len());
    for (rank, country) in panel.top_countries.iter().enumerate() {
        let _ = writeln!(
            output,
            "  {:>2}. {} {}",
            rank + 1,
            country.country,
            country.total_laid_off
        );
    }
    output
}

pub fn companies_text(panel: &CompaniesPanel) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "Top companies in {}", panel.country);
    let running = pipeline::cumulative_totals(panel.top.iter().map(|c| c.total_laid_off));
    for ((rank, company), so_far) in panel.top.iter().enumerate().zip(running) {
        let industries: Vec<&str> = panel
            .by_industry
            .iter()
            .filter(|b| b.company == company.company)
            .map(|b| b.industry.as_str())
            .collect();
        let _ = writeln!(
            output,
            "  {:>2}. {} {} [{}] (top {}: {})",
            rank + 1,
            company.company,
            company.total_laid_off,
            industries.join(", "),
            rank + 1,
            so_far
        );
    }
    match &panel.leader {
        Some(leader) => {
            let _ = writeln!(output, "Most layoffs: {}", leader_line(leader));
        }
        None => {
            let _ = writeln!(output, "No layoffs reported for the selected year.");
        }
    }
    output
}

pub fn funds_text(panel: &FundsPanel) -> String {
    let mut output = String::new();
    let with_funds = panel.points.iter().filter(|p| p.funds_raised.is_some()).count();
    let _ = writeln!(
        output,
        "Funds raised: {} layoff events, {} with a reported raise",
        panel.points.len(),
        with_funds
    );
    let mut ranked: Vec<_> = panel.points.iter().collect();
    ranked.sort_by(|a, b| b.total_laid_off.cmp(&a.total_laid_off));
    for point in ranked.iter().take(10) {
        let funds = point
            .funds_raised
            .map(|f| format!("${f:.1}M"))
            .unwrap_or_else(|| "n/a".to_string());
        let _ = writeln!(
            output,
            "  {} ({}) {} laid off, raised {}",
            point.company, point.date, point.total_laid_off, funds
        );
    }
    output
}

pub fn render_text(view: &DashboardView) -> String {
    [
        overview_text(&view.overview),
        trends_text(&view.trends),
        geo_text(&view.geo),
        companies_text(&view.companies),
        funds_text(&view.funds),
    ]
    .join("\n")
}

pub fn render_markdown(view: &DashboardView, dataset_label: &str) -> String {
    let mut output = String::new();
    let range = view.selection.date_range;

    let _ = writeln!(output, "# Tech Companies Layoffs (2020-2023)");
    let _ = writeln!(
        output,
        "Generated from {} for {} to {}",
        dataset_label, range.start, range.end
    );
    let _ = writeln!(output);

    let _ = writeln!(output, "## Overview");
    if view.overview.daily.is_empty() {
        let _ = writeln!(output, "No layoffs reported in this range.");
    } else {
        let _ = writeln!(
            output,
            "{} employees laid off across {} reporting days.",
            view.overview.total_laid_off,
            view.overview.daily.len()
        );
    }
    for country in view.overview.compared_countries.iter() {
        let total: u64 = view
            .overview
            .by_country
            .iter()
            .filter(|p| &p.country == country)
            .map(|p| p.total_laid_off)
            .sum();
        let _ = writeln!(output, "- {country}: {total}");
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Layoff Trends over Time");
    let _ = writeln!(output, "| Year | Layoffs |");
    let _ = writeln!(output, "|------|---------|");
    for year in view.trends.yearly.iter() {
        let _ = writeln!(output, "| {} | {} |", year.year, year.total_laid_off);
    }
    let _ = writeln!(output);
    let _ = writeln!(output, "| Quarter | Layoffs |");
    let _ = writeln!(output, "|---------|---------|");
    for quarter in view.trends.quarterly.iter() {
        let _ = writeln!(output, "| {} | {} |", quarter.quarter, quarter.total_laid_off);
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Layoffs in Different Countries/Regions");
    let _ = writeln!(
        output,
        "Map scope: {} ({} of {} locations in view).",
        view.geo.map.region,
        view.geo.map.visible_points,
        view.geo.map.points.len()
    );
    for country in view.geo.top_countries.iter() {
        let _ = writeln!(output, "- {}: {}", country.country, country.total_laid_off);
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Layoffs in {}", view.companies.country);
    if view.companies.top.is_empty() {
        let _ = writeln!(output, "No companies reported layoffs.");
    } else {
        for company in view.companies.top.iter() {
            let _ = writeln!(output, "- {}: {}", company.company, company.total_laid_off);
        }
    }
    if let Some(leader) = &view.companies.leader {
        let _ = writeln!(output);
        let _ = writeln!(output, "Most layoffs in {}: {}", leader.year, leader_line(leader));
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Layoffs and Fund Raised");
    let _ = writeln!(
        output,
        "{} layoff events with a reported count.",
        view.funds.points.len()
    );

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Dataset;
    use crate::models::{quarter_label, LayoffRecord};
    use crate::selection::Selection;
    use chrono::NaiveDate;

    fn record(company: &str, country: &str, day: NaiveDate, laid_off: u64) -> LayoffRecord {
        LayoffRecord {
            company: company.to_string(),
            location: "SF Bay Area".to_string(),
            country: country.to_string(),
            latitude: Some(37.77),
            longitude: Some(-122.41),
            industry: "Consumer".to_string(),
            date: day,
            total_laid_off: laid_off,
            funds_raised: Some(26.0),
            year: chrono::Datelike::year(&day),
            quarter: quarter_label(day),
        }
    }

    fn view() -> DashboardView {
        let dataset = Dataset::from_records(vec![
            record("Meta", "United States", NaiveDate::from_ymd_opt(2022, 11, 9).unwrap(), 11000),
            record("Meta", "United States", NaiveDate::from_ymd_opt(2021, 3, 9).unwrap(), 5500),
            record("Lyft", "United States", NaiveDate::from_ymd_opt(2022, 11, 3).unwrap(), 700),
        ]);
        let mut selection = Selection::default();
        selection.leader_year = 2022;
        DashboardView::build(&dataset, &selection).unwrap()
    }

    #[test]
    fn markdown_has_every_section() {
        let report = render_markdown(&view(), "layoff_clean.csv");
        for heading in [
            "# Tech Companies Layoffs (2020-2023)",
            "## Overview",
            "## Layoff Trends over Time",
            "## Layoffs in Different Countries/Regions",
            "## Layoffs in United States",
            "## Layoffs and Fund Raised",
        ] {
            assert!(report.contains(heading), "missing {heading}");
        }
        assert!(report.contains("| 2022 | 11700 |"));
        assert!(report.contains("- Meta: 16500"));
    }

    #[test]
    fn leader_line_includes_delta() {
        let view = view();
        let line = leader_line(view.companies.leader.as_ref().unwrap());
        assert_eq!(
            line,
            "Meta | SF Bay Area | Consumer: 11000 laid off in 2022 (+100.00% vs 2021)"
        );
    }

    #[test]
    fn text_summary_lists_panels() {
        let text = render_text(&view());
        assert!(text.contains("Layoffs by year"));
        assert!(text.contains("Top companies in United States"));
        assert!(text.contains("Funds raised: 3 layoff events, 3 with a reported raise"));
        assert!(text.contains("Map: World"));
    }
}
