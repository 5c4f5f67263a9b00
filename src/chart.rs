//! SVG rendering of dashboard panels.
//!
//! Category axes (years, quarters, countries, companies) are laid out on a
//! float axis with one bar per integer slot; dates are plotted as day
//! numbers and formatted back on the axis.

use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDate};
use clap::ValueEnum;
use plotters::prelude::*;
use thiserror::Error;
use tracing::debug;

use crate::dashboard::DashboardView;

const WIDTH: u32 = 960;
const HEIGHT: u32 = 540;
const OVERVIEW_GREEN: RGBColor = RGBColor(0x10, 0x96, 0x18);
const STEEL_BLUE: RGBColor = RGBColor(70, 130, 180);
const ORANGE: RGBColor = RGBColor(255, 165, 0);
const D3: [RGBColor; 10] = [
    RGBColor(0x1f, 0x77, 0xb4),
    RGBColor(0xff, 0x7f, 0x0e),
    RGBColor(0x2c, 0xa0, 0x2c),
    RGBColor(0xd6, 0x27, 0x28),
    RGBColor(0x94, 0x67, 0xbd),
    RGBColor(0x8c, 0x56, 0x4b),
    RGBColor(0xe3, 0x77, 0xc2),
    RGBColor(0x7f, 0x7f, 0x7f),
    RGBColor(0xbc, 0xbd, 0x22),
    RGBColor(0x17, 0xbe, 0xcf),
];

#[derive(Debug, Error)]
pub enum ChartError {
    #[error("failed to draw {panel} chart: {message}")]
    Draw { panel: &'static str, message: String },
    #[error("failed to write chart {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Panel {
    Overview,
    Compare,
    Yearly,
    Quarterly,
    Map,
    Countries,
    Companies,
    Funds,
}

impl Panel {
    pub fn name(self) -> &'static str {
        match self {
            Panel::Overview => "overview",
            Panel::Compare => "compare",
            Panel::Yearly => "yearly",
            Panel::Quarterly => "quarterly",
            Panel::Map => "map",
            Panel::Countries => "countries",
            Panel::Companies => "companies",
            Panel::Funds => "funds",
        }
    }
}

struct Bar {
    label: String,
    value: u64,
    color: RGBColor,
}

/// One stacked piece of a category's bar, `series` indexing the legend.
#[derive(Debug, Clone, PartialEq)]
struct Segment {
    category: usize,
    series: usize,
    low: u64,
    high: u64,
}

/// Stacks each company's industry totals in ranking order. Returns the
/// legend entries (first-seen industry order) and the segments.
fn industry_segments(view: &DashboardView) -> (Vec<String>, Vec<Segment>) {
    let mut industries: Vec<String> = Vec::new();
    let mut segments = Vec::new();
    for (category, company) in view.companies.top.iter().enumerate() {
        let mut base = 0u64;
        for part in view
            .companies
            .by_industry
            .iter()
            .filter(|b| b.company == company.company)
        {
            let series = match industries.iter().position(|i| i == &part.industry) {
                Some(index) => index,
                None => {
                    industries.push(part.industry.clone());
                    industries.len() - 1
                }
            };
            segments.push(Segment {
                category,
                series,
                low: base,
                high: base + part.total_laid_off,
            });
            base += part.total_laid_off;
        }
    }
    (industries, segments)
}

fn marker_radius(weight: u64, heaviest: u64) -> i32 {
    if weight == 0 || heaviest == 0 {
        return 3;
    }
    2 + ((weight as f64 / heaviest as f64).sqrt() * 18.0) as i32
}

fn day_number(date: NaiveDate) -> f64 {
    date.num_days_from_ce() as f64
}

fn day_label(value: &f64) -> String {
    NaiveDate::from_num_days_from_ce_opt(value.round() as i32)
        .map(|d| d.format("%y-%m-%d").to_string())
        .unwrap_or_default()
}

fn year_color(year: i32) -> RGBColor {
    match year {
        2022 => ORANGE,
        2023 => RED,
        _ => STEEL_BLUE,
    }
}

fn padded_max(max: f64) -> f64 {
    if max <= 0.0 {
        1.0
    } else {
        max * 1.1
    }
}

fn bar_chart(panel: Panel, title: &str, x_desc: &str, bars: &[Bar]) -> Result<String, ChartError> {
    let fail = |e: &dyn std::fmt::Display| ChartError::Draw {
        panel: panel.name(),
        message: e.to_string(),
    };
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (WIDTH, HEIGHT)).into_drawing_area();
        root.fill(&WHITE).map_err(|e| fail(&e))?;

        let max = bars.iter().map(|b| b.value).max().unwrap_or(0) as f64;
        let slots = bars.len().max(1) as f64;
        let mut chart = ChartBuilder::on(&root)
            .caption(title, ("sans-serif", 24).into_font())
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(-0.5..slots - 0.5, 0.0..padded_max(max))
            .map_err(|e| fail(&e))?;

        let labels: Vec<&str> = bars.iter().map(|b| b.label.as_str()).collect();
        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(bars.len().max(1))
            .x_label_formatter(&|x: &f64| {
                if (x - x.round()).abs() > 1e-6 || *x < 0.0 {
                    return String::new();
                }
                labels
                    .get(x.round() as usize)
                    .map(|s| s.to_string())
                    .unwrap_or_default()
            })
            .x_desc(x_desc)
            .y_desc("Number of Layoffs")
            .draw()
            .map_err(|e| fail(&e))?;

        chart
            .draw_series(bars.iter().enumerate().map(|(i, bar)| {
                let x = i as f64;
                Rectangle::new([(x - 0.4, 0.0), (x + 0.4, bar.value as f64)], bar.color.filled())
            }))
            .map_err(|e| fail(&e))?;

        root.present().map_err(|e| fail(&e))?;
    }
    Ok(svg)
}

fn stacked_bar_chart(
    panel: Panel,
    title: &str,
    x_desc: &str,
    categories: &[String],
    series: &[String],
    segments: &[Segment],
) -> Result<String, ChartError> {
    let fail = |e: &dyn std::fmt::Display| ChartError::Draw {
        panel: panel.name(),
        message: e.to_string(),
    };
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (WIDTH, HEIGHT)).into_drawing_area();
        root.fill(&WHITE).map_err(|e| fail(&e))?;

        let max = segments.iter().map(|s| s.high).max().unwrap_or(0) as f64;
        let slots = categories.len().max(1) as f64;
        let mut chart = ChartBuilder::on(&root)
            .caption(title, ("sans-serif", 24).into_font())
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(-0.5..slots - 0.5, 0.0..padded_max(max))
            .map_err(|e| fail(&e))?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(categories.len().max(1))
            .x_label_formatter(&|x: &f64| {
                if (x - x.round()).abs() > 1e-6 || *x < 0.0 {
                    return String::new();
                }
                categories.get(x.round() as usize).cloned().unwrap_or_default()
            })
            .x_desc(x_desc)
            .y_desc("Number of Layoffs")
            .draw()
            .map_err(|e| fail(&e))?;

        for (index, name) in series.iter().enumerate() {
            let color = D3[index % D3.len()];
            chart
                .draw_series(segments.iter().filter(|s| s.series == index).map(|s| {
                    let x = s.category as f64;
                    Rectangle::new([(x - 0.4, s.low as f64), (x + 0.4, s.high as f64)], color.filled())
                }))
                .map_err(|e| fail(&e))?
                .label(name.as_str())
                .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));
        }

        if !series.is_empty() {
            chart
                .configure_series_labels()
                .position(SeriesLabelPosition::UpperRight)
                .background_style(WHITE.mix(0.8))
                .border_style(BLACK)
                .draw()
                .map_err(|e| fail(&e))?;
        }

        root.present().map_err(|e| fail(&e))?;
    }
    Ok(svg)
}

fn line_chart(
    panel: Panel,
    title: &str,
    series: &[(String, RGBColor, Vec<(NaiveDate, u64)>)],
) -> Result<String, ChartError> {
    let fail = |e: &dyn std::fmt::Display| ChartError::Draw {
        panel: panel.name(),
        message: e.to_string(),
    };
    let points = series.iter().flat_map(|(_, _, pts)| pts.iter());
    let (mut x_min, mut x_max, mut y_max) = (f64::MAX, f64::MIN, 0.0f64);
    for (date, value) in points {
        x_min = x_min.min(day_number(*date));
        x_max = x_max.max(day_number(*date));
        y_max = y_max.max(*value as f64);
    }
    if x_min > x_max {
        (x_min, x_max) = (0.0, 1.0);
    }
    if x_min == x_max {
        x_max = x_min + 1.0;
    }

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (WIDTH, HEIGHT)).into_drawing_area();
        root.fill(&WHITE).map_err(|e| fail(&e))?;

        let mut chart = ChartBuilder::on(&root)
            .caption(title, ("sans-serif", 24).into_font())
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(x_min..x_max, 0.0..padded_max(y_max))
            .map_err(|e| fail(&e))?;

        chart
            .configure_mesh()
            .x_label_formatter(&day_label)
            .x_desc("Date")
            .y_desc("Number of Layoffs")
            .draw()
            .map_err(|e| fail(&e))?;

        for (name, color, pts) in series {
            let color = *color;
            let coords: Vec<(f64, f64)> = pts
                .iter()
                .map(|(d, v)| (day_number(*d), *v as f64))
                .collect();
            chart
                .draw_series(LineSeries::new(coords.iter().copied(), color.stroke_width(2)))
                .map_err(|e| fail(&e))?
                .label(name.as_str())
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
            chart
                .draw_series(coords.iter().map(|&(x, y)| Circle::new((x, y), 3, color.filled())))
                .map_err(|e| fail(&e))?;
        }

        if series.len() > 1 {
            chart
                .configure_series_labels()
                .background_style(WHITE.mix(0.8))
                .border_style(BLACK)
                .draw()
                .map_err(|e| fail(&e))?;
        }

        root.present().map_err(|e| fail(&e))?;
    }
    Ok(svg)
}

/// `(x, y, weight)` triples; circle radius grows with the weight. Zero
/// weight draws a plain marker.
fn scatter_chart(
    panel: Panel,
    title: &str,
    axes: ((f64, f64), (f64, f64)),
    descs: (&str, &str),
    points: &[(f64, f64, u64)],
) -> Result<String, ChartError> {
    let fail = |e: &dyn std::fmt::Display| ChartError::Draw {
        panel: panel.name(),
        message: e.to_string(),
    };
    let ((x_min, x_max), (y_min, y_max)) = axes;
    let heaviest = points.iter().map(|p| p.2).max().unwrap_or(0);

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (WIDTH, HEIGHT)).into_drawing_area();
        root.fill(&WHITE).map_err(|e| fail(&e))?;

        let mut chart = ChartBuilder::on(&root)
            .caption(title, ("sans-serif", 24).into_font())
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(x_min..x_max, y_min..y_max)
            .map_err(|e| fail(&e))?;

        chart
            .configure_mesh()
            .x_desc(descs.0)
            .y_desc(descs.1)
            .draw()
            .map_err(|e| fail(&e))?;

        chart
            .draw_series(points.iter().map(|&(x, y, weight)| {
                Circle::new((x, y), marker_radius(weight, heaviest), D3[0].mix(0.6).filled())
            }))
            .map_err(|e| fail(&e))?;

        root.present().map_err(|e| fail(&e))?;
    }
    Ok(svg)
}

pub fn render_svg(panel: Panel, view: &DashboardView) -> Result<String, ChartError> {
    match panel {
        Panel::Overview => {
            let points = view
                .overview
                .daily
                .iter()
                .map(|p| (p.date, p.total_laid_off))
                .collect();
            line_chart(
                panel,
                "Layoffs over time",
                &[("All countries".to_string(), OVERVIEW_GREEN, points)],
            )
        }
        Panel::Compare => {
            let series: Vec<_> = view
                .overview
                .compared_countries
                .iter()
                .enumerate()
                .map(|(i, country)| {
                    let points = view
                        .overview
                        .by_country
                        .iter()
                        .filter(|p| &p.country == country)
                        .map(|p| (p.date, p.total_laid_off))
                        .collect();
                    (country.clone(), D3[i % D3.len()], points)
                })
                .collect();
            line_chart(panel, "United States compared", &series)
        }
        Panel::Yearly => {
            let bars: Vec<Bar> = view
                .trends
                .yearly
                .iter()
                .map(|y| Bar {
                    label: y.year.to_string(),
                    value: y.total_laid_off,
                    color: year_color(y.year),
                })
                .collect();
            bar_chart(panel, "Number of layoffs from 2020 to 2023", "Year", &bars)
        }
        Panel::Quarterly => {
            let bars: Vec<Bar> = view
                .trends
                .quarterly
                .iter()
                .map(|q| Bar {
                    label: q.quarter.clone(),
                    value: q.total_laid_off,
                    color: D3[0],
                })
                .collect();
            bar_chart(panel, "Layoff trends by quarter", "Quarter", &bars)
        }
        Panel::Map => {
            let viewport = view.geo.map.viewport;
            let points: Vec<(f64, f64, u64)> = view
                .geo
                .map
                .visible()
                .map(|p| (p.longitude, p.latitude, p.total_laid_off))
                .collect();
            let title = format!("Layoffs by location: {}", view.geo.map.region);
            scatter_chart(
                panel,
                &title,
                (
                    (viewport.lon_min, viewport.lon_max),
                    (viewport.lat_min, viewport.lat_max),
                ),
                ("Longitude", "Latitude"),
                &points,
            )
        }
        Panel::Countries => {
            let bars: Vec<Bar> = view
                .geo
                .top_countries
                .iter()
                .map(|c| Bar {
                    label: c.country.clone(),
                    value: c.total_laid_off,
                    color: D3[0],
                })
                .collect();
            bar_chart(panel, "Countries with the most layoffs", "Countries", &bars)
        }
        Panel::Companies => {
            let companies: Vec<String> =
                view.companies.top.iter().map(|c| c.company.clone()).collect();
            let (industries, segments) = industry_segments(view);
            let title = format!(
                "The top {} companies with the most reported layoffs in {}",
                companies.len(),
                view.companies.country
            );
            stacked_bar_chart(panel, &title, "Company", &companies, &industries, &segments)
        }
        Panel::Funds => {
            let points: Vec<(f64, f64, u64)> = view
                .funds
                .points
                .iter()
                .filter_map(|p| p.funds_raised.map(|f| (p.total_laid_off as f64, f, 0)))
                .collect();
            let x_max = points.iter().map(|p| p.0).fold(0.0, f64::max);
            let y_max = points.iter().map(|p| p.1).fold(0.0, f64::max);
            scatter_chart(
                panel,
                "Number of layoffs vs. funds raised",
                ((0.0, padded_max(x_max)), (0.0, padded_max(y_max))),
                ("Number of Layoffs", "Amount of Funds Raised"),
                &points,
            )
        }
    }
}

/// Writes one `<panel>.svg` per panel into `dir`.
pub fn write_all(view: &DashboardView, dir: &Path) -> Result<Vec<PathBuf>, ChartError> {
    std::fs::create_dir_all(dir).map_err(|source| ChartError::Write {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut written = Vec::new();
    for panel in Panel::value_variants() {
        let svg = render_svg(*panel, view)?;
        let path = dir.join(format!("{}.svg", panel.name()));
        std::fs::write(&path, svg).map_err(|source| ChartError::Write {
            path: path.clone(),
            source,
        })?;
        debug!(path = %path.display(), "chart written");
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Dataset;
    use crate::models::{quarter_label, LayoffRecord};
    use crate::selection::Selection;

    fn view() -> DashboardView {
        let day = NaiveDate::from_ymd_opt(2022, 11, 9).unwrap();
        let dataset = Dataset::from_records(vec![LayoffRecord {
            company: "Meta".to_string(),
            location: "SF Bay Area".to_string(),
            country: "United States".to_string(),
            latitude: Some(37.77),
            longitude: Some(-122.41),
            industry: "Consumer".to_string(),
            date: day,
            total_laid_off: 11000,
            funds_raised: Some(26000.0),
            year: 2022,
            quarter: quarter_label(day),
        }]);
        DashboardView::build(&dataset, &Selection::default()).unwrap()
    }

    #[test]
    fn day_labels_round_trip() {
        let date = NaiveDate::from_ymd_opt(2022, 11, 9).unwrap();
        assert_eq!(day_label(&day_number(date)), "22-11-09");
    }

    #[test]
    fn year_colors_follow_severity() {
        assert_eq!(year_color(2020), STEEL_BLUE);
        assert_eq!(year_color(2022), ORANGE);
        assert_eq!(year_color(2023), RED);
    }

    fn record(company: &str, industry: &str, laid_off: u64) -> LayoffRecord {
        let day = NaiveDate::from_ymd_opt(2023, 1, 20).unwrap();
        LayoffRecord {
            company: company.to_string(),
            location: "SF Bay Area".to_string(),
            country: "United States".to_string(),
            latitude: Some(37.77),
            longitude: Some(-122.41),
            industry: industry.to_string(),
            date: day,
            total_laid_off: laid_off,
            funds_raised: None,
            year: 2023,
            quarter: quarter_label(day),
        }
    }

    fn mixed_industry_view() -> DashboardView {
        let dataset = Dataset::from_records(vec![
            record("Google", "Consumer", 12000),
            record("Google", "Hardware", 3000),
            record("Salesforce", "Sales", 8000),
        ]);
        DashboardView::build(&dataset, &Selection::default()).unwrap()
    }

    #[test]
    fn industries_stack_within_each_company() {
        let (industries, segments) = industry_segments(&mixed_industry_view());
        assert_eq!(industries, vec!["Consumer", "Hardware", "Sales"]);
        assert_eq!(
            segments,
            vec![
                Segment { category: 0, series: 0, low: 0, high: 12000 },
                Segment { category: 0, series: 1, low: 12000, high: 15000 },
                Segment { category: 1, series: 2, low: 0, high: 8000 },
            ]
        );
    }

    #[test]
    fn companies_chart_has_industry_legend() {
        let svg = render_svg(Panel::Companies, &mixed_industry_view()).unwrap();
        for industry in ["Consumer", "Hardware", "Sales"] {
            assert!(svg.contains(industry), "legend is missing {industry}");
        }
    }

    #[test]
    fn unweighted_markers_stay_small() {
        assert_eq!(marker_radius(0, 0), 3);
        assert_eq!(marker_radius(0, 500), 3);
        assert_eq!(marker_radius(500, 500), 20);
        assert!(marker_radius(5, 500) < marker_radius(500, 500));
    }

    #[test]
    fn writes_one_svg_per_panel() {
        let dir = tempfile::tempdir().unwrap();
        let written = write_all(&view(), dir.path()).unwrap();
        assert_eq!(written.len(), Panel::value_variants().len());
        for path in written {
            let body = std::fs::read_to_string(&path).unwrap();
            assert!(body.contains("<svg"), "{} is not svg", path.display());
        }
    }
}
