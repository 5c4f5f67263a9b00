use serde::Serialize;
use tracing::{debug, info_span};

use crate::dataset::Dataset;
use crate::error::SelectionError;
use crate::models::{
    CompanyIndustryTotal, CompanyTotal, CountryDailyTotal, CountryTotal, DailyTotal, FundPoint,
    QuarterTotal, YearLeader, YearTotal,
};
use crate::pipeline;
use crate::region::{self, MapView};
use crate::selection::{Selection, FOCUS_COUNTRY, TOP_COMPANIES};

#[derive(Debug, Clone, Serialize)]
pub struct OverviewPanel {
    pub daily: Vec<DailyTotal>,
    pub compared_countries: Vec<String>,
    pub by_country: Vec<CountryDailyTotal>,
    pub total_laid_off: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrendsPanel {
    pub yearly: Vec<YearTotal>,
    pub quarterly: Vec<QuarterTotal>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GeoPanel {
    pub map: MapView,
    pub top_countries: Vec<CountryTotal>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompaniesPanel {
    pub country: String,
    pub top: Vec<CompanyTotal>,
    pub by_industry: Vec<CompanyIndustryTotal>,
    pub leader: Option<YearLeader>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FundsPanel {
    pub points: Vec<FundPoint>,
}

/// Every panel derived from one selection, in page order.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub selection: Selection,
    pub overview: OverviewPanel,
    pub trends: TrendsPanel,
    pub geo: GeoPanel,
    pub companies: CompaniesPanel,
    pub funds: FundsPanel,
}

pub fn overview(dataset: &Dataset, selection: &Selection) -> OverviewPanel {
    let in_range = pipeline::filter_date_range(dataset.records(), selection.date_range);
    let daily = pipeline::daily_totals(&in_range);
    let compared_countries = selection.compare.compared_set();
    let by_country = pipeline::country_daily_totals(&in_range, &compared_countries);
    let total_laid_off = daily.iter().map(|p| p.total_laid_off).sum();
    OverviewPanel {
        daily,
        compared_countries,
        by_country,
        total_laid_off,
    }
}

pub fn trends(dataset: &Dataset) -> TrendsPanel {
    TrendsPanel {
        yearly: pipeline::yearly_totals(dataset.records()),
        quarterly: pipeline::quarterly_totals(dataset.records()),
    }
}

pub fn geo(dataset: &Dataset, selection: &Selection) -> GeoPanel {
    let locations = pipeline::location_totals(dataset.records());
    let top_countries = pipeline::top_countries(&locations, selection.top_countries);
    GeoPanel {
        map: region::map_view(locations, selection.region),
        top_countries,
    }
}

pub fn companies(dataset: &Dataset, selection: &Selection) -> CompaniesPanel {
    let records = dataset.records();
    let top = pipeline::top_companies(records, FOCUS_COUNTRY, TOP_COMPANIES);
    let by_industry = pipeline::company_industry_breakdown(records, FOCUS_COUNTRY, &top);
    let leader = pipeline::year_leader(records, FOCUS_COUNTRY, selection.leader_year);
    CompaniesPanel {
        country: FOCUS_COUNTRY.to_string(),
        top,
        by_industry,
        leader,
    }
}

pub fn funds(dataset: &Dataset) -> FundsPanel {
    FundsPanel {
        points: pipeline::fund_points(dataset.records()),
    }
}

impl DashboardView {
    /// Re-runs the whole page for `selection`. Nothing is carried over
    /// from a previous build.
    pub fn build(dataset: &Dataset, selection: &Selection) -> Result<Self, SelectionError> {
        selection.validate()?;
        let _span = info_span!("dashboard", records = dataset.len()).entered();

        let view = Self {
            selection: selection.clone(),
            overview: overview(dataset, selection),
            trends: trends(dataset),
            geo: geo(dataset, selection),
            companies: companies(dataset, selection),
            funds: funds(dataset),
        };

        debug!(
            daily_points = view.overview.daily.len(),
            map_points = view.geo.map.points.len(),
            visible_points = view.geo.map.visible_points,
            fund_points = view.funds.points.len(),
            "dashboard built"
        );
        Ok(view)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{quarter_label, LayoffRecord};
    use crate::region::Region;
    use crate::selection::{CompareCountry, DateRange};
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn record(
        company: &str,
        location: &str,
        country: &str,
        coords: (f64, f64),
        day: NaiveDate,
        laid_off: u64,
    ) -> LayoffRecord {
        LayoffRecord {
            company: company.to_string(),
            location: location.to_string(),
            country: country.to_string(),
            latitude: Some(coords.0),
            longitude: Some(coords.1),
            industry: "Retail".to_string(),
            date: day,
            total_laid_off: laid_off,
            funds_raised: None,
            year: chrono::Datelike::year(&day),
            quarter: quarter_label(day),
        }
    }

    fn dataset() -> Dataset {
        let sf = (37.77, -122.41);
        Dataset::from_records(vec![
            record("Amazon", "Seattle", "United States", (47.6, -122.3), date(2022, 11, 16), 10000),
            record("Meta", "SF Bay Area", "United States", sf, date(2022, 11, 9), 11000),
            record("Salesforce", "SF Bay Area", "United States", sf, date(2023, 1, 4), 8000),
            record("Zalando", "Berlin", "Germany", (52.52, 13.40), date(2022, 9, 1), 250),
            record("Shopify", "Ottawa", "Canada", (45.42, -75.69), date(2022, 7, 26), 1000),
            record("Ola", "Bengaluru", "India", (12.97, 77.59), date(2020, 5, 1), 1400),
        ])
    }

    #[test]
    fn overview_follows_date_range_and_comparison() {
        let data = dataset();
        let mut selection = Selection::default();
        selection.compare = CompareCountry::Germany;
        selection.date_range = DateRange::new(date(2022, 8, 1), date(2022, 12, 31)).unwrap();

        let view = DashboardView::build(&data, &selection).unwrap();
        assert_eq!(view.overview.total_laid_off, 21250);
        assert_eq!(
            view.overview.compared_countries,
            vec!["United States".to_string(), "Germany".to_string()]
        );
        assert!(view
            .overview
            .by_country
            .iter()
            .all(|p| p.country == "United States" || p.country == "Germany"));
        assert_eq!(view.overview.by_country.len(), 3);
    }

    #[test]
    fn region_choice_leaves_other_panels_untouched() {
        let data = dataset();
        let world = DashboardView::build(&data, &Selection::default()).unwrap();
        let mut selection = Selection::default();
        selection.region = Region::Europe;
        let europe = DashboardView::build(&data, &selection).unwrap();

        assert_eq!(europe.geo.map.points, world.geo.map.points);
        assert_eq!(europe.geo.top_countries, world.geo.top_countries);
        assert_eq!(europe.geo.map.visible_points, 1);
        assert_eq!(world.geo.map.visible_points, 5);
        assert_eq!(europe.geo.map.total_laid_off, data.total_laid_off());
    }

    #[test]
    fn companies_panel_ranks_focus_country() {
        let mut selection = Selection::default();
        selection.leader_year = 2023;
        let view = DashboardView::build(&dataset(), &selection).unwrap();
        let names: Vec<_> = view.companies.top.iter().map(|c| c.company.as_str()).collect();
        assert_eq!(names, vec!["Meta", "Amazon", "Salesforce"]);
        let leader = view.companies.leader.unwrap();
        assert_eq!(leader.company, "Salesforce");
        assert_eq!(leader.previous_total, None);
    }

    #[test]
    fn leader_absent_for_empty_year() {
        let view = DashboardView::build(&dataset(), &Selection::default()).unwrap();
        assert!(view.companies.leader.is_none());
    }

    #[test]
    fn invalid_selection_is_rejected() {
        let mut selection = Selection::default();
        selection.top_countries = 2;
        assert!(DashboardView::build(&dataset(), &selection).is_err());
    }

    #[test]
    fn view_serializes_to_json() {
        let view = DashboardView::build(&dataset(), &Selection::default()).unwrap();
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["selection"]["top_countries"], 5);
        assert_eq!(json["geo"]["map"]["region"], "World");
        assert!(json["trends"]["yearly"].is_array());
    }
}
