use std::fmt;

use clap::ValueEnum;
use serde::Serialize;

use crate::models::LocationTotal;

/// Map scopes offered by the region picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize)]
pub enum Region {
    #[default]
    World,
    Europe,
    Asia,
    Africa,
    NorthAmerica,
    SouthAmerica,
}

/// Longitude/latitude bounding box of a map viewport.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Viewport {
    pub lon_min: f64,
    pub lon_max: f64,
    pub lat_min: f64,
    pub lat_max: f64,
}

impl Viewport {
    pub fn contains(&self, longitude: f64, latitude: f64) -> bool {
        (self.lon_min..=self.lon_max).contains(&longitude)
            && (self.lat_min..=self.lat_max).contains(&latitude)
    }
}

impl Region {
    pub fn viewport(self) -> Viewport {
        let (lon_min, lon_max, lat_min, lat_max) = match self {
            Region::World => (-180.0, 180.0, -90.0, 90.0),
            Region::Europe => (-25.0, 45.0, 34.0, 72.0),
            Region::Asia => (25.0, 150.0, -12.0, 80.0),
            Region::Africa => (-20.0, 55.0, -36.0, 38.0),
            Region::NorthAmerica => (-170.0, -50.0, 7.0, 84.0),
            Region::SouthAmerica => (-83.0, -33.0, -56.0, 14.0),
        };
        Viewport {
            lon_min,
            lon_max,
            lat_min,
            lat_max,
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Region::World => "World",
            Region::Europe => "Europe",
            Region::Asia => "Asia",
            Region::Africa => "Africa",
            Region::NorthAmerica => "North America",
            Region::SouthAmerica => "South America",
        };
        f.write_str(label)
    }
}

/// Geo panel state. `points` always holds every location; the region only
/// narrows what is drawn.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapView {
    pub region: Region,
    pub viewport: Viewport,
    pub points: Vec<LocationTotal>,
    pub visible_points: usize,
    pub total_laid_off: u64,
}

impl MapView {
    pub fn visible(&self) -> impl Iterator<Item = &LocationTotal> {
        self.points
            .iter()
            .filter(|p| self.viewport.contains(p.longitude, p.latitude))
    }
}

pub fn map_view(locations: Vec<LocationTotal>, region: Region) -> MapView {
    let viewport = region.viewport();
    let visible_points = locations
        .iter()
        .filter(|p| viewport.contains(p.longitude, p.latitude))
        .count();
    let total_laid_off = locations.iter().map(|p| p.total_laid_off).sum();
    MapView {
        region,
        viewport,
        points: locations,
        visible_points,
        total_laid_off,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(location: &str, country: &str, latitude: f64, longitude: f64, total: u64) -> LocationTotal {
        LocationTotal {
            latitude,
            longitude,
            location: location.to_string(),
            country: country.to_string(),
            total_laid_off: total,
        }
    }

    fn sample() -> Vec<LocationTotal> {
        vec![
            point("Berlin", "Germany", 52.52, 13.40, 300),
            point("Bengaluru", "India", 12.97, 77.59, 900),
            point("SF Bay Area", "United States", 37.77, -122.41, 5000),
            point("Sao Paulo", "Brazil", -23.55, -46.63, 120),
        ]
    }

    #[test]
    fn region_never_changes_totals() {
        let world = map_view(sample(), Region::World);
        for region in Region::value_variants() {
            let view = map_view(sample(), *region);
            assert_eq!(view.points, world.points);
            assert_eq!(view.total_laid_off, world.total_laid_off);
        }
        assert_eq!(world.total_laid_off, 6320);
        assert_eq!(world.visible_points, 4);
    }

    #[test]
    fn region_narrows_visible_points() {
        let europe = map_view(sample(), Region::Europe);
        let names: Vec<_> = europe.visible().map(|p| p.location.as_str()).collect();
        assert_eq!(names, vec!["Berlin"]);
        assert_eq!(europe.visible_points, 1);

        let south = map_view(sample(), Region::SouthAmerica);
        assert_eq!(south.visible_points, 1);
        let north = map_view(sample(), Region::NorthAmerica);
        assert_eq!(north.visible_points, 1);
    }

    #[test]
    fn display_matches_picker_labels() {
        assert_eq!(Region::NorthAmerica.to_string(), "North America");
        assert_eq!(Region::default().to_string(), "World");
    }
}
