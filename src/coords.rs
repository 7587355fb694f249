use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{ArchiveError, Result};

/// Map-center form: `@lat,lon,...`
static AT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@(-?\d+\.\d+),(-?\d+\.\d+)").unwrap());
/// Pin/place form: `!3dlat!4dlon`
static PIN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!3d(-?\d+\.\d+)!4d(-?\d+\.\d+)").unwrap());

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    fn in_range(&self) -> bool {
        self.latitude.abs() <= 90.0 && self.longitude.abs() <= 180.0
    }
}

/// Fixed six decimals, comma-space separated. This is the text written into the
/// document and searched for during duplicate detection.
impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}, {:.6}", self.latitude, self.longitude)
    }
}

/// Whether a string looks like a Google Maps URL worth handing to the pipeline.
pub fn is_maps_url(candidate: &str, marker: &str) -> bool {
    candidate.contains(marker)
}

/// Pull a latitude/longitude pair out of a Google Maps URL.
///
/// The `@lat,lon` form wins over `!3d..!4d..` when both are present. A pattern that
/// matches but does not yield a valid in-range pair falls through to the next one.
pub fn extract_coordinates(url: &str) -> Result<Coordinate> {
    [&*AT_RE, &*PIN_RE]
        .into_iter()
        .find_map(|re| {
            let caps = re.captures(url)?;
            let lat = caps[1].parse::<f64>().ok()?;
            let lon = caps[2].parse::<f64>().ok()?;
            Some(Coordinate::new(lat, lon)).filter(Coordinate::in_range)
        })
        .ok_or_else(|| ArchiveError::Extraction {
            url: url.to_string(),
        })
}
