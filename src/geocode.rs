use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, info};

use crate::coords::Coordinate;
use crate::error::{ArchiveError, Result};

pub const DEFAULT_ENDPOINT: &str = "https://maps.googleapis.com";
const GEOCODE_PATH: &str = "/maps/api/geocode/json";

const COUNTRY: &str = "country";
const STATE: &str = "administrative_area_level_1";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationLabel {
    pub country: String,
    pub state: String,
}

/// Anything that can turn a coordinate into a (country, state) label.
pub trait Geocoder {
    fn resolve(&self, coordinate: Coordinate) -> Result<LocationLabel>;
}

// ── Wire format ──

#[derive(Debug, Deserialize)]
pub struct GeocodeResponse {
    pub status: String,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub results: Vec<GeocodeResult>,
}

#[derive(Debug, Deserialize)]
pub struct GeocodeResult {
    #[serde(default)]
    pub address_components: Vec<AddressComponent>,
}

#[derive(Debug, Deserialize)]
pub struct AddressComponent {
    pub long_name: String,
    #[serde(default)]
    pub types: Vec<String>,
}

impl AddressComponent {
    fn has_type(&self, kind: &str) -> bool {
        self.types.iter().any(|t| t == kind)
    }
}

/// Map a decoded geocoding response onto a location label.
///
/// Only the first result is considered; within it, the first component tagged
/// `country` and the first tagged `administrative_area_level_1` supply the labels.
pub fn location_from_response(
    coordinate: Coordinate,
    response: GeocodeResponse,
) -> Result<LocationLabel> {
    if response.status != "OK" {
        return Err(ArchiveError::Geocoding {
            status: response.status,
            message: response.error_message,
        });
    }

    let first = response
        .results
        .into_iter()
        .next()
        .ok_or(ArchiveError::NoResults { coordinate })?;

    let find = |kind: &'static str| -> Result<String> {
        first
            .address_components
            .iter()
            .find(|c| c.has_type(kind))
            .map(|c| c.long_name.clone())
            .filter(|name| !name.trim().is_empty())
            .ok_or(ArchiveError::IncompleteLocation {
                coordinate,
                missing: kind,
            })
    };

    Ok(LocationLabel {
        country: find(COUNTRY)?,
        state: find(STATE)?,
    })
}

// ── HTTP client ──

pub struct GeocodingClient {
    http: reqwest::blocking::Client,
    endpoint: String,
    api_key: String,
}

impl GeocodingClient {
    pub fn new(endpoint: &str, api_key: &str, timeout: Duration) -> reqwest::Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(Self {
            http,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    fn fetch(&self, coordinate: Coordinate) -> reqwest::Result<GeocodeResponse> {
        let latlng = format!("{},{}", coordinate.latitude, coordinate.longitude);
        debug!(%latlng, "Requesting reverse geocode");
        self.http
            .get(format!("{}{}", self.endpoint, GEOCODE_PATH))
            .query(&[("latlng", latlng.as_str()), ("key", self.api_key.as_str())])
            .send()?
            .error_for_status()?
            .json()
    }
}

impl Geocoder for GeocodingClient {
    fn resolve(&self, coordinate: Coordinate) -> Result<LocationLabel> {
        let response = self
            .fetch(coordinate)
            .map_err(|source| ArchiveError::Transport { coordinate, source })?;
        let label = location_from_response(coordinate, response)?;
        info!(country = %label.country, state = %label.state, "Resolved location");
        Ok(label)
    }
}
