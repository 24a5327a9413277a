use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Geocoded point for a free-text address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
    pub display_name: String,
}

/// A best-effort address geocoder. Implementations must never fail loudly:
/// timeouts, transport errors and unparseable responses all degrade to
/// `None` and the pipeline continues without coordinates.
pub trait Geocoder {
    fn geocode(&self, address: &str) -> Option<GeoPoint>;
}

pub const GEOCODE_TIMEOUT_SECS: u64 = 10;

const NOMINATIM_ENDPOINT: &str = "https://nominatim.openstreetmap.org/search";
const USER_AGENT: &str = "alberta_land_use_tool";

/// Nominatim-backed geocoder. One query per address parse, scoped to Alberta
/// by appending ", Alberta, Canada" to the input.
pub struct NominatimGeocoder {
    client: reqwest::blocking::Client,
    endpoint: String,
}

// Nominatim returns lat/lon as strings.
#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
    display_name: String,
}

impl NominatimGeocoder {
    pub fn new() -> reqwest::Result<Self> {
        Self::with_endpoint(NOMINATIM_ENDPOINT)
    }

    /// Point the geocoder at an alternate endpoint, for tests or a local
    /// Nominatim mirror.
    pub fn with_endpoint(endpoint: &str) -> reqwest::Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(GEOCODE_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()?;
        Ok(NominatimGeocoder {
            client,
            endpoint: endpoint.to_string(),
        })
    }
}

impl Geocoder for NominatimGeocoder {
    fn geocode(&self, address: &str) -> Option<GeoPoint> {
        let query = format!("{}, Alberta, Canada", address);
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("q", query.as_str()), ("format", "json"), ("limit", "1")])
            .send()
            .ok()?;
        let places: Vec<NominatimPlace> = response.json().ok()?;
        let place = places.into_iter().next()?;
        let latitude = place.lat.parse().ok()?;
        let longitude = place.lon.parse().ok()?;
        Some(GeoPoint {
            latitude,
            longitude,
            display_name: place.display_name,
        })
    }
}
