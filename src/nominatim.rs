//! Nominatim HTTP adapter for place-name geocoding.

use serde::Deserialize;
use tracing::debug;

use crate::error::ProviderError;
use crate::point::GeoPoint;
use crate::traits::Geocoder;

#[derive(Debug, Clone)]
pub struct NominatimConfig {
    pub base_url: String,
    /// Nominatim's usage policy requires an identifying user agent.
    pub user_agent: String,
    /// Comma-separated ISO 3166-1 codes restricting the search, e.g. `"fr"`.
    pub country_codes: Option<String>,
    pub timeout_secs: u64,
}

impl Default for NominatimConfig {
    fn default() -> Self {
        Self {
            base_url: "https://nominatim.openstreetmap.org".to_string(),
            user_agent: concat!("ev-stop-planner/", env!("CARGO_PKG_VERSION")).to_string(),
            country_codes: None,
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NominatimClient {
    config: NominatimConfig,
    client: reqwest::blocking::Client,
}

impl NominatimClient {
    pub fn new(config: NominatimConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self { config, client })
    }
}

impl Geocoder for NominatimClient {
    fn locate(&self, place: &str) -> Result<GeoPoint, ProviderError> {
        let mut query = vec![
            ("q", place.to_string()),
            ("format", "json".to_string()),
            ("limit", "1".to_string()),
        ];
        if let Some(codes) = &self.config.country_codes {
            query.push(("countrycodes", codes.clone()));
        }

        let places = self
            .client
            .get(format!("{}/search", self.config.base_url))
            .query(&query)
            .send()?
            .error_for_status()?
            .json::<Vec<NominatimPlace>>()?;

        let found = places
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::PlaceNotFound(place.to_string()))?;

        let lat = parse_coordinate(&found.lat)?;
        let lng = parse_coordinate(&found.lon)?;
        let point = GeoPoint::validated(lat, lng)
            .map_err(|err| ProviderError::InvalidResponse(err.to_string()))?;
        debug!(place, lat, lng, "geocoded place");

        Ok(point)
    }
}

fn parse_coordinate(raw: &str) -> Result<f64, ProviderError> {
    raw.trim()
        .parse()
        .map_err(|_| ProviderError::InvalidResponse(format!("unreadable coordinate {raw:?}")))
}

/// Nominatim returns coordinates as strings.
#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
}
