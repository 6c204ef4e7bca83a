//! OSRM HTTP adapter for driving routes.

use serde::Deserialize;
use tracing::debug;

use crate::error::ProviderError;
use crate::point::GeoPoint;
use crate::polyline::POLYLINE6_PRECISION;
use crate::traits::{RouteGeometry, RouteProvider};

#[derive(Debug, Clone)]
pub struct OsrmConfig {
    pub base_url: String,
    pub profile: String,
    pub timeout_secs: u64,
}

impl Default for OsrmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            profile: "car".to_string(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OsrmClient {
    config: OsrmConfig,
    client: reqwest::blocking::Client,
}

impl OsrmClient {
    pub fn new(config: OsrmConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }
}

impl RouteProvider for OsrmClient {
    fn route(&self, from: GeoPoint, to: GeoPoint) -> Result<RouteGeometry, ProviderError> {
        let url = format!(
            "{}/route/v1/{}/{:.6},{:.6};{:.6},{:.6}",
            self.config.base_url, self.config.profile, from.lng, from.lat, to.lng, to.lat
        );

        let response = self
            .client
            .get(url)
            .query(&[("overview", "full"), ("geometries", "polyline6")])
            .send()?;

        // OSRM reports routing failures as 400 with a JSON `code`.
        let status = response.status();
        let body = match response.json::<OsrmRouteResponse>() {
            Ok(body) => body,
            Err(err) if status.is_success() => return Err(err.into()),
            Err(_) => {
                return Err(ProviderError::InvalidResponse(format!(
                    "OSRM returned status {status}"
                )));
            }
        };

        if body.code != "Ok" {
            return Err(match body.code.as_str() {
                "NoRoute" | "NoSegment" => ProviderError::NoRoute,
                _ => ProviderError::InvalidResponse(body.message.unwrap_or(body.code)),
            });
        }

        let route = body.routes.into_iter().next().ok_or(ProviderError::NoRoute)?;
        debug!(distance_m = route.distance, "OSRM route received");

        Ok(RouteGeometry {
            distance_km: route.distance / 1000.0,
            encoded_polyline: route.geometry,
            precision: POLYLINE6_PRECISION,
        })
    }
}

#[derive(Debug, Deserialize)]
struct OsrmRouteResponse {
    code: String,
    message: Option<String>,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    /// Metres.
    distance: f64,
    geometry: String,
}
