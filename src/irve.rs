//! Station directory adapter for the French IRVE charging-point dataset,
//! served by an Opendatasoft records API.

use serde::Deserialize;
use tracing::{debug, warn};

use crate::corridor::Corridor;
use crate::error::ProviderError;
use crate::stations::{PowerField, RawStationRecord};
use crate::traits::StationDirectory;

#[derive(Debug, Clone)]
pub struct IrveConfig {
    /// Records search endpoint.
    pub base_url: String,
    pub dataset: String,
    /// Maximum records fetched per corridor query.
    pub rows: u32,
    pub timeout_secs: u64,
}

impl Default for IrveConfig {
    fn default() -> Self {
        Self {
            base_url: "https://odre.opendatasoft.com/api/records/1.0/search/".to_string(),
            dataset: "bornes-irve".to_string(),
            rows: 500,
            timeout_secs: 15,
        }
    }
}

#[derive(Debug, Clone)]
pub struct IrveDirectory {
    config: IrveConfig,
    client: reqwest::blocking::Client,
}

impl IrveDirectory {
    pub fn new(config: IrveConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }
}

impl StationDirectory for IrveDirectory {
    fn stations_within(&self, corridor: &Corridor) -> Result<Vec<RawStationRecord>, ProviderError> {
        let (filter_name, filter_value) = geofilter(corridor);
        let query = [
            ("dataset", self.config.dataset.clone()),
            ("rows", self.config.rows.to_string()),
            (filter_name, filter_value),
        ];

        let body = self
            .client
            .get(self.config.base_url.as_str())
            .query(&query)
            .send()?
            .error_for_status()?
            .json::<IrveResponse>()?;

        let returned = body.records.len();
        if let Some(hits) = body.nhits.filter(|&hits| hits > returned as u64) {
            warn!(hits, returned, "station directory truncated the corridor results");
        }
        debug!(returned, "station records received");

        Ok(body.records.into_iter().map(IrveRecord::into_raw).collect())
    }
}

/// Opendatasoft geofilter parameter for a corridor.
///
/// Polygons are sent as `(lat,lng),(lat,lng),...`; circles as
/// `lat,lng,radius_in_metres`.
pub fn geofilter(corridor: &Corridor) -> (&'static str, String) {
    match corridor {
        Corridor::Polygon { ring } => (
            "geofilter.polygon",
            ring.iter()
                .map(|p| format!("({:.6},{:.6})", p.lat, p.lng))
                .collect::<Vec<_>>()
                .join(","),
        ),
        Corridor::Circle { center, radius_km } => (
            "geofilter.distance",
            format!("{:.6},{:.6},{:.0}", center.lat, center.lng, radius_km * 1000.0),
        ),
    }
}

#[derive(Debug, Deserialize)]
struct IrveResponse {
    nhits: Option<u64>,
    #[serde(default)]
    records: Vec<IrveRecord>,
}

#[derive(Debug, Deserialize)]
struct IrveRecord {
    recordid: Option<String>,
    #[serde(default)]
    fields: IrveFields,
}

#[derive(Debug, Default, Deserialize)]
struct IrveFields {
    /// `[lat, lng]`.
    geo_point_borne: Option<Vec<f64>>,
    puiss_max: Option<PowerField>,
    n_enseigne: Option<String>,
    n_amenageur: Option<String>,
}

impl IrveRecord {
    fn into_raw(self) -> RawStationRecord {
        let coordinates = match self.fields.geo_point_borne.as_deref() {
            Some(&[lat, lng]) => Some((lat, lng)),
            _ => None,
        };

        RawStationRecord {
            id: self.recordid,
            coordinates,
            power: self.fields.puiss_max,
            brand: self.fields.n_enseigne,
            site_operator: self.fields.n_amenageur,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::point::GeoPoint;

    #[test]
    fn test_record_mapping() {
        let json = r#"{
            "nhits": 3,
            "records": [
                {"recordid": "r1", "fields": {"geo_point_borne": [45.1, 3.2], "puiss_max": "22", "n_enseigne": "Ionity"}},
                {"recordid": "r2", "fields": {"puiss_max": 50, "n_amenageur": "Allego"}},
                {"fields": {"geo_point_borne": [45.3]}}
            ]
        }"#;
        let body: IrveResponse = serde_json::from_str(json).unwrap();
        let raw: Vec<_> = body.records.into_iter().map(IrveRecord::into_raw).collect();

        assert_eq!(raw[0].id.as_deref(), Some("r1"));
        assert_eq!(raw[0].coordinates, Some((45.1, 3.2)));
        assert_eq!(raw[0].power, Some(PowerField::Text("22".into())));
        assert_eq!(raw[0].brand.as_deref(), Some("Ionity"));
        assert_eq!(raw[1].coordinates, None);
        assert_eq!(raw[1].power, Some(PowerField::Number(50.0)));
        assert_eq!(raw[1].site_operator.as_deref(), Some("Allego"));
        assert_eq!(raw[2].id, None);
        assert_eq!(raw[2].coordinates, None);
    }

    #[test]
    fn test_geofilter_formats() {
        let circle = Corridor::Circle {
            center: GeoPoint::new(45.0, 3.5),
            radius_km: 12.5,
        };
        assert_eq!(
            geofilter(&circle),
            ("geofilter.distance", "45.000000,3.500000,12500".to_string())
        );

        let polygon = Corridor::Polygon {
            ring: vec![
                GeoPoint::new(1.0, 2.0),
                GeoPoint::new(1.5, 3.0),
                GeoPoint::new(2.0, 2.0),
                GeoPoint::new(1.0, 2.0),
            ],
        };
        let (name, value) = geofilter(&polygon);
        assert_eq!(name, "geofilter.polygon");
        assert!(value.starts_with("(1.000000,2.000000),(1.500000,3.000000)"));
    }
}
