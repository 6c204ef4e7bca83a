//! Planning configuration.
//!
//! Every knob the pipeline uses is passed explicitly; this struct gathers
//! them so a deployment can keep them in one TOML file. Missing keys take
//! the defaults below.

use std::path::Path;

use serde::Deserialize;

use crate::corridor::{CorridorOptions, DEFAULT_ARC_SEGMENTS, DEFAULT_CORRIDOR_WIDTH_KM, DEFAULT_MAX_VERTICES};
use crate::error::ConfigError;
use crate::planner::{DEFAULT_SAFETY_MARGIN, PlanOptions};
use crate::stations::{CandidateFilter, DEFAULT_POWER_KW};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Half-width of the station search corridor.
    pub corridor_width_km: f64,
    pub max_corridor_vertices: usize,
    pub corridor_arc_segments: usize,

    /// Drop candidates outside the corridor width or below `min_power_kw`.
    pub apply_filter: bool,
    pub min_power_kw: f64,

    pub safety_margin: f64,

    /// Trip defaults used when a request leaves them out.
    pub default_range_km: f64,
    pub default_speed_kmh: f64,
    pub default_recharge_hours: f64,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            corridor_width_km: DEFAULT_CORRIDOR_WIDTH_KM,
            max_corridor_vertices: DEFAULT_MAX_VERTICES,
            corridor_arc_segments: DEFAULT_ARC_SEGMENTS,
            apply_filter: true,
            min_power_kw: DEFAULT_POWER_KW,
            safety_margin: DEFAULT_SAFETY_MARGIN,
            default_range_km: 350.0,
            default_speed_kmh: 110.0,
            default_recharge_hours: 0.5,
        }
    }
}

impl PlannerConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("corridor_width_km", self.corridor_width_km)?;
        positive("default_range_km", self.default_range_km)?;
        positive("default_speed_kmh", self.default_speed_kmh)?;
        if !(self.default_recharge_hours.is_finite() && self.default_recharge_hours >= 0.0) {
            return Err(invalid("default_recharge_hours", self.default_recharge_hours));
        }
        if !(self.min_power_kw.is_finite() && self.min_power_kw >= 0.0) {
            return Err(invalid("min_power_kw", self.min_power_kw));
        }
        if !(self.safety_margin > 0.0 && self.safety_margin <= 1.0) {
            return Err(invalid("safety_margin", self.safety_margin));
        }
        if self.max_corridor_vertices < 3 {
            return Err(ConfigError::Invalid {
                field: "max_corridor_vertices",
                reason: format!("needs at least 3, got {}", self.max_corridor_vertices),
            });
        }
        if self.corridor_arc_segments < 3 {
            return Err(ConfigError::Invalid {
                field: "corridor_arc_segments",
                reason: format!("needs at least 3, got {}", self.corridor_arc_segments),
            });
        }
        Ok(())
    }

    pub fn corridor_options(&self) -> CorridorOptions {
        CorridorOptions {
            width_km: self.corridor_width_km,
            max_vertices: self.max_corridor_vertices,
            arc_segments: self.corridor_arc_segments,
        }
    }

    pub fn candidate_filter(&self) -> CandidateFilter {
        CandidateFilter {
            corridor_width_km: self.corridor_width_km,
            min_power_kw: self.min_power_kw,
        }
    }

    pub fn plan_options(&self) -> PlanOptions {
        PlanOptions {
            safety_margin: self.safety_margin,
        }
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(field, value))
    }
}

fn invalid(field: &'static str, value: f64) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: format!("out of range: {value}"),
    }
}
