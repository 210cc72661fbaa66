//! Engineconfiguratie, te laden uit JSON.
//!
//! Alle velden zijn optioneel; ontbrekende waarden krijgen hun standaard.

use serde::Deserialize;
use thiserror::Error;

use crate::acquire::AcquisitionConfig;
use crate::geom::LatLng;
use crate::parse::ImportOptions;
use crate::survey::point::{BoundaryPoint, FixType};

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuratie is geen geldige JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("`{field}` moet groter dan nul zijn")]
    NonPositive { field: &'static str },
    #[error("`{field}` is geen geldige positie: {reason}")]
    InvalidPosition { field: &'static str, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub acquisition: AcquisitionConfig,
    #[serde(default)]
    pub import: ImportOptions,
}

impl EngineConfig {
    /// Leest en valideert een configuratie. Een lege string geeft de standaard.
    pub fn from_json(input: &str) -> ConfigResult<Self> {
        if input.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_json::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        let acquisition = &self.acquisition;
        if acquisition.position_timeout_ms == 0 {
            return Err(ConfigError::NonPositive {
                field: "acquisition.position_timeout_ms",
            });
        }
        if acquisition.tracking_interval_ms == 0 {
            return Err(ConfigError::NonPositive {
                field: "acquisition.tracking_interval_ms",
            });
        }
        if !(acquisition.manual_accuracy_m.is_finite() && acquisition.manual_accuracy_m > 0.0) {
            return Err(ConfigError::NonPositive {
                field: "acquisition.manual_accuracy_m",
            });
        }
        if !(self.import.synthetic_span_deg.is_finite() && self.import.synthetic_span_deg > 0.0) {
            return Err(ConfigError::NonPositive {
                field: "import.synthetic_span_deg",
            });
        }
        check_position("acquisition.reference_position", acquisition.reference_position)?;
        check_position("import.reference_origin", self.import.reference_origin)
    }
}

fn check_position(field: &'static str, position: LatLng) -> ConfigResult<()> {
    BoundaryPoint::new(position.lat, position.lng, FixType::Manual)
        .map(|_| ())
        .map_err(|err| ConfigError::InvalidPosition {
            field,
            reason: err.to_string(),
        })
}
