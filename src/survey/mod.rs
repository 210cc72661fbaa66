//! Survey-aggregaat: de geordende puntenlijst van één opnamesessie.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;

pub mod point;

use crate::geom::{self, LatLng};
use crate::parse::ImportedBoundary;
use point::BoundaryPoint;

/// Result type voor survey-mutaties.
pub type SurveyResult<T> = Result<T, SurveyError>;

/// Fouten bij het muteren of afsluiten van een survey.
#[derive(Debug, Error)]
pub enum SurveyError {
    #[error("puntindex {index} bestaat niet (survey bevat {len} punten)")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("bron {0} accepteert geen handmatige of live opnames")]
    SourceMismatch(DataSource),
    #[error("een ingediende survey heeft minimaal 3 punten nodig, gevonden: {0}")]
    IncompleteBoundary(usize),
    #[error("payload kon niet geserialiseerd worden: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Databron van een sessie. Eén bron per sessie; wisselen wist de punten.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DataSource {
    #[default]
    ManualEntry,
    DeviceGps,
    #[serde(rename = "GEOJSON")]
    GeoJson,
    Kml,
    Csv,
    Lidar,
    Shapefile,
}

impl DataSource {
    pub const ALL: [Self; 7] = [
        Self::ManualEntry,
        Self::DeviceGps,
        Self::GeoJson,
        Self::Kml,
        Self::Csv,
        Self::Lidar,
        Self::Shapefile,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::ManualEntry => "MANUAL_ENTRY",
            Self::DeviceGps => "DEVICE_GPS",
            Self::GeoJson => "GEOJSON",
            Self::Kml => "KML",
            Self::Csv => "CSV",
            Self::Lidar => "LIDAR",
            Self::Shapefile => "SHAPEFILE",
        }
    }

    /// Instrumentlabel dat bij de bron hoort zolang er geen expliciet label is gekozen.
    #[must_use]
    pub const fn default_instrument(self) -> &'static str {
        match self {
            Self::ManualEntry => "Manual Map Entry",
            Self::DeviceGps => "Device GPS",
            Self::GeoJson => "GeoJSON Import",
            Self::Kml => "KML Import",
            Self::Csv => "Coordinate List",
            Self::Lidar => "LiDAR Scanner",
            Self::Shapefile => "Survey Extract",
        }
    }

    /// Of punten via de acquisitiecontroller (live of handmatig) mogen binnenkomen.
    #[must_use]
    pub const fn accepts_capture(self) -> bool {
        matches!(self, Self::ManualEntry | Self::DeviceGps)
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Onbekende naam voor een databron.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("onbekende databron: `{0}`")]
pub struct UnknownDataSource(pub String);

impl FromStr for DataSource {
    type Err = UnknownDataSource;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_uppercase().replace(['-', ' '], "_");
        Self::ALL
            .into_iter()
            .find(|source| source.name() == normalized)
            .ok_or_else(|| UnknownDataSource(value.to_owned()))
    }
}

/// Eindstatus waarmee een survey aan de persistentielaag wordt overgedragen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SurveyStatus {
    Draft,
    Submitted,
}

/// Afgeleide grootheden voor weergave.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SurveyStatistics {
    pub point_count: usize,
    pub area_m2: f64,
    pub area_hectares: f64,
    pub area_acres: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub centroid: Option<LatLng>,
}

/// JSON-payload `{center, boundary_points}` voor de persistentielaag.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoundaryPayload {
    pub center: Option<LatLng>,
    pub boundary_points: Vec<LatLng>,
}

/// Afgesloten survey, klaar voor overdracht.
#[derive(Debug, Clone, Serialize)]
pub struct SurveySubmission {
    pub status: SurveyStatus,
    pub data_source: DataSource,
    pub instrument_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub declared_accuracy: Option<f64>,
    pub area_m2: f64,
    pub points: Vec<BoundaryPoint>,
    /// Geserialiseerde [`BoundaryPayload`].
    pub boundary_data: String,
}

/// Eén opnamesessie voor precies één perceelkandidaat.
#[derive(Debug, Clone, Default)]
pub struct Survey {
    points: Vec<BoundaryPoint>,
    data_source: DataSource,
    declared_accuracy: Option<f64>,
    instrument_type: Option<String>,
}

impl Survey {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_source(data_source: DataSource) -> Self {
        Self {
            data_source,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn points(&self) -> &[BoundaryPoint] {
        &self.points
    }

    #[must_use]
    pub fn point(&self, index: usize) -> Option<&BoundaryPoint> {
        self.points.get(index)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[must_use]
    pub fn data_source(&self) -> DataSource {
        self.data_source
    }

    #[must_use]
    pub fn declared_accuracy(&self) -> Option<f64> {
        self.declared_accuracy
    }

    #[must_use]
    pub fn instrument_type(&self) -> &str {
        self.instrument_type
            .as_deref()
            .unwrap_or_else(|| self.data_source.default_instrument())
    }

    /// Wisselt van databron. Bij een andere bron worden alle punten, de
    /// gedeclareerde nauwkeurigheid en het instrumentlabel gewist.
    pub fn set_data_source(&mut self, data_source: DataSource) {
        if self.data_source == data_source {
            return;
        }
        log::debug!(
            "databron gewijzigd van {} naar {}, {} punten gewist",
            self.data_source,
            data_source,
            self.points.len()
        );
        self.data_source = data_source;
        self.points.clear();
        self.declared_accuracy = None;
        self.instrument_type = None;
    }

    pub fn set_instrument_type(&mut self, instrument_type: impl Into<String>) {
        self.instrument_type = Some(instrument_type.into());
    }

    /// Zelfgerapporteerde sessiebetrouwbaarheid, begrensd tot `[0, 1]`.
    pub fn set_declared_accuracy(&mut self, accuracy: Option<f64>) {
        self.declared_accuracy = accuracy.filter(|value| value.is_finite()).map(|value| {
            let clamped = value.clamp(0.0, 1.0);
            if (clamped - value).abs() > f64::EPSILON {
                log::warn!("gedeclareerde nauwkeurigheid {value} begrensd tot {clamped}");
            }
            clamped
        });
    }

    /// Voegt een opgenomen punt achteraan toe.
    pub fn append(&mut self, point: BoundaryPoint) -> SurveyResult<usize> {
        if !self.data_source.accepts_capture() {
            return Err(SurveyError::SourceMismatch(self.data_source));
        }
        self.points.push(point);
        Ok(self.points.len() - 1)
    }

    /// Verwijdert precies één punt; latere indices schuiven één plaats op.
    pub fn remove_point(&mut self, index: usize) -> SurveyResult<BoundaryPoint> {
        if index >= self.points.len() {
            return Err(SurveyError::IndexOutOfRange {
                index,
                len: self.points.len(),
            });
        }
        Ok(self.points.remove(index))
    }

    /// Wist alle punten. Een importsessie valt terug op handmatige invoer,
    /// zodat daarna weer punten kunnen worden opgenomen.
    pub fn clear(&mut self) {
        if self.data_source.accepts_capture() {
            self.points.clear();
        } else {
            self.set_data_source(DataSource::ManualEntry);
        }
    }

    /// Vervangt de sessie-inhoud door een geslaagde import.
    ///
    /// Omdat de import volledig is geparsed voordat deze functie wordt
    /// aangeroepen, blijft een mislukte import zonder effect op de survey.
    pub fn apply_import(&mut self, imported: ImportedBoundary) {
        let (boundary, synthetic) = imported.into_parts();
        log::info!(
            "{} punten geïmporteerd uit {} (synthetisch: {synthetic})",
            boundary.points.len(),
            boundary.source
        );

        self.data_source = boundary.source;
        self.points = boundary.points;
        self.instrument_type = Some(boundary.instrument_type);
        self.set_declared_accuracy(Some(boundary.accuracy_estimate));
    }

    #[must_use]
    pub fn area_m2(&self) -> f64 {
        geom::compute_area(&self.points)
    }

    #[must_use]
    pub fn centroid(&self) -> Option<LatLng> {
        geom::compute_centroid(&self.points)
    }

    #[must_use]
    pub fn statistics(&self) -> SurveyStatistics {
        let area_m2 = self.area_m2();
        SurveyStatistics {
            point_count: self.points.len(),
            area_m2,
            area_hectares: geom::square_meters_to_hectares(area_m2),
            area_acres: geom::square_meters_to_acres(area_m2),
            centroid: self.centroid(),
        }
    }

    #[must_use]
    pub fn payload(&self) -> BoundaryPayload {
        BoundaryPayload {
            center: self.centroid(),
            boundary_points: self.points.iter().map(BoundaryPoint::position).collect(),
        }
    }

    /// Sluit de sessie af. De survey wordt geconsumeerd; verdere mutaties zijn
    /// daarna niet meer mogelijk.
    pub fn finish(self, status: SurveyStatus) -> SurveyResult<SurveySubmission> {
        if status == SurveyStatus::Submitted && self.points.len() < 3 {
            return Err(SurveyError::IncompleteBoundary(self.points.len()));
        }

        let boundary_data = serde_json::to_string(&self.payload())?;
        let area_m2 = self.area_m2();
        let instrument_type = self.instrument_type().to_owned();
        log::info!(
            "survey afgesloten als {status:?} met {} punten ({area_m2:.1} m²)",
            self.points.len()
        );

        Ok(SurveySubmission {
            status,
            data_source: self.data_source,
            instrument_type,
            declared_accuracy: self.declared_accuracy,
            area_m2,
            points: self.points,
            boundary_data,
        })
    }
}
