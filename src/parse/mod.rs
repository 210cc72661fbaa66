//! Importeurs voor externe grensformaten.
//!
//! Elke importeur levert een geordende puntreeks plus een bronlabel en een
//! nauwkeurigheidsschatting. De volgorde van de bron blijft altijd behouden;
//! er wordt niet op winding of convexiteit gesorteerd.

use std::fmt;

use serde::Deserialize;
use thiserror::Error;

use crate::geom::LatLng;
use crate::survey::DataSource;
use crate::survey::point::{BoundaryPoint, PointError};

pub mod delimited;
pub mod geojson;
pub mod kml;
pub mod synthetic;

/// Result type voor imports.
pub type ImportResult<T> = Result<T, ImportError>;

/// Fouten tijdens een import. Een fout laat de survey altijd ongemoeid.
#[derive(Debug, Error)]
pub enum ImportError {
    /// De extensie hoort bij geen enkele importeur.
    #[error("niet-ondersteund bestandsformaat: `{0}`")]
    UnsupportedFormat(String),
    /// De opmaak (XML/GeoJSON-structuur) is onbruikbaar.
    #[error("ongeldige opmaak: {0}")]
    MalformedMarkup(String),
    /// Het document bevat geen bruikbare polygoon.
    #[error("niet-ondersteunde geometrie: {0}")]
    UnsupportedGeometry(String),
    /// Na het parsen bleven er geen punten over.
    #[error("geen geldige punten gevonden in {0}-bestand")]
    EmptyResult(ImportFormat),
    /// Een coördinaat valt buiten het geldige bereik.
    #[error("ongeldige coördinaat: {0}")]
    InvalidCoordinate(#[from] PointError),
    /// Tekstformaten moeten UTF-8 zijn.
    #[error("bestand is geen geldige UTF-8 tekst: {0}")]
    Encoding(#[from] std::str::Utf8Error),
    /// Syntaxfout in een GeoJSON-document.
    #[error("JSON parsefout: {0}")]
    Json(#[from] serde_json::Error),
}

/// Herkende importformaten.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImportFormat {
    GeoJson,
    Kml,
    Delimited,
    PointCloud,
    ShapefileExtract,
}

impl ImportFormat {
    /// Alle herkende extensies, in weergavevolgorde.
    pub const EXTENSIONS: &'static [&'static str] = &[
        "json", "geojson", "kml", "las", "laz", "shp", "zip", "csv", "txt",
    ];

    /// Bepaalt het formaat op basis van een extensie of bestandsnaam,
    /// ongeacht hoofdletters en met of zonder punt.
    pub fn from_extension(declared: &str) -> ImportResult<Self> {
        let extension = normalize_extension(declared);
        match extension.as_str() {
            "json" | "geojson" => Ok(Self::GeoJson),
            "kml" => Ok(Self::Kml),
            "csv" | "txt" => Ok(Self::Delimited),
            "las" | "laz" => Ok(Self::PointCloud),
            "shp" | "zip" => Ok(Self::ShapefileExtract),
            _ => Err(ImportError::UnsupportedFormat(declared.trim().to_owned())),
        }
    }

    #[must_use]
    pub const fn data_source(self) -> DataSource {
        match self {
            Self::GeoJson => DataSource::GeoJson,
            Self::Kml => DataSource::Kml,
            Self::Delimited => DataSource::Csv,
            Self::PointCloud => DataSource::Lidar,
            Self::ShapefileExtract => DataSource::Shapefile,
        }
    }

    /// Formaten zonder echte decoder; zij leveren een synthetische grens.
    #[must_use]
    pub const fn is_synthetic(self) -> bool {
        matches!(self, Self::PointCloud | Self::ShapefileExtract)
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::GeoJson => "GeoJSON",
            Self::Kml => "KML",
            Self::Delimited => "CSV",
            Self::PointCloud => "LAS",
            Self::ShapefileExtract => "Shapefile",
        }
    }
}

impl fmt::Display for ImportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn normalize_extension(declared: &str) -> String {
    let trimmed = declared.trim();
    let extension = trimmed.rsplit_once('.').map_or(trimmed, |(_, ext)| ext);
    extension.to_ascii_lowercase()
}

/// Geïmporteerde grens met herkomstgegevens.
#[derive(Debug, Clone, PartialEq)]
pub struct Boundary {
    pub points: Vec<BoundaryPoint>,
    pub source: DataSource,
    pub accuracy_estimate: f64,
    pub instrument_type: String,
}

impl Boundary {
    fn new(points: Vec<BoundaryPoint>, source: DataSource, accuracy_estimate: f64) -> Self {
        Self {
            points,
            source,
            accuracy_estimate,
            instrument_type: source.default_instrument().to_owned(),
        }
    }
}

/// Resultaat van een import.
///
/// `Synthetic` markeert een vaste stubgrens voor formaten waarvoor nog geen
/// echte decoder bestaat (LAS/LAZ, shapefile). Aanroepers behandelen die als
/// geldige data met een lage herkomstbetrouwbaarheid.
#[derive(Debug, Clone, PartialEq)]
pub enum ImportedBoundary {
    Parsed(Boundary),
    Synthetic(Boundary),
}

impl ImportedBoundary {
    #[must_use]
    pub fn boundary(&self) -> &Boundary {
        match self {
            Self::Parsed(boundary) | Self::Synthetic(boundary) => boundary,
        }
    }

    #[must_use]
    pub fn points(&self) -> &[BoundaryPoint] {
        &self.boundary().points
    }

    #[must_use]
    pub fn source_tag(&self) -> DataSource {
        self.boundary().source
    }

    #[must_use]
    pub fn accuracy_estimate(&self) -> f64 {
        self.boundary().accuracy_estimate
    }

    #[must_use]
    pub fn instrument_type(&self) -> &str {
        &self.boundary().instrument_type
    }

    #[must_use]
    pub fn is_synthetic(&self) -> bool {
        matches!(self, Self::Synthetic(_))
    }

    /// Splitst in de grens en een vlag die aangeeft of deze synthetisch is.
    #[must_use]
    pub fn into_parts(self) -> (Boundary, bool) {
        match self {
            Self::Parsed(boundary) => (boundary, false),
            Self::Synthetic(boundary) => (boundary, true),
        }
    }
}

/// Instellingen voor de importeurs.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ImportOptions {
    /// Referentie-oorsprong voor synthetische grenzen.
    #[serde(default = "default_reference_origin")]
    pub reference_origin: LatLng,
    /// Zijde (in graden) van de synthetische rechthoek.
    #[serde(default = "default_synthetic_span")]
    pub synthetic_span_deg: f64,
}

pub(crate) fn default_reference_origin() -> LatLng {
    LatLng::new(5.6037, -0.1870)
}

fn default_synthetic_span() -> f64 {
    0.001
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            reference_origin: default_reference_origin(),
            synthetic_span_deg: default_synthetic_span(),
        }
    }
}

/// Importeert ruwe bestandsinhoud op basis van de opgegeven extensie.
pub fn import(raw: &[u8], declared_extension: &str, options: &ImportOptions) -> ImportResult<ImportedBoundary> {
    let format = ImportFormat::from_extension(declared_extension)?;
    log::debug!("import van {} bytes als {format}", raw.len());

    let imported = match format {
        ImportFormat::GeoJson => ImportedBoundary::Parsed(geojson::parse_str(text(raw)?)?),
        ImportFormat::Kml => ImportedBoundary::Parsed(kml::parse_str(text(raw)?)?),
        ImportFormat::Delimited => ImportedBoundary::Parsed(delimited::parse_str(text(raw)?)?),
        ImportFormat::PointCloud | ImportFormat::ShapefileExtract => {
            let extension = normalize_extension(declared_extension);
            ImportedBoundary::Synthetic(synthetic::boundary_for(format, &extension, raw, options)?)
        }
    };

    log::debug!("{} punten gelezen uit {format}", imported.points().len());
    Ok(imported)
}

/// Zoals [`import`], maar voor tekst die al gedecodeerd is.
pub fn import_str(input: &str, declared_extension: &str, options: &ImportOptions) -> ImportResult<ImportedBoundary> {
    import(input.as_bytes(), declared_extension, options)
}

fn text(raw: &[u8]) -> ImportResult<&str> {
    let text = std::str::from_utf8(raw)?;
    Ok(text.strip_prefix('\u{feff}').unwrap_or(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_dispatch_is_case_insensitive() {
        assert_eq!(ImportFormat::from_extension(".GeoJSON").unwrap(), ImportFormat::GeoJson);
        assert_eq!(ImportFormat::from_extension("json").unwrap(), ImportFormat::GeoJson);
        assert_eq!(ImportFormat::from_extension("parcel.KML").unwrap(), ImportFormat::Kml);
        assert_eq!(ImportFormat::from_extension("points.txt").unwrap(), ImportFormat::Delimited);
        assert_eq!(ImportFormat::from_extension(".LAZ").unwrap(), ImportFormat::PointCloud);
        assert_eq!(ImportFormat::from_extension("zip").unwrap(), ImportFormat::ShapefileExtract);
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let err = import(b"\x00\x01", ".bin", &ImportOptions::default()).unwrap_err();
        assert!(matches!(err, ImportError::UnsupportedFormat(ext) if ext == ".bin"));
        assert!(matches!(
            ImportFormat::from_extension(""),
            Err(ImportError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn every_listed_extension_is_recognised() {
        for extension in ImportFormat::EXTENSIONS {
            assert!(ImportFormat::from_extension(extension).is_ok(), "{extension}");
        }
    }

    #[test]
    fn non_utf8_text_is_an_encoding_error() {
        let err = import(&[0xff, 0xfe, 0x00], "csv", &ImportOptions::default()).unwrap_err();
        assert!(matches!(err, ImportError::Encoding(_)));
    }

    #[test]
    fn byte_order_mark_is_ignored() {
        let input = "\u{feff}lat,lng\n5.0,-1.0\n";
        let imported = import_str(input, "csv", &ImportOptions::default()).unwrap();
        assert_eq!(imported.points().len(), 1);
        assert!(!imported.is_synthetic());
    }
}
