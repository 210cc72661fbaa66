//! Stubgrenzen voor puntwolk- en shapefile-exports.
//!
//! Er is nog geen echte LAS- of shapefile-decoder. Deze importeurs leveren
//! een vaste rechthoek rond de referentie-oorsprong, zodat een echte decoder
//! later achter hetzelfde contract kan worden geplaatst.

use time::OffsetDateTime;

use super::{Boundary, ImportError, ImportFormat, ImportOptions, ImportResult};
use crate::survey::point::{BoundaryPoint, FixType};

/// Nauwkeurigheidsschatting voor LAS/LAZ-puntwolken.
pub const POINT_CLOUD_ACCURACY: f64 = 0.98;

/// Nauwkeurigheidsschatting voor shapefile-exports.
pub const SHAPEFILE_ACCURACY: f64 = 0.94;

const LAS_SIGNATURE: &[u8] = b"LASF";
const ZIP_SIGNATURE: &[u8] = b"PK";

/// Bouwt de synthetische rechthoek voor `format`.
///
/// `extension` is de genormaliseerde extensie (`las`, `zip`, ...). De inhoud
/// van `raw` wordt alleen op een bekende bestandssignatuur gecontroleerd;
/// een ontbrekende signatuur geeft een waarschuwing.
pub fn boundary_for(
    format: ImportFormat,
    extension: &str,
    raw: &[u8],
    options: &ImportOptions,
) -> ImportResult<Boundary> {
    let accuracy = match format {
        ImportFormat::PointCloud => POINT_CLOUD_ACCURACY,
        ImportFormat::ShapefileExtract => SHAPEFILE_ACCURACY,
        ImportFormat::GeoJson | ImportFormat::Kml | ImportFormat::Delimited => {
            return Err(ImportError::UnsupportedFormat(format.name().to_owned()));
        }
    };

    if let Some(warning) = signature_warning(extension, raw) {
        log::warn!("{warning}; synthetische grens wordt gebruikt");
    }

    let points = rectangle(options)?;
    Ok(Boundary::new(points, format.data_source(), accuracy))
}

/// Controleert de bestandssignatuur die bij `extension` hoort.
///
/// Alleen `.las`/`.laz` (LASF) en `.zip` (PK) hebben een signatuur; een losse
/// `.shp` wordt niet gecontroleerd. Lege invoer geeft nooit een waarschuwing.
fn signature_warning(extension: &str, raw: &[u8]) -> Option<&'static str> {
    if raw.is_empty() {
        return None;
    }
    match extension {
        "las" | "laz" if !raw.starts_with(LAS_SIGNATURE) => Some("puntwolkbestand mist de LASF-signatuur"),
        "zip" if !raw.starts_with(ZIP_SIGNATURE) => Some("shapefile-export is geen ZIP-archief"),
        _ => None,
    }
}

/// Rechthoek met de klok mee vanaf de oorsprong: ZW, ZO, NO, NW.
fn rectangle(options: &ImportOptions) -> ImportResult<Vec<BoundaryPoint>> {
    let origin = options.reference_origin;
    let span = options.synthetic_span_deg;
    let captured_at = OffsetDateTime::now_utc();

    [
        (origin.lat, origin.lng),
        (origin.lat, origin.lng + span),
        (origin.lat + span, origin.lng + span),
        (origin.lat + span, origin.lng),
    ]
    .into_iter()
    .map(|(lat, lng)| BoundaryPoint::new_at(lat, lng, FixType::Imported, captured_at).map_err(ImportError::from))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::{self, LatLng, METERS_PER_DEGREE};
    use crate::survey::DataSource;

    #[test]
    fn point_cloud_yields_tagged_rectangle() {
        let options = ImportOptions::default();
        let boundary = boundary_for(ImportFormat::PointCloud, "las", b"LASF\x01\x02", &options).unwrap();
        assert_eq!(boundary.points.len(), 4);
        assert_eq!(boundary.source, DataSource::Lidar);
        assert_eq!(boundary.instrument_type, "LiDAR Scanner");
        assert!((boundary.accuracy_estimate - POINT_CLOUD_ACCURACY).abs() < f64::EPSILON);
        assert!(boundary.points.iter().all(|p| p.fix_type() == FixType::Imported));
        assert_eq!(boundary.points[0].position(), options.reference_origin);
    }

    #[test]
    fn shapefile_stub_ignores_content() {
        let options = ImportOptions {
            reference_origin: LatLng::new(6.6885, -1.6244),
            synthetic_span_deg: 0.002,
        };
        let boundary = boundary_for(ImportFormat::ShapefileExtract, "shp", b"", &options).unwrap();
        assert_eq!(boundary.source, DataSource::Shapefile);
        assert_eq!(boundary.instrument_type, "Survey Extract");
        assert!((boundary.accuracy_estimate - SHAPEFILE_ACCURACY).abs() < f64::EPSILON);

        let area = geom::compute_area(&boundary.points);
        let expected = 0.002 * 0.002 * METERS_PER_DEGREE * METERS_PER_DEGREE;
        assert!((area - expected).abs() < expected * 1e-6);
    }

    #[test]
    fn out_of_range_origin_is_rejected() {
        let options = ImportOptions {
            reference_origin: LatLng::new(89.9995, 0.0),
            synthetic_span_deg: 0.001,
        };
        assert!(matches!(
            boundary_for(ImportFormat::PointCloud, "laz", b"LASF", &options),
            Err(ImportError::InvalidCoordinate(_))
        ));
    }

    #[test]
    fn signature_is_checked_per_extension() {
        // een echte .shp begint met de shapefile-header, niet met PK
        let shp_header = [0x00, 0x00, 0x27, 0x0a, 0x00, 0x00];
        assert_eq!(signature_warning("shp", &shp_header), None);
        assert_eq!(signature_warning("zip", b"PK\x03\x04"), None);
        assert!(signature_warning("zip", &shp_header).is_some());
        assert_eq!(signature_warning("las", b"LASF\x01"), None);
        assert!(signature_warning("laz", b"XYZ").is_some());
        assert_eq!(signature_warning("las", b""), None);

        let boundary = boundary_for(ImportFormat::ShapefileExtract, "shp", &shp_header, &ImportOptions::default()).unwrap();
        assert_eq!(boundary.points.len(), 4);
    }

    #[test]
    fn text_formats_are_not_synthetic() {
        assert!(matches!(
            boundary_for(ImportFormat::Kml, "kml", b"", &ImportOptions::default()),
            Err(ImportError::UnsupportedFormat(_))
        ));
    }
}
