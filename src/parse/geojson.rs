//! GeoJSON-importeur: eerste feature, eerste ring van een `Polygon`.

use serde::Deserialize;
use time::OffsetDateTime;

use super::{Boundary, ImportError, ImportFormat, ImportResult};
use crate::survey::DataSource;
use crate::survey::point::{BoundaryPoint, FixType};

/// Nauwkeurigheid als het document zelf geen `properties.accuracy` heeft.
pub const DEFAULT_ACCURACY: f64 = 0.95;

/// Leest een `FeatureCollection` en neemt de eerste ring van de eerste feature.
///
/// Posities staan als `[lng, lat(, alt)]` in het document en worden naar
/// `(lat, lng)` omgezet.
pub fn parse_str(input: &str) -> ImportResult<Boundary> {
    let collection: FeatureCollection = serde_json::from_str(input)?;
    log::debug!("GeoJSON bevat {} features", collection.features.len());

    let feature = collection
        .features
        .into_iter()
        .next()
        .ok_or_else(|| ImportError::UnsupportedGeometry("FeatureCollection bevat geen features".to_owned()))?;

    let geometry = feature
        .geometry
        .ok_or_else(|| ImportError::UnsupportedGeometry("feature heeft geen geometrie".to_owned()))?;
    if geometry.kind != "Polygon" {
        return Err(ImportError::UnsupportedGeometry(format!(
            "verwacht Polygon, kreeg {}",
            geometry.kind
        )));
    }

    let rings: Vec<Vec<Vec<f64>>> = serde_json::from_value(geometry.coordinates)
        .map_err(|err| ImportError::MalformedMarkup(format!("ongeldige Polygon-coördinaten: {err}")))?;
    let ring = rings.into_iter().next().unwrap_or_default();

    let captured_at = OffsetDateTime::now_utc();
    let points = ring
        .iter()
        .enumerate()
        .map(|(index, position)| position_to_point(index, position, captured_at))
        .collect::<ImportResult<Vec<_>>>()?;

    if points.is_empty() {
        return Err(ImportError::EmptyResult(ImportFormat::GeoJson));
    }

    let accuracy = feature
        .properties
        .and_then(|properties| properties.accuracy)
        .and_then(|value| accuracy_value(&value))
        .unwrap_or(DEFAULT_ACCURACY);

    Ok(Boundary::new(points, DataSource::GeoJson, accuracy))
}

fn position_to_point(index: usize, position: &[f64], captured_at: OffsetDateTime) -> ImportResult<BoundaryPoint> {
    match position {
        [lng, lat, rest @ ..] => {
            let point = BoundaryPoint::new_at(*lat, *lng, FixType::Imported, captured_at)?;
            Ok(point.with_altitude(rest.first().copied()))
        }
        _ => Err(ImportError::MalformedMarkup(format!(
            "positie {index} heeft minder dan twee coördinaten"
        ))),
    }
}

fn accuracy_value(value: &serde_json::Value) -> Option<f64> {
    let accuracy: Option<f64> = match value {
        serde_json::Value::Number(number) => number.as_f64(),
        serde_json::Value::String(text) => text.trim().parse().ok(),
        _ => None,
    };
    accuracy.filter(|accuracy| accuracy.is_finite())
}

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    #[serde(default)]
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    #[serde(default)]
    geometry: Option<Geometry>,
    #[serde(default)]
    properties: Option<Properties>,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    coordinates: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct Properties {
    #[serde(default)]
    accuracy: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const PARCEL: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "properties": { "name": "plot 7" },
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[-0.187, 5.6037], [-0.186, 5.6037], [-0.186, 5.6047, 12.5], [-0.187, 5.6037]]]
                }
            },
            {
                "type": "Feature",
                "geometry": { "type": "Polygon", "coordinates": [[[1.0, 1.0], [2.0, 2.0], [3.0, 1.0]]] }
            }
        ]
    }"#;

    #[test]
    fn swaps_positions_and_keeps_ring_order() {
        let boundary = parse_str(PARCEL).unwrap();
        assert_eq!(boundary.points.len(), 4);
        assert_eq!(boundary.source, DataSource::GeoJson);
        assert!((boundary.accuracy_estimate - DEFAULT_ACCURACY).abs() < f64::EPSILON);

        let expected = [(5.6037, -0.187), (5.6037, -0.186), (5.6047, -0.186), (5.6037, -0.187)];
        for (point, (lat, lng)) in boundary.points.iter().zip(expected) {
            assert_eq!(point.latitude(), lat);
            assert_eq!(point.longitude(), lng);
            assert_eq!(point.fix_type(), FixType::Imported);
        }
        assert_eq!(boundary.points[2].altitude(), Some(12.5));
        assert_eq!(boundary.points[0].altitude(), None);
    }

    #[test]
    fn properties_accuracy_overrides_default() {
        let input = r#"{"type":"FeatureCollection","features":[{"type":"Feature",
            "properties":{"accuracy":0.87},
            "geometry":{"type":"Polygon","coordinates":[[[0.0,0.0],[0.0,1.0],[1.0,1.0]]]}}]}"#;
        let boundary = parse_str(input).unwrap();
        assert!((boundary.accuracy_estimate - 0.87).abs() < f64::EPSILON);
    }

    #[test]
    fn rejects_non_polygon_geometry() {
        let input = r#"{"type":"FeatureCollection","features":[{"type":"Feature",
            "geometry":{"type":"LineString","coordinates":[[0.0,0.0],[1.0,1.0]]}}]}"#;
        assert!(matches!(parse_str(input), Err(ImportError::UnsupportedGeometry(_))));
    }

    #[test]
    fn rejects_empty_collection() {
        let input = r#"{"type":"FeatureCollection","features":[]}"#;
        assert!(matches!(parse_str(input), Err(ImportError::UnsupportedGeometry(_))));
    }

    #[test]
    fn reports_short_positions_and_bad_json() {
        let input = r#"{"type":"FeatureCollection","features":[{"type":"Feature",
            "geometry":{"type":"Polygon","coordinates":[[[0.0,0.0],[1.0]]]}}]}"#;
        assert!(matches!(parse_str(input), Err(ImportError::MalformedMarkup(_))));
        assert!(matches!(parse_str("{ not json"), Err(ImportError::Json(_))));
    }

    #[test]
    fn rejects_out_of_range_latitude() {
        let input = r#"{"type":"FeatureCollection","features":[{"type":"Feature",
            "geometry":{"type":"Polygon","coordinates":[[[0.0,95.0],[1.0,1.0],[2.0,0.0]]]}}]}"#;
        assert!(matches!(parse_str(input), Err(ImportError::InvalidCoordinate(_))));
    }
}
