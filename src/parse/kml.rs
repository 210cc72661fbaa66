//! KML-importeur: het eerste `<coordinates>`-blok.

use quick_xml::events::Event;
use quick_xml::reader::Reader;
use time::OffsetDateTime;

use super::{Boundary, ImportError, ImportFormat, ImportResult};
use crate::survey::DataSource;
use crate::survey::point::{BoundaryPoint, FixType};

/// Vaste nauwkeurigheidsschatting voor KML-bestanden.
pub const ACCURACY: f64 = 0.92;

/// Leest het eerste `<coordinates>`-element (ook met namespace-prefix).
///
/// De tekst wordt op witruimte gesplitst; elk token is `lng,lat[,alt]`.
pub fn parse_str(input: &str) -> ImportResult<Boundary> {
    let text = first_coordinates_block(input)?;

    let captured_at = OffsetDateTime::now_utc();
    let points = text
        .split_whitespace()
        .map(|token| parse_tuple(token, captured_at))
        .collect::<ImportResult<Vec<_>>>()?;

    if points.is_empty() {
        return Err(ImportError::EmptyResult(ImportFormat::Kml));
    }

    Ok(Boundary::new(points, DataSource::Kml, ACCURACY))
}

fn first_coordinates_block(input: &str) -> ImportResult<String> {
    let mut reader = Reader::from_str(input);
    reader.trim_text(true);

    loop {
        match reader.read_event() {
            Ok(Event::Start(element)) if element.local_name().as_ref() == b"coordinates" => {
                let text = reader.read_text(element.name()).map_err(markup_error)?;
                log::debug!("KML coördinatenblok gevonden ({} tekens)", text.len());
                return Ok(text.into_owned());
            }
            Ok(Event::Empty(element)) if element.local_name().as_ref() == b"coordinates" => {
                return Ok(String::new());
            }
            Ok(Event::Eof) => {
                return Err(ImportError::MalformedMarkup(
                    "geen <coordinates> blok gevonden".to_owned(),
                ));
            }
            Ok(_) => {}
            Err(err) => return Err(markup_error(err)),
        }
    }
}

fn markup_error(err: quick_xml::Error) -> ImportError {
    ImportError::MalformedMarkup(format!("XML parsefout: {err}"))
}

fn parse_tuple(token: &str, captured_at: OffsetDateTime) -> ImportResult<BoundaryPoint> {
    let fields: Vec<&str> = token.split(',').collect();
    let numbers = match fields.as_slice() {
        [lng, lat] => (number(lng, token)?, number(lat, token)?, None),
        [lng, lat, alt] => (number(lng, token)?, number(lat, token)?, Some(number(alt, token)?)),
        _ => {
            return Err(ImportError::MalformedMarkup(format!(
                "coördinaat `{token}` is geen lng,lat[,alt]"
            )));
        }
    };

    let (lng, lat, altitude) = numbers;
    Ok(BoundaryPoint::new_at(lat, lng, FixType::Imported, captured_at)?.with_altitude(altitude))
}

fn number(field: &str, token: &str) -> ImportResult<f64> {
    field
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| ImportError::MalformedMarkup(format!("ongeldig getal in coördinaat `{token}`")))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLACEMARK: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<kml xmlns="http://www.opengis.net/kml/2.2">
  <Document>
    <Placemark>
      <name>Plot 12</name>
      <Polygon>
        <outerBoundaryIs>
          <LinearRing>
            <coordinates>
              -0.1870,5.6037,0 -0.1860,5.6037
              -0.1860,5.6047,15.2
              -0.1870,5.6047
            </coordinates>
          </LinearRing>
        </outerBoundaryIs>
      </Polygon>
    </Placemark>
    <Placemark>
      <Point><coordinates>1.0,1.0</coordinates></Point>
    </Placemark>
  </Document>
</kml>"#;

    #[test]
    fn reads_first_coordinates_block_in_order() {
        let boundary = parse_str(PLACEMARK).unwrap();
        assert_eq!(boundary.points.len(), 4);
        assert_eq!(boundary.source, DataSource::Kml);
        assert!((boundary.accuracy_estimate - ACCURACY).abs() < f64::EPSILON);

        assert_eq!(boundary.points[0].latitude(), 5.6037);
        assert_eq!(boundary.points[0].longitude(), -0.1870);
        assert_eq!(boundary.points[0].altitude(), Some(0.0));
        assert_eq!(boundary.points[1].altitude(), None);
        assert_eq!(boundary.points[2].altitude(), Some(15.2));
        assert_eq!(boundary.points[3].latitude(), 5.6047);
    }

    #[test]
    fn accepts_namespace_prefix() {
        let input = r#"<kml:kml xmlns:kml="http://www.opengis.net/kml/2.2"><kml:coordinates>2.0,1.0 3.0,1.0 3.0,2.0</kml:coordinates></kml:kml>"#;
        let boundary = parse_str(input).unwrap();
        assert_eq!(boundary.points.len(), 3);
        assert_eq!(boundary.points[0].latitude(), 1.0);
        assert_eq!(boundary.points[0].longitude(), 2.0);
    }

    #[test]
    fn missing_block_is_malformed_markup() {
        let input = "<kml><Document><name>leeg</name></Document></kml>";
        assert!(matches!(parse_str(input), Err(ImportError::MalformedMarkup(_))));
    }

    #[test]
    fn empty_block_is_empty_result() {
        assert!(matches!(
            parse_str("<kml><coordinates>   </coordinates></kml>"),
            Err(ImportError::EmptyResult(ImportFormat::Kml))
        ));
        assert!(matches!(
            parse_str("<kml><coordinates/></kml>"),
            Err(ImportError::EmptyResult(ImportFormat::Kml))
        ));
    }

    #[test]
    fn bad_tuple_is_fatal() {
        let input = "<kml><coordinates>1.0,2.0 abc,2.0</coordinates></kml>";
        assert!(matches!(parse_str(input), Err(ImportError::MalformedMarkup(_))));
        let input = "<kml><coordinates>1.0</coordinates></kml>";
        assert!(matches!(parse_str(input), Err(ImportError::MalformedMarkup(_))));
    }
}
