//! CSV/TXT-importeur met per-regel herstel.
//!
//! De eerste regel is altijd een kopregel. Elke volgende niet-lege regel is
//! `lat,lng`; regels die geen twee eindige getallen binnen het geldige bereik
//! opleveren worden stil overgeslagen.

use time::OffsetDateTime;

use super::{Boundary, ImportError, ImportFormat, ImportResult};
use crate::survey::DataSource;
use crate::survey::point::{BoundaryPoint, FixType};

/// Vaste nauwkeurigheidsschatting voor gescheiden tekst.
pub const ACCURACY: f64 = 0.90;

const SEPARATORS: [char; 3] = [',', ';', '\t'];

pub fn parse_str(input: &str) -> ImportResult<Boundary> {
    let captured_at = OffsetDateTime::now_utc();
    let mut skipped = 0usize;

    let points: Vec<BoundaryPoint> = input
        .lines()
        .skip(1)
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| {
            let point = parse_line(line, captured_at);
            if point.is_none() {
                skipped += 1;
                log::debug!("regel overgeslagen: `{line}`");
            }
            point
        })
        .collect();

    if skipped > 0 {
        log::warn!("{skipped} ongeldige coördinaatregels overgeslagen");
    }

    if points.is_empty() {
        return Err(ImportError::EmptyResult(ImportFormat::Delimited));
    }

    Ok(Boundary::new(points, DataSource::Csv, ACCURACY))
}

fn parse_line(line: &str, captured_at: OffsetDateTime) -> Option<BoundaryPoint> {
    let mut fields = line.split(SEPARATORS).map(field_value);
    let lat = fields.next()??;
    let lng = fields.next()??;
    BoundaryPoint::new_at(lat, lng, FixType::Imported, captured_at).ok()
}

fn field_value(field: &str) -> Option<f64> {
    field
        .trim()
        .trim_matches('"')
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}
