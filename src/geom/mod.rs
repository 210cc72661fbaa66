//! Oppervlakte- en zwaartepuntberekening over geordende puntreeksen.
//!
//! De oppervlakte gebruikt bewust een vlakke shoelace-benadering in graden
//! met een vaste schaal van 111 000 m per graad. Die schaal is niet
//! breedtegraadafhankelijk; weergavecode rekent op exact deze factor.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

/// Meters per graad, gemeten op de evenaar.
pub const METERS_PER_DEGREE: f64 = 111_000.0;

/// Vierkante meters per hectare.
pub const SQUARE_METERS_PER_HECTARE: f64 = 10_000.0;

/// Vierkante meters per internationale acre.
pub const SQUARE_METERS_PER_ACRE: f64 = 4_046.856_422_4;

/// Alles met een breedte- en lengtegraad in decimale graden.
pub trait GeoCoordinate {
    fn latitude(&self) -> f64;
    fn longitude(&self) -> f64;
}

/// Eenvoudig coördinatenpaar zoals het naar de persistentielaag gaat.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    #[must_use]
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

impl GeoCoordinate for LatLng {
    fn latitude(&self) -> f64 {
        self.lat
    }

    fn longitude(&self) -> f64 {
        self.lng
    }
}

/// Oppervlakte in m² van een polygoon gegeven als geordende hoekpunten.
///
/// Minder dan drie punten levert `0.0`. De volgorde (winding) heeft geen
/// invloed op het resultaat.
#[must_use]
pub fn compute_area<P: GeoCoordinate>(points: &[P]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }

    let mut twice_area = 0.0;
    for (index, current) in points.iter().enumerate() {
        let next = &points[(index + 1) % points.len()];
        twice_area += current.longitude() * next.latitude();
        twice_area -= next.longitude() * current.latitude();
    }

    (twice_area / 2.0).abs() * METERS_PER_DEGREE * METERS_PER_DEGREE
}

/// Oppervlakte in m² van een cirkelvormig gebied met straal in meters.
#[must_use]
pub fn compute_circle_area(radius_m: f64) -> f64 {
    if !radius_m.is_finite() || radius_m <= 0.0 {
        return 0.0;
    }
    PI * radius_m * radius_m
}

/// Gemiddelde van de hoekpunten.
///
/// Een afsluitend punt dat gelijk is aan het eerste punt (gesloten ring)
/// telt niet mee.
#[must_use]
pub fn compute_centroid<P: GeoCoordinate>(points: &[P]) -> Option<LatLng> {
    let vertices = open_ring(points);
    if vertices.is_empty() {
        return None;
    }

    let count = vertices.len() as f64;
    let (lat_sum, lng_sum) = vertices.iter().fold((0.0, 0.0), |(lat, lng), point| {
        (lat + point.latitude(), lng + point.longitude())
    });

    Some(LatLng::new(lat_sum / count, lng_sum / count))
}

fn open_ring<P: GeoCoordinate>(points: &[P]) -> &[P] {
    match (points.first(), points.last()) {
        (Some(first), Some(last))
            if points.len() > 1
                && first.latitude() == last.latitude()
                && first.longitude() == last.longitude() =>
        {
            &points[..points.len() - 1]
        }
        _ => points,
    }
}

/// Cirkelvormig opnamegebied rond een middelpunt.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CircularRegion {
    pub center: LatLng,
    pub radius_m: f64,
}

impl CircularRegion {
    #[must_use]
    pub const fn new(center: LatLng, radius_m: f64) -> Self {
        Self { center, radius_m }
    }

    #[must_use]
    pub fn area_m2(&self) -> f64 {
        compute_circle_area(self.radius_m)
    }
}

#[must_use]
pub fn square_meters_to_hectares(area_m2: f64) -> f64 {
    area_m2 / SQUARE_METERS_PER_HECTARE
}

#[must_use]
pub fn square_meters_to_acres(area_m2: f64) -> f64 {
    area_m2 / SQUARE_METERS_PER_ACRE
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(origin: LatLng, side: f64) -> Vec<LatLng> {
        vec![
            origin,
            LatLng::new(origin.lat, origin.lng + side),
            LatLng::new(origin.lat + side, origin.lng + side),
            LatLng::new(origin.lat + side, origin.lng),
        ]
    }

    #[test]
    fn area_is_zero_below_three_points() {
        let points = square(LatLng::new(5.0, -1.0), 0.01);
        assert_eq!(compute_area::<LatLng>(&[]), 0.0);
        assert_eq!(compute_area(&points[..1]), 0.0);
        assert_eq!(compute_area(&points[..2]), 0.0);
    }

    #[test]
    fn square_area_uses_equatorial_scale() {
        let side = 0.001;
        let area = compute_area(&square(LatLng::new(5.6037, -0.187), side));
        let expected = side * side * METERS_PER_DEGREE * METERS_PER_DEGREE;
        assert!((area - expected).abs() < expected * 1e-6, "area {area}, verwacht {expected}");
    }

    #[test]
    fn area_is_invariant_under_reversal() {
        let mut points = vec![
            LatLng::new(0.0, 0.0),
            LatLng::new(0.0, 2.0),
            LatLng::new(1.0, 3.0),
            LatLng::new(2.0, 1.0),
        ];
        let forward = compute_area(&points);
        points.reverse();
        let backward = compute_area(&points);
        assert!((forward - backward).abs() < 1e-6);
        assert!(forward > 0.0);
    }

    #[test]
    fn closing_vertex_does_not_change_area_or_centroid() {
        let mut points = square(LatLng::new(0.0, 0.0), 2.0);
        let open_area = compute_area(&points);
        points.push(points[0]);
        assert!((compute_area(&points) - open_area).abs() < 1e-6);

        let centroid = compute_centroid(&points).unwrap();
        assert!((centroid.lat - 1.0).abs() < 1e-12);
        assert!((centroid.lng - 1.0).abs() < 1e-12);
    }

    #[test]
    fn centroid_of_empty_sequence_is_none() {
        assert!(compute_centroid::<LatLng>(&[]).is_none());
        let single = compute_centroid(&[LatLng::new(3.0, 4.0)]).unwrap();
        assert_eq!(single, LatLng::new(3.0, 4.0));
    }

    #[test]
    fn circle_area_bypasses_shoelace() {
        let region = CircularRegion::new(LatLng::new(5.0, -1.0), 10.0);
        assert!((region.area_m2() - PI * 100.0).abs() < 1e-9);
        assert_eq!(compute_circle_area(-3.0), 0.0);
        assert_eq!(compute_circle_area(f64::NAN), 0.0);
    }

    #[test]
    fn unit_conversions() {
        assert!((square_meters_to_hectares(25_000.0) - 2.5).abs() < 1e-12);
        assert!((square_meters_to_acres(SQUARE_METERS_PER_ACRE) - 1.0).abs() < 1e-12);
    }
}
