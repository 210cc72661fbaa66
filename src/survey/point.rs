//! Eén gemeten hoekpunt van een perceelgrens.

use serde::Serialize;
use thiserror::Error;
use time::OffsetDateTime;

use crate::geom::{GeoCoordinate, LatLng};

/// Fouten bij het construeren van een [`BoundaryPoint`].
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum PointError {
    #[error("breedtegraad {0} ligt buiten [-90, 90]")]
    LatitudeOutOfRange(f64),
    #[error("lengtegraad {0} ligt buiten [-180, 180]")]
    LongitudeOutOfRange(f64),
}

/// Herkomst van een fix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FixType {
    RtkFixed,
    Standard,
    Manual,
    Imported,
}

/// Afgeleide signaalclassificatie; niet zelfstandig gezaghebbend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalStrength {
    Excellent,
    Good,
    Fair,
    Poor,
    Manual,
}

impl SignalStrength {
    /// Classificeert een fix op basis van fixtype en horizontale nauwkeurigheid (meters).
    #[must_use]
    pub fn classify(fix_type: FixType, horizontal_accuracy: Option<f64>) -> Self {
        match fix_type {
            FixType::Manual => Self::Manual,
            FixType::RtkFixed => Self::Excellent,
            FixType::Standard | FixType::Imported => match horizontal_accuracy {
                None => Self::Good,
                Some(accuracy) if accuracy <= 3.0 => Self::Excellent,
                Some(accuracy) if accuracy <= 5.0 => Self::Good,
                Some(accuracy) if accuracy <= 10.0 => Self::Fair,
                Some(_) => Self::Poor,
            },
        }
    }
}

/// Geodetisch meetpunt met herkomstgegevens.
///
/// Een punt is onveranderlijk zodra het aan een survey is toegevoegd; de
/// `with_*`-methoden consumeren de waarde en horen bij de constructie.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoundaryPoint {
    latitude: f64,
    longitude: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    altitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    horizontal_accuracy: Option<f64>,
    #[serde(with = "time::serde::rfc3339")]
    captured_at: OffsetDateTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    satellite_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    hdop: Option<f64>,
    fix_type: FixType,
    signal_strength: SignalStrength,
}

impl BoundaryPoint {
    /// Maakt een punt met het huidige tijdstip als `captured_at`.
    pub fn new(latitude: f64, longitude: f64, fix_type: FixType) -> Result<Self, PointError> {
        Self::new_at(latitude, longitude, fix_type, OffsetDateTime::now_utc())
    }

    /// Maakt een punt met een expliciet opnametijdstip.
    pub fn new_at(
        latitude: f64,
        longitude: f64,
        fix_type: FixType,
        captured_at: OffsetDateTime,
    ) -> Result<Self, PointError> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(PointError::LatitudeOutOfRange(latitude));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(PointError::LongitudeOutOfRange(longitude));
        }

        let satellite_count = (fix_type == FixType::Manual).then_some(0);
        Ok(Self {
            latitude,
            longitude,
            altitude: None,
            horizontal_accuracy: None,
            captured_at,
            satellite_count,
            hdop: None,
            fix_type,
            signal_strength: SignalStrength::classify(fix_type, None),
        })
    }

    #[must_use]
    pub fn with_altitude(mut self, altitude: Option<f64>) -> Self {
        self.altitude = altitude.filter(|value| value.is_finite());
        self
    }

    #[must_use]
    pub fn with_horizontal_accuracy(mut self, accuracy: Option<f64>) -> Self {
        self.horizontal_accuracy = accuracy.filter(|value| value.is_finite() && *value >= 0.0);
        self.signal_strength = SignalStrength::classify(self.fix_type, self.horizontal_accuracy);
        self
    }

    /// Handmatige punten houden altijd nul satellieten.
    #[must_use]
    pub fn with_satellite_count(mut self, count: Option<u32>) -> Self {
        if self.fix_type != FixType::Manual {
            self.satellite_count = count;
        }
        self
    }

    #[must_use]
    pub fn with_hdop(mut self, hdop: Option<f64>) -> Self {
        self.hdop = hdop.filter(|value| value.is_finite());
        self
    }

    #[must_use]
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    #[must_use]
    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    #[must_use]
    pub fn altitude(&self) -> Option<f64> {
        self.altitude
    }

    #[must_use]
    pub fn horizontal_accuracy(&self) -> Option<f64> {
        self.horizontal_accuracy
    }

    #[must_use]
    pub fn captured_at(&self) -> OffsetDateTime {
        self.captured_at
    }

    #[must_use]
    pub fn satellite_count(&self) -> Option<u32> {
        self.satellite_count
    }

    #[must_use]
    pub fn hdop(&self) -> Option<f64> {
        self.hdop
    }

    #[must_use]
    pub fn fix_type(&self) -> FixType {
        self.fix_type
    }

    #[must_use]
    pub fn signal_strength(&self) -> SignalStrength {
        self.signal_strength
    }

    #[must_use]
    pub fn position(&self) -> LatLng {
        LatLng::new(self.latitude, self.longitude)
    }
}

impl GeoCoordinate for BoundaryPoint {
    fn latitude(&self) -> f64 {
        self.latitude
    }

    fn longitude(&self) -> f64 {
        self.longitude
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn rejects_out_of_range_coordinates() {
        assert!(matches!(
            BoundaryPoint::new(90.5, 0.0, FixType::Standard),
            Err(PointError::LatitudeOutOfRange(_))
        ));
        assert!(matches!(
            BoundaryPoint::new(0.0, -180.01, FixType::Standard),
            Err(PointError::LongitudeOutOfRange(_))
        ));
        assert!(BoundaryPoint::new(f64::NAN, 0.0, FixType::Standard).is_err());
        assert!(BoundaryPoint::new(-90.0, 180.0, FixType::Standard).is_ok());
    }

    #[test]
    fn manual_points_have_zero_satellites() {
        let point = BoundaryPoint::new(5.6, -0.18, FixType::Manual)
            .unwrap()
            .with_satellite_count(Some(12));
        assert_eq!(point.satellite_count(), Some(0));
        assert_eq!(point.signal_strength(), SignalStrength::Manual);
    }

    #[test]
    fn signal_strength_follows_accuracy() {
        let base = BoundaryPoint::new_at(5.6, -0.18, FixType::Standard, datetime!(2024-03-01 10:00 UTC))
            .unwrap();
        assert_eq!(
            base.clone().with_horizontal_accuracy(Some(2.5)).signal_strength(),
            SignalStrength::Excellent
        );
        assert_eq!(
            base.clone().with_horizontal_accuracy(Some(4.0)).signal_strength(),
            SignalStrength::Good
        );
        assert_eq!(
            base.clone().with_horizontal_accuracy(Some(8.0)).signal_strength(),
            SignalStrength::Fair
        );
        assert_eq!(
            base.with_horizontal_accuracy(Some(25.0)).signal_strength(),
            SignalStrength::Poor
        );
        assert_eq!(
            SignalStrength::classify(FixType::RtkFixed, Some(40.0)),
            SignalStrength::Excellent
        );
    }

    #[test]
    fn serializes_wire_names() {
        let point = BoundaryPoint::new_at(5.0, -1.0, FixType::RtkFixed, datetime!(2024-03-01 10:00 UTC))
            .unwrap();
        let json = serde_json::to_value(&point).unwrap();
        assert_eq!(json["fix_type"], "RTK_FIXED");
        assert_eq!(json["signal_strength"], "excellent");
        assert_eq!(json["captured_at"], "2024-03-01T10:00:00Z");
        assert!(json.get("altitude").is_none());
    }
}
