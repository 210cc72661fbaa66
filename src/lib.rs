#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod acquire;
pub mod config;
pub mod geom;
pub mod ident;
pub mod parse;
pub mod survey;

use std::fmt;

use config::EngineConfig;
use geom::LatLng;
use survey::point::BoundaryPoint;
use survey::{DataSource, Survey, SurveyStatus};
use wasm_bindgen::prelude::*;

cfg_if::cfg_if! {
    if #[cfg(all(feature = "console_error_panic_hook", target_arch = "wasm32"))] {
        #[wasm_bindgen(start)]
        pub fn initialize() {
            console_error_panic_hook::set_once();
            init_logger();
        }
    } else {
        #[wasm_bindgen(start)]
        pub fn initialize() {
            init_logger();
        }
    }
}

#[cfg(feature = "debug_logs")]
fn init_logger() {
    use log::LevelFilter;
    use wasm_bindgen_console_logger::DEFAULT_LOGGER;
    if log::set_logger(&DEFAULT_LOGGER).is_ok() {
        log::set_max_level(LevelFilter::Debug);
    }
}

#[cfg(not(feature = "debug_logs"))]
fn init_logger() {}

/// Browserzijde van een opnamesessie.
///
/// De host (JavaScript) doet zelf de geolocatie-aanvraag met timeout en
/// levert het resultaat via [`SurveyEngine::capture_fix`] of valt terug op
/// [`SurveyEngine::capture_manual`].
#[wasm_bindgen]
pub struct SurveyEngine {
    survey: Survey,
    config: EngineConfig,
    reference: LatLng,
}

impl Default for SurveyEngine {
    fn default() -> Self {
        Self::from_config(EngineConfig::default())
    }
}

#[wasm_bindgen]
impl SurveyEngine {
    #[wasm_bindgen(constructor)]
    #[must_use]
    pub fn new() -> SurveyEngine {
        Self::default()
    }

    /// Maakt een engine met configuratie uit JSON.
    pub fn with_config(config_json: &str) -> Result<SurveyEngine, JsValue> {
        let config = EngineConfig::from_json(config_json).map_err(to_js_error)?;
        Ok(Self::from_config(config))
    }

    #[wasm_bindgen]
    #[must_use]
    pub fn data_source(&self) -> String {
        self.survey.data_source().name().to_owned()
    }

    /// Wisselt van databron; bij een andere bron worden de punten gewist.
    #[wasm_bindgen]
    pub fn set_data_source(&mut self, name: &str) -> Result<(), JsValue> {
        let source: DataSource = name.parse().map_err(to_js_error)?;
        self.survey.set_data_source(source);
        Ok(())
    }

    #[wasm_bindgen]
    #[must_use]
    pub fn instrument_type(&self) -> String {
        self.survey.instrument_type().to_owned()
    }

    #[wasm_bindgen]
    pub fn set_instrument_type(&mut self, instrument_type: &str) {
        self.survey.set_instrument_type(instrument_type);
    }

    /// Importeert een bestand. Bij een fout blijft de sessie ongewijzigd.
    #[wasm_bindgen]
    pub fn import_file(&mut self, bytes: &[u8], extension: &str) -> Result<usize, JsValue> {
        let imported = parse::import(bytes, extension, &self.config.import).map_err(to_js_error)?;
        self.survey.apply_import(imported);
        Ok(self.survey.len())
    }

    /// Voegt een fix van de browser toe. Een fix buiten het geldige bereik
    /// wordt als handmatig punt op de referentiepositie vastgelegd.
    ///
    /// Geeft `true` terug als het punt live is opgenomen.
    #[wasm_bindgen]
    pub fn capture_fix(
        &mut self,
        latitude: f64,
        longitude: f64,
        altitude: Option<f64>,
        horizontal_accuracy: f64,
        satellite_count: Option<u32>,
        rtk_fixed: bool,
    ) -> Result<bool, JsValue> {
        let fix = acquire::PositionFix {
            latitude,
            longitude,
            altitude,
            horizontal_accuracy,
            satellite_count,
            hdop: None,
            rtk_fixed,
        };

        match acquire::live_point(&fix) {
            Ok(point) => {
                let position = point.position();
                self.survey.append(point).map_err(to_js_error)?;
                self.reference = position;
                Ok(true)
            }
            Err(err) => {
                log::warn!("ongeldige fix ({err}); terugval op handmatig punt");
                self.capture_manual()?;
                Ok(false)
            }
        }
    }

    /// Legt een handmatig punt vast op de laatst bekende referentiepositie.
    #[wasm_bindgen]
    pub fn capture_manual(&mut self) -> Result<(), JsValue> {
        let point = acquire::manual_point(self.reference, self.config.acquisition.manual_accuracy_m)
            .map_err(to_js_error)?;
        self.survey.append(point).map_err(to_js_error)?;
        Ok(())
    }

    #[wasm_bindgen]
    pub fn set_reference_position(&mut self, latitude: f64, longitude: f64) -> Result<(), JsValue> {
        BoundaryPoint::new(latitude, longitude, survey::point::FixType::Manual).map_err(to_js_error)?;
        self.reference = LatLng::new(latitude, longitude);
        Ok(())
    }

    #[wasm_bindgen]
    pub fn remove_point(&mut self, index: usize) -> Result<(), JsValue> {
        self.survey.remove_point(index).map(|_| ()).map_err(to_js_error)
    }

    #[wasm_bindgen]
    pub fn clear(&mut self) {
        self.survey.clear();
    }

    #[wasm_bindgen]
    #[must_use]
    pub fn point_count(&self) -> usize {
        self.survey.len()
    }

    #[wasm_bindgen]
    #[must_use]
    pub fn area_m2(&self) -> f64 {
        self.survey.area_m2()
    }

    #[wasm_bindgen]
    pub fn statistics_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.survey.statistics()).map_err(to_js_error)
    }

    #[wasm_bindgen]
    pub fn payload_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.survey.payload()).map_err(to_js_error)
    }

    #[wasm_bindgen]
    pub fn get_statistics(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.survey.statistics()).map_err(to_js_error)
    }

    #[wasm_bindgen]
    pub fn get_points(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.survey.points()).map_err(to_js_error)
    }

    /// Sluit de sessie af (`"draft"` of `"submitted"`) en geeft de
    /// submission als JSON. Daarna begint een lege sessie met dezelfde bron.
    #[wasm_bindgen]
    pub fn submit(&mut self, status: &str) -> Result<String, JsValue> {
        let status = match status.trim().to_ascii_lowercase().as_str() {
            "draft" => SurveyStatus::Draft,
            "submitted" => SurveyStatus::Submitted,
            other => return Err(js_error(&format!("onbekende status `{other}`"))),
        };

        let submission = self.survey.clone().finish(status).map_err(to_js_error)?;
        let json = serde_json::to_string(&submission).map_err(to_js_error)?;
        self.survey = Survey::with_source(self.survey.data_source());
        Ok(json)
    }
}

impl SurveyEngine {
    fn from_config(config: EngineConfig) -> Self {
        Self {
            survey: Survey::new(),
            reference: config.acquisition.reference_position,
            config,
        }
    }

    #[must_use]
    pub fn survey(&self) -> &Survey {
        &self.survey
    }

    #[must_use]
    pub fn reference_position(&self) -> LatLng {
        self.reference
    }
}

/// Genereert een perceelidentificatie voor het huidige jaar.
#[wasm_bindgen]
#[must_use]
pub fn generate_parcel_id(region: &str, district: &str, sequence: Option<u32>) -> String {
    ident::generate(region, district, sequence)
}

#[wasm_bindgen]
#[must_use]
pub fn circle_area(radius_m: f64) -> f64 {
    geom::compute_circle_area(radius_m)
}

fn to_js_error<E: fmt::Display>(error: E) -> JsValue {
    js_error(&error.to_string())
}

fn js_error(message: &str) -> JsValue {
    #[cfg(target_arch = "wasm32")]
    {
        wasm_bindgen::JsError::new(message).into()
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        log::debug!("js_error: {message}");
        JsValue::NULL
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_entry_session_accepts_fixes() {
        let mut engine = SurveyEngine::new();
        assert_eq!(engine.data_source(), "MANUAL_ENTRY");
        assert!(engine.capture_fix(5.6037, -0.1870, None, 4.0, Some(8), false).unwrap());
        assert!(engine.capture_fix(5.6037, -0.1860, Some(12.0), 1.0, None, true).unwrap());
        assert_eq!(engine.point_count(), 2);
        assert_eq!(engine.reference_position(), LatLng::new(5.6037, -0.1860));
    }

    #[test]
    fn invalid_fix_falls_back_to_reference() {
        let mut engine = SurveyEngine::new();
        engine.set_reference_position(6.0, -1.0).unwrap();
        assert!(!engine.capture_fix(f64::NAN, 0.0, None, 3.0, None, false).unwrap());
        let point = &engine.survey().points()[0];
        assert_eq!(point.fix_type(), survey::point::FixType::Manual);
        assert_eq!(point.position(), LatLng::new(6.0, -1.0));
    }

    #[test]
    fn import_replaces_session_and_failure_keeps_it() {
        let mut engine = SurveyEngine::new();
        engine.capture_manual().unwrap();

        let csv = b"lat,lng\n5.0,-1.0\n5.0,-0.99\n5.01,-0.99\n";
        assert_eq!(engine.import_file(csv, "plot.csv").unwrap(), 3);
        assert_eq!(engine.data_source(), "CSV");
        assert_eq!(engine.instrument_type(), "Coordinate List");

        assert!(engine.import_file(b"{}", "broken.geojson").is_err());
        assert_eq!(engine.point_count(), 3);
        assert_eq!(engine.data_source(), "CSV");

        // importbron accepteert geen opnames
        assert!(engine.capture_manual().is_err());
    }

    #[test]
    fn clear_after_import_returns_to_manual_entry() {
        let mut engine = SurveyEngine::new();
        engine.import_file(b"lat,lng\n5.0,-1.0\n5.0,-0.99\n", "plot.csv").unwrap();
        engine.clear();
        assert_eq!(engine.point_count(), 0);
        assert_eq!(engine.data_source(), "MANUAL_ENTRY");
        assert!(engine.capture_manual().is_ok());
    }

    #[test]
    fn switching_source_clears_points() {
        let mut engine = SurveyEngine::new();
        engine.capture_manual().unwrap();
        engine.set_data_source("device-gps").unwrap();
        assert_eq!(engine.point_count(), 0);
        assert!(engine.set_data_source("satellite").is_err());
    }

    #[test]
    fn statistics_and_payload_are_json() {
        let mut engine = SurveyEngine::new();
        for (lat, lng) in [(0.0, 0.0), (0.0, 0.001), (0.001, 0.001), (0.001, 0.0)] {
            engine.set_reference_position(lat, lng).unwrap();
            engine.capture_manual().unwrap();
        }
        let stats: serde_json::Value = serde_json::from_str(&engine.statistics_json().unwrap()).unwrap();
        assert_eq!(stats["point_count"], 4);
        let area = stats["area_m2"].as_f64().unwrap();
        assert!((area - 12_321.0).abs() < 1e-3);

        let payload: serde_json::Value = serde_json::from_str(&engine.payload_json().unwrap()).unwrap();
        assert_eq!(payload["boundary_points"].as_array().unwrap().len(), 4);
        assert!((payload["center"]["lat"].as_f64().unwrap() - 0.0005).abs() < 1e-12);
    }

    #[test]
    fn submit_requires_three_points_and_resets() {
        let mut engine = SurveyEngine::new();
        engine.capture_manual().unwrap();
        assert!(engine.submit("submitted").is_err());
        assert_eq!(engine.point_count(), 1);

        let json = engine.submit("draft").unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["status"], "draft");
        assert_eq!(value["data_source"], "MANUAL_ENTRY");
        assert_eq!(engine.point_count(), 0);
        assert!(engine.submit("archived").is_err());
    }

    #[test]
    fn free_functions() {
        assert!((circle_area(1.0) - std::f64::consts::PI).abs() < 1e-12);
        assert!(generate_parcel_id("Greater Accra", "Tema Metropolitan", Some(5)).ends_with("-000005"));
    }

    #[test]
    fn config_errors_surface() {
        assert!(SurveyEngine::with_config(r#"{ "acquisition": { "position_timeout_ms": 0 } }"#).is_err());
        let engine = SurveyEngine::with_config(r#"{ "acquisition": { "reference_position": { "lat": 7.0, "lng": -2.0 } } }"#)
            .unwrap();
        assert_eq!(engine.reference_position(), LatLng::new(7.0, -2.0));
    }
}
