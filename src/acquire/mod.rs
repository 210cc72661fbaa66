//! Acquisitiecontroller: losse en continue opname van grenspunten.
//!
//! Een live opname vraagt één fix aan de [`PositionSource`] met een begrensde
//! wachttijd. Lukt dat niet (timeout, geweigerde toestemming, geen ontvanger),
//! dan valt de controller terug op een handmatig punt op de laatst bekende
//! referentiepositie. Die terugval is geen fout: er wordt altijd een punt
//! toegevoegd.
//!
//! ```text
//!   Idle ──capture_point──▶ Capturing ──▶ Idle
//!   Idle ──start_continuous──▶ Tracking ──stop_continuous──▶ Idle
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

pub mod tracking;

use crate::geom::LatLng;
use crate::parse::default_reference_origin;
use crate::survey::point::{BoundaryPoint, FixType, PointError};
use crate::survey::{Survey, SurveyError};
use tracking::TrackingHandle;

/// Result type voor acquisitie-operaties.
pub type AcquisitionResult<T> = Result<T, AcquisitionError>;

/// Eén antwoord van de positiebron.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionFix {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: Option<f64>,
    /// Horizontale nauwkeurigheid in meters.
    pub horizontal_accuracy: f64,
    pub satellite_count: Option<u32>,
    pub hdop: Option<f64>,
    /// Of de ontvanger een RTK-fixed oplossing rapporteert.
    pub rtk_fixed: bool,
}

impl PositionFix {
    #[must_use]
    pub fn new(latitude: f64, longitude: f64, horizontal_accuracy: f64) -> Self {
        Self {
            latitude,
            longitude,
            altitude: None,
            horizontal_accuracy,
            satellite_count: None,
            hdop: None,
            rtk_fixed: false,
        }
    }
}

/// Redenen waarom de positiebron geen fix leverde.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PositioningError {
    #[error("geen positie binnen {0:?}")]
    Timeout(Duration),
    #[error("toegang tot locatie geweigerd")]
    PermissionDenied,
    #[error("positiebron niet beschikbaar: {0}")]
    Unavailable(String),
    /// Een eerdere aanvraag is na haar timeout nog niet teruggekeerd.
    #[error("vorige positieaanvraag loopt nog")]
    RequestPending,
}

/// Live positiebron (GNSS-ontvanger, browser-geolocatie, ...).
///
/// Implementaties mogen blokkeren; de controller begrenst de wachttijd zelf.
pub trait PositionSource: Send + Sync {
    fn current_position(&self, timeout: Duration) -> Result<PositionFix, PositioningError>;
}

/// Waarom een opname als handmatig punt is vastgelegd.
#[derive(Debug, Clone, PartialEq)]
pub enum FallbackReason {
    /// Er is geen live opname gevraagd.
    NotRequested,
    /// De positiebron faalde.
    Positioning(PositioningError),
    /// De bron leverde een fix buiten het geldige bereik.
    InvalidFix(PointError),
}

/// Resultaat van een opname; de herkomst blijft in het type zichtbaar.
#[derive(Debug, Clone, PartialEq)]
pub enum CapturedPoint {
    Live(BoundaryPoint),
    Manual {
        point: BoundaryPoint,
        reason: FallbackReason,
    },
}

impl CapturedPoint {
    #[must_use]
    pub fn point(&self) -> &BoundaryPoint {
        match self {
            Self::Live(point) | Self::Manual { point, .. } => point,
        }
    }

    #[must_use]
    pub fn into_point(self) -> BoundaryPoint {
        match self {
            Self::Live(point) | Self::Manual { point, .. } => point,
        }
    }

    #[must_use]
    pub fn is_live(&self) -> bool {
        matches!(self, Self::Live(_))
    }
}

/// Toestand van de controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquisitionState {
    Idle,
    Capturing,
    Tracking,
}

/// Fouten van de acquisitiecontroller.
#[derive(Debug, Error)]
pub enum AcquisitionError {
    #[error("controller is bezet ({0:?})")]
    Busy(AcquisitionState),
    #[error("interval moet groter dan nul zijn")]
    InvalidInterval,
    #[error(transparent)]
    Survey(#[from] SurveyError),
    #[error("ongeldige positie: {0}")]
    Point(#[from] PointError),
    #[error("volgthread kon niet gestart worden: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Instellingen voor opname en continu volgen.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct AcquisitionConfig {
    /// Maximale wachttijd op een live fix.
    #[serde(default = "default_position_timeout_ms")]
    pub position_timeout_ms: u64,
    /// Interval tussen opnames tijdens continu volgen.
    #[serde(default = "default_tracking_interval_ms")]
    pub tracking_interval_ms: u64,
    /// Horizontale nauwkeurigheid die aan handmatige punten wordt toegekend.
    #[serde(default = "default_manual_accuracy")]
    pub manual_accuracy_m: f64,
    /// Startwaarde voor de laatst bekende kaart-/referentiepositie.
    #[serde(default = "default_reference_origin")]
    pub reference_position: LatLng,
}

fn default_position_timeout_ms() -> u64 {
    10_000
}

fn default_tracking_interval_ms() -> u64 {
    5_000
}

fn default_manual_accuracy() -> f64 {
    5.0
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            position_timeout_ms: default_position_timeout_ms(),
            tracking_interval_ms: default_tracking_interval_ms(),
            manual_accuracy_m: default_manual_accuracy(),
            reference_position: default_reference_origin(),
        }
    }
}

impl AcquisitionConfig {
    #[must_use]
    pub fn position_timeout(&self) -> Duration {
        Duration::from_millis(self.position_timeout_ms)
    }

    #[must_use]
    pub fn tracking_interval(&self) -> Duration {
        Duration::from_millis(self.tracking_interval_ms)
    }
}

/// Bouwt een punt uit een live fix: `RTK_FIXED` of `STANDARD`.
pub fn live_point(fix: &PositionFix) -> Result<BoundaryPoint, PointError> {
    let fix_type = if fix.rtk_fixed {
        FixType::RtkFixed
    } else {
        FixType::Standard
    };

    Ok(BoundaryPoint::new(fix.latitude, fix.longitude, fix_type)?
        .with_altitude(fix.altitude)
        .with_horizontal_accuracy(Some(fix.horizontal_accuracy))
        .with_satellite_count(fix.satellite_count)
        .with_hdop(fix.hdop))
}

/// Bouwt een handmatig punt op de referentiepositie.
pub fn manual_point(reference: LatLng, accuracy_m: f64) -> Result<BoundaryPoint, PointError> {
    Ok(BoundaryPoint::new(reference.lat, reference.lng, FixType::Manual)?
        .with_horizontal_accuracy(Some(accuracy_m)))
}

/// Gedeelde toestand tussen de controller en de volgthread.
struct CaptureCore {
    survey: Mutex<Survey>,
    source: Arc<dyn PositionSource>,
    reference: Mutex<LatLng>,
    in_flight: AtomicBool,
    /// Gezet zolang een hulpthread op de positiebron wacht, ook na de timeout.
    request_pending: Arc<AtomicBool>,
    config: AcquisitionConfig,
}

impl CaptureCore {
    fn survey(&self) -> MutexGuard<'_, Survey> {
        self.survey.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn reference(&self) -> LatLng {
        *self.reference.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_reference(&self, position: LatLng) {
        *self.reference.lock().unwrap_or_else(PoisonError::into_inner) = position;
    }

    /// Voert één opname uit en voegt het punt toe. De aanroeper houdt de
    /// in-flight vlag vast.
    fn capture(&self, use_live_source: bool) -> AcquisitionResult<CapturedPoint> {
        let captured = if use_live_source {
            match self.request_fix() {
                Ok(fix) => match live_point(&fix) {
                    Ok(point) => {
                        self.set_reference(point.position());
                        CapturedPoint::Live(point)
                    }
                    Err(err) => self.fallback(FallbackReason::InvalidFix(err))?,
                },
                Err(err) => self.fallback(FallbackReason::Positioning(err))?,
            }
        } else {
            self.fallback(FallbackReason::NotRequested)?
        };

        self.survey().append(captured.point().clone())?;
        Ok(captured)
    }

    fn fallback(&self, reason: FallbackReason) -> AcquisitionResult<CapturedPoint> {
        if reason != FallbackReason::NotRequested {
            log::warn!("live positie mislukt ({reason:?}); terugval op handmatig punt");
        }
        let point = manual_point(self.reference(), self.config.manual_accuracy_m)?;
        Ok(CapturedPoint::Manual { point, reason })
    }

    /// Vraagt één fix op een hulpthread, zodat een hangende bron de
    /// controller nooit langer dan de timeout blokkeert.
    ///
    /// Er loopt hoogstens één hulpthread tegelijk. Zolang een eerdere
    /// aanvraag niet is teruggekeerd, faalt een nieuwe direct met
    /// [`PositioningError::RequestPending`].
    fn request_fix(&self) -> Result<PositionFix, PositioningError> {
        if self
            .request_pending
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(PositioningError::RequestPending);
        }

        let timeout = self.config.position_timeout();
        let (tx, rx) = mpsc::channel();
        let source = Arc::clone(&self.source);
        let pending = PendingRequest(Arc::clone(&self.request_pending));

        thread::Builder::new()
            .name("position-request".to_owned())
            .spawn(move || {
                let _pending = pending;
                let _ = tx.send(source.current_position(timeout));
            })
            .map_err(|err| PositioningError::Unavailable(err.to_string()))?;

        match rx.recv_timeout(timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => Err(PositioningError::Timeout(timeout)),
            Err(RecvTimeoutError::Disconnected) => Err(PositioningError::Unavailable(
                "positiebron stopte zonder antwoord".to_owned(),
            )),
        }
    }
}

/// Wist de pending-vlag zodra de hulpthread klaar is, ook bij een panic
/// in de positiebron of als de thread niet gestart kon worden.
struct PendingRequest(Arc<AtomicBool>);

impl Drop for PendingRequest {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Houdt de in-flight vlag vast en geeft die vrij bij drop.
struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    fn try_acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Beheert opnames voor één survey-sessie.
pub struct AcquisitionController {
    core: Arc<CaptureCore>,
    tracking: Option<TrackingHandle>,
}

impl AcquisitionController {
    #[must_use]
    pub fn new(survey: Survey, source: Arc<dyn PositionSource>, config: AcquisitionConfig) -> Self {
        Self {
            core: Arc::new(CaptureCore {
                survey: Mutex::new(survey),
                source,
                reference: Mutex::new(config.reference_position),
                in_flight: AtomicBool::new(false),
                request_pending: Arc::new(AtomicBool::new(false)),
                config,
            }),
            tracking: None,
        }
    }

    #[must_use]
    pub fn state(&self) -> AcquisitionState {
        if self.tracking.is_some() {
            AcquisitionState::Tracking
        } else if self.core.in_flight.load(Ordering::Acquire) {
            AcquisitionState::Capturing
        } else {
            AcquisitionState::Idle
        }
    }

    #[must_use]
    pub fn is_tracking(&self) -> bool {
        self.tracking.is_some()
    }

    /// Interval van de lopende volgthread, als die er is.
    #[must_use]
    pub fn tracking_interval(&self) -> Option<Duration> {
        self.tracking.as_ref().map(TrackingHandle::interval)
    }

    #[must_use]
    pub fn config(&self) -> &AcquisitionConfig {
        &self.core.config
    }

    /// Neemt één punt op en voegt het toe aan de survey.
    ///
    /// Niet toegestaan tijdens continu volgen of terwijl een andere opname loopt.
    pub fn capture_point(&self, use_live_source: bool) -> AcquisitionResult<CapturedPoint> {
        if self.tracking.is_some() {
            return Err(AcquisitionError::Busy(AcquisitionState::Tracking));
        }
        let _guard = InFlightGuard::try_acquire(&self.core.in_flight)
            .ok_or(AcquisitionError::Busy(AcquisitionState::Capturing))?;
        self.core.capture(use_live_source)
    }

    /// Start continu volgen met het interval uit de configuratie.
    pub fn start_tracking(&mut self) -> AcquisitionResult<()> {
        let interval = self.core.config.tracking_interval();
        self.start_continuous(interval)
    }

    /// Start continu volgen: elke `interval` één live opname, tot
    /// [`stop_continuous`](Self::stop_continuous).
    ///
    /// Een tick wordt overgeslagen zolang een vorige opname nog loopt.
    pub fn start_continuous(&mut self, interval: Duration) -> AcquisitionResult<()> {
        if interval.is_zero() {
            return Err(AcquisitionError::InvalidInterval);
        }
        if self.tracking.is_some() {
            return Err(AcquisitionError::Busy(AcquisitionState::Tracking));
        }

        self.tracking = Some(TrackingHandle::spawn(Arc::clone(&self.core), interval)?);
        log::info!("continu volgen gestart (interval {interval:?})");
        Ok(())
    }

    /// Stopt continu volgen. Veilig om aan te roepen als er niet gevolgd wordt.
    pub fn stop_continuous(&mut self) {
        if let Some(handle) = self.tracking.take() {
            handle.stop();
            log::info!("continu volgen gestopt");
        }
    }

    /// Zet de laatst bekende kaartpositie (bijvoorbeeld na een klik op de kaart).
    pub fn set_reference_position(&self, position: LatLng) -> AcquisitionResult<()> {
        BoundaryPoint::new(position.lat, position.lng, FixType::Manual)?;
        self.core.set_reference(position);
        Ok(())
    }

    #[must_use]
    pub fn reference_position(&self) -> LatLng {
        self.core.reference()
    }

    /// Verwijdert één punt; latere indices schuiven op.
    pub fn remove_point(&self, index: usize) -> AcquisitionResult<BoundaryPoint> {
        Ok(self.core.survey().remove_point(index)?)
    }

    pub fn with_survey<R>(&self, f: impl FnOnce(&Survey) -> R) -> R {
        f(&*self.core.survey())
    }

    pub fn with_survey_mut<R>(&self, f: impl FnOnce(&mut Survey) -> R) -> R {
        f(&mut *self.core.survey())
    }

    /// Stopt eventueel volgen en geeft de survey terug.
    #[must_use]
    pub fn into_survey(mut self) -> Survey {
        self.stop_continuous();
        std::mem::take(&mut *self.core.survey())
    }
}

impl Drop for AcquisitionController {
    fn drop(&mut self) {
        self.stop_continuous();
    }
}
