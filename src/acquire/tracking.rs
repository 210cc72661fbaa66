//! Achtergrondthread voor continu volgen.

use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use super::{CaptureCore, InFlightGuard};

/// Handle op een lopende volgthread. Stopt en wacht de thread af bij drop.
pub struct TrackingHandle {
    stop_tx: Sender<()>,
    thread: Option<JoinHandle<usize>>,
    interval: Duration,
}

impl TrackingHandle {
    pub(super) fn spawn(core: Arc<CaptureCore>, interval: Duration) -> std::io::Result<Self> {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();

        let thread = thread::Builder::new()
            .name("survey-tracking".to_owned())
            .spawn(move || {
                let mut captured = 0usize;
                loop {
                    match stop_rx.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => {
                            if tick(&core) {
                                captured += 1;
                            }
                        }
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                captured
            })?;

        Ok(Self {
            stop_tx,
            thread: Some(thread),
            interval,
        })
    }

    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Stopt de thread en wacht tot een lopende opname klaar is.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        let _ = self.stop_tx.send(());
        if let Some(thread) = self.thread.take() {
            match thread.join() {
                Ok(captured) => log::debug!("volgthread gestopt na {captured} opnames"),
                Err(_) => log::error!("volgthread is in paniek geraakt"),
            }
        }
    }
}

impl Drop for TrackingHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Eén volgtick. Geeft `true` als er een punt is toegevoegd.
fn tick(core: &CaptureCore) -> bool {
    let Some(_guard) = InFlightGuard::try_acquire(&core.in_flight) else {
        log::debug!("vorige opname loopt nog; tick overgeslagen");
        return false;
    };

    match core.capture(true) {
        Ok(captured) => {
            log::debug!(
                "volgpunt toegevoegd ({:?}, live: {})",
                captured.point().position(),
                captured.is_live()
            );
            true
        }
        Err(err) => {
            log::warn!("volgpunt niet toegevoegd: {err}");
            false
        }
    }
}
