use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{Instant, sleep};

use super::event::{ChangeEvent, Signal};

/// Quiet period used when the configuration does not override it.
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(100);

/// Collapses bursts of raw modifications into one `ChangeEvent` per quiet period.
///
/// A single timer is kept. Every `Signal::Modified` re-arms it `interval` into the
/// future; only when it fires without being re-armed is a `ChangeEvent` delivered.
/// Errors bypass the timer and are forwarded as they arrive.
pub(crate) struct Debouncer {
    interval: Duration,
    live: Arc<AtomicBool>,
}

impl Debouncer {
    pub(crate) fn new(interval: Duration, live: Arc<AtomicBool>) -> Self {
        Self { interval, live }
    }

    fn is_live(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }

    /// Drive the debouncer until the raw signal stream closes, either output
    /// stream is dropped, or the session is marked closed.
    pub(crate) async fn run(
        self,
        mut raw: mpsc::UnboundedReceiver<Signal>,
        changes: mpsc::Sender<ChangeEvent>,
        errors: mpsc::Sender<notify::Error>,
    ) {
        let timer = sleep(Duration::ZERO);
        tokio::pin!(timer);
        let mut armed = false;

        loop {
            tokio::select! {
                signal = raw.recv() => match signal {
                    Some(Signal::Modified) => {
                        timer.as_mut().reset(Instant::now() + self.interval);
                        if !armed {
                            tracing::trace!(interval_ms = self.interval.as_millis() as u64, "debounce timer armed");
                        }
                        armed = true;
                    }
                    Some(Signal::Failed(err)) => {
                        if !self.is_live() || errors.send(err).await.is_err() {
                            return;
                        }
                    }
                    // Sender lives inside the OS watcher; it is gone once the session shuts down.
                    None => return,
                },
                () = &mut timer, if armed => {
                    armed = false;
                    if !self.is_live() {
                        return;
                    }
                    tracing::debug!("change settled");
                    if changes.send(ChangeEvent).await.is_err() {
                        return;
                    }
                }
            }
        }
    }
}
