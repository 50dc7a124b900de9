//! Bounded-concurrency dispatch over a device work source.
//!
//! The dispatcher runs a fixed pool of worker tasks. Workers pull device
//! specs from a shared iterator, so memory use is bounded by the pool size
//! rather than the fleet size, and a streamed inventory never needs to be
//! buffered in full. Each pulled spec is driven through the session
//! protocol exactly once and yields exactly one [`DeviceReport`].
//!
//! # Main Components
//!
//! - [`Dispatcher`] - the worker pool
//! - [`DeviceReport`] / [`Outcome`] - the per-device result
//! - [`CancelToken`] - cooperative cancellation shared by a run

use std::sync::{Arc, Mutex};

use log::{debug, warn};
use serde::Serialize;
use tokio::sync::{mpsc, watch};

use crate::device::DeviceSpec;
use crate::error::Stage;
use crate::session::{self, SessionSettings};
use crate::transport::Transport;

/// Cooperative cancellation signal shared by one run.
///
/// Raising the signal stops workers from pulling new devices; in-flight
/// sessions observe it at their next blocking step and unwind through the
/// normal teardown path.
#[derive(Debug, Clone)]
pub struct CancelToken {
    tx: Arc<watch::Sender<bool>>,
    rx: watch::Receiver<bool>,
}

impl CancelToken {
    pub fn new() -> CancelToken {
        let (tx, rx) = watch::channel(false);
        CancelToken {
            tx: Arc::new(tx),
            rx,
        }
    }

    /// Raises the signal. Idempotent.
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }

    /// Whether the signal has been raised.
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once the signal is raised.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        // wait_for only errs when every sender is gone; self holds one.
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

/// The single outcome produced for one device.
///
/// Mutually exclusive by construction: a device either yields its complete
/// command output or one classified failure, never both.
#[derive(Debug, Serialize)]
pub enum Outcome {
    /// Ordered concatenation of every per-command prompt-delimited read.
    Output(Vec<u8>),
    /// The session failed; `stage` names the protocol stage at fault.
    Failed { stage: Stage, reason: String },
}

/// Per-device result streamed out of a run.
#[derive(Debug, Serialize)]
pub struct DeviceReport {
    /// Address of the originating device spec.
    pub address: String,
    /// Informational device tag from the spec.
    pub device_type: String,
    pub outcome: Outcome,
}

/// Fixed-size worker pool driving sessions to completion.
pub struct Dispatcher<T: Transport> {
    transport: Arc<T>,
    settings: SessionSettings,
    workers: usize,
}

impl<T: Transport> Dispatcher<T> {
    /// Creates a pool running at most `workers` concurrent sessions.
    ///
    /// Values below 1 are clamped to 1.
    pub fn new(transport: T, settings: SessionSettings, workers: usize) -> Dispatcher<T> {
        Dispatcher {
            transport: Arc::new(transport),
            settings,
            workers: workers.max(1),
        }
    }

    /// Runs the session protocol once per device and streams the reports.
    ///
    /// The returned channel closes after every pulled device has reported.
    /// Devices complete in no particular order. Once `cancel` is raised,
    /// no new device is pulled; devices already in flight report a
    /// cancellation failure from their next blocking step.
    pub fn run<I>(&self, devices: I, cancel: CancelToken) -> mpsc::Receiver<DeviceReport>
    where
        I: IntoIterator<Item = DeviceSpec>,
        I::IntoIter: Send + 'static,
    {
        let source = Arc::new(Mutex::new(devices.into_iter()));
        let (report_tx, report_rx) = mpsc::channel(self.workers);

        for worker in 0..self.workers {
            let source = Arc::clone(&source);
            let transport = Arc::clone(&self.transport);
            let settings = self.settings.clone();
            let cancel = cancel.clone();
            let reports = report_tx.clone();

            tokio::spawn(async move {
                loop {
                    if cancel.is_cancelled() {
                        debug!("worker {worker}: cancellation raised, stopping dispatch");
                        break;
                    }

                    // The lock guards only the synchronous pull; it is
                    // released before any await point.
                    let spec = match source.lock() {
                        Ok(mut iter) => iter.next(),
                        Err(_) => break,
                    };
                    let Some(spec) = spec else { break };

                    let report =
                        process_device(transport.as_ref(), &spec, &settings, &cancel).await;
                    if reports.send(report).await.is_err() {
                        break;
                    }
                }
            });
        }

        report_rx
    }
}

async fn process_device<T: Transport>(
    transport: &T,
    spec: &DeviceSpec,
    settings: &SessionSettings,
    cancel: &CancelToken,
) -> DeviceReport {
    debug!("{} starting session ({})", spec.address, spec.device_type);

    let outcome = match session::run_device(transport, spec, settings, cancel).await {
        Ok(output) => {
            debug!(
                "{} all {} command(s) completed",
                spec.address,
                spec.commands.len()
            );
            Outcome::Output(output)
        }
        Err(err) => {
            warn!(
                "{} failed at {} stage: {err}",
                spec.address,
                err.stage().label()
            );
            Outcome::Failed {
                stage: err.stage(),
                reason: err.to_string(),
            }
        }
    };

    DeviceReport {
        address: spec.address.clone(),
        device_type: spec.device_type.clone(),
        outcome,
    }
}

#[cfg(test)]
mod tests {
    use super::CancelToken;
    use std::time::Duration;

    #[tokio::test]
    async fn cancel_flips_the_flag_for_all_clones() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());

        token.cancel();
        assert!(clone.is_cancelled());
    }

    #[tokio::test]
    async fn cancelled_resolves_after_the_signal_is_raised() {
        let token = CancelToken::new();
        let waiter = token.clone();

        let handle = tokio::spawn(async move {
            waiter.cancelled().await;
        });

        tokio::time::sleep(Duration::from_millis(10)).await;
        token.cancel();

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("waiter should wake after cancel")
            .expect("waiter task should not panic");
    }

    #[tokio::test]
    async fn cancelled_resolves_immediately_when_already_raised() {
        let token = CancelToken::new();
        token.cancel();

        tokio::time::timeout(Duration::from_millis(100), token.cancelled())
            .await
            .expect("already-raised signal resolves at once");
    }
}
