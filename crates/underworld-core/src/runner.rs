//! Background ticking for the run engine.
//!
//! [`RunService`] wraps a shared [`CrimeRunEngine`] and spawns one tokio
//! task per started run. The task ticks at the configured interval until
//! the run resolves or is cancelled. Each task is bound to its run id, so a
//! ticker that outlives its run can never advance a newer one.
//!
//! # Cancellation
//!
//! Cancelling sets the ticker's flag and wakes it through a [`Notify`]. The
//! flag is checked before every tick, and the engine clears the active run
//! under its own lock, so a tick racing a cancel publishes nothing.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;
use underworld_types::{CrimeType, OutcomeEvent, RunId};

use crate::engine::{BeginOutcome, CrimeRunEngine, TickStatus};

/// Stop signal shared between the service and one ticker task.
#[derive(Debug, Default)]
struct TickerControl {
    cancelled: AtomicBool,
    wake: Notify,
}

impl TickerControl {
    fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
        self.wake.notify_one();
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

#[derive(Debug)]
struct Ticker {
    run_id: RunId,
    control: Arc<TickerControl>,
    handle: JoinHandle<()>,
}

/// Drives an engine's runs on the tokio runtime.
///
/// Must be used from within a tokio runtime.
#[derive(Debug)]
pub struct RunService {
    engine: Arc<CrimeRunEngine>,
    ticker: Mutex<Option<Ticker>>,
}

impl RunService {
    /// Wrap an engine.
    pub const fn new(engine: Arc<CrimeRunEngine>) -> Self {
        Self {
            engine,
            ticker: Mutex::new(None),
        }
    }

    /// The wrapped engine, for observers.
    pub const fn engine(&self) -> &Arc<CrimeRunEngine> {
        &self.engine
    }

    /// Start a run and its ticker. Refusals are passed through unchanged
    /// and spawn nothing.
    pub fn begin_run(&self, crime: CrimeType) -> BeginOutcome {
        let mut slot = self.ticker.lock().unwrap_or_else(PoisonError::into_inner);
        let outcome = self.engine.begin_run(crime);
        let BeginOutcome::Started { run_id, .. } = outcome else {
            return outcome;
        };

        if let Some(previous) = slot.take() {
            previous.control.cancel();
        }

        let control = Arc::new(TickerControl::default());
        let interval_ms = self.engine.settings().tick_interval_ms.max(1);
        let handle = tokio::spawn(run_ticker(
            Arc::clone(&self.engine),
            run_id,
            interval_ms,
            Arc::clone(&control),
        ));
        *slot = Some(Ticker {
            run_id,
            control,
            handle,
        });
        outcome
    }

    /// Cancel the active run and stop its ticker. Returns `false` if
    /// nothing was running.
    pub fn cancel_run(&self) -> bool {
        let mut slot = self.ticker.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(ticker) = slot.take() {
            debug!(run_id = %ticker.run_id, "Stopping ticker");
            ticker.control.cancel();
        }
        self.engine.cancel_run()
    }

    /// Whether the current run's ticker task is still alive.
    pub fn is_ticking(&self) -> bool {
        self.ticker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|ticker| !ticker.handle.is_finished())
    }

    /// Wait until no run is active, then return the latest outcome.
    ///
    /// Returns `None` if the run was cancelled or the outcome was already
    /// taken.
    pub async fn wait_until_idle(&self) -> Option<OutcomeEvent> {
        let mut runs = self.engine.subscribe_run();
        // Only fails if the engine is dropped, which `self` prevents.
        let _ = runs.wait_for(Option::is_none).await;
        self.engine.last_outcome()
    }
}

impl Drop for RunService {
    fn drop(&mut self) {
        let slot = self.ticker.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(ticker) = slot.take() {
            ticker.control.cancel();
        }
    }
}

async fn run_ticker(
    engine: Arc<CrimeRunEngine>,
    run_id: RunId,
    interval_ms: u64,
    control: Arc<TickerControl>,
) {
    let mut interval = tokio::time::interval(Duration::from_millis(interval_ms));
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // The first tick completes immediately; the initial state is already
    // published by begin.
    interval.tick().await;

    debug!(run_id = %run_id, interval_ms, "Ticker started");
    loop {
        tokio::select! {
            _ = interval.tick() => {}
            () = control.wake.notified() => {}
        }

        if control.is_cancelled() {
            debug!(run_id = %run_id, "Ticker cancelled");
            break;
        }

        match engine.tick_run(run_id) {
            TickStatus::Idle | TickStatus::Resolved(_) => break,
            TickStatus::Unchanged | TickStatus::Published => {}
        }
    }
    debug!(run_id = %run_id, "Ticker stopped");
}
