//! Wall-clock abstraction for the run engine.
//!
//! The engine never calls [`Utc::now`] directly. Every timestamp comes from
//! an injected [`Clock`], so tests drive runs with a [`ManualClock`] and
//! never depend on real elapsed time.
//!
//! # Design Principles
//!
//! - Timestamp arithmetic saturates instead of panicking on overflow.
//! - Elapsed time is never negative; a clock that moves backwards reads as
//!   zero elapsed.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, TimeDelta, Utc};

/// A source of the current time.
pub trait Clock: Send + Sync {
    /// Return the current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// The real system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
///
/// Stores milliseconds since the Unix epoch in an atomic so it can be shared
/// between a test and the engine without locking.
#[derive(Debug)]
pub struct ManualClock {
    millis: AtomicI64,
}

impl ManualClock {
    /// Create a clock frozen at `start`.
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            millis: AtomicI64::new(start.timestamp_millis()),
        }
    }

    /// Create a clock frozen at the given Unix time in milliseconds.
    pub const fn from_millis(millis: i64) -> Self {
        Self {
            millis: AtomicI64::new(millis),
        }
    }

    /// Move the clock forward by `ms` milliseconds.
    pub fn advance(&self, ms: u64) {
        let delta = i64::try_from(ms).unwrap_or(i64::MAX);
        // fetch_update never fails when the closure always returns Some.
        let _ = self
            .millis
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                Some(current.saturating_add(delta))
            });
    }

    /// Jump the clock to `at`.
    pub fn set(&self, at: DateTime<Utc>) {
        self.millis.store(at.timestamp_millis(), Ordering::Release);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::from_millis(0)
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.millis.load(Ordering::Acquire)).unwrap_or_default()
    }
}

/// Wall time measured on the tokio clock.
///
/// Captures a wall-clock anchor once, then adds the monotonic time elapsed
/// on [`tokio::time::Instant`]. Runs are immune to wall-clock jumps, and
/// under a paused test runtime the clock follows tokio's virtual time.
#[derive(Debug, Clone, Copy)]
pub struct RuntimeClock {
    anchor_wall: DateTime<Utc>,
    anchor: tokio::time::Instant,
}

impl RuntimeClock {
    /// Anchor a new clock at the current instant.
    pub fn new() -> Self {
        Self {
            anchor_wall: Utc::now(),
            anchor: tokio::time::Instant::now(),
        }
    }
}

impl Default for RuntimeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for RuntimeClock {
    fn now(&self) -> DateTime<Utc> {
        let elapsed = tokio::time::Instant::now().saturating_duration_since(self.anchor);
        let ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        offset(self.anchor_wall, ms)
    }
}

/// `at` shifted forward by `ms` milliseconds, saturating at `at` on overflow.
pub fn offset(at: DateTime<Utc>, ms: u64) -> DateTime<Utc> {
    let delta = TimeDelta::try_milliseconds(i64::try_from(ms).unwrap_or(i64::MAX))
        .unwrap_or(TimeDelta::MAX);
    at.checked_add_signed(delta).unwrap_or(at)
}

/// Milliseconds from `since` to `now`, or zero if `now` is earlier.
pub fn elapsed_ms(since: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    u64::try_from(now.signed_duration_since(since).num_milliseconds()).unwrap_or(0)
}
