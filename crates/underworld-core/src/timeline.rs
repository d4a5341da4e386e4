//! Phase boundaries of a single run.
//!
//! A run of `duration_ms` is split at fixed fractions: setup until
//! `setup_end_pct`, execution until `execution_end_pct`, climax until the
//! end. Boundaries are computed once when the run begins; every tick maps
//! the clamped elapsed time onto exactly one phase.

use chrono::{DateTime, Utc};
use underworld_types::Phase;

use crate::clock::{elapsed_ms, offset};
use crate::config::PhaseTiming;

/// Permille value of a finished run.
pub const PROGRESS_COMPLETE: u32 = 1_000;

/// Fixed timing of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunTimeline {
    started_at: DateTime<Utc>,
    duration_ms: u64,
    setup_end_ms: u64,
    execution_end_ms: u64,
}

impl RunTimeline {
    /// Lay out a run starting at `started_at`. A zero duration is raised to
    /// one millisecond.
    pub fn new(started_at: DateTime<Utc>, duration_ms: u64, timing: PhaseTiming) -> Self {
        let duration_ms = duration_ms.max(1);
        Self {
            started_at,
            duration_ms,
            setup_end_ms: scale(duration_ms, timing.setup_end_pct),
            execution_end_ms: scale(duration_ms, timing.execution_end_pct),
        }
    }

    /// When the run began.
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Total run length.
    pub const fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    /// When the run resolves.
    pub fn ends_at(&self) -> DateTime<Utc> {
        offset(self.started_at, self.duration_ms)
    }

    /// Whether `now` is at or past the end.
    pub fn is_complete(&self, now: DateTime<Utc>) -> bool {
        now >= self.ends_at()
    }

    /// Elapsed time at `now`, clamped to `[0, duration_ms]`.
    pub fn elapsed_ms(&self, now: DateTime<Utc>) -> u64 {
        elapsed_ms(self.started_at, now).min(self.duration_ms)
    }

    /// The phase covering `elapsed` milliseconds into the run.
    pub const fn phase_at(&self, elapsed: u64) -> Phase {
        if elapsed < self.setup_end_ms {
            Phase::Setup
        } else if elapsed < self.execution_end_ms {
            Phase::Execution
        } else {
            Phase::Climax
        }
    }

    /// Start and end of `phase`, in milliseconds from the run start.
    pub const fn phase_bounds_ms(&self, phase: Phase) -> (u64, u64) {
        match phase {
            Phase::Setup => (0, self.setup_end_ms),
            Phase::Execution => (self.setup_end_ms, self.execution_end_ms),
            Phase::Climax => (self.execution_end_ms, self.duration_ms),
        }
    }

    /// Start and end of `phase` as timestamps.
    pub fn phase_window(&self, phase: Phase) -> (DateTime<Utc>, DateTime<Utc>) {
        let (start, end) = self.phase_bounds_ms(phase);
        (offset(self.started_at, start), offset(self.started_at, end))
    }

    /// Overall progress at `elapsed`, in per-mille.
    pub fn progress_permille(&self, elapsed: u64) -> u32 {
        let elapsed = u128::from(elapsed.min(self.duration_ms));
        let permille = elapsed
            .saturating_mul(u128::from(PROGRESS_COMPLETE))
            .checked_div(u128::from(self.duration_ms))
            .unwrap_or(0);
        u32::try_from(permille).unwrap_or(PROGRESS_COMPLETE)
    }
}

/// `pct` percent of `value`, rounded up, so a boundary never lands before
/// the exact fraction.
fn scale(value: u64, pct: u32) -> u64 {
    let scaled = u128::from(value)
        .saturating_mul(u128::from(pct))
        .div_ceil(100);
    u64::try_from(scaled).unwrap_or(value)
}
