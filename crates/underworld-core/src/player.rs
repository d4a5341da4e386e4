//! Player-state collaborator interface.
//!
//! The engine does not own the player's money, notoriety, or sentence. It
//! only requests deltas through [`PlayerState`], and treats every call as
//! best-effort: a failure is logged and the run still resolves.

use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};

/// Errors reported by a player-state backend.
#[derive(Debug, thiserror::Error)]
pub enum PlayerStateError {
    /// The backing store rejected or failed the write.
    #[error("player store write failed: {message}")]
    Write {
        /// Description of the failure.
        message: String,
    },

    /// The backing store could not be read.
    #[error("player store read failed: {message}")]
    Read {
        /// Description of the failure.
        message: String,
    },
}

/// Persistent player fields the engine adjusts.
pub trait PlayerState: Send + Sync {
    /// Add `amount` to the player's balance.
    fn add_money(&self, amount: i64) -> Result<(), PlayerStateError>;

    /// Add `delta` (possibly negative) to the player's notoriety.
    fn add_notoriety(&self, delta: i64) -> Result<(), PlayerStateError>;

    /// Add `days` to the player's jail sentence.
    fn add_jail_days(&self, days: u32) -> Result<(), PlayerStateError>;

    /// Current notoriety, read once when a run begins.
    fn notoriety(&self) -> Result<i64, PlayerStateError>;
}

/// A lock-free in-process player record.
///
/// Used by the engine binary and tests. [`set_failing`](Self::set_failing)
/// makes every call fail, for exercising the best-effort policy.
#[derive(Debug, Default)]
pub struct InMemoryPlayer {
    balance: AtomicI64,
    notoriety: AtomicI64,
    jail_days: AtomicU64,
    failing: AtomicBool,
}

impl InMemoryPlayer {
    /// Create a player with zeroed fields.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a player with a starting balance and notoriety.
    pub fn with_values(balance: i64, notoriety: i64) -> Self {
        Self {
            balance: AtomicI64::new(balance),
            notoriety: AtomicI64::new(notoriety),
            ..Self::default()
        }
    }

    /// Current balance.
    pub fn balance(&self) -> i64 {
        self.balance.load(Ordering::Acquire)
    }

    /// Total days of jail time accrued.
    pub fn jail_days(&self) -> u64 {
        self.jail_days.load(Ordering::Acquire)
    }

    /// Make every subsequent call fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::Release);
    }

    fn check_writable(&self) -> Result<(), PlayerStateError> {
        if self.failing.load(Ordering::Acquire) {
            return Err(PlayerStateError::Write {
                message: "store unavailable".to_owned(),
            });
        }
        Ok(())
    }
}

fn saturating_add_i64(cell: &AtomicI64, delta: i64) {
    // fetch_update never fails when the closure always returns Some.
    let _ = cell.fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
        Some(current.saturating_add(delta))
    });
}

impl PlayerState for InMemoryPlayer {
    fn add_money(&self, amount: i64) -> Result<(), PlayerStateError> {
        self.check_writable()?;
        saturating_add_i64(&self.balance, amount);
        Ok(())
    }

    fn add_notoriety(&self, delta: i64) -> Result<(), PlayerStateError> {
        self.check_writable()?;
        saturating_add_i64(&self.notoriety, delta);
        Ok(())
    }

    fn add_jail_days(&self, days: u32) -> Result<(), PlayerStateError> {
        self.check_writable()?;
        let _ = self
            .jail_days
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                Some(current.saturating_add(u64::from(days)))
            });
        Ok(())
    }

    fn notoriety(&self) -> Result<i64, PlayerStateError> {
        if self.failing.load(Ordering::Acquire) {
            return Err(PlayerStateError::Read {
                message: "store unavailable".to_owned(),
            });
        }
        Ok(self.notoriety.load(Ordering::Acquire))
    }
}
