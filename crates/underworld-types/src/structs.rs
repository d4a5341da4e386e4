//! Observable run state and terminal outcome records.
//!
//! Both structs are produced exclusively by the run engine and handed to
//! observers as immutable snapshots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{CrimeType, OutcomeCategory, Phase, RiskTier};
use crate::ids::RunId;

// ---------------------------------------------------------------------------
// CrimeRunState
// ---------------------------------------------------------------------------

/// Snapshot of the single in-progress run.
///
/// A fresh value is published whenever the phase, progress, or displayed
/// message changes. Observers never mutate it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct CrimeRunState {
    /// Identifier of this run.
    pub run_id: RunId,
    /// The crime being attempted.
    pub crime: CrimeType,
    /// Display name, from content when available.
    pub name: String,
    /// Risk tier of the crime.
    pub tier: RiskTier,
    /// When the run began.
    pub started_at: DateTime<Utc>,
    /// Total run length in milliseconds.
    pub duration_ms: u64,
    /// Current phase.
    pub phase: Phase,
    /// When the current phase began.
    pub phase_start: DateTime<Utc>,
    /// When the current phase ends.
    pub phase_end: DateTime<Utc>,
    /// Overall progress in per-mille (0..=1000).
    pub progress_permille: u32,
    /// Narrative lines revealed so far in the current phase.
    pub lines: Vec<String>,
    /// Ambient mood lines for the whole run.
    pub mood: Vec<String>,
    /// The line currently on display.
    pub message: String,
    /// The player's notoriety when the run began.
    pub notoriety: i64,
    /// Whether the run is using generic content because none was loaded.
    pub fallback: bool,
}

// ---------------------------------------------------------------------------
// OutcomeEvent
// ---------------------------------------------------------------------------

/// Terminal result of a completed run. Produced exactly once per run that
/// reaches its end time; cancelled runs never produce one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct OutcomeEvent {
    /// Identifier of the run that resolved.
    pub run_id: RunId,
    /// The crime that was attempted.
    pub crime: CrimeType,
    /// The drawn outcome category.
    pub outcome: OutcomeCategory,
    /// Whether the run counts as a win.
    pub success: bool,
    /// Whether the player was arrested.
    pub was_caught: bool,
    /// Money added to the player's balance.
    pub money_gained: i64,
    /// Days added to the player's sentence.
    pub jail_days: u32,
    /// Change applied to the player's notoriety.
    pub notoriety_delta: i64,
    /// Closing narrative line, empty when content has none.
    pub final_line: String,
    /// When the run resolved.
    pub resolved_at: DateTime<Utc>,
}
