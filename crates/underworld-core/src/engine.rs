//! The crime run state machine.
//!
//! [`CrimeRunEngine`] owns the single active run, if any. It moves through
//! two states:
//!
//! - **Idle** -- no run. [`begin_run`](CrimeRunEngine::begin_run) may start one
//!   unless a lockout window is open.
//! - **Running** -- one run in progress. Each [`tick`](CrimeRunEngine::tick)
//!   recomputes phase, progress, and visible narration from the injected
//!   clock and publishes a new [`CrimeRunState`] when something visible
//!   changed. The tick at or after the end time resolves the run.
//!
//! Resolution draws an outcome and rolls rewards, then publishes an
//! [`OutcomeEvent`] and arms or clears the lockout window. Rewards are
//! applied to the player last (best-effort), after the run lock is released.
//!
//! # Concurrency
//!
//! The active run lives behind one mutex; begin, tick, and cancel all take
//! it, so at most one run exists at any time. Observers read the latest
//! published values through `tokio::sync::watch` channels and never touch
//! the lock.
//!
//! The engine itself is synchronous. [`RunService`](crate::runner::RunService)
//! drives ticks from a background task.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use rand::seq::IndexedRandom;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use underworld_content::{AssetBank, NarrativePath};
use underworld_types::{
    CrimeRunState, CrimeType, OutcomeCategory, OutcomeEvent, Phase, RiskTier, RunId,
};

use crate::clock::{Clock, elapsed_ms, offset};
use crate::config::{DurationConfig, EngineConfig, PhaseTiming};
use crate::player::PlayerState;
use crate::resolver::{RewardRoll, pick_outcome, roll_rewards};
use crate::rewards::RewardTable;
use crate::timeline::RunTimeline;

/// Setup line shown when a crime has no loaded content.
pub const FALLBACK_SETUP_LINE: &str = "You size up the target and wait for an opening.";

/// Execution line shown when a crime has no loaded content.
pub const FALLBACK_EXECUTION_LINE: &str = "You make your move.";

/// Closing line of every fallback run.
pub const FALLBACK_FINAL_LINE: &str = "Something feels off. You abandon the job and slip away.";

/// Number of mood lines drawn for each run.
const MOOD_LINES_PER_RUN: usize = 2;

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// The slice of [`EngineConfig`] the state machine needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSettings {
    /// Milliseconds between ticks (used by the ticker service).
    pub tick_interval_ms: u64,
    /// Lockout armed after a failed run.
    pub failure_lockout_ms: u64,
    /// Phase split.
    pub timing: PhaseTiming,
    /// Default run length per tier.
    pub durations: DurationConfig,
    /// Seed for reproducible draws.
    pub rng_seed: Option<u64>,
}

impl RunSettings {
    /// Extract run settings from a full config.
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            tick_interval_ms: config.run.tick_interval_ms,
            failure_lockout_ms: config.run.failure_lockout_ms,
            timing: config.run.phase_timing(),
            durations: config.durations.clone(),
            rng_seed: config.run.rng_seed,
        }
    }
}

impl Default for RunSettings {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// What a call to [`CrimeRunEngine::begin_run`] did.
///
/// Refusals are not errors; callers that only care about the happy path may
/// ignore the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeginOutcome {
    /// A new run is active.
    Started {
        /// The new run.
        run_id: RunId,
        /// Whether generic content is standing in for missing content.
        fallback: bool,
    },
    /// Another run is already active; nothing changed.
    AlreadyRunning {
        /// The run that is still active.
        run_id: RunId,
    },
    /// A failure lockout is still open; nothing changed.
    LockedOut {
        /// When the lockout ends.
        until: DateTime<Utc>,
    },
}

impl BeginOutcome {
    /// The started run's id, if a run was started.
    pub const fn started(&self) -> Option<RunId> {
        match self {
            Self::Started { run_id, .. } => Some(*run_id),
            Self::AlreadyRunning { .. } | Self::LockedOut { .. } => None,
        }
    }
}

/// What a single tick did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickStatus {
    /// No matching run is active.
    Idle,
    /// The run is active but nothing visible changed.
    Unchanged,
    /// A new [`CrimeRunState`] was published.
    Published,
    /// The run reached its end and resolved.
    Resolved(OutcomeEvent),
}

// ---------------------------------------------------------------------------
// Active run
// ---------------------------------------------------------------------------

/// Narrative source for a run.
#[derive(Debug, Clone)]
enum Script {
    /// A path picked from loaded content.
    Narrative(NarrativePath),
    /// Generic lines for a crime with no content. Always fails.
    Fallback,
}

impl Script {
    /// Lines shown during `phase`. The climax reuses execution text (or
    /// setup text if there is none); the real climax is kept for the
    /// outcome event.
    fn phase_lines(&self, phase: Phase) -> Vec<String> {
        match self {
            Self::Narrative(path) => match phase {
                Phase::Setup => path.setup.clone(),
                Phase::Execution => path.execution.clone(),
                Phase::Climax if path.execution.is_empty() => path.setup.clone(),
                Phase::Climax => path.execution.clone(),
            },
            Self::Fallback => match phase {
                Phase::Setup => vec![FALLBACK_SETUP_LINE.to_owned()],
                Phase::Execution | Phase::Climax => vec![FALLBACK_EXECUTION_LINE.to_owned()],
            },
        }
    }

    const fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback)
    }
}

#[derive(Debug)]
struct ActiveRun {
    run_id: RunId,
    crime: CrimeType,
    name: String,
    script: Script,
    timeline: RunTimeline,
    mood: Vec<String>,
    notoriety: i64,
    last_published: Option<CrimeRunState>,
}

impl ActiveRun {
    fn snapshot(&self, now: DateTime<Utc>) -> CrimeRunState {
        let elapsed = self.timeline.elapsed_ms(now);
        let phase = self.timeline.phase_at(elapsed);
        let (phase_start, phase_end) = self.timeline.phase_window(phase);
        let (phase_start_ms, phase_end_ms) = self.timeline.phase_bounds_ms(phase);

        let lines = reveal_lines(
            self.script.phase_lines(phase),
            elapsed.saturating_sub(phase_start_ms),
            phase_end_ms.saturating_sub(phase_start_ms),
        );
        let message = lines.last().cloned().unwrap_or_default();

        CrimeRunState {
            run_id: self.run_id,
            crime: self.crime,
            name: self.name.clone(),
            tier: self.crime.risk_tier(),
            started_at: self.timeline.started_at(),
            duration_ms: self.timeline.duration_ms(),
            phase,
            phase_start,
            phase_end,
            progress_permille: self.timeline.progress_permille(elapsed),
            lines,
            mood: self.mood.clone(),
            message,
            notoriety: self.notoriety,
            fallback: self.script.is_fallback(),
        }
    }
}

/// Keep the lines revealed `into_phase` milliseconds into a phase of
/// `phase_len` milliseconds: one line at the start, then evenly spaced.
fn reveal_lines(mut lines: Vec<String>, into_phase: u64, phase_len: u64) -> Vec<String> {
    let total = lines.len();
    if total == 0 {
        return lines;
    }
    let total_u128 = u128::try_from(total).unwrap_or(u128::MAX);
    let revealed = u128::from(into_phase)
        .saturating_mul(total_u128)
        .checked_div(u128::from(phase_len))
        .unwrap_or(total_u128);
    let visible = usize::try_from(revealed)
        .unwrap_or(total)
        .saturating_add(1)
        .min(total);
    lines.truncate(visible);
    lines
}

/// Whether `next` differs from `previous` in a way observers can see.
fn is_visible_change(previous: &CrimeRunState, next: &CrimeRunState) -> bool {
    previous.phase != next.phase
        || previous.progress_permille != next.progress_permille
        || previous.message != next.message
}

fn mood_pool(tier: RiskTier) -> &'static [&'static str] {
    match tier {
        RiskTier::Low => &[
            "Keep it casual.",
            "Nobody here is paying attention.",
            "Just another face in the crowd.",
            "Hands steady. Eyes forward.",
        ],
        RiskTier::Medium => &[
            "A dog barks somewhere down the block.",
            "Every footstep sounds too loud.",
            "Headlights sweep past and keep going.",
            "You count the seconds under your breath.",
        ],
        RiskTier::High => &[
            "Your pulse is hammering in your ears.",
            "Somewhere, a radio crackles.",
            "There is no talking your way out of this one.",
            "Sweat runs cold down your back.",
        ],
        RiskTier::Extreme => &[
            "Months of planning come down to minutes.",
            "The crew is silent. Everyone knows their part.",
            "One mistake and it is over.",
            "The city hums, unaware of what is happening.",
        ],
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Owns and advances the single active crime run.
pub struct CrimeRunEngine {
    bank: Arc<AssetBank>,
    rewards: RewardTable,
    settings: RunSettings,
    clock: Arc<dyn Clock>,
    player: Arc<dyn PlayerState>,
    rng: Mutex<SmallRng>,
    active: Mutex<Option<ActiveRun>>,
    run_tx: watch::Sender<Option<CrimeRunState>>,
    outcome_tx: watch::Sender<Option<OutcomeEvent>>,
    lockout_tx: watch::Sender<Option<DateTime<Utc>>>,
}

impl core::fmt::Debug for CrimeRunEngine {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CrimeRunEngine")
            .field("crimes_loaded", &self.bank.len())
            .field("settings", &self.settings)
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}

impl CrimeRunEngine {
    /// Create an idle engine.
    pub fn new(
        bank: Arc<AssetBank>,
        rewards: RewardTable,
        settings: RunSettings,
        clock: Arc<dyn Clock>,
        player: Arc<dyn PlayerState>,
    ) -> Self {
        let rng = settings
            .rng_seed
            .map_or_else(SmallRng::from_os_rng, SmallRng::seed_from_u64);
        let (run_tx, _) = watch::channel(None);
        let (outcome_tx, _) = watch::channel(None);
        let (lockout_tx, _) = watch::channel(None);
        Self {
            bank,
            rewards,
            settings,
            clock,
            player,
            rng: Mutex::new(rng),
            active: Mutex::new(None),
            run_tx,
            outcome_tx,
            lockout_tx,
        }
    }

    // -----------------------------------------------------------------------
    // Commands
    // -----------------------------------------------------------------------

    /// Start a run for `crime`.
    ///
    /// Does nothing while another run is active or a lockout is open. When
    /// the bank has no content for `crime` a fallback run starts instead,
    /// which always resolves as a failure.
    pub fn begin_run(&self, crime: CrimeType) -> BeginOutcome {
        let now = self.clock.now();
        let mut active = lock(&self.active);

        if let Some(run) = active.as_ref() {
            debug!(crime = %crime, active_run = %run.run_id, "Run already active, ignoring begin");
            return BeginOutcome::AlreadyRunning { run_id: run.run_id };
        }
        if let Some(until) = self.locked_until().filter(|until| now < *until) {
            debug!(crime = %crime, until = %until, "Lockout open, ignoring begin");
            return BeginOutcome::LockedOut { until };
        }

        let tier = crime.risk_tier();
        let mut rng = lock(&self.rng);

        let asset = self.bank.get(crime);
        let path = asset.and_then(|asset| asset.pick_path(&mut *rng));
        let script = path.map_or(Script::Fallback, |path| Script::Narrative(path.clone()));
        if script.is_fallback() {
            warn!(crime = %crime, "No content for crime, starting fallback run");
        }
        let name = asset
            .and_then(|asset| asset.name())
            .unwrap_or_else(|| crime.display_name())
            .to_owned();
        let duration_ms = asset
            .and_then(|asset| asset.duration_ms())
            .unwrap_or_else(|| self.settings.durations.for_tier(tier));

        let mood = mood_pool(tier)
            .choose_multiple(&mut *rng, MOOD_LINES_PER_RUN)
            .map(|line| (*line).to_owned())
            .collect();
        drop(rng);

        let notoriety = self.player.notoriety().unwrap_or_else(|err| {
            warn!(error = %err, "Could not read notoriety, showing 0");
            0
        });

        let timeline = RunTimeline::new(now, duration_ms, self.settings.timing);
        let mut run = ActiveRun {
            run_id: RunId::new(),
            crime,
            name,
            script,
            timeline,
            mood,
            notoriety,
            last_published: None,
        };

        let state = run.snapshot(now);
        run.last_published = Some(state.clone());
        self.lockout_tx.send_replace(Some(timeline.ends_at()));
        self.run_tx.send_replace(Some(state));

        let run_id = run.run_id;
        let fallback = run.script.is_fallback();
        info!(
            run_id = %run_id,
            crime = %crime,
            tier = ?tier,
            duration_ms = timeline.duration_ms(),
            fallback,
            "Crime run started"
        );
        *active = Some(run);

        BeginOutcome::Started { run_id, fallback }
    }

    /// Advance whatever run is active.
    pub fn tick(&self) -> TickStatus {
        self.advance(None)
    }

    /// Advance the run only if it is still `run_id`.
    ///
    /// A ticker bound to a cancelled run gets [`TickStatus::Idle`] even if
    /// a newer run has started since.
    pub fn tick_run(&self, run_id: RunId) -> TickStatus {
        self.advance(Some(run_id))
    }

    /// Abort the active run.
    ///
    /// No outcome is produced and no rewards or penalties are applied. The
    /// lockout window is cleared, so a new run may begin immediately.
    /// Returns `false` if nothing was running.
    pub fn cancel_run(&self) -> bool {
        let mut active = lock(&self.active);
        let Some(run) = active.take() else {
            debug!("Cancel requested with no active run");
            return false;
        };
        self.lockout_tx.send_replace(None);
        self.run_tx.send_replace(None);
        info!(run_id = %run.run_id, crime = %run.crime, "Crime run cancelled");
        true
    }

    fn advance(&self, expected: Option<RunId>) -> TickStatus {
        let now = self.clock.now();
        let mut active = lock(&self.active);

        let Some(run) = active.as_mut() else {
            return TickStatus::Idle;
        };
        if expected.is_some_and(|id| id != run.run_id) {
            return TickStatus::Idle;
        }

        if run.timeline.is_complete(now) {
            let Some(run) = active.take() else {
                return TickStatus::Idle;
            };
            let (event, roll) = self.resolve(&run, now);
            // Player writes happen outside the run lock.
            drop(active);
            self.apply_effects(run.run_id, &roll);
            return TickStatus::Resolved(event);
        }

        let state = run.snapshot(now);
        let changed = run
            .last_published
            .as_ref()
            .is_none_or(|previous| is_visible_change(previous, &state));
        if !changed {
            return TickStatus::Unchanged;
        }

        if run
            .last_published
            .as_ref()
            .is_some_and(|previous| previous.phase != state.phase)
        {
            debug!(run_id = %run.run_id, phase = ?state.phase, "Phase changed");
        }
        run.last_published = Some(state.clone());
        self.run_tx.send_replace(Some(state));
        TickStatus::Published
    }

    /// Roll the outcome and publish it. The returned roll still has to be
    /// applied to the player.
    fn resolve(&self, run: &ActiveRun, now: DateTime<Utc>) -> (OutcomeEvent, RewardRoll) {
        let entry = self.rewards.entry(run.crime);
        let mut rng = lock(&self.rng);

        let (roll, final_line) = match &run.script {
            Script::Narrative(path) => {
                let outcome = pick_outcome(&path.outcomes, &mut *rng);
                let line = path.final_line(outcome).unwrap_or_default().to_owned();
                (roll_rewards(outcome, &entry, &mut *rng), line)
            }
            Script::Fallback => (
                roll_rewards(OutcomeCategory::Fail, &entry, &mut *rng),
                FALLBACK_FINAL_LINE.to_owned(),
            ),
        };
        drop(rng);

        let event = OutcomeEvent {
            run_id: run.run_id,
            crime: run.crime,
            outcome: roll.outcome,
            success: roll.success,
            was_caught: roll.was_caught,
            money_gained: roll.money_gained,
            jail_days: roll.jail_days,
            notoriety_delta: roll.notoriety_delta,
            final_line,
            resolved_at: now,
        };

        let lockout = if roll.success {
            None
        } else {
            Some(offset(now, self.settings.failure_lockout_ms))
        };
        self.lockout_tx.send_replace(lockout);
        self.outcome_tx.send_replace(Some(event.clone()));
        self.run_tx.send_replace(None);

        info!(
            run_id = %run.run_id,
            crime = %run.crime,
            outcome = ?roll.outcome,
            money_gained = roll.money_gained,
            jail_days = roll.jail_days,
            notoriety_delta = roll.notoriety_delta,
            "Crime run resolved"
        );
        (event, roll)
    }

    /// Push the roll to the player store. Each write is independent; a
    /// failure is logged and the rest still run.
    fn apply_effects(&self, run_id: RunId, roll: &RewardRoll) {
        if roll.money_gained > 0
            && let Err(err) = self.player.add_money(roll.money_gained)
        {
            warn!(run_id = %run_id, error = %err, "Failed to apply money");
        }
        if roll.notoriety_delta != 0
            && let Err(err) = self.player.add_notoriety(roll.notoriety_delta)
        {
            warn!(run_id = %run_id, error = %err, "Failed to apply notoriety");
        }
        if roll.jail_days > 0
            && let Err(err) = self.player.add_jail_days(roll.jail_days)
        {
            warn!(run_id = %run_id, error = %err, "Failed to apply jail time");
        }
    }

    // -----------------------------------------------------------------------
    // Observers
    // -----------------------------------------------------------------------

    /// Whether a run is active.
    pub fn is_running(&self) -> bool {
        self.run_tx.borrow().is_some()
    }

    /// The latest published state of the active run.
    pub fn current_run(&self) -> Option<CrimeRunState> {
        self.run_tx.borrow().clone()
    }

    /// Subscribe to run state updates. `None` means idle.
    pub fn subscribe_run(&self) -> watch::Receiver<Option<CrimeRunState>> {
        self.run_tx.subscribe()
    }

    /// The most recent unconsumed outcome.
    pub fn last_outcome(&self) -> Option<OutcomeEvent> {
        self.outcome_tx.borrow().clone()
    }

    /// Consume the most recent outcome, clearing the slot.
    pub fn take_outcome(&self) -> Option<OutcomeEvent> {
        self.outcome_tx.send_replace(None)
    }

    /// Subscribe to the outcome slot.
    pub fn subscribe_outcome(&self) -> watch::Receiver<Option<OutcomeEvent>> {
        self.outcome_tx.subscribe()
    }

    /// The lockout timestamp, if one is set. May be in the past.
    pub fn locked_until(&self) -> Option<DateTime<Utc>> {
        *self.lockout_tx.borrow()
    }

    /// Subscribe to lockout changes.
    pub fn subscribe_lockout(&self) -> watch::Receiver<Option<DateTime<Utc>>> {
        self.lockout_tx.subscribe()
    }

    /// Whether a new run would be refused right now.
    pub fn is_locked_out(&self) -> bool {
        let now = self.clock.now();
        self.locked_until().is_some_and(|until| now < until)
    }

    /// Milliseconds until the lockout ends, zero if none is open.
    pub fn lockout_remaining_ms(&self) -> u64 {
        let now = self.clock.now();
        self.locked_until()
            .map_or(0, |until| elapsed_ms(now, until))
    }

    /// Run settings in effect.
    pub const fn settings(&self) -> &RunSettings {
        &self.settings
    }

    /// The loaded content.
    pub fn bank(&self) -> &AssetBank {
        &self.bank
    }

    /// The reward constants.
    pub const fn rewards(&self) -> &RewardTable {
        &self.rewards
    }
}
