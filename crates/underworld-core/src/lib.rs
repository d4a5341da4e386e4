//! Run state machine, outcome resolution, and rewards for the Underworld
//! crime run engine.
//!
//! A run is a timed, three-phase narrative for one crime. This crate owns
//! its lifecycle: start, phase progression, resolution, cancellation, and
//! the failure lockout that follows a bad outcome.
//!
//! # Modules
//!
//! - [`clock`] -- Injected wall clock ([`Clock`]) with system, runtime, and
//!   manual implementations.
//! - [`config`] -- Configuration loading from `underworld-config.yaml` into
//!   strongly-typed structs.
//! - [`engine`] -- [`CrimeRunEngine`], the synchronous run state machine.
//! - [`player`] -- [`PlayerState`] collaborator trait and [`InMemoryPlayer`].
//! - [`resolver`] -- Weighted outcome draws and reward rolls.
//! - [`rewards`] -- [`RewardTable`] of per-crime payout and penalty ranges.
//! - [`runner`] -- [`RunService`], which ticks runs on the tokio runtime.
//! - [`timeline`] -- Phase boundaries and progress for one run.
//!
//! [`Clock`]: clock::Clock
//! [`CrimeRunEngine`]: engine::CrimeRunEngine
//! [`PlayerState`]: player::PlayerState
//! [`InMemoryPlayer`]: player::InMemoryPlayer
//! [`RewardTable`]: rewards::RewardTable
//! [`RunService`]: runner::RunService

pub mod clock;
pub mod config;
pub mod engine;
pub mod player;
pub mod resolver;
pub mod rewards;
pub mod runner;
pub mod timeline;

pub use engine::{BeginOutcome, CrimeRunEngine, RunSettings, TickStatus};
pub use runner::RunService;
