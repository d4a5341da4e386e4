//! Command-line driver for the Underworld crime run engine.
//!
//! Runs a single crime to completion against an in-memory player and
//! reports the outcome.
//!
//! ```text
//! underworld-engine [CONFIG] [CRIME_KEY]
//! ```
//!
//! # Startup Sequence
//!
//! 1. Load configuration (defaults when the file is missing)
//! 2. Initialize structured logging (tracing)
//! 3. Read and merge content packages into the asset bank
//! 4. Build the engine and its ticker service
//! 5. Begin the requested run and log every published state
//! 6. Wait for the outcome (Ctrl-C cancels) and print the result

mod error;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;
use underworld_content::{load_bank, read_sources};
use underworld_core::clock::{Clock, RuntimeClock};
use underworld_core::config::EngineConfig;
use underworld_core::player::{InMemoryPlayer, PlayerState};
use underworld_core::rewards::RewardTable;
use underworld_core::{BeginOutcome, CrimeRunEngine, RunService, RunSettings};
use underworld_types::{CrimeRunState, CrimeType, OutcomeEvent};

use crate::error::EngineError;

/// Config file used when none is given.
const DEFAULT_CONFIG_PATH: &str = "underworld-config.yaml";

/// Crime run when none is given.
const DEFAULT_CRIME: &str = "PICKPOCKET";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if the config is invalid, the crime key is unknown, or
/// the run is refused.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let config_path = args
        .next()
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
    let crime_key = args.next().unwrap_or_else(|| DEFAULT_CRIME.to_owned());

    // 1. Load configuration.
    let (config, found) = load_config(&config_path)?;

    // 2. Initialize structured logging. RUST_LOG wins over the config.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_target(true)
        .init();

    info!("underworld-engine starting");
    if found {
        info!(path = %config_path.display(), "Configuration loaded");
    } else {
        info!(path = %config_path.display(), "Config file not found, using defaults");
    }
    info!(
        tick_interval_ms = config.run.tick_interval_ms,
        failure_lockout_ms = config.run.failure_lockout_ms,
        rng_seed = ?config.run.rng_seed,
        "Run settings"
    );

    let crime = CrimeType::from_key(&crime_key).ok_or_else(|| EngineError::UnknownCrime {
        key: crime_key.clone(),
    })?;

    // 3. Load content.
    let packages = config.content.resolved_packages();
    let sources = read_sources(&packages);
    let bank = Arc::new(load_bank(&sources));
    info!(
        packages = packages.len(),
        readable = sources.len(),
        crimes = bank.len(),
        "Content loaded"
    );

    // 4. Build the engine.
    let player = Arc::new(InMemoryPlayer::new());
    let engine = Arc::new(CrimeRunEngine::new(
        bank,
        RewardTable::standard(),
        RunSettings::from_config(&config),
        Arc::new(RuntimeClock::new()) as Arc<dyn Clock>,
        Arc::clone(&player) as Arc<dyn PlayerState>,
    ));
    let service = RunService::new(Arc::clone(&engine));

    // 5. Begin the run.
    let watcher = tokio::spawn(log_run_updates(engine.subscribe_run()));
    match service.begin_run(crime) {
        BeginOutcome::Started { run_id, fallback } => {
            info!(run_id = %run_id, crime = %crime, fallback, "Run begun");
        }
        BeginOutcome::AlreadyRunning { run_id } => {
            return Err(EngineError::Refused {
                reason: format!("run {run_id} is already active"),
            }
            .into());
        }
        BeginOutcome::LockedOut { until } => {
            return Err(EngineError::Refused {
                reason: format!("locked out until {until}"),
            }
            .into());
        }
    }

    // 6. Wait for the outcome.
    let outcome = tokio::select! {
        outcome = service.wait_until_idle() => outcome,
        signal = tokio::signal::ctrl_c() => {
            if let Err(err) = signal {
                warn!(error = %err, "Failed to listen for Ctrl-C");
            }
            info!("Interrupted, cancelling run");
            let _ = service.cancel_run();
            None
        }
    };
    watcher.abort();

    match outcome {
        Some(event) => report(&event, &player),
        None => println!("Run cancelled. No rewards or penalties applied."),
    }
    Ok(())
}

/// Load configuration from `path`, or defaults if the file is missing.
///
/// The flag reports whether the file was found.
fn load_config(path: &Path) -> Result<(EngineConfig, bool), EngineError> {
    if path.exists() {
        Ok((EngineConfig::from_file(path)?, true))
    } else {
        Ok((EngineConfig::default(), false))
    }
}

/// Log each published run state. New narration is logged at info, progress
/// ticks at debug.
async fn log_run_updates(mut runs: watch::Receiver<Option<CrimeRunState>>) {
    let mut last_message = String::new();
    while runs.changed().await.is_ok() {
        let Some(state) = runs.borrow_and_update().clone() else {
            continue;
        };
        if state.message == last_message {
            debug!(
                phase = ?state.phase,
                progress_permille = state.progress_permille,
                "Run progress"
            );
        } else {
            info!(
                crime = %state.name,
                phase = ?state.phase,
                progress_permille = state.progress_permille,
                mood = ?state.mood,
                "{}",
                state.message
            );
            last_message.clone_from(&state.message);
        }
    }
}

fn report(event: &OutcomeEvent, player: &InMemoryPlayer) {
    info!(
        run_id = %event.run_id,
        outcome = ?event.outcome,
        money_gained = event.money_gained,
        jail_days = event.jail_days,
        notoriety_delta = event.notoriety_delta,
        "Run resolved"
    );
    if !event.final_line.is_empty() {
        println!("{}", event.final_line);
    }
    println!("Outcome:   {:?}", event.outcome);
    println!("Money:     {:+}", event.money_gained);
    println!("Jail:      {} days", event.jail_days);
    println!("Notoriety: {:+}", event.notoriety_delta);
    println!(
        "Player:    balance {} / notoriety {} / jail {} days",
        player.balance(),
        player.notoriety().unwrap_or_default(),
        player.jail_days()
    );
}
