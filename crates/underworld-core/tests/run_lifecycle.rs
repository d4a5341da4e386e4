//! End-to-end run lifecycle tests.
//!
//! Every run here is driven by a [`ManualClock`], so no test depends on
//! real elapsed time. The shipped content packages under `content/` are
//! loaded to make sure they stay valid.

#![allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]

use std::path::PathBuf;
use std::sync::Arc;

use underworld_content::{AssetBank, ContentSource, load_bank, read_sources};
use underworld_core::clock::{Clock, ManualClock};
use underworld_core::config::EngineConfig;
use underworld_core::player::{InMemoryPlayer, PlayerState};
use underworld_core::rewards::RewardTable;
use underworld_core::{BeginOutcome, CrimeRunEngine, RunSettings, TickStatus};
use underworld_types::{CrimeType, OutcomeCategory, OutcomeEvent, Phase};

const STREET: &str = r#"{"crimes": [
    {
        "type": "pickpocket",
        "durationSeconds": 20,
        "paths": [{
            "setup": ["crowd"],
            "execution": ["lift"],
            "climax": ["gone"],
            "outcomes": [{"outcome": "SUCCESS", "weight": 100}]
        }]
    },
    {
        "type": "CAR_THEFT",
        "paths": [{
            "setup": ["sedan"],
            "execution": ["keys"],
            "climax": {"success": "away", "caught": "boxed in"},
            "outcomes": [{"outcome": "CAUGHT", "weight": 5}, {"outcome": "SUCCESS", "weight": 0}]
        }]
    }
]}"#;

// =============================================================================
// Helpers
// =============================================================================

struct World {
    engine: CrimeRunEngine,
    clock: Arc<ManualClock>,
    player: Arc<InMemoryPlayer>,
}

fn world_with(bank: AssetBank, seed: u64) -> World {
    let clock = Arc::new(ManualClock::from_millis(1_700_000_000_000));
    let player = Arc::new(InMemoryPlayer::with_values(500, 20));
    let settings = RunSettings {
        rng_seed: Some(seed),
        ..RunSettings::default()
    };
    let engine = CrimeRunEngine::new(
        Arc::new(bank),
        RewardTable::standard(),
        settings,
        Arc::clone(&clock) as Arc<dyn Clock>,
        Arc::clone(&player) as Arc<dyn PlayerState>,
    );
    World {
        engine,
        clock,
        player,
    }
}

fn world(seed: u64) -> World {
    world_with(load_bank(&[ContentSource::new("street", STREET)]), seed)
}

/// Tick every 100 ms until the run resolves, counting outcomes published.
fn drive(world: &World) -> (OutcomeEvent, usize) {
    let mut outcomes = world.engine.subscribe_outcome();
    outcomes.mark_unchanged();
    let mut resolved = None;
    let mut published = 0;

    while world.engine.is_running() {
        world.clock.advance(100);
        if let TickStatus::Resolved(event) = world.engine.tick() {
            resolved = Some(event);
        }
        if outcomes.has_changed().unwrap() {
            published += 1;
            outcomes.mark_unchanged();
        }
    }
    (resolved.unwrap(), published)
}

fn repo_content() -> Vec<PathBuf> {
    let root = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../..");
    EngineConfig::from_file(&root.join("underworld-config.yaml"))
        .unwrap()
        .content
        .packages
        .into_iter()
        .map(|path| root.join(path))
        .collect()
}

// =============================================================================
// Lifecycle
// =============================================================================

#[test]
fn run_returns_to_idle_with_one_outcome() {
    let w = world(1);
    let started = w.engine.begin_run(CrimeType::Pickpocket);
    let run_id = started.started().unwrap();
    assert!(w.engine.is_running());

    let (event, published) = drive(&w);
    assert_eq!(published, 1);
    assert_eq!(event.run_id, run_id);
    assert_eq!(event.outcome, OutcomeCategory::Success);
    assert_eq!(event.final_line, "gone");
    assert!(!w.engine.is_running());
    assert!(w.engine.current_run().is_none());
    assert_eq!(w.engine.tick(), TickStatus::Idle);
}

#[test]
fn resolution_happens_exactly_at_duration() {
    let w = world(1);
    let _ = w.engine.begin_run(CrimeType::Pickpocket);
    w.clock.advance(19_999);
    assert!(!matches!(w.engine.tick(), TickStatus::Resolved(_)));
    assert!(w.engine.is_running());
    w.clock.advance(1);
    assert!(matches!(w.engine.tick(), TickStatus::Resolved(_)));
}

#[test]
fn phases_progress_in_order() {
    let w = world(2);
    let _ = w.engine.begin_run(CrimeType::Pickpocket);
    let mut seen = vec![w.engine.current_run().unwrap().phase];
    while w.engine.is_running() {
        w.clock.advance(250);
        if w.engine.tick() == TickStatus::Published {
            let phase = w.engine.current_run().unwrap().phase;
            if seen.last() != Some(&phase) {
                seen.push(phase);
            }
        }
    }
    assert_eq!(seen, vec![Phase::Setup, Phase::Execution, Phase::Climax]);
}

#[test]
fn double_begin_leaves_one_run() {
    let w = world(3);
    let first = w.engine.begin_run(CrimeType::Pickpocket).started().unwrap();
    assert_eq!(
        w.engine.begin_run(CrimeType::CarTheft),
        BeginOutcome::AlreadyRunning { run_id: first }
    );
    let (event, published) = drive(&w);
    assert_eq!(published, 1);
    assert_eq!(event.crime, CrimeType::Pickpocket);
}

// =============================================================================
// Outcomes and rewards
// =============================================================================

#[test]
fn caught_path_jails_within_range() {
    let entry = RewardTable::standard().entry(CrimeType::CarTheft);
    for seed in 0..20 {
        let w = world(seed);
        let _ = w.engine.begin_run(CrimeType::CarTheft);
        let (event, _) = drive(&w);
        assert_eq!(event.outcome, OutcomeCategory::Caught);
        assert!(event.was_caught);
        assert_eq!(event.money_gained, 0);
        assert!((entry.jail_min..=entry.jail_max).contains(&event.jail_days));
        assert_eq!(event.final_line, "boxed in");
        assert_eq!(w.player.balance(), 500);
        assert_eq!(w.player.jail_days(), u64::from(event.jail_days));
        assert_eq!(w.player.notoriety().unwrap(), 20 + entry.notoriety_loss);
    }
}

#[test]
fn success_pays_within_range() {
    let entry = RewardTable::standard().entry(CrimeType::Pickpocket);
    for seed in 0..20 {
        let w = world(seed);
        let _ = w.engine.begin_run(CrimeType::Pickpocket);
        let (event, _) = drive(&w);
        assert!((entry.payout_min..=entry.payout_max).contains(&event.money_gained));
        assert_eq!(w.player.balance(), 500 + event.money_gained);
        assert_eq!(w.engine.locked_until(), None);
    }
}

#[test]
fn fallback_always_fails() {
    let entry = RewardTable::standard().entry(CrimeType::Smuggling);
    for seed in 0..10 {
        let w = world(seed);
        let started = w.engine.begin_run(CrimeType::Smuggling);
        assert!(matches!(started, BeginOutcome::Started { fallback: true, .. }));
        let (event, _) = drive(&w);
        assert!(!event.success);
        assert_eq!(event.outcome, OutcomeCategory::Fail);
        assert_eq!(event.money_gained, 0);
        assert_eq!(event.jail_days, 0);
        assert_eq!(event.notoriety_delta, entry.notoriety_loss);
        assert!(w.engine.is_locked_out());
    }
}

#[test]
fn same_seed_same_outcome() {
    let a = world(99);
    let b = world(99);
    let _ = a.engine.begin_run(CrimeType::Pickpocket);
    let _ = b.engine.begin_run(CrimeType::Pickpocket);
    let (left, _) = drive(&a);
    let (right, _) = drive(&b);
    assert_eq!(left.money_gained, right.money_gained);
    assert_eq!(left.outcome, right.outcome);
}

#[test]
fn persistence_failure_still_publishes() {
    let w = world(4);
    w.player.set_failing(true);
    let _ = w.engine.begin_run(CrimeType::CarTheft);
    let (event, published) = drive(&w);
    assert_eq!(published, 1);
    assert!(event.was_caught);
    w.player.set_failing(false);
    assert_eq!(w.player.jail_days(), 0);
    assert_eq!(w.player.notoriety().unwrap(), 20);
}

// =============================================================================
// Lockout and cancellation
// =============================================================================

#[test]
fn failure_lockout_blocks_then_expires() {
    let w = world(5);
    let _ = w.engine.begin_run(CrimeType::CarTheft);
    let (event, _) = drive(&w);
    assert!(!event.success);

    let until = w.engine.locked_until().unwrap();
    assert_eq!(until.signed_duration_since(event.resolved_at).num_milliseconds(), 6_000);
    assert_eq!(
        w.engine.begin_run(CrimeType::Pickpocket),
        BeginOutcome::LockedOut { until }
    );

    w.clock.advance(5_999);
    assert!(w.engine.is_locked_out());
    assert_eq!(w.engine.lockout_remaining_ms(), 1);
    w.clock.advance(1);
    assert!(!w.engine.is_locked_out());
    assert!(w.engine.begin_run(CrimeType::Pickpocket).started().is_some());
}

#[test]
fn active_run_holds_lockout_until_end() {
    let w = world(6);
    let _ = w.engine.begin_run(CrimeType::Pickpocket);
    let state = w.engine.current_run().unwrap();
    let until = w.engine.locked_until().unwrap();
    assert_eq!(until.signed_duration_since(state.started_at).num_milliseconds(), 20_000);
    assert_eq!(w.engine.lockout_remaining_ms(), 20_000);
}

#[test]
fn cancel_is_a_pure_abort() {
    let w = world(7);
    let _ = w.engine.begin_run(CrimeType::CarTheft);
    w.clock.advance(30_000);
    let _ = w.engine.tick();

    assert!(w.engine.cancel_run());
    assert!(!w.engine.is_running());
    assert!(w.engine.last_outcome().is_none());
    assert_eq!(w.engine.locked_until(), None);
    assert_eq!(w.player.jail_days(), 0);
    assert_eq!(w.player.balance(), 500);

    assert!(w.engine.begin_run(CrimeType::Pickpocket).started().is_some());
}

#[test]
fn cancel_while_idle_keeps_lockout() {
    let w = world(8);
    let _ = w.engine.begin_run(CrimeType::CarTheft);
    let _ = drive(&w);
    assert!(!w.engine.cancel_run());
    assert!(w.engine.is_locked_out());
}

// =============================================================================
// Shipped content
// =============================================================================

#[test]
fn shipped_packages_load() {
    let sources = read_sources(&repo_content());
    assert_eq!(sources.len(), 2);
    let bank = load_bank(&sources);

    for crime in [
        CrimeType::Pickpocket,
        CrimeType::Shoplift,
        CrimeType::Mugging,
        CrimeType::CarTheft,
        CrimeType::BankHeist,
        CrimeType::ArtHeist,
    ] {
        let asset = bank.get(crime).unwrap();
        assert!(asset.paths().iter().all(|path| path.is_playable()), "{crime}");
    }
    assert!(!bank.contains(CrimeType::CasinoHeist));
}

#[test]
fn every_shipped_crime_resolves() {
    let bank = load_bank(&read_sources(&repo_content()));
    let keys: Vec<String> = bank.keys().map(str::to_owned).collect();
    let w = world_with(bank, 11);

    for key in keys {
        let crime = CrimeType::from_key(&key).unwrap();
        w.clock.advance(10_000);
        let started = w.engine.begin_run(crime);
        assert!(matches!(started, BeginOutcome::Started { fallback: false, .. }), "{key}");
        let (event, published) = drive(&w);
        assert_eq!(published, 1, "{key}");
        assert_eq!(event.crime, crime);
    }
}
