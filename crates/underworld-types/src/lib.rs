//! Shared type definitions for the Underworld crime run engine.
//!
//! This crate is the single source of truth for the types that cross crate
//! boundaries: the crime catalog, outcome categories, run phases, and the
//! snapshots published to observers. Types flow to `TypeScript` via `ts-rs`
//! for the presentation layer.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrapper for run identifiers
//! - [`enums`] -- Crime catalog, risk tiers, outcome categories, phases
//! - [`structs`] -- Observable run state and terminal outcome events

pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{CrimeType, OutcomeCategory, Phase, RiskTier, normalize_key};
pub use ids::RunId;
pub use structs::{CrimeRunState, OutcomeEvent};
