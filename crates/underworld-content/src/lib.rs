//! Narrative content loading and normalization for the Underworld engine.
//!
//! Content packages arrive as JSON in two climax dialects. This crate reads
//! them, normalizes everything into one model, and merges the result into
//! an immutable [`AssetBank`] keyed by crime.
//!
//! # Modules
//!
//! - [`bank`] -- [`AssetBank`] and per-crime [`CrimeAsset`] with path selection
//! - [`error`] -- Per-package read/parse errors ([`ContentError`])
//! - [`loader`] -- Package parsing, normalization, and merging ([`load_bank`])
//! - [`narrative`] -- [`NarrativePath`], the [`Climax`] sum type, and outcome tables

pub mod bank;
pub mod error;
pub mod loader;
pub mod narrative;

pub use bank::{AssetBank, CrimeAsset};
pub use error::ContentError;
pub use loader::{ContentSource, load_bank, parse_package, read_sources};
pub use narrative::{Climax, DEFAULT_SUCCESS_WEIGHT, NarrativePath, WeightedOutcome, default_outcomes};
