//! Content package parsing and normalization.
//!
//! A package is a JSON list of crime definitions, either bare or wrapped as
//! `{"crimes": [...]}`. Each definition is normalized into a [`CrimeAsset`]:
//!
//! 1. Definitions with a blank type key or no paths are skipped.
//! 2. Each path's outcome table is mapped onto [`OutcomeCategory`]; unknown
//!    labels are dropped and an empty table becomes a single 100-weight
//!    success entry.
//! 3. Each path's climax is collapsed into a [`Climax`].
//! 4. Paths with no setup and no execution lines are dropped.
//! 5. Crimes left with no paths are dropped.
//!
//! Packages are merged in order; a later package replaces earlier entries
//! with the same key. A package that fails to read or parse is skipped. A
//! single crime definition that fails to parse is skipped on its own and
//! the rest of its package still loads.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};
use underworld_types::{OutcomeCategory, normalize_key};

use crate::bank::{AssetBank, CrimeAsset};
use crate::error::ContentError;
use crate::narrative::{Climax, NarrativePath, WeightedOutcome, default_outcomes};

// ---------------------------------------------------------------------------
// Sources
// ---------------------------------------------------------------------------

/// A named content package awaiting parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentSource {
    name: String,
    text: String,
}

impl ContentSource {
    /// Wrap already-read package text.
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }

    /// Read a package from disk. The file path becomes the package name.
    ///
    /// # Errors
    ///
    /// Returns [`ContentError::Io`] if the file cannot be read.
    pub fn from_path(path: &Path) -> Result<Self, ContentError> {
        let text = std::fs::read_to_string(path).map_err(|source| ContentError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::new(path.display().to_string(), text))
    }

    /// Package name used in logs.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Raw package text.
    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Read every package in `paths`, skipping (and logging) unreadable ones.
pub fn read_sources(paths: &[PathBuf]) -> Vec<ContentSource> {
    paths
        .iter()
        .filter_map(|path| match ContentSource::from_path(path) {
            Ok(source) => Some(source),
            Err(err) => {
                warn!(error = %err, "Skipping unreadable content package");
                None
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Raw package model
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawPackage {
    Wrapped { crimes: Vec<Value> },
    Bare(Vec<Value>),
}

impl RawPackage {
    fn into_crimes(self) -> Vec<Value> {
        match self {
            Self::Wrapped { crimes } | Self::Bare(crimes) => crimes,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCrime {
    #[serde(rename = "type", default)]
    type_key: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    duration_seconds: Option<u64>,
    #[serde(default)]
    paths: Vec<RawPath>,
}

#[derive(Debug, Deserialize)]
struct RawPath {
    #[serde(default)]
    setup: Vec<String>,
    #[serde(default)]
    execution: Vec<String>,
    #[serde(default)]
    climax: Option<Value>,
    #[serde(default)]
    outcomes: Vec<RawOutcome>,
}

#[derive(Debug, Deserialize)]
struct RawOutcome {
    #[serde(alias = "result", alias = "type", default)]
    outcome: String,
    #[serde(default)]
    weight: i64,
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

fn normalize_outcomes(raw: &[RawOutcome]) -> Vec<WeightedOutcome> {
    let table: Vec<WeightedOutcome> = raw
        .iter()
        .filter_map(|entry| {
            let outcome = OutcomeCategory::from_label(&entry.outcome)?;
            let weight = u32::try_from(entry.weight.max(0)).unwrap_or(u32::MAX);
            Some(WeightedOutcome::new(outcome, weight))
        })
        .collect();

    if table.is_empty() {
        default_outcomes()
    } else {
        table
    }
}

fn normalize_path(raw: RawPath) -> Option<NarrativePath> {
    let path = NarrativePath {
        outcomes: normalize_outcomes(&raw.outcomes),
        climax: Climax::from_value(raw.climax.as_ref()),
        setup: raw.setup,
        execution: raw.execution,
    };
    path.is_playable().then_some(path)
}

fn parse_crime(package: &str, index: usize, value: Value) -> Option<RawCrime> {
    let type_key = value
        .get("type")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_owned();
    match serde_json::from_value(value) {
        Ok(crime) => Some(crime),
        Err(err) => {
            warn!(
                package,
                index,
                crime = %type_key,
                error = %err,
                "Skipping malformed crime definition"
            );
            None
        }
    }
}

fn normalize_crime(package: &str, raw: RawCrime) -> Option<CrimeAsset> {
    let key = normalize_key(&raw.type_key);
    if key.is_empty() {
        debug!(package, "Skipping crime with blank type key");
        return None;
    }
    if raw.paths.is_empty() {
        debug!(package, crime = %key, "Skipping crime with no paths");
        return None;
    }

    let declared = raw.paths.len();
    let paths: Vec<NarrativePath> = raw.paths.into_iter().filter_map(normalize_path).collect();
    if paths.len() < declared {
        debug!(
            package,
            crime = %key,
            dropped = declared.saturating_sub(paths.len()),
            "Dropped paths with no narrative lines"
        );
    }

    let duration_seconds = raw.duration_seconds.filter(|secs| *secs > 0);
    let name = raw.name.filter(|name| !name.trim().is_empty());
    let asset = CrimeAsset::new(key, name, duration_seconds, paths);
    if asset.is_none() {
        warn!(package, "Skipping crime with no playable paths");
    }
    asset
}

/// Parse and normalize one package.
///
/// Returns the package's valid assets in declaration order. Crimes that do
/// not parse are logged and dropped; unplayable crimes and paths are
/// dropped quietly.
///
/// # Errors
///
/// Returns [`ContentError::Json`] if the text is not a list of crimes.
pub fn parse_package(source: &ContentSource) -> Result<Vec<CrimeAsset>, ContentError> {
    let raw: RawPackage =
        serde_json::from_str(&source.text).map_err(|err| ContentError::Json {
            package: source.name.clone(),
            source: err,
        })?;
    Ok(raw
        .into_crimes()
        .into_iter()
        .enumerate()
        .filter_map(|(index, value)| parse_crime(&source.name, index, value))
        .filter_map(|crime| normalize_crime(&source.name, crime))
        .collect())
}

/// Load every source into one bank.
///
/// Never fails: a package that does not parse is logged and skipped, and
/// loading continues with the next.
pub fn load_bank(sources: &[ContentSource]) -> AssetBank {
    let mut bank = AssetBank::new();
    let mut skipped_packages: usize = 0;

    for source in sources {
        match parse_package(source) {
            Ok(assets) => {
                let count = assets.len();
                for asset in assets {
                    if let Some(replaced) = bank.insert(asset) {
                        debug!(
                            package = source.name(),
                            crime = replaced.key(),
                            "Crime content overridden by later package"
                        );
                    }
                }
                debug!(package = source.name(), crimes = count, "Content package loaded");
            }
            Err(err) => {
                skipped_packages = skipped_packages.saturating_add(1);
                warn!(error = %err, "Skipping malformed content package");
            }
        }
    }

    info!(
        packages = sources.len(),
        skipped_packages,
        crimes = bank.len(),
        "Asset bank loaded"
    );
    bank
}
