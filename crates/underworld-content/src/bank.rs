//! The merged, read-only lookup of narrative content by crime key.

use std::collections::BTreeMap;

use rand::Rng;
use rand::seq::IndexedRandom;
use underworld_types::CrimeType;

use crate::narrative::NarrativePath;

/// Narrative content for one crime kind.
///
/// Always holds at least one playable path; the constructor refuses an
/// empty list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrimeAsset {
    key: String,
    name: Option<String>,
    duration_seconds: Option<u64>,
    paths: Vec<NarrativePath>,
}

impl CrimeAsset {
    /// Build an asset. Returns `None` when `paths` is empty.
    pub fn new(
        key: impl Into<String>,
        name: Option<String>,
        duration_seconds: Option<u64>,
        paths: Vec<NarrativePath>,
    ) -> Option<Self> {
        if paths.is_empty() {
            return None;
        }
        Some(Self {
            key: key.into(),
            name,
            duration_seconds,
            paths,
        })
    }

    /// Normalized crime key this asset is filed under.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Display name declared by the package, if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Explicit run length in seconds, if the package declared one.
    pub const fn duration_seconds(&self) -> Option<u64> {
        self.duration_seconds
    }

    /// Explicit run length in milliseconds, if the package declared one.
    pub fn duration_ms(&self) -> Option<u64> {
        self.duration_seconds.map(|secs| secs.saturating_mul(1000))
    }

    /// All narrative paths, in package order.
    pub fn paths(&self) -> &[NarrativePath] {
        &self.paths
    }

    /// Pick one path uniformly at random.
    pub fn pick_path<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&NarrativePath> {
        self.paths.choose(rng)
    }
}

/// Crime content keyed by normalized crime key.
///
/// Built once by [`load_bank`](crate::loader::load_bank) and never mutated
/// afterwards, so it can be shared across threads behind an `Arc` without
/// locking.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetBank {
    assets: BTreeMap<String, CrimeAsset>,
}

impl AssetBank {
    /// Create an empty bank.
    pub const fn new() -> Self {
        Self {
            assets: BTreeMap::new(),
        }
    }

    /// File an asset under its key, replacing any earlier entry.
    ///
    /// Returns the replaced asset, if there was one.
    pub fn insert(&mut self, asset: CrimeAsset) -> Option<CrimeAsset> {
        self.assets.insert(asset.key.clone(), asset)
    }

    /// Look up content for a catalogued crime.
    pub fn get(&self, crime: CrimeType) -> Option<&CrimeAsset> {
        self.assets.get(crime.key())
    }

    /// Look up content by raw key. The key is normalized first.
    pub fn get_key(&self, key: &str) -> Option<&CrimeAsset> {
        self.assets.get(&underworld_types::normalize_key(key))
    }

    /// Whether the bank has content for `crime`.
    pub fn contains(&self, crime: CrimeType) -> bool {
        self.assets.contains_key(crime.key())
    }

    /// Number of crime entries.
    pub fn len(&self) -> usize {
        self.assets.len()
    }

    /// Whether the bank holds no content at all.
    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    /// Keys present in the bank, in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.assets.keys().map(String::as_str)
    }
}
