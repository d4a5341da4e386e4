//! Enumeration types for the crime run engine.
//!
//! The crime catalog is fixed: every [`CrimeType`] belongs to exactly one
//! [`RiskTier`] for the lifetime of the program. Keys are stable
//! `SCREAMING_SNAKE_CASE` strings shared with the JSON content packages.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Risk Tier
// ---------------------------------------------------------------------------

/// Risk classification driving default run duration and reward magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export, export_to = "bindings/")]
pub enum RiskTier {
    /// Petty street crime. Short runs, small payouts.
    Low,
    /// Property crime with real exposure.
    Medium,
    /// Serious crime with long sentences on capture.
    High,
    /// Planned heists. Longest runs, largest swings.
    Extreme,
}

impl RiskTier {
    /// All tiers in ascending order of risk.
    pub const ALL: [Self; 4] = [Self::Low, Self::Medium, Self::High, Self::Extreme];
}

// ---------------------------------------------------------------------------
// Crime Type
// ---------------------------------------------------------------------------

/// One of the catalogued crime kinds a player can attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export, export_to = "bindings/")]
pub enum CrimeType {
    // --- Low ---
    /// Lifting a wallet in a crowd.
    Pickpocket,
    /// Walking out of a store with unpaid goods.
    Shoplift,
    /// Tagging or wrecking property.
    Vandalism,
    /// Riding transit without paying.
    FareEvasion,
    /// A quick con on a passer-by.
    StreetScam,

    // --- Medium ---
    /// Smashing into a parked car for valuables.
    CarBreakIn,
    /// Robbing someone on the street.
    Mugging,
    /// Breaking into a home.
    Burglary,
    /// Printing and passing fake bills.
    Counterfeiting,
    /// Moving stolen goods.
    Fencing,

    // --- High ---
    /// Stealing a vehicle outright.
    CarTheft,
    /// Holding up a store at gunpoint.
    ArmedRobbery,
    /// Running stolen card numbers.
    CardFraud,
    /// Moving contraband across a border.
    Smuggling,
    /// Shaking down local businesses.
    Extortion,

    // --- Extreme ---
    /// Taking down a bank vault.
    BankHeist,
    /// Lifting a painting from a gallery.
    ArtHeist,
    /// Cleaning out a casino cage.
    CasinoHeist,
    /// Hitting a cash transport in transit.
    ArmoredTruck,
}

impl CrimeType {
    /// Every crime kind in the catalog.
    pub const ALL: [Self; 19] = [
        Self::Pickpocket,
        Self::Shoplift,
        Self::Vandalism,
        Self::FareEvasion,
        Self::StreetScam,
        Self::CarBreakIn,
        Self::Mugging,
        Self::Burglary,
        Self::Counterfeiting,
        Self::Fencing,
        Self::CarTheft,
        Self::ArmedRobbery,
        Self::CardFraud,
        Self::Smuggling,
        Self::Extortion,
        Self::BankHeist,
        Self::ArtHeist,
        Self::CasinoHeist,
        Self::ArmoredTruck,
    ];

    /// The stable key used in content packages and logs.
    pub const fn key(self) -> &'static str {
        match self {
            Self::Pickpocket => "PICKPOCKET",
            Self::Shoplift => "SHOPLIFT",
            Self::Vandalism => "VANDALISM",
            Self::FareEvasion => "FARE_EVASION",
            Self::StreetScam => "STREET_SCAM",
            Self::CarBreakIn => "CAR_BREAK_IN",
            Self::Mugging => "MUGGING",
            Self::Burglary => "BURGLARY",
            Self::Counterfeiting => "COUNTERFEITING",
            Self::Fencing => "FENCING",
            Self::CarTheft => "CAR_THEFT",
            Self::ArmedRobbery => "ARMED_ROBBERY",
            Self::CardFraud => "CARD_FRAUD",
            Self::Smuggling => "SMUGGLING",
            Self::Extortion => "EXTORTION",
            Self::BankHeist => "BANK_HEIST",
            Self::ArtHeist => "ART_HEIST",
            Self::CasinoHeist => "CASINO_HEIST",
            Self::ArmoredTruck => "ARMORED_TRUCK",
        }
    }

    /// Human-readable name shown when a content package does not supply one.
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Pickpocket => "Pickpocket",
            Self::Shoplift => "Shoplift",
            Self::Vandalism => "Vandalism",
            Self::FareEvasion => "Fare Evasion",
            Self::StreetScam => "Street Scam",
            Self::CarBreakIn => "Car Break-In",
            Self::Mugging => "Mugging",
            Self::Burglary => "Burglary",
            Self::Counterfeiting => "Counterfeiting",
            Self::Fencing => "Fencing",
            Self::CarTheft => "Car Theft",
            Self::ArmedRobbery => "Armed Robbery",
            Self::CardFraud => "Card Fraud",
            Self::Smuggling => "Smuggling",
            Self::Extortion => "Extortion",
            Self::BankHeist => "Bank Heist",
            Self::ArtHeist => "Art Heist",
            Self::CasinoHeist => "Casino Heist",
            Self::ArmoredTruck => "Armored Truck",
        }
    }

    /// The tier this crime is permanently assigned to.
    pub const fn risk_tier(self) -> RiskTier {
        match self {
            Self::Pickpocket
            | Self::Shoplift
            | Self::Vandalism
            | Self::FareEvasion
            | Self::StreetScam => RiskTier::Low,
            Self::CarBreakIn
            | Self::Mugging
            | Self::Burglary
            | Self::Counterfeiting
            | Self::Fencing => RiskTier::Medium,
            Self::CarTheft
            | Self::ArmedRobbery
            | Self::CardFraud
            | Self::Smuggling
            | Self::Extortion => RiskTier::High,
            Self::BankHeist | Self::ArtHeist | Self::CasinoHeist | Self::ArmoredTruck => {
                RiskTier::Extreme
            }
        }
    }

    /// Parse a crime key.
    ///
    /// Matching is case-insensitive, ignores surrounding whitespace, and
    /// treats `-` and spaces as `_`, so `"car-theft"` and `"Car Theft"`
    /// both resolve to [`CrimeType::CarTheft`].
    pub fn from_key(raw: &str) -> Option<Self> {
        let key = normalize_key(raw);
        Self::ALL.into_iter().find(|crime| crime.key() == key)
    }
}

impl core::fmt::Display for CrimeType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.key())
    }
}

/// Canonical form of a crime key: trimmed, upper-case, `_`-separated.
pub fn normalize_key(raw: &str) -> String {
    raw.trim()
        .chars()
        .map(|c| match c {
            '-' | ' ' => '_',
            other => other.to_ascii_uppercase(),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Outcome Category
// ---------------------------------------------------------------------------

/// The possible resolutions of a completed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export, export_to = "bindings/")]
pub enum OutcomeCategory {
    /// Clean getaway with the full take.
    Success,
    /// Got away with part of the take.
    Partial,
    /// Walked away empty-handed.
    Fail,
    /// Arrested.
    Caught,
}

impl OutcomeCategory {
    /// Parse an outcome label case-insensitively. Unknown labels yield `None`.
    pub fn from_label(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "SUCCESS" => Some(Self::Success),
            "PARTIAL" => Some(Self::Partial),
            "FAIL" => Some(Self::Fail),
            "CAUGHT" => Some(Self::Caught),
            _ => None,
        }
    }

    /// Whether the player counts this outcome as a win.
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Success | Self::Partial)
    }

    /// Whether this outcome sends the player to jail.
    pub const fn was_caught(self) -> bool {
        matches!(self, Self::Caught)
    }
}

// ---------------------------------------------------------------------------
// Phase
// ---------------------------------------------------------------------------

/// A time-boxed segment of a run with its own narrative content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export, export_to = "bindings/")]
pub enum Phase {
    /// Casing the target.
    Setup,
    /// Doing the job.
    Execution,
    /// The final moments before the result is known.
    Climax,
}
