//! Static per-crime reward and penalty constants.
//!
//! Every entry is validated when the table is built and never mutated
//! afterwards. Crimes missing from a custom table resolve to their tier's
//! default entry, so lookups are infallible.

use std::collections::BTreeMap;

use underworld_types::{CrimeType, RiskTier};

/// Errors raised when building a reward table.
#[derive(Debug, thiserror::Error)]
pub enum RewardError {
    /// An entry violates one of the range invariants.
    #[error("invalid reward entry for {crime}: {reason}")]
    InvalidEntry {
        /// The crime whose entry is invalid.
        crime: CrimeType,
        /// Which invariant is violated.
        reason: String,
    },
}

/// Payout, jail, and notoriety ranges for one crime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RewardEntry {
    /// Smallest full payout.
    pub payout_min: i64,
    /// Largest full payout.
    pub payout_max: i64,
    /// Shortest sentence on capture, in days.
    pub jail_min: u32,
    /// Longest sentence on capture, in days.
    pub jail_max: u32,
    /// Notoriety earned on success (non-negative).
    pub notoriety_gain: i64,
    /// Notoriety applied on failure (non-positive).
    pub notoriety_loss: i64,
}

impl RewardEntry {
    /// Build an entry without validation.
    pub const fn new(
        payout: (i64, i64),
        jail: (u32, u32),
        notoriety_gain: i64,
        notoriety_loss: i64,
    ) -> Self {
        Self {
            payout_min: payout.0,
            payout_max: payout.1,
            jail_min: jail.0,
            jail_max: jail.1,
            notoriety_gain,
            notoriety_loss,
        }
    }

    /// Check the range invariants.
    ///
    /// # Errors
    ///
    /// Returns [`RewardError::InvalidEntry`] naming the first violation.
    pub fn validate(&self, crime: CrimeType) -> Result<(), RewardError> {
        let reason = if self.payout_min < 0 {
            Some(format!("payout_min {} is negative", self.payout_min))
        } else if self.payout_min > self.payout_max {
            Some(format!(
                "payout_min {} exceeds payout_max {}",
                self.payout_min, self.payout_max
            ))
        } else if self.jail_min > self.jail_max {
            Some(format!(
                "jail_min {} exceeds jail_max {}",
                self.jail_min, self.jail_max
            ))
        } else if self.notoriety_gain < 0 {
            Some(format!("notoriety_gain {} is negative", self.notoriety_gain))
        } else if self.notoriety_loss > 0 {
            Some(format!("notoriety_loss {} is positive", self.notoriety_loss))
        } else {
            None
        };

        reason.map_or(Ok(()), |reason| Err(RewardError::InvalidEntry { crime, reason }))
    }

    /// The entry used for a crime with no explicit row.
    pub const fn tier_default(tier: RiskTier) -> Self {
        match tier {
            RiskTier::Low => Self::new((10, 100), (1, 3), 1, -1),
            RiskTier::Medium => Self::new((100, 1_000), (7, 30), 3, -2),
            RiskTier::High => Self::new((1_000, 10_000), (60, 365), 8, -5),
            RiskTier::Extreme => Self::new((50_000, 250_000), (730, 3_650), 25, -12),
        }
    }
}

/// Reward constants keyed by crime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewardTable {
    entries: BTreeMap<CrimeType, RewardEntry>,
}

impl RewardTable {
    /// Build a table from explicit rows.
    ///
    /// # Errors
    ///
    /// Returns [`RewardError::InvalidEntry`] for the first row that breaks
    /// an invariant.
    pub fn from_entries(
        rows: impl IntoIterator<Item = (CrimeType, RewardEntry)>,
    ) -> Result<Self, RewardError> {
        let mut entries = BTreeMap::new();
        for (crime, entry) in rows {
            entry.validate(crime)?;
            entries.insert(crime, entry);
        }
        Ok(Self { entries })
    }

    /// The built-in table covering the whole catalog.
    pub fn standard() -> Self {
        Self {
            entries: CrimeType::ALL
                .into_iter()
                .map(|crime| (crime, standard_entry(crime)))
                .collect(),
        }
    }

    /// Entry for `crime`, falling back to its tier default.
    pub fn entry(&self, crime: CrimeType) -> RewardEntry {
        self.entries
            .get(&crime)
            .copied()
            .unwrap_or_else(|| RewardEntry::tier_default(crime.risk_tier()))
    }

    /// Whether `crime` has an explicit row.
    pub fn has_entry(&self, crime: CrimeType) -> bool {
        self.entries.contains_key(&crime)
    }
}

impl Default for RewardTable {
    fn default() -> Self {
        Self::standard()
    }
}

const fn standard_entry(crime: CrimeType) -> RewardEntry {
    match crime {
        // --- Low ---
        CrimeType::Pickpocket => RewardEntry::new((20, 120), (1, 3), 1, -1),
        CrimeType::Shoplift => RewardEntry::new((15, 90), (1, 2), 1, -1),
        CrimeType::Vandalism => RewardEntry::new((0, 40), (1, 3), 1, -1),
        CrimeType::FareEvasion => RewardEntry::new((5, 20), (0, 1), 1, -1),
        CrimeType::StreetScam => RewardEntry::new((30, 150), (1, 4), 2, -1),

        // --- Medium ---
        CrimeType::CarBreakIn => RewardEntry::new((100, 600), (5, 20), 3, -2),
        CrimeType::Mugging => RewardEntry::new((80, 400), (10, 30), 4, -2),
        CrimeType::Burglary => RewardEntry::new((300, 1_500), (15, 45), 5, -3),
        CrimeType::Counterfeiting => RewardEntry::new((400, 1_800), (20, 60), 4, -3),
        CrimeType::Fencing => RewardEntry::new((250, 1_200), (10, 40), 3, -2),

        // --- High ---
        CrimeType::CarTheft => RewardEntry::new((2_000, 8_000), (60, 180), 8, -5),
        CrimeType::ArmedRobbery => RewardEntry::new((3_000, 12_000), (180, 540), 12, -6),
        CrimeType::CardFraud => RewardEntry::new((2_500, 10_000), (90, 365), 8, -4),
        CrimeType::Smuggling => RewardEntry::new((5_000, 20_000), (180, 720), 10, -5),
        CrimeType::Extortion => RewardEntry::new((4_000, 15_000), (120, 480), 12, -6),

        // --- Extreme ---
        CrimeType::BankHeist => RewardEntry::new((50_000, 250_000), (730, 3_650), 30, -15),
        CrimeType::ArtHeist => RewardEntry::new((40_000, 300_000), (730, 2_920), 25, -12),
        CrimeType::CasinoHeist => RewardEntry::new((75_000, 400_000), (1_095, 3_650), 35, -15),
        CrimeType::ArmoredTruck => RewardEntry::new((60_000, 200_000), (1_095, 3_285), 30, -15),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn standard_table_covers_catalog() {
        let table = RewardTable::standard();
        for crime in CrimeType::ALL {
            assert!(table.has_entry(crime), "{crime} missing");
        }
    }

    #[test]
    fn standard_entries_are_valid() {
        for crime in CrimeType::ALL {
            assert!(standard_entry(crime).validate(crime).is_ok(), "{crime} invalid");
        }
        for tier in RiskTier::ALL {
            assert!(RewardEntry::tier_default(tier).validate(CrimeType::Pickpocket).is_ok());
        }
    }

    #[test]
    fn missing_rows_use_tier_default() {
        let table = RewardTable::from_entries([(
            CrimeType::Pickpocket,
            RewardEntry::new((1, 2), (0, 0), 1, 0),
        )])
        .unwrap();
        assert_eq!(table.entry(CrimeType::Pickpocket).payout_max, 2);
        assert!(!table.has_entry(CrimeType::BankHeist));
        assert_eq!(
            table.entry(CrimeType::BankHeist),
            RewardEntry::tier_default(RiskTier::Extreme)
        );
    }

    #[test]
    fn invalid_rows_rejected() {
        let cases = [
            RewardEntry::new((10, 5), (0, 0), 0, 0),
            RewardEntry::new((0, 5), (3, 1), 0, 0),
            RewardEntry::new((0, 5), (0, 1), -1, 0),
            RewardEntry::new((0, 5), (0, 1), 1, 2),
            RewardEntry::new((-5, 5), (0, 1), 1, 0),
        ];
        for entry in cases {
            let result = RewardTable::from_entries([(CrimeType::Mugging, entry)]);
            assert!(matches!(result, Err(RewardError::InvalidEntry { crime: CrimeType::Mugging, .. })));
        }
    }

    #[test]
    fn extreme_pays_more_than_low() {
        let table = RewardTable::standard();
        assert!(
            table.entry(CrimeType::BankHeist).payout_min
                > table.entry(CrimeType::Pickpocket).payout_max
        );
    }
}
