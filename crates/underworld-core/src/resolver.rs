//! Outcome resolution: weighted category draws and reward rolls.
//!
//! Both steps take the random source as a parameter so callers (and tests)
//! control determinism.

use rand::Rng;
use underworld_content::WeightedOutcome;
use underworld_types::OutcomeCategory;

use crate::rewards::RewardEntry;

/// Draw one category from a weighted table.
///
/// Draws a uniform integer in `[0, total)` and walks the table subtracting
/// weights until the draw lands in a bucket. Zero-weight entries are never
/// drawn while any weight is positive. When every weight is zero the first
/// declared category wins. An empty table resolves to
/// [`OutcomeCategory::Success`].
pub fn pick_outcome<R: Rng + ?Sized>(table: &[WeightedOutcome], rng: &mut R) -> OutcomeCategory {
    let Some(first) = table.first() else {
        return OutcomeCategory::Success;
    };

    let total = table
        .iter()
        .map(|entry| u64::from(entry.weight))
        .fold(0_u64, u64::saturating_add);
    if total == 0 {
        return first.outcome;
    }

    let mut roll = rng.random_range(0..total);
    for entry in table {
        let weight = u64::from(entry.weight);
        if roll < weight {
            return entry.outcome;
        }
        roll = roll.saturating_sub(weight);
    }

    // Unreachable with exact integer weights; kept as a deterministic fallback.
    table.last().map_or(first.outcome, |entry| entry.outcome)
}

/// Concrete consequences of a resolved run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RewardRoll {
    /// The category the consequences were rolled for.
    pub outcome: OutcomeCategory,
    /// Whether the run counts as a win.
    pub success: bool,
    /// Whether the player was arrested.
    pub was_caught: bool,
    /// Money to add to the balance.
    pub money_gained: i64,
    /// Days to add to the sentence.
    pub jail_days: u32,
    /// Change to apply to notoriety.
    pub notoriety_delta: i64,
}

/// Roll money, jail time, and notoriety for `outcome`.
///
/// | Outcome | Money | Jail | Notoriety |
/// |---------|-------|------|-----------|
/// | Success | `[payout_min, payout_max]` | 0 | `notoriety_gain` |
/// | Partial | `[max(0, payout_min/3), max(1, payout_max/2)]` | 0 | `max(1, notoriety_gain/2)` |
/// | Fail | 0 | 0 | `notoriety_loss` |
/// | Caught | 0 | `[jail_min, jail_max]` | `notoriety_loss` |
pub fn roll_rewards<R: Rng + ?Sized>(
    outcome: OutcomeCategory,
    entry: &RewardEntry,
    rng: &mut R,
) -> RewardRoll {
    let money_gained = match outcome {
        OutcomeCategory::Success => roll_i64(entry.payout_min, entry.payout_max, rng),
        OutcomeCategory::Partial => {
            let low = (entry.payout_min / 3).max(0);
            let high = (entry.payout_max / 2).max(1);
            roll_i64(low, high, rng)
        }
        OutcomeCategory::Fail | OutcomeCategory::Caught => 0,
    };

    let jail_days = if outcome.was_caught() {
        roll_u32(entry.jail_min, entry.jail_max, rng)
    } else {
        0
    };

    let notoriety_delta = match outcome {
        OutcomeCategory::Success => entry.notoriety_gain,
        OutcomeCategory::Partial => (entry.notoriety_gain / 2).max(1),
        OutcomeCategory::Fail | OutcomeCategory::Caught => entry.notoriety_loss,
    };

    RewardRoll {
        outcome,
        success: outcome.is_success(),
        was_caught: outcome.was_caught(),
        money_gained,
        jail_days,
        notoriety_delta,
    }
}

fn roll_i64<R: Rng + ?Sized>(low: i64, high: i64, rng: &mut R) -> i64 {
    if low >= high {
        return low;
    }
    rng.random_range(low..=high)
}

fn roll_u32<R: Rng + ?Sized>(low: u32, high: u32, rng: &mut R) -> u32 {
    if low >= high {
        return low;
    }
    rng.random_range(low..=high)
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;

    fn table(entries: &[(OutcomeCategory, u32)]) -> Vec<WeightedOutcome> {
        entries
            .iter()
            .map(|&(outcome, weight)| WeightedOutcome::new(outcome, weight))
            .collect()
    }

    #[test]
    fn single_success_table_always_succeeds() {
        let outcomes = table(&[(OutcomeCategory::Success, 100)]);
        let mut rng = SmallRng::seed_from_u64(42);
        for _ in 0..10_000 {
            assert_eq!(pick_outcome(&outcomes, &mut rng), OutcomeCategory::Success);
        }
    }

    #[test]
    fn zero_weight_entries_never_drawn() {
        let outcomes = table(&[(OutcomeCategory::Success, 1), (OutcomeCategory::Fail, 0)]);
        let mut rng = SmallRng::seed_from_u64(3);
        for _ in 0..1_000 {
            assert_eq!(pick_outcome(&outcomes, &mut rng), OutcomeCategory::Success);
        }
    }

    #[test]
    fn all_zero_weights_pick_first() {
        let outcomes = table(&[(OutcomeCategory::Caught, 0), (OutcomeCategory::Success, 0)]);
        let mut rng = SmallRng::seed_from_u64(9);
        for _ in 0..100 {
            assert_eq!(pick_outcome(&outcomes, &mut rng), OutcomeCategory::Caught);
        }
    }

    #[test]
    fn empty_table_succeeds() {
        let mut rng = SmallRng::seed_from_u64(1);
        assert_eq!(pick_outcome(&[], &mut rng), OutcomeCategory::Success);
    }

    #[test]
    fn weights_shape_distribution() {
        let outcomes = table(&[(OutcomeCategory::Success, 90), (OutcomeCategory::Caught, 10)]);
        let mut rng = SmallRng::seed_from_u64(2024);
        let caught = (0..10_000)
            .filter(|_| pick_outcome(&outcomes, &mut rng) == OutcomeCategory::Caught)
            .count();
        assert!((700..1_300).contains(&caught), "caught {caught} of 10000");
    }

    #[test]
    fn every_declared_category_is_reachable() {
        let outcomes = table(&[
            (OutcomeCategory::Success, 25),
            (OutcomeCategory::Partial, 25),
            (OutcomeCategory::Fail, 25),
            (OutcomeCategory::Caught, 25),
        ]);
        let mut rng = SmallRng::seed_from_u64(11);
        let mut seen = std::collections::BTreeSet::new();
        for _ in 0..1_000 {
            seen.insert(pick_outcome(&outcomes, &mut rng));
        }
        assert_eq!(seen.len(), 4);
    }

    #[test]
    fn success_pays_within_range() {
        let entry = RewardEntry::new((100, 600), (5, 20), 3, -2);
        let mut rng = SmallRng::seed_from_u64(5);
        for _ in 0..1_000 {
            let roll = roll_rewards(OutcomeCategory::Success, &entry, &mut rng);
            assert!((100..=600).contains(&roll.money_gained));
            assert_eq!(roll.jail_days, 0);
            assert_eq!(roll.notoriety_delta, 3);
            assert!(roll.success);
            assert!(!roll.was_caught);
        }
    }

    #[test]
    fn partial_pays_reduced_range() {
        let entry = RewardEntry::new((300, 1_500), (15, 45), 5, -3);
        let mut rng = SmallRng::seed_from_u64(6);
        for _ in 0..1_000 {
            let roll = roll_rewards(OutcomeCategory::Partial, &entry, &mut rng);
            assert!((100..=750).contains(&roll.money_gained));
            assert_eq!(roll.jail_days, 0);
            assert_eq!(roll.notoriety_delta, 2);
            assert!(roll.success);
        }
    }

    #[test]
    fn partial_floors_tiny_tables() {
        let entry = RewardEntry::new((0, 1), (0, 0), 1, 0);
        let mut rng = SmallRng::seed_from_u64(6);
        let roll = roll_rewards(OutcomeCategory::Partial, &entry, &mut rng);
        assert!((0..=1).contains(&roll.money_gained));
        assert_eq!(roll.notoriety_delta, 1);
    }

    #[test]
    fn caught_jails_without_pay() {
        let entry = RewardEntry::new((2_000, 8_000), (60, 180), 8, -5);
        let mut rng = SmallRng::seed_from_u64(8);
        for _ in 0..1_000 {
            let roll = roll_rewards(OutcomeCategory::Caught, &entry, &mut rng);
            assert_eq!(roll.money_gained, 0);
            assert!((60..=180).contains(&roll.jail_days));
            assert_eq!(roll.notoriety_delta, -5);
            assert!(!roll.success);
            assert!(roll.was_caught);
        }
    }

    #[test]
    fn fail_costs_notoriety_only() {
        let entry = RewardEntry::new((2_000, 8_000), (60, 180), 8, -5);
        let mut rng = SmallRng::seed_from_u64(8);
        let roll = roll_rewards(OutcomeCategory::Fail, &entry, &mut rng);
        assert_eq!(roll.money_gained, 0);
        assert_eq!(roll.jail_days, 0);
        assert_eq!(roll.notoriety_delta, -5);
        assert!(!roll.success);
        assert!(!roll.was_caught);
    }

    #[test]
    fn degenerate_ranges_return_bound() {
        let entry = RewardEntry::new((50, 50), (7, 7), 2, -1);
        let mut rng = SmallRng::seed_from_u64(1);
        assert_eq!(roll_rewards(OutcomeCategory::Success, &entry, &mut rng).money_gained, 50);
        assert_eq!(roll_rewards(OutcomeCategory::Caught, &entry, &mut rng).jail_days, 7);
    }
}
