//! Normalized narrative model.
//!
//! Content packages describe a crime's climax in one of two JSON shapes: a
//! list of neutral lines, or an object keyed by outcome. [`Climax`] collapses
//! both into a single sum type so every consumer handles the shapes
//! exhaustively.

use serde_json::Value;
use underworld_types::OutcomeCategory;

/// Weight given to the implicit success entry when a path declares no
/// usable outcomes.
pub const DEFAULT_SUCCESS_WEIGHT: u32 = 100;

// ---------------------------------------------------------------------------
// Climax
// ---------------------------------------------------------------------------

/// The closing text of a narrative path.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Climax {
    /// Neutral lines usable for any outcome.
    Lines(Vec<String>),
    /// Outcome-specific lines. Missing entries stay unset.
    ByOutcome {
        /// Line for a successful run.
        success: Option<String>,
        /// Line for a failed run (also used when caught without a
        /// dedicated line).
        fail: Option<String>,
        /// Line for an arrest.
        caught: Option<String>,
    },
    /// No usable climax text.
    #[default]
    None,
}

impl Climax {
    /// Normalize a raw climax value.
    ///
    /// Arrays keep their string entries as lines. Objects copy the
    /// `success`, `fail`, and `caught` string fields. Anything else yields
    /// [`Climax::None`].
    pub fn from_value(value: Option<&Value>) -> Self {
        match value {
            Some(Value::Array(items)) => Self::Lines(
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_owned)
                    .collect(),
            ),
            Some(Value::Object(map)) => {
                let field = |name: &str| map.get(name).and_then(Value::as_str).map(str::to_owned);
                Self::ByOutcome {
                    success: field("success"),
                    fail: field("fail"),
                    caught: field("caught"),
                }
            }
            _ => Self::None,
        }
    }

    /// Neutral climax lines. Empty for the object shape.
    pub fn lines(&self) -> &[String] {
        match self {
            Self::Lines(lines) => lines,
            Self::ByOutcome { .. } | Self::None => &[],
        }
    }

    /// Explicit success line, if declared.
    pub fn success(&self) -> Option<&str> {
        match self {
            Self::ByOutcome { success, .. } => success.as_deref(),
            Self::Lines(_) | Self::None => None,
        }
    }

    /// Explicit failure line, if declared.
    pub fn fail(&self) -> Option<&str> {
        match self {
            Self::ByOutcome { fail, .. } => fail.as_deref(),
            Self::Lines(_) | Self::None => None,
        }
    }

    /// Explicit arrest line, if declared.
    pub fn caught(&self) -> Option<&str> {
        match self {
            Self::ByOutcome { caught, .. } => caught.as_deref(),
            Self::Lines(_) | Self::None => None,
        }
    }

    /// The outcome-specific line for `outcome`, if any.
    ///
    /// `Caught` prefers the `caught` line and falls back to `fail`.
    /// `Partial` never has a dedicated line.
    pub fn explicit_line(&self, outcome: OutcomeCategory) -> Option<&str> {
        match outcome {
            OutcomeCategory::Success => self.success(),
            OutcomeCategory::Fail => self.fail(),
            OutcomeCategory::Caught => self.caught().or_else(|| self.fail()),
            OutcomeCategory::Partial => None,
        }
    }
}

// ---------------------------------------------------------------------------
// WeightedOutcome
// ---------------------------------------------------------------------------

/// One entry of a path's outcome table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeightedOutcome {
    /// The category this entry resolves to.
    pub outcome: OutcomeCategory,
    /// Relative weight; zero-weight entries are never drawn unless every
    /// weight is zero.
    pub weight: u32,
}

impl WeightedOutcome {
    /// Create a table entry.
    pub const fn new(outcome: OutcomeCategory, weight: u32) -> Self {
        Self { outcome, weight }
    }
}

/// The table substituted when a path declares no usable outcomes.
pub fn default_outcomes() -> Vec<WeightedOutcome> {
    vec![WeightedOutcome::new(
        OutcomeCategory::Success,
        DEFAULT_SUCCESS_WEIGHT,
    )]
}

// ---------------------------------------------------------------------------
// NarrativePath
// ---------------------------------------------------------------------------

/// One alternative story variant for a crime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NarrativePath {
    /// Lines shown during the setup phase, in order.
    pub setup: Vec<String>,
    /// Lines shown during the execution phase, in order.
    pub execution: Vec<String>,
    /// Closing text, reserved for the outcome event.
    pub climax: Climax,
    /// Outcome table. Never empty once normalized.
    pub outcomes: Vec<WeightedOutcome>,
}

impl NarrativePath {
    /// Number of setup plus execution lines.
    pub fn total_lines(&self) -> usize {
        self.setup.len().saturating_add(self.execution.len())
    }

    /// A path with no setup or execution text cannot drive a run.
    pub fn is_playable(&self) -> bool {
        self.total_lines() > 0
    }

    /// Sum of all outcome weights.
    pub fn total_weight(&self) -> u64 {
        self.outcomes
            .iter()
            .map(|entry| u64::from(entry.weight))
            .fold(0_u64, u64::saturating_add)
    }

    /// Closing line for a resolved run.
    ///
    /// Resolution order: the outcome-specific climax field, then the first
    /// neutral climax line, then nothing.
    pub fn final_line(&self, outcome: OutcomeCategory) -> Option<&str> {
        self.climax
            .explicit_line(outcome)
            .or_else(|| self.climax.lines().first().map(String::as_str))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn path_with(climax: Climax) -> NarrativePath {
        NarrativePath {
            setup: vec![String::from("s")],
            execution: vec![String::from("e")],
            climax,
            outcomes: default_outcomes(),
        }
    }

    #[test]
    fn array_climax_becomes_lines() {
        let value = json!(["a", "b"]);
        let climax = Climax::from_value(Some(&value));
        assert_eq!(climax.lines(), ["a", "b"]);
        assert_eq!(climax.success(), None);
        assert_eq!(climax.fail(), None);
        assert_eq!(climax.caught(), None);
    }

    #[test]
    fn object_climax_copies_fields() {
        let value = json!({"success": "s", "fail": "f"});
        let climax = Climax::from_value(Some(&value));
        assert!(climax.lines().is_empty());
        assert_eq!(climax.success(), Some("s"));
        assert_eq!(climax.fail(), Some("f"));
        assert_eq!(climax.caught(), None);
    }

    #[test]
    fn other_shapes_yield_none() {
        assert_eq!(Climax::from_value(None), Climax::None);
        assert_eq!(Climax::from_value(Some(&json!("just a string"))), Climax::None);
        assert_eq!(Climax::from_value(Some(&json!(42))), Climax::None);
        assert_eq!(Climax::from_value(Some(&Value::Null)), Climax::None);
    }

    #[test]
    fn non_string_entries_are_ignored() {
        let climax = Climax::from_value(Some(&json!(["a", 3, null, "b"])));
        assert_eq!(climax.lines(), ["a", "b"]);

        let climax = Climax::from_value(Some(&json!({"success": 1, "caught": "c"})));
        assert_eq!(climax.success(), None);
        assert_eq!(climax.caught(), Some("c"));
    }

    #[test]
    fn final_line_prefers_explicit_field() {
        let path = path_with(Climax::ByOutcome {
            success: Some(String::from("won")),
            fail: Some(String::from("lost")),
            caught: Some(String::from("cuffed")),
        });
        assert_eq!(path.final_line(OutcomeCategory::Success), Some("won"));
        assert_eq!(path.final_line(OutcomeCategory::Fail), Some("lost"));
        assert_eq!(path.final_line(OutcomeCategory::Caught), Some("cuffed"));
        assert_eq!(path.final_line(OutcomeCategory::Partial), None);
    }

    #[test]
    fn caught_falls_back_to_fail_line() {
        let path = path_with(Climax::ByOutcome {
            success: None,
            fail: Some(String::from("lost")),
            caught: None,
        });
        assert_eq!(path.final_line(OutcomeCategory::Caught), Some("lost"));
        assert_eq!(path.final_line(OutcomeCategory::Success), None);
    }

    #[test]
    fn final_line_falls_back_to_first_climax_line() {
        let path = path_with(Climax::Lines(vec![
            String::from("first"),
            String::from("second"),
        ]));
        for outcome in [
            OutcomeCategory::Success,
            OutcomeCategory::Partial,
            OutcomeCategory::Fail,
            OutcomeCategory::Caught,
        ] {
            assert_eq!(path.final_line(outcome), Some("first"));
        }
    }

    #[test]
    fn final_line_absent_without_climax() {
        let path = path_with(Climax::None);
        assert_eq!(path.final_line(OutcomeCategory::Success), None);
    }

    #[test]
    fn playable_requires_setup_or_execution() {
        let mut path = path_with(Climax::None);
        assert!(path.is_playable());
        path.setup.clear();
        assert!(path.is_playable());
        path.execution.clear();
        assert!(!path.is_playable());
    }

    #[test]
    fn total_weight_sums_entries() {
        let mut path = path_with(Climax::None);
        path.outcomes = vec![
            WeightedOutcome::new(OutcomeCategory::Success, 60),
            WeightedOutcome::new(OutcomeCategory::Caught, 40),
        ];
        assert_eq!(path.total_weight(), 100);
    }
}
