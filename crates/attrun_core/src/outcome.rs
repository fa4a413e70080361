//! Outcome vocabulary.

use serde::{Deserialize, Serialize};

/// Outcome visible to running test code through the context.
///
/// Mirrors the interop enum so values can be compared by name from either layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitTestOutcome {
    Failed,
    Inconclusive,
    Passed,
    InProgress,
    Error,
    Timeout,
    Aborted,
    Unknown,
    NotRunnable,
}

impl UnitTestOutcome {
    /// Parse the interop spelling of an outcome (e.g. `"InProgress"`).
    pub fn from_name(name: &str) -> Option<Self> {
        let outcome = match name {
            "Failed" => UnitTestOutcome::Failed,
            "Inconclusive" => UnitTestOutcome::Inconclusive,
            "Passed" => UnitTestOutcome::Passed,
            "InProgress" => UnitTestOutcome::InProgress,
            "Error" => UnitTestOutcome::Error,
            "Timeout" => UnitTestOutcome::Timeout,
            "Aborted" => UnitTestOutcome::Aborted,
            "Unknown" => UnitTestOutcome::Unknown,
            "NotRunnable" => UnitTestOutcome::NotRunnable,
            _ => return None,
        };
        Some(outcome)
    }
}

impl std::fmt::Display for UnitTestOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Reported outcome of a single test method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TestOutcome {
    Passed,
    Failed,
    Ignored,
}

impl From<TestOutcome> for UnitTestOutcome {
    fn from(outcome: TestOutcome) -> Self {
        match outcome {
            TestOutcome::Passed => UnitTestOutcome::Passed,
            TestOutcome::Failed => UnitTestOutcome::Failed,
            TestOutcome::Ignored => UnitTestOutcome::NotRunnable,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip_through_display() {
        for outcome in [
            UnitTestOutcome::Failed,
            UnitTestOutcome::InProgress,
            UnitTestOutcome::NotRunnable,
        ] {
            assert_eq!(UnitTestOutcome::from_name(&outcome.to_string()), Some(outcome));
        }
        assert_eq!(UnitTestOutcome::from_name("passed"), None);
    }

    #[test]
    fn ignored_maps_to_not_runnable() {
        assert_eq!(UnitTestOutcome::from(TestOutcome::Ignored), UnitTestOutcome::NotRunnable);
    }
}
