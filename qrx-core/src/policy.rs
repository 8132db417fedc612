use serde::{Deserialize, Serialize};

/// What to do when the same path/index arrives more than once.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicatePolicy {
    /// Later input overwrites earlier input.
    #[default]
    LastWins,
    FirstWins,
    /// Identical duplicates are tolerated; differing data abandons the file.
    Strict,
}

/// What to do when chunks of one path declare different totals.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TotalPolicy {
    /// Adopt the largest declared total.
    #[default]
    MaxObserved,
    /// Abandon the file.
    Strict,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodePolicy {
    pub duplicates: DuplicatePolicy,
    pub totals: TotalPolicy,
}

impl DecodePolicy {
    /// Strict on both axes: never guess, ask for a re-scan instead.
    pub fn strict() -> Self {
        Self {
            duplicates: DuplicatePolicy::Strict,
            totals: TotalPolicy::Strict,
        }
    }
}
