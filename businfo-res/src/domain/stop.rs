//! Scheduled stops.

use super::StopTime;

/// One scheduled departure at a station.
///
/// `policy` is `None` when the stop follows the line's default circulation
/// policy, and holds the override otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Stop {
    pub time: StopTime,
    pub policy: Option<String>,
}

impl Stop {
    /// A stop running under the line's default policy.
    pub fn new(time: StopTime) -> Self {
        Self { time, policy: None }
    }

    /// A stop with an explicit circulation policy.
    pub fn with_policy(time: StopTime, policy: impl Into<String>) -> Self {
        Self {
            time,
            policy: Some(policy.into()),
        }
    }

    /// The policy text stored in the `stop` table; empty when defaulted.
    pub fn policy_text(&self) -> &str {
        self.policy.as_deref().unwrap_or("")
    }
}
