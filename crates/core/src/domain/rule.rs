// Heavy Process Rule Domain Model

use serde::{Deserialize, Serialize};

/// A trigger condition: while any live OS process name contains `process`
/// (case-insensitive substring), supervised projects must be paused.
///
/// `name` is the display label used in logs and the rule's key in scan
/// results; `process` is the OS process-name fragment to match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeavyProcessRule {
    pub name: String,
    pub process: String,
}

impl HeavyProcessRule {
    pub fn new(name: impl Into<String>, process: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            process: process.into(),
        }
    }

    /// Case-insensitive substring test against an already-lowercased
    /// process name.
    pub fn matches_lowercase(&self, process_name: &str) -> bool {
        process_name.contains(&self.process.to_lowercase())
    }
}
