// RAM Policy and Supervisor State

use serde::{Deserialize, Serialize};

use super::error::DomainError;

/// Memory hysteresis policy.
///
/// Pausing is forced when usage strictly exceeds `threshold`; resuming is
/// permitted only when usage is strictly below `safe`. The band
/// `[safe, threshold]` is a dead zone where no transition happens, which
/// keeps the supervisor from toggling around a single cutoff.
///
/// Only constructible through `new`, so an inverted pair cannot exist.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RamPolicy {
    threshold: f32,
    safe: f32,
}

impl RamPolicy {
    /// Build a validated policy. `safe` must be strictly below
    /// `threshold`, and both must be percentages in `[0, 100]`.
    pub fn new(threshold: f32, safe: f32) -> Result<Self, DomainError> {
        for pct in [threshold, safe] {
            if !(0.0..=100.0).contains(&pct) {
                return Err(DomainError::PercentOutOfRange(pct));
            }
        }
        if safe >= threshold {
            return Err(DomainError::InvertedRamPolicy { safe, threshold });
        }
        Ok(Self { threshold, safe })
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn safe(&self) -> f32 {
        self.safe
    }

    /// Strict comparison: usage exactly at the threshold is not critical.
    pub fn is_critical(&self, ram_percent: f32) -> bool {
        ram_percent > self.threshold
    }

    /// Resuming requires usage strictly below the safe mark.
    pub fn is_safe(&self, ram_percent: f32) -> bool {
        ram_percent < self.safe
    }
}

/// Whether the supervised project set is currently active.
///
/// Transitions happen only inside the supervisor loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SupervisorState {
    Stopped,
    Running,
}

impl std::fmt::Display for SupervisorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SupervisorState::Stopped => write!(f, "STOPPED"),
            SupervisorState::Running => write!(f, "RUNNING"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_inverted_policy() {
        assert!(RamPolicy::new(80.0, 90.0).is_err());
        assert!(RamPolicy::new(90.0, 90.0).is_err());
        assert!(RamPolicy::new(90.0, 80.0).is_ok());
    }

    #[test]
    fn rejects_out_of_range_percentages() {
        assert!(RamPolicy::new(120.0, 80.0).is_err());
        assert!(RamPolicy::new(90.0, -1.0).is_err());
    }

    #[test]
    fn threshold_comparison_is_strict() {
        let policy = RamPolicy::new(90.0, 80.0).unwrap();
        assert!(!policy.is_critical(90.0));
        assert!(policy.is_critical(90.1));
    }

    #[test]
    fn hysteresis_band_is_neither_critical_nor_safe() {
        let policy = RamPolicy::new(90.0, 80.0).unwrap();
        assert!(!policy.is_critical(85.0));
        assert!(!policy.is_safe(85.0));
        assert!(policy.is_safe(79.9));
    }
}
