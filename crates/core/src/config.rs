// Supervisor Configuration Record
//
// Plain structured record consumed by the core. File loading lives in the
// daemon (strict vs permissive); the core can always be constructed from
// in-memory values, bypassing any file.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::{DomainError, HeavyProcessRule, Project, RamPolicy};

/// Default memory threshold forcing a pause (percent)
pub const DEFAULT_RAM_THRESHOLD: f32 = 95.0;

/// Default memory mark below which resuming is permitted (percent)
pub const DEFAULT_RAM_SAFE: f32 = 85.0;

/// Default poll interval (seconds)
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;

/// One configured project entry: a display name and a launchable path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectEntry {
    pub name: String,
    pub path: String,
}

/// Supervisor configuration as it appears on disk (or in memory).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SupervisorConfig {
    pub projects: Vec<ProjectEntry>,
    pub heavy_processes: Vec<HeavyProcessRule>,
    pub ram_threshold: f32,
    pub ram_safe: f32,
    pub poll_interval_secs: u64,
    pub log_level: Option<String>,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            projects: Vec::new(),
            heavy_processes: Vec::new(),
            ram_threshold: DEFAULT_RAM_THRESHOLD,
            ram_safe: DEFAULT_RAM_SAFE,
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            log_level: None,
        }
    }
}

impl SupervisorConfig {
    /// Projects with their launch kind resolved from the path suffix.
    pub fn projects(&self) -> Vec<Project> {
        self.projects
            .iter()
            .map(|p| Project::new(p.name.clone(), p.path.clone()))
            .collect()
    }

    pub fn heavy_process_rules(&self) -> Vec<HeavyProcessRule> {
        self.heavy_processes.clone()
    }

    /// Validated hysteresis policy. An inverted or out-of-range pair is a
    /// construction-time error, surfaced to the caller.
    pub fn ram_policy(&self) -> Result<RamPolicy, DomainError> {
        RamPolicy::new(self.ram_threshold, self.ram_safe)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ProjectKind;

    #[test]
    fn defaults_are_permissive_and_valid() {
        let config = SupervisorConfig::default();
        assert!(config.projects.is_empty());
        assert!(config.heavy_processes.is_empty());
        assert!(config.ram_policy().is_ok());
        assert_eq!(config.poll_interval(), Duration::from_secs(5));
    }

    #[test]
    fn inverted_thresholds_fail_at_construction() {
        let config = SupervisorConfig {
            ram_threshold: 80.0,
            ram_safe: 90.0,
            ..Default::default()
        };
        assert!(config.ram_policy().is_err());
    }

    #[test]
    fn kinds_resolve_during_conversion() {
        let config = SupervisorConfig {
            projects: vec![
                ProjectEntry {
                    name: "bot".to_string(),
                    path: "/srv/bot/main.py".to_string(),
                },
                ProjectEntry {
                    name: "notes".to_string(),
                    path: "/srv/notes/readme.md".to_string(),
                },
            ],
            ..Default::default()
        };
        let projects = config.projects();
        assert_eq!(projects[0].kind, ProjectKind::PythonScript);
        assert_eq!(projects[1].kind, ProjectKind::Unsupported);
    }

    #[test]
    fn poll_interval_is_clamped_to_at_least_one_second() {
        let config = SupervisorConfig {
            poll_interval_secs: 0,
            ..Default::default()
        };
        assert_eq!(config.poll_interval(), Duration::from_secs(1));
    }

    #[test]
    fn deserializes_from_yaml_with_defaults() {
        let yaml = r#"
projects:
  - name: bot
    path: /srv/bot/main.py
heavy_processes:
  - name: Game
    process: fortniteclient
ram_threshold: 90
ram_safe: 80
"#;
        let config: SupervisorConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.projects.len(), 1);
        assert_eq!(config.heavy_processes[0].process, "fortniteclient");
        assert_eq!(config.ram_threshold, 90.0);
        assert_eq!(config.poll_interval_secs, DEFAULT_POLL_INTERVAL_SECS);
    }
}
