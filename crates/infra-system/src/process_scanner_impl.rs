// Process table scanner implementation
// sysinfo for cross-platform process enumeration
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use sysinfo::System;
use tracing::debug;

use vigil_core::domain::HeavyProcessRule;
use vigil_core::port::ProcessScanner;

/// Process scanner backed by sysinfo
///
/// The process table is re-read on every call; sysinfo skips entries
/// that vanish or deny access mid-refresh, so one dying process never
/// fails a scan.
pub struct SystemProcessScanner {
    system: Arc<Mutex<System>>,
}

impl SystemProcessScanner {
    pub fn new() -> Self {
        Self {
            system: Arc::new(Mutex::new(System::new())),
        }
    }
}

impl Default for SystemProcessScanner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProcessScanner for SystemProcessScanner {
    async fn find_active(&self, rules: &[HeavyProcessRule]) -> HashMap<String, bool> {
        let mut status: HashMap<String, bool> =
            rules.iter().map(|r| (r.name.clone(), false)).collect();
        if rules.is_empty() {
            return status;
        }

        let mut sys = self.system.lock().unwrap();
        sys.refresh_processes();

        for process in sys.processes().values() {
            let name = process.name().to_lowercase();
            for rule in rules {
                if rule.matches_lowercase(&name) {
                    status.insert(rule.name.clone(), true);
                }
            }
        }

        let active = status.values().filter(|v| **v).count();
        debug!(rules = rules.len(), active, "Process table scanned");
        status
    }

    fn is_alive(&self, pid: u32) -> bool {
        #[cfg(unix)]
        {
            use nix::sys::signal::kill;
            use nix::unistd::Pid;

            // Signal 0 checks existence without actually sending a signal
            kill(Pid::from_raw(pid as i32), None).is_ok()
        }

        #[cfg(windows)]
        {
            let mut sys = self.system.lock().unwrap();
            sys.refresh_process(sysinfo::Pid::from_u32(pid))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn empty_rule_list_yields_empty_map() {
        let scanner = SystemProcessScanner::new();
        assert!(scanner.find_active(&[]).await.is_empty());
    }

    #[tokio::test]
    async fn absent_process_maps_false() {
        let scanner = SystemProcessScanner::new();
        let rules = vec![HeavyProcessRule::new(
            "Ghost",
            "no-such-process-zzz-vigil-test",
        )];
        let status = scanner.find_active(&rules).await;
        assert_eq!(status.get("Ghost"), Some(&false));
    }

    #[test]
    fn current_process_is_alive() {
        let scanner = SystemProcessScanner::new();
        assert!(scanner.is_alive(std::process::id()));
    }
}
