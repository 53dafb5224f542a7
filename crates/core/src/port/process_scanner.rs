// Process table scanning port

use std::collections::HashMap;

use async_trait::async_trait;

use crate::domain::HeavyProcessRule;

/// Queries the OS process table.
#[async_trait]
pub trait ProcessScanner: Send + Sync {
    /// Check which heavy-process rules currently match a live process.
    ///
    /// Enumerates the process table once; a rule maps to `true` if any
    /// process name contains the rule's `process` fragment
    /// (case-insensitive). Every rule's `name` appears in the result;
    /// an empty rule list yields an empty map. Processes that vanish or
    /// deny access mid-scan are skipped, never failing the whole scan.
    async fn find_active(&self, rules: &[HeavyProcessRule]) -> HashMap<String, bool>;

    /// Whether a process with this PID is still present in the table.
    /// Used by the dead-process sweep.
    fn is_alive(&self, pid: u32) -> bool;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::HashSet;
    use std::sync::{Arc, Mutex};

    /// Mock ProcessScanner over a settable fake process table
    pub struct MockProcessScanner {
        process_names: Arc<Mutex<Vec<String>>>,
        dead_pids: Arc<Mutex<HashSet<u32>>>,
    }

    impl MockProcessScanner {
        pub fn new() -> Self {
            Self {
                process_names: Arc::new(Mutex::new(Vec::new())),
                dead_pids: Arc::new(Mutex::new(HashSet::new())),
            }
        }

        /// Replace the fake process table
        pub fn set_processes(&self, names: &[&str]) {
            *self.process_names.lock().unwrap() =
                names.iter().map(|s| s.to_string()).collect();
        }

        /// Mark a PID as exited for `is_alive`
        pub fn mark_dead(&self, pid: u32) {
            self.dead_pids.lock().unwrap().insert(pid);
        }
    }

    impl Default for MockProcessScanner {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl ProcessScanner for MockProcessScanner {
        async fn find_active(&self, rules: &[HeavyProcessRule]) -> HashMap<String, bool> {
            let names = self.process_names.lock().unwrap();
            let mut status: HashMap<String, bool> =
                rules.iter().map(|r| (r.name.clone(), false)).collect();
            for name in names.iter() {
                let lower = name.to_lowercase();
                for rule in rules {
                    if rule.matches_lowercase(&lower) {
                        status.insert(rule.name.clone(), true);
                    }
                }
            }
            status
        }

        fn is_alive(&self, pid: u32) -> bool {
            !self.dead_pids.lock().unwrap().contains(&pid)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mocks::MockProcessScanner;
    use super::*;

    #[tokio::test]
    async fn matching_rule_maps_true_others_false() {
        let scanner = MockProcessScanner::new();
        scanner.set_processes(&["Explorer.exe", "FortniteClient-Win64-Shipping.exe"]);

        let rules = vec![
            HeavyProcessRule::new("Game", "fortniteclient"),
            HeavyProcessRule::new("Renderer", "blender"),
        ];
        let status = scanner.find_active(&rules).await;

        assert_eq!(status.get("Game"), Some(&true));
        assert_eq!(status.get("Renderer"), Some(&false));
    }

    #[tokio::test]
    async fn empty_rule_list_yields_empty_map() {
        let scanner = MockProcessScanner::new();
        scanner.set_processes(&["anything"]);
        assert!(scanner.find_active(&[]).await.is_empty());
    }
}
