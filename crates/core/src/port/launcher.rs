// Project launching port

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{Project, ProjectKind};

/// Handle to a spawned project's process-tree root.
///
/// Created by the launcher, owned exclusively by the supervisor,
/// invalidated when the tree is terminated or the root exits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessHandle {
    pub pid: u32,
    pub project: String,
}

impl ProcessHandle {
    pub fn new(pid: u32, project: impl Into<String>) -> Self {
        Self {
            pid,
            project: project.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum LaunchError {
    #[error("failed to spawn '{project}': {reason}")]
    SpawnFailed { project: String, reason: String },

    #[error("no pid available for spawned project '{0}'")]
    NoPid(String),

    // The supervisor filters unsupported kinds before calling the port;
    // this variant exists so a misrouted call still fails loudly.
    #[error("project '{project}' has unsupported kind {kind}")]
    UnsupportedKind { project: String, kind: ProjectKind },
}

/// Spawns one project as a detached process tree.
#[async_trait]
pub trait ProjectLauncher: Send + Sync {
    /// Start `project` according to its resolved kind and return a handle
    /// to the tree root. The child runs in its own process group/console,
    /// independent of the supervisor's.
    async fn launch(&self, project: &Project) -> Result<ProcessHandle, LaunchError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};

    /// Mock ProjectLauncher handing out sequential PIDs
    pub struct MockLauncher {
        next_pid: AtomicU32,
        launched: Arc<Mutex<Vec<String>>>,
        failing: Arc<Mutex<HashSet<String>>>,
    }

    impl MockLauncher {
        pub fn new() -> Self {
            Self {
                next_pid: AtomicU32::new(1000),
                launched: Arc::new(Mutex::new(Vec::new())),
                failing: Arc::new(Mutex::new(HashSet::new())),
            }
        }

        /// Names of projects launched so far, in order
        pub fn launched(&self) -> Vec<String> {
            self.launched.lock().unwrap().clone()
        }

        /// Make launches of this project fail with a spawn error
        pub fn fail_for(&self, project: &str) {
            self.failing.lock().unwrap().insert(project.to_string());
        }
    }

    impl Default for MockLauncher {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl ProjectLauncher for MockLauncher {
        async fn launch(&self, project: &Project) -> Result<ProcessHandle, LaunchError> {
            if project.kind == ProjectKind::Unsupported {
                return Err(LaunchError::UnsupportedKind {
                    project: project.name.clone(),
                    kind: project.kind,
                });
            }
            if self.failing.lock().unwrap().contains(&project.name) {
                return Err(LaunchError::SpawnFailed {
                    project: project.name.clone(),
                    reason: "mock spawn failure".to_string(),
                });
            }
            let pid = self.next_pid.fetch_add(1, Ordering::SeqCst);
            self.launched.lock().unwrap().push(project.name.clone());
            Ok(ProcessHandle::new(pid, project.name.clone()))
        }
    }
}
