// Process tree termination port

use async_trait::async_trait;
use thiserror::Error;

use super::launcher::ProcessHandle;

#[derive(Error, Debug)]
pub enum TerminateError {
    #[error("failed to kill pid {pid}: {reason}")]
    KillFailed { pid: u32, reason: String },
}

/// Force-terminates a process tree rooted at a handle's PID.
#[async_trait]
pub trait ProcessTreeTerminator: Send + Sync {
    /// Enumerate all descendants of the handle's PID and force-kill them
    /// children-before-parent, then kill the root. A PID that no longer
    /// exists is silently Ok; partial kill failures are reported so the
    /// caller can log and move on to the remaining handles.
    async fn terminate_tree(&self, handle: &ProcessHandle) -> Result<(), TerminateError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Mock terminator recording every terminated PID
    pub struct MockTerminator {
        terminated: Arc<Mutex<Vec<u32>>>,
        failing: Arc<Mutex<bool>>,
    }

    impl MockTerminator {
        pub fn new() -> Self {
            Self {
                terminated: Arc::new(Mutex::new(Vec::new())),
                failing: Arc::new(Mutex::new(false)),
            }
        }

        pub fn terminated(&self) -> Vec<u32> {
            self.terminated.lock().unwrap().clone()
        }

        /// Make subsequent terminations report a kill failure
        pub fn set_failing(&self, failing: bool) {
            *self.failing.lock().unwrap() = failing;
        }
    }

    impl Default for MockTerminator {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl ProcessTreeTerminator for MockTerminator {
        async fn terminate_tree(&self, handle: &ProcessHandle) -> Result<(), TerminateError> {
            self.terminated.lock().unwrap().push(handle.pid);
            if *self.failing.lock().unwrap() {
                return Err(TerminateError::KillFailed {
                    pid: handle.pid,
                    reason: "mock kill failure".to_string(),
                });
            }
            Ok(())
        }
    }
}
