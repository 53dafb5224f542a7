// Lifecycle callback port

/// Caller-supplied pause/resume notifications.
///
/// `on_resume` fires exactly once after a launch batch commits;
/// `on_pause` exactly once after a terminate batch completes. The
/// supervisor invokes both through a panic guard, so a misbehaving hook
/// is logged and swallowed, never propagated.
pub trait LifecycleHooks: Send + Sync {
    fn on_pause(&self) {}
    fn on_resume(&self) {}
}

/// Default hooks: do nothing.
pub struct NoopHooks;

impl LifecycleHooks for NoopHooks {}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Hooks that count invocations
    pub struct CountingHooks {
        pauses: AtomicUsize,
        resumes: AtomicUsize,
    }

    impl CountingHooks {
        pub fn new() -> Self {
            Self {
                pauses: AtomicUsize::new(0),
                resumes: AtomicUsize::new(0),
            }
        }

        pub fn pauses(&self) -> usize {
            self.pauses.load(Ordering::SeqCst)
        }

        pub fn resumes(&self) -> usize {
            self.resumes.load(Ordering::SeqCst)
        }
    }

    impl Default for CountingHooks {
        fn default() -> Self {
            Self::new()
        }
    }

    impl LifecycleHooks for CountingHooks {
        fn on_pause(&self) {
            self.pauses.fetch_add(1, Ordering::SeqCst);
        }

        fn on_resume(&self) {
            self.resumes.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// Hooks that panic, for exercising the panic guard
    pub struct PanickingHooks;

    impl LifecycleHooks for PanickingHooks {
        fn on_pause(&self) {
            panic!("pause hook blew up");
        }

        fn on_resume(&self) {
            panic!("resume hook blew up");
        }
    }
}
