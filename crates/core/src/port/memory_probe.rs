// Memory utilization port

use async_trait::async_trait;
use thiserror::Error;

/// Transient sensor failure. The supervisor logs it, skips the cycle's
/// effect, and retries on the next poll; it never aborts supervision.
#[derive(Error, Debug)]
pub enum SensorError {
    #[error("memory query failed: {0}")]
    QueryFailed(String),
}

/// Reads current physical-memory utilization.
///
/// One OS query per call, no caching, no side effects.
#[async_trait]
pub trait MemoryProbe: Send + Sync {
    /// Percentage of total physical memory in use, in `[0, 100]`.
    async fn memory_percent(&self) -> Result<f32, SensorError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Mock MemoryProbe with a settable reading
    pub struct MockMemoryProbe {
        percent: Arc<Mutex<f32>>,
        failing: Arc<Mutex<bool>>,
    }

    impl MockMemoryProbe {
        pub fn new(percent: f32) -> Self {
            Self {
                percent: Arc::new(Mutex::new(percent)),
                failing: Arc::new(Mutex::new(false)),
            }
        }

        pub fn set_percent(&self, percent: f32) {
            *self.percent.lock().unwrap() = percent;
        }

        /// Make subsequent reads fail, to exercise the skip-cycle path
        pub fn set_failing(&self, failing: bool) {
            *self.failing.lock().unwrap() = failing;
        }
    }

    #[async_trait]
    impl MemoryProbe for MockMemoryProbe {
        async fn memory_percent(&self) -> Result<f32, SensorError> {
            if *self.failing.lock().unwrap() {
                return Err(SensorError::QueryFailed("mock sensor down".to_string()));
            }
            Ok(*self.percent.lock().unwrap())
        }
    }
}
