// Memory probe implementation
// sysinfo for cross-platform memory accounting
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use sysinfo::System;
use tracing::debug;

use vigil_core::port::{MemoryProbe, SensorError};

/// Memory probe backed by sysinfo: one refresh per reading, no caching
pub struct SystemMemoryProbe {
    system: Arc<Mutex<System>>,
}

impl SystemMemoryProbe {
    pub fn new() -> Self {
        Self {
            system: Arc::new(Mutex::new(System::new())),
        }
    }
}

impl Default for SystemMemoryProbe {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MemoryProbe for SystemMemoryProbe {
    async fn memory_percent(&self) -> Result<f32, SensorError> {
        let mut sys = self.system.lock().unwrap();
        sys.refresh_memory();

        let total = sys.total_memory();
        if total == 0 {
            return Err(SensorError::QueryFailed(
                "total memory reported as zero".to_string(),
            ));
        }

        let percent = (sys.used_memory() as f64 / total as f64 * 100.0) as f32;
        debug!(ram_percent = percent, "Memory sampled");
        Ok(percent.clamp(0.0, 100.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reading_is_a_percentage() {
        let probe = SystemMemoryProbe::new();
        let percent = probe.memory_percent().await.unwrap();
        assert!((0.0..=100.0).contains(&percent));
    }

    #[tokio::test]
    async fn consecutive_readings_do_not_fail() {
        let probe = SystemMemoryProbe::new();
        for _ in 0..3 {
            probe.memory_percent().await.unwrap();
        }
    }
}
