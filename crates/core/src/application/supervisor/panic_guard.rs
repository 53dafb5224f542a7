// Panic isolation for caller-supplied lifecycle hooks
use std::panic::catch_unwind;
use tracing::error;

/// Result of a panic-guarded execution
#[derive(Debug)]
pub enum PanicGuardResult<T> {
    /// Execution completed successfully
    Success(T),
    /// Execution panicked
    Panicked(String),
}

/// Execute a closure with panic isolation.
///
/// A panicking hook is caught, logged, and reported as
/// `PanicGuardResult::Panicked`; it never takes the supervisor down.
pub fn execute_guarded<F, T>(f: F) -> PanicGuardResult<T>
where
    F: FnOnce() -> T + std::panic::UnwindSafe,
{
    match catch_unwind(f) {
        Ok(result) => PanicGuardResult::Success(result),
        Err(panic_info) => {
            let panic_msg = if let Some(s) = panic_info.downcast_ref::<&str>() {
                s.to_string()
            } else if let Some(s) = panic_info.downcast_ref::<String>() {
                s.clone()
            } else {
                "Unknown panic".to_string()
            };

            error!(panic_msg = %panic_msg, "Guarded callback panicked");
            PanicGuardResult::Panicked(panic_msg)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn returns_value_on_success() {
        match execute_guarded(|| 42) {
            PanicGuardResult::Success(v) => assert_eq!(v, 42),
            PanicGuardResult::Panicked(msg) => panic!("unexpected panic: {msg}"),
        }
    }

    #[test]
    fn catches_panics_with_message() {
        let result: PanicGuardResult<()> = execute_guarded(|| panic!("boom"));
        match result {
            PanicGuardResult::Panicked(msg) => assert!(msg.contains("boom")),
            PanicGuardResult::Success(_) => panic!("panic was not caught"),
        }
    }
}
