// Supervisor constants (no magic values in the loop body)
use std::time::Duration;

/// Sleep after an unexpected cycle error before polling again (1s)
pub const ERROR_RECOVERY_SLEEP_DURATION: Duration = Duration::from_secs(1);

/// Bound on the shutdown-time termination pass, so a stuck kill cannot
/// hold up process exit (5s)
pub const SHUTDOWN_TERMINATE_TIMEOUT: Duration = Duration::from_secs(5);
