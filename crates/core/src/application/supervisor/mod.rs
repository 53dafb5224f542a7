// Supervisor - resource-aware poll loop over the supervised project set

pub mod constants;
mod panic_guard;
mod shutdown;

use constants::*;
pub use panic_guard::{execute_guarded, PanicGuardResult};
pub use shutdown::{shutdown_channel, ShutdownSender, ShutdownToken};

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::config::SupervisorConfig;
use crate::domain::{HeavyProcessRule, Project, ProjectKind, RamPolicy, SupervisorState};
use crate::error::{AppError, Result};
use crate::port::{
    LifecycleHooks, MemoryProbe, ProcessHandle, ProcessScanner, ProcessTreeTerminator,
    ProjectLauncher,
};

/// Supervises configured projects against heavy-process and memory
/// pressure.
///
/// One cooperative control task: poll sensors, apply the hysteresis
/// policy, drive the launcher/terminator, sleep, repeat. The handle set
/// and state are owned exclusively by this struct; nothing else mutates
/// them, so no locking is involved.
pub struct Supervisor {
    projects: Vec<Project>,
    rules: Vec<HeavyProcessRule>,
    policy: RamPolicy,
    poll_interval: Duration,
    scanner: Arc<dyn ProcessScanner>,
    memory_probe: Arc<dyn MemoryProbe>,
    launcher: Arc<dyn ProjectLauncher>,
    terminator: Arc<dyn ProcessTreeTerminator>,
    hooks: Arc<dyn LifecycleHooks>,
    active_handles: Vec<ProcessHandle>,
    state: SupervisorState,
}

impl Supervisor {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        projects: Vec<Project>,
        rules: Vec<HeavyProcessRule>,
        policy: RamPolicy,
        poll_interval: Duration,
        scanner: Arc<dyn ProcessScanner>,
        memory_probe: Arc<dyn MemoryProbe>,
        launcher: Arc<dyn ProjectLauncher>,
        terminator: Arc<dyn ProcessTreeTerminator>,
        hooks: Arc<dyn LifecycleHooks>,
    ) -> Self {
        Self {
            projects,
            rules,
            policy,
            poll_interval,
            scanner,
            memory_probe,
            launcher,
            terminator,
            hooks,
            active_handles: Vec::new(),
            state: SupervisorState::Stopped,
        }
    }

    /// Build a supervisor straight from an in-memory configuration record.
    /// Policy validation happens here, at construction time.
    pub fn from_config(
        config: &SupervisorConfig,
        scanner: Arc<dyn ProcessScanner>,
        memory_probe: Arc<dyn MemoryProbe>,
        launcher: Arc<dyn ProjectLauncher>,
        terminator: Arc<dyn ProcessTreeTerminator>,
        hooks: Arc<dyn LifecycleHooks>,
    ) -> Result<Self> {
        let policy = config.ram_policy()?;
        Ok(Self::new(
            config.projects(),
            config.heavy_process_rules(),
            policy,
            config.poll_interval(),
            scanner,
            memory_probe,
            launcher,
            terminator,
            hooks,
        ))
    }

    pub fn state(&self) -> SupervisorState {
        self.state
    }

    pub fn active_handles(&self) -> &[ProcessHandle] {
        &self.active_handles
    }

    /// Run until shutdown is signalled or a fatal condition ends
    /// supervision. On any exit path, tracked process trees are
    /// terminated best-effort before returning.
    pub async fn run(&mut self, mut shutdown: ShutdownToken) -> Result<()> {
        info!(
            projects = self.projects.len(),
            rules = self.rules.len(),
            poll_interval_secs = self.poll_interval.as_secs(),
            "Supervisor starting"
        );

        let outcome = self.run_loop(&mut shutdown).await;

        if !self.active_handles.is_empty() {
            if tokio::time::timeout(SHUTDOWN_TERMINATE_TIMEOUT, self.terminate_all())
                .await
                .is_err()
            {
                warn!("Termination pass timed out during shutdown");
            }
        }
        info!("Supervisor stopped");
        outcome
    }

    async fn run_loop(&mut self, shutdown: &mut ShutdownToken) -> Result<()> {
        self.start().await?;

        loop {
            if shutdown.is_shutdown() {
                info!("Shutdown requested, leaving poll loop");
                return Ok(());
            }
            tokio::select! {
                _ = sleep(self.poll_interval) => {}
                _ = shutdown.wait() => {
                    info!("Shutdown requested, leaving poll loop");
                    return Ok(());
                }
            }
            match self.poll_once().await {
                Ok(()) => {}
                Err(e @ AppError::NothingToSupervise(_)) => {
                    error!(error = %e, "Fatal condition, ending supervision");
                    return Err(e);
                }
                Err(e) => {
                    // Transient: keep the polling cadence alive
                    error!(error = %e, "Cycle failed, retrying next poll");
                    sleep(ERROR_RECOVERY_SLEEP_DURATION).await;
                }
            }
        }
    }

    /// Pre-loop check: launch immediately only when no trigger condition
    /// holds. A held-off start is a delay, never a cancellation; the
    /// normal resume rule applies on later cycles.
    pub async fn start(&mut self) -> Result<()> {
        let detected = self.detected_heavy().await;

        let ram_percent = match self.memory_probe.memory_percent().await {
            Ok(pct) => pct,
            Err(e) => {
                warn!(
                    error = %e,
                    "Memory probe failed at startup; projects start once a poll succeeds"
                );
                self.state = SupervisorState::Stopped;
                return Ok(());
            }
        };

        if !detected.is_empty() {
            info!(
                processes = ?detected,
                "Heavy processes already running; projects start once the system is clear"
            );
            self.state = SupervisorState::Stopped;
        } else if self.policy.is_critical(ram_percent) {
            info!(
                ram_percent,
                threshold = self.policy.threshold(),
                "Memory already critical; projects start once usage drops"
            );
            self.state = SupervisorState::Stopped;
        } else {
            self.launch_all().await;
            self.state = SupervisorState::Running;
            self.ensure_supervisable()?;
        }
        Ok(())
    }

    /// One cycle: read sensors, evaluate the policy, transition if needed.
    pub async fn poll_once(&mut self) -> Result<()> {
        let detected = self.detected_heavy().await;

        let ram_percent = match self.memory_probe.memory_percent().await {
            Ok(pct) => pct,
            Err(e) => {
                warn!(error = %e, "Memory probe failed, skipping this cycle");
                return Ok(());
            }
        };

        let heavy_active = !detected.is_empty();
        let ram_critical = self.policy.is_critical(ram_percent);

        match self.state {
            SupervisorState::Running if heavy_active || ram_critical => {
                if heavy_active {
                    warn!(processes = ?detected, "Pausing projects: heavy processes detected");
                } else {
                    warn!(
                        ram_percent,
                        threshold = self.policy.threshold(),
                        "Pausing projects: memory usage critical"
                    );
                }
                self.terminate_all().await;
                self.state = SupervisorState::Stopped;
            }
            SupervisorState::Stopped
                if !heavy_active && !ram_critical && self.policy.is_safe(ram_percent) =>
            {
                info!(ram_percent, "System stable, starting projects");
                self.launch_all().await;
                self.state = SupervisorState::Running;
                self.ensure_supervisable()?;
            }
            SupervisorState::Running => {
                self.sweep_dead();
                self.ensure_supervisable()?;
            }
            // Stopped with a trigger still active, or inside the
            // hysteresis band: deliberately no transition.
            SupervisorState::Stopped => {}
        }
        Ok(())
    }

    /// Names of heavy-process rules that currently match a live process.
    async fn detected_heavy(&self) -> Vec<String> {
        self.scanner
            .find_active(&self.rules)
            .await
            .into_iter()
            .filter(|(_, active)| *active)
            .map(|(name, _)| name)
            .collect()
    }

    /// Launch every configured project, skipping unsupported kinds and
    /// isolating per-project failures. Fires the resume hook once after
    /// the batch commits.
    async fn launch_all(&mut self) {
        let mut launched = Vec::new();
        for project in &self.projects {
            if project.kind == ProjectKind::Unsupported {
                warn!(
                    project = %project.name,
                    path = %project.path.display(),
                    "Skipping project with unsupported path suffix"
                );
                continue;
            }
            match self.launcher.launch(project).await {
                Ok(handle) => {
                    info!(project = %project.name, pid = handle.pid, "Project started");
                    launched.push(handle);
                }
                Err(e) => {
                    error!(
                        project = %project.name,
                        error = %e,
                        "Failed to start project, continuing with the rest"
                    );
                }
            }
        }
        self.active_handles.extend(launched);

        let hooks = Arc::clone(&self.hooks);
        let _ = execute_guarded(AssertUnwindSafe(move || hooks.on_resume()));
    }

    /// Terminate every tracked process tree. The handle set is cleared
    /// unconditionally; per-handle failures are logged and do not stop
    /// the rest. Fires the pause hook once after all terminations
    /// attempted.
    pub async fn terminate_all(&mut self) {
        let handles = std::mem::take(&mut self.active_handles);
        if !handles.is_empty() {
            info!(count = handles.len(), "Terminating supervised process trees");
        }
        for handle in &handles {
            match self.terminator.terminate_tree(handle).await {
                Ok(()) => {
                    info!(project = %handle.project, pid = handle.pid, "Process tree terminated");
                }
                Err(e) => {
                    warn!(
                        project = %handle.project,
                        pid = handle.pid,
                        error = %e,
                        "Termination failed, continuing with remaining handles"
                    );
                }
            }
        }

        let hooks = Arc::clone(&self.hooks);
        let _ = execute_guarded(AssertUnwindSafe(move || hooks.on_pause()));
    }

    /// Drop handles whose root process has exited on its own.
    fn sweep_dead(&mut self) {
        let scanner = Arc::clone(&self.scanner);
        self.active_handles.retain(|handle| {
            let alive = scanner.is_alive(handle.pid);
            if !alive {
                warn!(
                    project = %handle.project,
                    pid = handle.pid,
                    "Project exited on its own, dropping handle"
                );
            }
            alive
        });
    }

    /// Fatal when RUNNING with nothing tracked: there is nothing left to
    /// supervise.
    fn ensure_supervisable(&self) -> Result<()> {
        if self.state == SupervisorState::Running && self.active_handles.is_empty() {
            return Err(AppError::NothingToSupervise(
                "no project is running; every launch failed, was skipped, or the process exited"
                    .to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::hooks::mocks::{CountingHooks, PanickingHooks};
    use crate::port::launcher::mocks::MockLauncher;
    use crate::port::memory_probe::mocks::MockMemoryProbe;
    use crate::port::process_scanner::mocks::MockProcessScanner;
    use crate::port::terminator::mocks::MockTerminator;

    struct Harness {
        scanner: Arc<MockProcessScanner>,
        probe: Arc<MockMemoryProbe>,
        launcher: Arc<MockLauncher>,
        terminator: Arc<MockTerminator>,
        hooks: Arc<CountingHooks>,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                scanner: Arc::new(MockProcessScanner::new()),
                probe: Arc::new(MockMemoryProbe::new(50.0)),
                launcher: Arc::new(MockLauncher::new()),
                terminator: Arc::new(MockTerminator::new()),
                hooks: Arc::new(CountingHooks::new()),
            }
        }

        fn supervisor(&self, projects: Vec<Project>, rules: Vec<HeavyProcessRule>) -> Supervisor {
            Supervisor::new(
                projects,
                rules,
                RamPolicy::new(90.0, 80.0).unwrap(),
                Duration::from_secs(5),
                self.scanner.clone(),
                self.probe.clone(),
                self.launcher.clone(),
                self.terminator.clone(),
                self.hooks.clone(),
            )
        }
    }

    fn one_project() -> Vec<Project> {
        vec![Project::new("bot", "/srv/bot/main.py")]
    }

    #[tokio::test]
    async fn starts_stopped_when_ram_above_threshold() {
        let h = Harness::new();
        h.probe.set_percent(91.0);
        let mut sup = h.supervisor(one_project(), vec![]);

        sup.start().await.unwrap();

        assert_eq!(sup.state(), SupervisorState::Stopped);
        assert!(h.launcher.launched().is_empty());
    }

    #[tokio::test]
    async fn starts_stopped_when_heavy_process_present() {
        let h = Harness::new();
        h.scanner.set_processes(&["FortniteClient-Win64-Shipping.exe"]);
        let mut sup = h.supervisor(
            one_project(),
            vec![HeavyProcessRule::new("Game", "fortniteclient")],
        );

        sup.start().await.unwrap();

        assert_eq!(sup.state(), SupervisorState::Stopped);
        assert!(h.launcher.launched().is_empty());
    }

    #[tokio::test]
    async fn launches_all_when_system_is_clear() {
        let h = Harness::new();
        let mut sup = h.supervisor(one_project(), vec![]);

        sup.start().await.unwrap();

        assert_eq!(sup.state(), SupervisorState::Running);
        assert_eq!(sup.active_handles().len(), 1);
        assert_eq!(h.hooks.resumes(), 1);
    }

    #[tokio::test]
    async fn no_transition_inside_hysteresis_band() {
        let h = Harness::new();
        let mut sup = h.supervisor(one_project(), vec![]);
        sup.start().await.unwrap();
        assert_eq!(sup.state(), SupervisorState::Running);

        // Band between safe (80) and threshold (90): nothing happens,
        // in either state.
        for pct in [80.0, 85.0, 90.0] {
            h.probe.set_percent(pct);
            sup.poll_once().await.unwrap();
            assert_eq!(sup.state(), SupervisorState::Running, "flapped at {pct}%");
        }
        assert!(h.terminator.terminated().is_empty());

        h.probe.set_percent(91.0);
        sup.poll_once().await.unwrap();
        assert_eq!(sup.state(), SupervisorState::Stopped);

        h.probe.set_percent(85.0);
        sup.poll_once().await.unwrap();
        assert_eq!(
            sup.state(),
            SupervisorState::Stopped,
            "resumed inside the band"
        );
    }

    #[tokio::test]
    async fn pauses_on_heavy_process_and_resumes_when_clear() {
        let h = Harness::new();
        let rules = vec![HeavyProcessRule::new("Game", "fortniteclient")];
        let mut sup = h.supervisor(one_project(), rules);
        sup.start().await.unwrap();
        let pid = sup.active_handles()[0].pid;

        h.scanner.set_processes(&["fortniteclient-win64-shipping.exe"]);
        sup.poll_once().await.unwrap();
        assert_eq!(sup.state(), SupervisorState::Stopped);
        assert_eq!(h.terminator.terminated(), vec![pid]);
        assert!(sup.active_handles().is_empty());
        assert_eq!(h.hooks.pauses(), 1);

        h.scanner.set_processes(&[]);
        sup.poll_once().await.unwrap();
        assert_eq!(sup.state(), SupervisorState::Running);
        assert_eq!(sup.active_handles().len(), 1);
        assert_eq!(h.hooks.resumes(), 2);
    }

    #[tokio::test]
    async fn terminate_all_twice_leaves_empty_set_and_does_not_fail() {
        let h = Harness::new();
        let mut sup = h.supervisor(one_project(), vec![]);
        sup.start().await.unwrap();

        sup.terminate_all().await;
        assert!(sup.active_handles().is_empty());

        // Second call over an empty set is a no-op
        sup.terminate_all().await;
        assert!(sup.active_handles().is_empty());
    }

    #[tokio::test]
    async fn kill_failure_still_clears_the_set() {
        let h = Harness::new();
        h.terminator.set_failing(true);
        let mut sup = h.supervisor(one_project(), vec![]);
        sup.start().await.unwrap();

        sup.terminate_all().await;
        assert!(sup.active_handles().is_empty());
    }

    #[tokio::test]
    async fn unsupported_suffix_is_skipped_without_aborting_the_batch() {
        let h = Harness::new();
        let projects = vec![
            Project::new("bot", "/srv/bot/main.py"),
            Project::new("settings", "/srv/thing/settings.cfg"),
            Project::new("web", "/srv/web/package.json"),
        ];
        let mut sup = h.supervisor(projects, vec![]);

        sup.start().await.unwrap();

        assert_eq!(h.launcher.launched(), vec!["bot", "web"]);
        assert_eq!(sup.active_handles().len(), 2);
    }

    #[tokio::test]
    async fn launch_failure_excludes_project_but_continues() {
        let h = Harness::new();
        h.launcher.fail_for("bot");
        let projects = vec![
            Project::new("bot", "/srv/bot/main.py"),
            Project::new("web", "/srv/web/package.json"),
        ];
        let mut sup = h.supervisor(projects, vec![]);

        sup.start().await.unwrap();

        assert_eq!(h.launcher.launched(), vec!["web"]);
        assert_eq!(sup.active_handles().len(), 1);
    }

    #[tokio::test]
    async fn all_launches_failing_is_fatal() {
        let h = Harness::new();
        h.launcher.fail_for("bot");
        let mut sup = h.supervisor(one_project(), vec![]);

        let result = sup.start().await;
        assert!(matches!(result, Err(AppError::NothingToSupervise(_))));
    }

    #[tokio::test]
    async fn sensor_error_skips_the_cycle_without_transition() {
        let h = Harness::new();
        let mut sup = h.supervisor(one_project(), vec![]);
        sup.start().await.unwrap();

        h.probe.set_failing(true);
        sup.poll_once().await.unwrap();
        assert_eq!(sup.state(), SupervisorState::Running);
        assert!(h.terminator.terminated().is_empty());
    }

    #[tokio::test]
    async fn sweep_drops_dead_handles_and_empty_set_is_fatal() {
        let h = Harness::new();
        let projects = vec![
            Project::new("bot", "/srv/bot/main.py"),
            Project::new("web", "/srv/web/package.json"),
        ];
        let mut sup = h.supervisor(projects, vec![]);
        sup.start().await.unwrap();
        let pids: Vec<u32> = sup.active_handles().iter().map(|x| x.pid).collect();

        h.scanner.mark_dead(pids[0]);
        sup.poll_once().await.unwrap();
        assert_eq!(sup.active_handles().len(), 1);

        h.scanner.mark_dead(pids[1]);
        let result = sup.poll_once().await;
        assert!(matches!(result, Err(AppError::NothingToSupervise(_))));
    }

    #[tokio::test]
    async fn panicking_hooks_are_swallowed() {
        let h = Harness::new();
        let mut sup = Supervisor::new(
            one_project(),
            vec![],
            RamPolicy::new(90.0, 80.0).unwrap(),
            Duration::from_secs(5),
            h.scanner.clone(),
            h.probe.clone(),
            h.launcher.clone(),
            h.terminator.clone(),
            Arc::new(PanickingHooks),
        );

        sup.start().await.unwrap();
        assert_eq!(sup.state(), SupervisorState::Running);

        h.probe.set_percent(95.0);
        sup.poll_once().await.unwrap();
        assert_eq!(sup.state(), SupervisorState::Stopped);
    }

    #[tokio::test]
    async fn run_terminates_tracked_trees_on_shutdown() {
        let h = Harness::new();
        let mut sup = h.supervisor(one_project(), vec![]);
        let (sender, token) = shutdown_channel();

        sender.shutdown();
        sup.run(token).await.unwrap();

        // Startup launched one project; shutdown must have torn it down.
        assert_eq!(h.launcher.launched().len(), 1);
        assert_eq!(h.terminator.terminated().len(), 1);
        assert!(sup.active_handles().is_empty());
    }
}
