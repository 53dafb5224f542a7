// Project launcher implementation
// tokio::process for spawning, detached from the supervisor's session
use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info};

use vigil_core::domain::{Project, ProjectKind};
use vigil_core::port::{LaunchError, ProcessHandle, ProjectLauncher};

/// Launcher dispatching on the project's pre-resolved kind
///
/// Children are spawned in their own process group (Unix session /
/// Windows console) with null stdio, so they survive independently of
/// the supervisor's terminal and root their own process trees. Dropped
/// child handles are reaped by the tokio runtime in the background;
/// teardown goes through the terminator, by PID.
pub struct SystemProjectLauncher;

impl SystemProjectLauncher {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SystemProjectLauncher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProjectLauncher for SystemProjectLauncher {
    async fn launch(&self, project: &Project) -> Result<ProcessHandle, LaunchError> {
        let mut command = match project.kind {
            ProjectKind::PythonScript => python_command(project),
            ProjectKind::NodeProject => node_command(project),
            ProjectKind::NativeExecutable => native_command(project),
            ProjectKind::Unsupported => {
                return Err(LaunchError::UnsupportedKind {
                    project: project.name.clone(),
                    kind: project.kind,
                })
            }
        };

        detach(&mut command);
        command
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        let child = command.spawn().map_err(|e| LaunchError::SpawnFailed {
            project: project.name.clone(),
            reason: e.to_string(),
        })?;

        let pid = child
            .id()
            .ok_or_else(|| LaunchError::NoPid(project.name.clone()))?;

        info!(project = %project.name, pid, kind = %project.kind, "Spawned project");
        Ok(ProcessHandle::new(pid, project.name.clone()))
    }
}

/// Python scripts prefer a virtual-environment interpreter colocated with
/// the script, falling back to the ambient one.
fn python_command(project: &Project) -> Command {
    let dir = project.directory();
    let interpreter = venv_interpreter(&dir).unwrap_or_else(ambient_python);
    debug!(project = %project.name, interpreter = %interpreter.display(), "Resolved Python interpreter");

    let mut cmd = Command::new(interpreter);
    cmd.arg(&project.path).current_dir(dir);
    cmd
}

/// Node projects are started through the package manager's `start`
/// script, from the manifest's directory.
fn node_command(project: &Project) -> Command {
    let npm = if cfg!(windows) { "npm.cmd" } else { "npm" };
    let mut cmd = Command::new(npm);
    cmd.args(["run", "start"]).current_dir(project.directory());
    cmd
}

#[cfg(windows)]
fn native_command(project: &Project) -> Command {
    let mut cmd = Command::new("cmd.exe");
    cmd.arg("/c")
        .arg(&project.path)
        .current_dir(project.directory());
    cmd
}

#[cfg(not(windows))]
fn native_command(project: &Project) -> Command {
    let mut cmd = Command::new(&project.path);
    cmd.current_dir(project.directory());
    cmd
}

fn venv_interpreter(dir: &Path) -> Option<PathBuf> {
    #[cfg(windows)]
    let candidate = dir.join(".venv").join("Scripts").join("python.exe");
    #[cfg(not(windows))]
    let candidate = dir.join(".venv").join("bin").join("python");

    candidate.exists().then_some(candidate)
}

fn ambient_python() -> PathBuf {
    if cfg!(windows) {
        PathBuf::from("python")
    } else {
        PathBuf::from("python3")
    }
}

fn detach(command: &mut Command) {
    #[cfg(unix)]
    {
        // New session: the child outlives the supervisor's terminal and
        // becomes the root of its own tree.
        unsafe {
            command.pre_exec(|| {
                if libc::setsid() == -1 {
                    return Err(std::io::Error::last_os_error());
                }
                Ok(())
            });
        }
    }

    #[cfg(windows)]
    {
        const CREATE_NEW_CONSOLE: u32 = 0x0000_0010;
        command.creation_flags(CREATE_NEW_CONSOLE);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unsupported_kind_is_rejected() {
        let launcher = SystemProjectLauncher::new();
        let project = Project::new("settings", "/tmp/settings.cfg");
        let result = launcher.launch(&project).await;
        assert!(matches!(result, Err(LaunchError::UnsupportedKind { .. })));
    }

    #[tokio::test]
    async fn missing_executable_reports_spawn_failure() {
        let launcher = SystemProjectLauncher::new();
        let project = Project::new("ghost", "/no/such/dir/ghost-binary");
        let result = launcher.launch(&project).await;
        assert!(matches!(result, Err(LaunchError::SpawnFailed { .. })));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn native_spawn_returns_a_live_pid() {
        let launcher = SystemProjectLauncher::new();
        let project = Project::new("sleeper", "/bin/sleep");
        let handle = launcher.launch(&project).await.unwrap();
        assert!(handle.pid > 0);
    }

    #[test]
    fn venv_interpreter_requires_existing_layout() {
        assert!(venv_interpreter(Path::new("/no/such/project")).is_none());
    }
}
