// Process tree terminator implementation
// sysinfo for descendant discovery and force-kill
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use sysinfo::{Pid, System};
use tracing::{debug, warn};

use vigil_core::port::{ProcessHandle, ProcessTreeTerminator, TerminateError};

/// Terminator walking the live process table
///
/// Descendants are discovered transitively from parent links and killed
/// leaf-first, so nothing is orphaned mid-teardown; the root goes last.
pub struct SystemTreeTerminator {
    system: Arc<Mutex<System>>,
}

impl SystemTreeTerminator {
    pub fn new() -> Self {
        Self {
            system: Arc::new(Mutex::new(System::new())),
        }
    }
}

impl Default for SystemTreeTerminator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProcessTreeTerminator for SystemTreeTerminator {
    async fn terminate_tree(&self, handle: &ProcessHandle) -> Result<(), TerminateError> {
        let mut sys = self.system.lock().unwrap();
        sys.refresh_processes();

        let root = Pid::from_u32(handle.pid);
        if sys.process(root).is_none() {
            // Already gone, nothing to do
            debug!(project = %handle.project, pid = handle.pid, "Process already exited");
            return Ok(());
        }

        let mut children: HashMap<Pid, Vec<Pid>> = HashMap::new();
        for (pid, process) in sys.processes() {
            if let Some(parent) = process.parent() {
                children.entry(parent).or_default().push(*pid);
            }
        }

        let mut descendants = Vec::new();
        collect_descendants(&children, root, &mut descendants);

        // Pre-order reversed = every process before its ancestors
        for pid in descendants.iter().rev() {
            match sys.process(*pid) {
                Some(process) => {
                    if !process.kill() {
                        warn!(pid = pid.as_u32(), "Failed to kill descendant, continuing");
                    }
                }
                // Vanished between refresh and kill
                None => {}
            }
        }
        debug!(
            project = %handle.project,
            pid = handle.pid,
            descendants = descendants.len(),
            "Descendants terminated"
        );

        match sys.process(root) {
            Some(process) if !process.kill() => Err(TerminateError::KillFailed {
                pid: handle.pid,
                reason: "kill signal was not delivered".to_string(),
            }),
            _ => Ok(()),
        }
    }
}

fn collect_descendants(children: &HashMap<Pid, Vec<Pid>>, pid: Pid, acc: &mut Vec<Pid>) {
    if let Some(kids) = children.get(&pid) {
        for kid in kids {
            acc.push(*kid);
            collect_descendants(children, *kid, acc);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[tokio::test]
    async fn kills_a_spawned_process() {
        let mut child = std::process::Command::new("sleep")
            .arg("30")
            .spawn()
            .expect("spawn sleep");
        let handle = ProcessHandle::new(child.id(), "sleeper");

        let terminator = SystemTreeTerminator::new();
        terminator.terminate_tree(&handle).await.unwrap();

        let status = child.wait().expect("wait on killed child");
        assert!(!status.success());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn already_exited_pid_is_silently_ok() {
        let mut child = std::process::Command::new("true").spawn().expect("spawn");
        let pid = child.id();
        child.wait().expect("wait");

        let terminator = SystemTreeTerminator::new();
        let handle = ProcessHandle::new(pid, "gone");
        terminator.terminate_tree(&handle).await.unwrap();
    }

    #[test]
    fn descendant_order_puts_leaves_before_ancestors() {
        let mut children: HashMap<Pid, Vec<Pid>> = HashMap::new();
        let root = Pid::from_u32(1);
        children.insert(root, vec![Pid::from_u32(2)]);
        children.insert(Pid::from_u32(2), vec![Pid::from_u32(3)]);

        let mut order = Vec::new();
        collect_descendants(&children, root, &mut order);
        let reversed: Vec<u32> = order.iter().rev().map(|p| p.as_u32()).collect();

        assert_eq!(reversed, vec![3, 2]);
    }
}
