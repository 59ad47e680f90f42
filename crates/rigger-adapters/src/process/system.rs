//! Process runner backed by `std::process`.

use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use rigger_core::application::ports::ProcessRunner;
use tracing::{debug, warn};

/// How often a running child is checked against its deadline.
const WAIT_SLICE: Duration = Duration::from_millis(50);

/// Production runner: spawns the command with null stdio and waits for it.
///
/// A child still running at the deadline is killed and counts as a failure.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemProcessRunner;

impl SystemProcessRunner {
    pub fn new() -> Self {
        Self
    }
}

impl ProcessRunner for SystemProcessRunner {
    fn succeeds(&self, argv: &[String], working_dir: &Path, timeout: Option<Duration>) -> bool {
        let Some((program, args)) = argv.split_first() else {
            warn!("Refusing to run an empty command");
            return false;
        };

        let child = Command::new(program)
            .args(args)
            .current_dir(working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();

        let mut child = match child {
            Ok(child) => child,
            Err(e) => {
                debug!(program = %program, error = %e, "Failed to spawn");
                return false;
            }
        };

        let status = match timeout {
            Some(limit) => wait_with_deadline(&mut child, limit),
            None => child.wait().ok(),
        };

        match status {
            Some(status) => {
                debug!(command = %argv.join(" "), code = ?status.code(), "Command finished");
                status.success()
            }
            None => false,
        }
    }
}

fn wait_with_deadline(child: &mut Child, limit: Duration) -> Option<ExitStatus> {
    let deadline = Instant::now() + limit;

    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Some(status),
            Ok(None) => {}
            Err(e) => {
                debug!(error = %e, "Failed to poll child");
                return None;
            }
        }

        let now = Instant::now();
        if now >= deadline {
            debug!(timeout_ms = limit.as_millis() as u64, "Command timed out, killing it");
            let _ = child.kill();
            let _ = child.wait();
            return None;
        }
        thread::sleep(WAIT_SLICE.min(deadline - now));
    }
}
