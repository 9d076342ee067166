use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::process::jobs::JobTable;

/// How a foreground child ended, as reported by `status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    Exited(i32),
    Signaled(i32),
}

impl ExitStatus {
    /// Decodes a raw `waitpid` status. Stopped/continued reports yield `None`.
    pub fn from_raw(raw: libc::c_int) -> Option<Self> {
        if libc::WIFEXITED(raw) {
            Some(ExitStatus::Exited(libc::WEXITSTATUS(raw)))
        } else if libc::WIFSIGNALED(raw) {
            Some(ExitStatus::Signaled(libc::WTERMSIG(raw)))
        } else {
            None
        }
    }

    pub fn is_interrupt(&self) -> bool {
        matches!(self, ExitStatus::Signaled(sig) if *sig == libc::SIGINT)
    }
}

impl Default for ExitStatus {
    fn default() -> Self {
        ExitStatus::Exited(0)
    }
}

impl fmt::Display for ExitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitStatus::Exited(code) => write!(f, "exit value {}", code),
            ExitStatus::Signaled(sig) => write!(f, "terminated by signal {}", sig),
        }
    }
}

/// Everything the shell mutates between prompts.
///
/// Only `foreground_only` is shared with the SIGTSTP handler, so it is the
/// only field behind an atomic. The rest is owned by the read loop.
pub struct ShellState {
    last_status: ExitStatus,
    foreground_only: Arc<AtomicBool>,
    observed_foreground_only: bool,
    pub jobs: JobTable,
    pid: String,
    running: bool,
}

impl Default for ShellState {
    fn default() -> Self {
        Self::new()
    }
}

impl ShellState {
    pub fn new() -> Self {
        Self {
            last_status: ExitStatus::default(),
            foreground_only: Arc::new(AtomicBool::new(false)),
            observed_foreground_only: false,
            jobs: JobTable::new(),
            pid: std::process::id().to_string(),
            running: true,
        }
    }

    pub fn last_status(&self) -> ExitStatus {
        self.last_status
    }

    /// Only foreground external commands report here; built-ins never do.
    pub fn record_status(&mut self, status: ExitStatus) {
        self.last_status = status;
    }

    /// Decimal form of the shell's own pid, substituted for `$$`.
    pub fn pid(&self) -> &str {
        &self.pid
    }

    pub fn foreground_only(&self) -> bool {
        self.foreground_only.load(Ordering::SeqCst)
    }

    /// Handle given to the signal controller.
    pub fn foreground_only_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.foreground_only)
    }

    /// Returns the new mode if the handler flipped it since the last poll.
    pub fn poll_mode_change(&mut self) -> Option<bool> {
        let current = self.foreground_only();
        if current == self.observed_foreground_only {
            return None;
        }
        self.observed_foreground_only = current;
        Some(current)
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn request_exit(&mut self) {
        self.running = false;
    }
}
