use std::fmt;
use std::io::{self, Write};

use libc::pid_t;
use tracing::{debug, warn};

use super::ProcessError;
use crate::core::parser::MAX_ARGUMENTS;
use crate::core::state::ExitStatus;

/// A background job observed to have terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Completion {
    pub pid: pid_t,
    pub status: ExitStatus,
}

impl fmt::Display for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "background pid {} is done: {}", self.pid, self.status)
    }
}

/// Pids of background children that have not yet been reaped, in launch order.
#[derive(Debug)]
pub struct JobTable {
    pids: Vec<pid_t>,
    capacity: usize,
}

impl Default for JobTable {
    fn default() -> Self {
        Self::new()
    }
}

impl JobTable {
    pub fn new() -> Self {
        Self::with_capacity(MAX_ARGUMENTS)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            pids: Vec::new(),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.pids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pids.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.pids.len() >= self.capacity
    }

    pub fn contains(&self, pid: pid_t) -> bool {
        self.pids.contains(&pid)
    }

    pub fn iter(&self) -> impl Iterator<Item = pid_t> + '_ {
        self.pids.iter().copied()
    }

    pub fn insert(&mut self, pid: pid_t) -> Result<(), ProcessError> {
        if self.is_full() {
            return Err(ProcessError::JobTableFull(self.capacity));
        }
        if !self.contains(pid) {
            self.pids.push(pid);
        }
        debug!(pid, jobs = self.pids.len(), "background job registered");
        Ok(())
    }

    /// Polls every tracked pid with `WNOHANG` and drops the ones that have
    /// terminated. Never blocks.
    pub fn reap_completed(&mut self) -> Vec<Completion> {
        let mut done = Vec::new();
        self.pids.retain(|&pid| match poll(pid) {
            Poll::Running => true,
            Poll::Done(status) => {
                debug!(pid, %status, "background job reaped");
                done.push(Completion { pid, status });
                false
            }
            Poll::Lost(err) => {
                warn!(pid, error = %err, "background job can no longer be waited for");
                false
            }
        });
        done
    }

    /// Reaps and writes one completion line per finished job to `out`.
    pub fn report_completed<W: Write>(&mut self, out: &mut W) -> io::Result<usize> {
        let done = self.reap_completed();
        for completion in &done {
            writeln!(out, "{}", completion)?;
        }
        out.flush()?;
        Ok(done.len())
    }

    /// Sends SIGTERM to every tracked job without waiting for it. Jobs that
    /// already exited are skipped silently.
    pub fn terminate_all(&self) -> Vec<ProcessError> {
        let mut failures = Vec::new();
        for pid in self.iter() {
            let rc = unsafe { libc::kill(pid, libc::SIGTERM) };
            if rc == 0 {
                debug!(pid, "sent SIGTERM to background job");
                continue;
            }
            let err = io::Error::last_os_error();
            if err.raw_os_error() != Some(libc::ESRCH) {
                failures.push(ProcessError::Kill(pid, err));
            }
        }
        failures
    }
}

enum Poll {
    Running,
    Done(ExitStatus),
    Lost(io::Error),
}

fn poll(pid: pid_t) -> Poll {
    let mut raw: libc::c_int = 0;
    let rc = unsafe { libc::waitpid(pid, &mut raw, libc::WNOHANG) };
    if rc == 0 {
        return Poll::Running;
    }
    if rc < 0 {
        let err = io::Error::last_os_error();
        if err.kind() == io::ErrorKind::Interrupted {
            return Poll::Running;
        }
        return Poll::Lost(err);
    }
    match ExitStatus::from_raw(raw) {
        Some(status) => Poll::Done(status),
        None => Poll::Running,
    }
}
