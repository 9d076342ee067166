use std::fmt;
use std::io;

pub mod executor;
pub mod jobs;
pub mod signal;

#[derive(Debug)]
pub enum ProcessError {
    Fork(io::Error),
    Wait(libc::pid_t, io::Error),
    Kill(libc::pid_t, io::Error),
    SignalError(String),
    InvalidArgument(String),
    JobTableFull(usize),
    Io(io::Error),
}

impl From<io::Error> for ProcessError {
    fn from(e: io::Error) -> Self {
        ProcessError::Io(e)
    }
}

impl fmt::Display for ProcessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessError::Fork(e) => write!(f, "cannot create process: {}", e),
            ProcessError::Wait(pid, e) => write!(f, "wait for pid {} failed: {}", pid, e),
            ProcessError::Kill(pid, e) => write!(f, "cannot signal pid {}: {}", pid, e),
            ProcessError::SignalError(msg) => write!(f, "signal error: {}", msg),
            ProcessError::InvalidArgument(arg) => {
                write!(f, "argument contains a NUL byte: {:?}", arg)
            }
            ProcessError::JobTableFull(limit) => {
                write!(f, "too many background jobs (limit {})", limit)
            }
            ProcessError::Io(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for ProcessError {}
