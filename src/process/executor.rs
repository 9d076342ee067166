use std::ffi::CString;
use std::io::{self, Write};

use libc::{c_char, c_int, pid_t};
use tracing::{debug, warn};

use super::{signal, ProcessError};
use crate::core::parser::{Command, Mode};
use crate::core::state::{ExitStatus, ShellState};

/// Where unattended background commands read from and write to.
pub const NULL_DEVICE: &str = "/dev/null";

/// What happened on the parent side of a launch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Launch {
    Foreground(ExitStatus),
    Background(pid_t),
}

/// Runs non-built-in commands as new processes.
#[derive(Debug, Clone)]
pub struct ProcessLauncher {
    null_device: String,
}

impl Default for ProcessLauncher {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessLauncher {
    pub fn new() -> Self {
        Self {
            null_device: NULL_DEVICE.to_string(),
        }
    }

    /// Forks, wires redirection in the child, and execs `command`.
    ///
    /// Foreground launches block until the child ends and record its status.
    /// Background launches print the pid and register it in the job table.
    /// If `fork` itself fails nothing in `state` changes.
    pub fn launch(&self, command: &Command, state: &mut ShellState) -> Result<Launch, ProcessError> {
        if command.is_background() && state.jobs.is_full() {
            return Err(ProcessError::JobTableFull(state.jobs.len()));
        }

        let prepared = PreparedCommand::new(command, &self.null_device)?;

        // Anything still buffered would otherwise be written twice.
        io::stdout().flush()?;
        io::stderr().flush()?;

        match fork()? {
            Fork::Child => prepared.exec_child(),
            Fork::Parent(pid) => {
                debug!(pid, command = command.name(), mode = ?command.mode, "child forked");
                self.parent_path(pid, command, state)
            }
        }
    }

    fn parent_path(
        &self,
        pid: pid_t,
        command: &Command,
        state: &mut ShellState,
    ) -> Result<Launch, ProcessError> {
        match command.mode {
            Mode::Foreground => {
                let status = wait_foreground(pid)?;
                debug!(pid, %status, "foreground child finished");
                if status.is_interrupt() {
                    println!("{}", status);
                    io::stdout().flush()?;
                }
                state.record_status(status);
                Ok(Launch::Foreground(status))
            }
            Mode::Background => {
                println!("background pid is {}", pid);
                io::stdout().flush()?;
                if let Err(e) = state.jobs.insert(pid) {
                    warn!(pid, error = %e, "background job not tracked");
                    return Err(e);
                }
                Ok(Launch::Background(pid))
            }
        }
    }
}

enum Fork {
    Parent(pid_t),
    Child,
}

fn fork() -> Result<Fork, ProcessError> {
    match unsafe { libc::fork() } {
        -1 => Err(ProcessError::Fork(io::Error::last_os_error())),
        0 => Ok(Fork::Child),
        pid => Ok(Fork::Parent(pid)),
    }
}

/// Blocks until `pid` terminates. Stop reports are skipped and interrupted
/// waits are retried.
fn wait_foreground(pid: pid_t) -> Result<ExitStatus, ProcessError> {
    loop {
        let mut raw: c_int = 0;
        let rc = unsafe { libc::waitpid(pid, &mut raw, 0) };
        if rc == pid {
            if let Some(status) = ExitStatus::from_raw(raw) {
                return Ok(status);
            }
            continue;
        }
        let err = io::Error::last_os_error();
        if err.kind() == io::ErrorKind::Interrupted {
            continue;
        }
        return Err(ProcessError::Wait(pid, err));
    }
}

/// Everything the child needs, built before `fork` so that the child path
/// allocates nothing and only makes async-signal-safe calls.
struct PreparedCommand {
    argv: Vec<CString>,
    argv_ptrs: Vec<*const c_char>,
    mode: Mode,
    stdin: Option<Redirect>,
    stdout: Option<Redirect>,
    exec_prefix: Vec<u8>,
}

struct Redirect {
    path: CString,
    flags: c_int,
    target: c_int,
    failure: Vec<u8>,
}

impl Redirect {
    fn input(path: &str) -> Result<Self, ProcessError> {
        Ok(Self {
            path: to_cstring(path)?,
            flags: libc::O_RDONLY,
            target: libc::STDIN_FILENO,
            failure: format!("smallsh: cannot open {} for input\n", path).into_bytes(),
        })
    }

    fn output(path: &str) -> Result<Self, ProcessError> {
        Ok(Self {
            path: to_cstring(path)?,
            flags: libc::O_WRONLY | libc::O_CREAT | libc::O_TRUNC,
            target: libc::STDOUT_FILENO,
            failure: format!("smallsh: cannot open {} for output\n", path).into_bytes(),
        })
    }

    /// Opens the file and moves it onto `target`. Child-side only.
    fn apply(&self) -> Result<(), ()> {
        let fd = unsafe { libc::open(self.path.as_ptr(), self.flags, 0o644 as libc::c_uint) };
        if fd < 0 {
            signal::raw_write(libc::STDERR_FILENO, &self.failure);
            return Err(());
        }
        if fd != self.target {
            let rc = unsafe { libc::dup2(fd, self.target) };
            unsafe { libc::close(fd) };
            if rc < 0 {
                signal::raw_write(libc::STDERR_FILENO, &self.failure);
                return Err(());
            }
        }
        Ok(())
    }
}

impl PreparedCommand {
    fn new(command: &Command, null_device: &str) -> Result<Self, ProcessError> {
        if command.argv.is_empty() {
            return Err(ProcessError::InvalidArgument("empty command".to_string()));
        }
        let argv = command
            .argv
            .iter()
            .map(|arg| to_cstring(arg))
            .collect::<Result<Vec<_>, _>>()?;
        let mut argv_ptrs: Vec<*const c_char> = argv.iter().map(|a| a.as_ptr()).collect();
        argv_ptrs.push(std::ptr::null());

        let background = command.mode == Mode::Background;
        let stdin = match (&command.input, background) {
            (Some(path), _) => Some(Redirect::input(path)?),
            (None, true) => Some(Redirect::input(null_device)?),
            (None, false) => None,
        };
        let stdout = match (&command.output, background) {
            (Some(path), _) => Some(Redirect::output(path)?),
            (None, true) => Some(Redirect::output(null_device)?),
            (None, false) => None,
        };

        Ok(Self {
            argv,
            argv_ptrs,
            mode: command.mode,
            stdin,
            stdout,
            exec_prefix: format!("smallsh: {}: ", command.name()).into_bytes(),
        })
    }

    /// The child branch. Never returns into shell logic.
    fn exec_child(&self) -> ! {
        signal::reset_for_child(self.mode);

        for redirect in [&self.stdin, &self.stdout].into_iter().flatten() {
            if redirect.apply().is_err() {
                unsafe { libc::_exit(1) };
            }
        }

        unsafe { libc::execvp(self.argv[0].as_ptr(), self.argv_ptrs.as_ptr()) };

        let reason: &[u8] = match signal::errno() {
            libc::ENOENT => b"no such file or directory\n",
            libc::EACCES => b"permission denied\n",
            libc::ENOEXEC => b"exec format error\n",
            _ => b"cannot execute\n",
        };
        signal::raw_write(libc::STDERR_FILENO, &self.exec_prefix);
        signal::raw_write(libc::STDERR_FILENO, reason);
        unsafe { libc::_exit(1) }
    }
}

fn to_cstring(s: &str) -> Result<CString, ProcessError> {
    CString::new(s).map_err(|_| ProcessError::InvalidArgument(s.to_string()))
}
