//! SIGINT and SIGTSTP handling.
//!
//! The shell ignores SIGINT for its whole lifetime. SIGTSTP toggles
//! foreground-only mode: the handler flips one atomic and writes a fixed
//! message with a raw `write(2)`, nothing else. Children re-arm both
//! signals between `fork` and `exec` through [`reset_for_child`].

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use libc::{c_int, sighandler_t, SIGINT, SIGTSTP, SIG_DFL, SIG_ERR, SIG_IGN};
use signal_hook::SigId;
use tracing::debug;

use crate::core::parser::Mode;
use crate::process::ProcessError;

pub const ENTER_FOREGROUND_ONLY: &[u8] = b"\nEntering foreground-only mode (& is now ignored)\n";
pub const EXIT_FOREGROUND_ONLY: &[u8] = b"\nExiting foreground-only mode\n";

/// Owns the SIGTSTP registration. Dropping it removes the handler.
pub struct SignalController {
    sigtstp: SigId,
}

impl SignalController {
    /// Ignores SIGINT and routes SIGTSTP to the foreground-only toggle.
    pub fn install(foreground_only: Arc<AtomicBool>) -> Result<Self, ProcessError> {
        set_disposition(SIGINT, SIG_IGN)
            .map_err(|e| ProcessError::SignalError(format!("cannot ignore SIGINT: {}", e)))?;

        // The closure runs in signal context: one atomic op and one write(2).
        let sigtstp = unsafe {
            signal_hook::low_level::register(SIGTSTP, move || {
                toggle_foreground_only(&foreground_only)
            })
        }
        .map_err(|e| ProcessError::SignalError(format!("cannot handle SIGTSTP: {}", e)))?;

        debug!("signal handlers installed");
        Ok(Self { sigtstp })
    }
}

impl Drop for SignalController {
    fn drop(&mut self) {
        signal_hook::low_level::unregister(self.sigtstp);
    }
}

/// Flips the mode and announces the new one on stdout.
///
/// Async-signal-safe: no allocation, no locks, no buffered I/O.
pub fn toggle_foreground_only(flag: &AtomicBool) {
    let was_enabled = flag.fetch_xor(true, Ordering::SeqCst);
    let message = if was_enabled {
        EXIT_FOREGROUND_ONLY
    } else {
        ENTER_FOREGROUND_ONLY
    };
    raw_write(libc::STDOUT_FILENO, message);
}

/// Unbuffered write straight to `fd`. Safe to call from a signal handler or
/// from a forked child before `exec`. Short writes are retried, errors dropped.
pub fn raw_write(fd: c_int, bytes: &[u8]) {
    let mut rest = bytes;
    while !rest.is_empty() {
        let n = unsafe { libc::write(fd, rest.as_ptr().cast(), rest.len()) };
        if n > 0 {
            rest = &rest[n as usize..];
        } else if n < 0 && errno() == libc::EINTR {
            continue;
        } else {
            break;
        }
    }
}

/// Dispositions for a freshly forked child, applied before `exec`.
///
/// Foreground children take SIGINT back to the default action; background
/// children keep the inherited ignore. No child can be stopped by SIGTSTP.
pub fn reset_for_child(mode: Mode) {
    unsafe {
        if mode == Mode::Foreground {
            libc::signal(SIGINT, SIG_DFL);
        }
        libc::signal(SIGTSTP, SIG_IGN);
    }
}

fn set_disposition(signal: c_int, handler: sighandler_t) -> io::Result<()> {
    let previous = unsafe { libc::signal(signal, handler) };
    if previous == SIG_ERR {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

pub(crate) fn errno() -> c_int {
    io::Error::last_os_error().raw_os_error().unwrap_or(0)
}
