use std::io::Write;

use tracing::debug;

use crate::core::commands::{BuiltinDispatcher, Dispatch};
use crate::core::parser::{self, ParsedLine};
use crate::core::state::ShellState;
use crate::error::ShellError;
use crate::process::executor::ProcessLauncher;

/// Parses one line and runs it as a built-in or an external program.
///
/// Blank lines and comments return immediately without touching `state`.
pub fn execute_line(
    line: &str,
    state: &mut ShellState,
    builtins: &BuiltinDispatcher,
    launcher: &ProcessLauncher,
) -> Result<(), ShellError> {
    let command = match parser::parse(line, state.pid(), state.foreground_only())? {
        ParsedLine::Ignorable => return Ok(()),
        ParsedLine::Command(command) => command,
    };
    debug!(argv = ?command.argv, mode = ?command.mode, "parsed command");

    if builtins.dispatch(&command, state)? == Dispatch::Handled {
        return Ok(());
    }

    launcher.launch(&command, state)?;
    Ok(())
}

/// End-of-iteration housekeeping: report finished background jobs to `out`
/// and note any foreground-only toggle made by the signal handler.
pub fn finish_iteration<W: Write>(state: &mut ShellState, out: &mut W) -> Result<(), ShellError> {
    state.jobs.report_completed(out)?;
    if let Some(enabled) = state.poll_mode_change() {
        debug!(foreground_only = enabled, "foreground-only mode changed");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::state::ExitStatus;
    use std::sync::atomic::Ordering;
    use std::thread;
    use std::time::{Duration, Instant};

    struct Engine {
        state: ShellState,
        builtins: BuiltinDispatcher,
        launcher: ProcessLauncher,
    }

    impl Engine {
        fn new() -> Self {
            Self {
                state: ShellState::new(),
                builtins: BuiltinDispatcher::new(),
                launcher: ProcessLauncher::new(),
            }
        }

        fn run(&mut self, line: &str) -> Result<(), ShellError> {
            execute_line(line, &mut self.state, &self.builtins, &self.launcher)
        }
    }

    #[test]
    fn test_ignorable_lines_change_nothing() {
        let mut engine = Engine::new();
        engine.run("false").unwrap();
        for line in ["", "    ", "# false", "#exit"] {
            engine.run(line).unwrap();
        }
        assert_eq!(engine.state.last_status(), ExitStatus::Exited(1));
        assert!(engine.state.jobs.is_empty());
        assert!(engine.state.is_running());
    }

    #[test]
    fn test_status_follows_foreground_commands() {
        let mut engine = Engine::new();
        engine.run("sh -c false").unwrap();
        assert_eq!(engine.state.last_status().to_string(), "exit value 1");
        engine.run("true").unwrap();
        assert_eq!(engine.state.last_status().to_string(), "exit value 0");
        engine.run("status").unwrap();
        assert_eq!(engine.state.last_status().to_string(), "exit value 0");
    }

    #[test]
    fn test_malformed_redirect_is_skipped() {
        let mut engine = Engine::new();
        engine.run("false").unwrap();
        let err = engine.run("cat >").unwrap_err();
        assert!(matches!(err, ShellError::ParseError(_)));
        assert_eq!(engine.state.last_status(), ExitStatus::Exited(1));
    }

    #[test]
    fn test_foreground_only_mode_blocks_background() {
        let mut engine = Engine::new();
        engine
            .state
            .foreground_only_flag()
            .store(true, Ordering::SeqCst);

        let started = Instant::now();
        engine.run("sleep 0.2 &").unwrap();
        assert!(started.elapsed() >= Duration::from_millis(150));
        assert!(engine.state.jobs.is_empty());
        assert_eq!(engine.state.last_status(), ExitStatus::Exited(0));
    }

    #[test]
    fn test_background_then_reap() {
        let mut engine = Engine::new();
        engine.run("sleep 0.1 &").unwrap();
        assert_eq!(engine.state.jobs.len(), 1);
        let pid = engine.state.jobs.iter().next().unwrap();

        let mut out = Vec::new();
        let deadline = Instant::now() + Duration::from_secs(10);
        while !engine.state.jobs.is_empty() && Instant::now() < deadline {
            finish_iteration(&mut engine.state, &mut out).unwrap();
            thread::sleep(Duration::from_millis(20));
        }
        assert_eq!(
            String::from_utf8(out).unwrap(),
            format!("background pid {} is done: exit value 0\n", pid)
        );
    }

    #[test]
    fn test_exit_stops_loop() {
        let mut engine = Engine::new();
        engine.run("exit").unwrap();
        assert!(!engine.state.is_running());
    }
}
