use std::collections::BTreeMap;
use std::path::PathBuf;

mod cd;
mod exit;
mod status;

pub use cd::CdCommand;
pub use exit::ExitCommand;
pub use status::StatusCommand;

use crate::core::parser::Command;
use crate::core::state::ShellState;
use tracing::debug;

#[derive(Debug)]
pub enum CommandError {
    ChangeDirectory(PathBuf, std::io::Error),
    IoError(std::io::Error),
}

impl std::fmt::Display for CommandError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommandError::ChangeDirectory(path, err) => {
                write!(f, "cd: {}: {}", path.display(), err)
            }
            CommandError::IoError(err) => write!(f, "IO error: {}", err),
        }
    }
}

impl std::error::Error for CommandError {}

impl From<std::io::Error> for CommandError {
    fn from(err: std::io::Error) -> Self {
        CommandError::IoError(err)
    }
}

/// A command run inside the shell process itself.
pub trait Builtin {
    fn execute(&self, args: &[String], state: &mut ShellState) -> Result<(), CommandError>;
}

#[derive(Clone)]
enum BuiltinType {
    Cd(CdCommand),
    Exit(ExitCommand),
    Status(StatusCommand),
}

impl Builtin for BuiltinType {
    fn execute(&self, args: &[String], state: &mut ShellState) -> Result<(), CommandError> {
        match self {
            BuiltinType::Cd(cmd) => cmd.execute(args, state),
            BuiltinType::Exit(cmd) => cmd.execute(args, state),
            BuiltinType::Status(cmd) => cmd.execute(args, state),
        }
    }
}

/// Outcome of offering a command to the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    Handled,
    External,
}

/// Routes `exit`, `cd` and `status`. Built-ins always run in the
/// foreground, ignore redirection, and never touch the last status.
#[derive(Clone)]
pub struct BuiltinDispatcher {
    commands: BTreeMap<&'static str, BuiltinType>,
}

impl Default for BuiltinDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl BuiltinDispatcher {
    pub fn new() -> Self {
        let mut commands = BTreeMap::new();
        commands.insert("cd", BuiltinType::Cd(CdCommand::new()));
        commands.insert("exit", BuiltinType::Exit(ExitCommand::new()));
        commands.insert("status", BuiltinType::Status(StatusCommand::new()));
        Self { commands }
    }

    pub fn dispatch(
        &self,
        command: &Command,
        state: &mut ShellState,
    ) -> Result<Dispatch, CommandError> {
        match self.commands.get(command.name()) {
            Some(builtin) => {
                debug!(builtin = command.name(), "dispatching built-in");
                builtin.execute(command.args(), state)?;
                Ok(Dispatch::Handled)
            }
            None => Ok(Dispatch::External),
        }
    }
}

/// Serializes tests that read or change the process working directory.
#[cfg(test)]
pub(crate) static CWD_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());
