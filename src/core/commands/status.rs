use std::io::{self, Write};

use super::{Builtin, CommandError};
use crate::core::state::ShellState;

/// Prints how the last foreground external command ended.
#[derive(Clone, Default)]
pub struct StatusCommand;

impl StatusCommand {
    pub fn new() -> Self {
        Self
    }

    pub fn render(&self, state: &ShellState) -> String {
        state.last_status().to_string()
    }
}

impl Builtin for StatusCommand {
    fn execute(&self, _args: &[String], state: &mut ShellState) -> Result<(), CommandError> {
        let mut stdout = io::stdout().lock();
        writeln!(stdout, "{}", self.render(state))?;
        stdout.flush()?;
        Ok(())
    }
}
