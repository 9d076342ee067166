use super::{Builtin, CommandError};
use crate::core::state::ShellState;
use tracing::{debug, warn};

/// Signals every tracked background job and asks the read loop to stop.
#[derive(Clone, Default)]
pub struct ExitCommand;

impl ExitCommand {
    pub fn new() -> Self {
        Self
    }
}

impl Builtin for ExitCommand {
    fn execute(&self, _args: &[String], state: &mut ShellState) -> Result<(), CommandError> {
        debug!(jobs = state.jobs.len(), "terminating background jobs");
        for failure in state.jobs.terminate_all() {
            warn!(error = %failure, "could not terminate background job");
        }
        state.request_exit();
        Ok(())
    }
}
