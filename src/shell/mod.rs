use std::io;

use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing::debug;

mod executor;

pub use executor::{execute_line, finish_iteration};

use crate::{
    config::Config,
    core::{commands::BuiltinDispatcher, state::ShellState},
    error::ShellError,
    highlight::DiagnosticPainter,
    process::{executor::ProcessLauncher, signal::SignalController},
};

pub struct Shell {
    pub(crate) editor: DefaultEditor,
    pub(crate) config: Config,
    pub(crate) state: ShellState,
    pub(crate) builtins: BuiltinDispatcher,
    pub(crate) launcher: ProcessLauncher,
    pub(crate) painter: DiagnosticPainter,
    _signals: SignalController,
}

impl Shell {
    pub fn new(config: Config) -> Result<Self, ShellError> {
        let state = ShellState::new();
        let signals = SignalController::install(state.foreground_only_flag())?;
        let editor = DefaultEditor::new()?;
        let painter = DiagnosticPainter::new(config.color);

        debug!(pid = state.pid(), prompt = %config.prompt, "shell initialised");

        Ok(Shell {
            editor,
            config,
            state,
            builtins: BuiltinDispatcher::new(),
            launcher: ProcessLauncher::new(),
            painter,
            _signals: signals,
        })
    }

    /// Read, run, reap, repeat until `exit` or end of input.
    pub fn run(&mut self) -> Result<(), ShellError> {
        while self.state.is_running() {
            match self.editor.readline(&self.config.prompt) {
                Ok(line) => {
                    if let Err(e) =
                        execute_line(&line, &mut self.state, &self.builtins, &self.launcher)
                    {
                        self.painter.report(e);
                    }
                }
                Err(ReadlineError::Interrupted) => continue,
                Err(ReadlineError::Io(e)) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(ReadlineError::Eof) => {
                    if !self.config.quiet {
                        println!("exit");
                    }
                    execute_line("exit", &mut self.state, &self.builtins, &self.launcher)?;
                }
                Err(e) => return Err(e.into()),
            }

            if let Err(e) = finish_iteration(&mut self.state, &mut io::stdout()) {
                self.painter.report(e);
            }
        }
        debug!("shell exiting");
        Ok(())
    }
}
