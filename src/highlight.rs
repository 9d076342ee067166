use inksac::prelude::*;

use crate::config::ColorMode;

/// Colors shell diagnostics on stderr. Status and job lines are never painted.
#[derive(Debug, Clone, Copy)]
pub struct DiagnosticPainter {
    enabled: bool,
}

impl DiagnosticPainter {
    pub fn new(mode: ColorMode) -> Self {
        let enabled = match mode {
            ColorMode::Always => true,
            ColorMode::Never => false,
            ColorMode::Auto => {
                let tty = unsafe { libc::isatty(libc::STDERR_FILENO) } == 1;
                let support = check_color_support().unwrap_or(ColorSupport::NoColor);
                tty && !matches!(support, ColorSupport::NoColor)
            }
        };
        Self { enabled }
    }

    pub fn paint_error(&self, message: &str) -> String {
        if !self.enabled {
            return message.to_string();
        }

        let error_style = Style::builder().foreground(Color::Red).bold().build();
        message.style(error_style).to_string()
    }

    /// Writes `smallsh: <message>` to stderr.
    pub fn report(&self, message: impl std::fmt::Display) {
        eprintln!("{}", self.paint_error(&format!("smallsh: {}", message)));
    }
}
