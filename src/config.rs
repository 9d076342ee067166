use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use tracing::{debug, warn};

use crate::flags::Flags;

pub const DEFAULT_PROMPT: &str = ": ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorMode {
    #[default]
    Auto,
    Always,
    Never,
}

impl FromStr for ColorMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(ColorMode::Auto),
            "always" | "on" => Ok(ColorMode::Always),
            "never" | "off" => Ok(ColorMode::Never),
            other => Err(ConfigError::InvalidValue {
                key: "color".to_string(),
                value: other.to_string(),
            }),
        }
    }
}

/// Settings resolved from flags and the optional rc file.
#[derive(Debug, Clone)]
pub struct Config {
    pub prompt: String,
    pub color: ColorMode,
    pub quiet: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            prompt: DEFAULT_PROMPT.to_string(),
            color: ColorMode::Auto,
            quiet: false,
        }
    }
}

impl Config {
    /// `<config_dir>/smallsh/config`, e.g. `~/.config/smallsh/config` on Linux.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("smallsh").join("config"))
    }

    /// An explicit `--config` file must exist; the default one is optional.
    pub fn from_flags(flags: &Flags) -> Result<Self, ConfigError> {
        let mut config = Config {
            quiet: flags.is_set("quiet"),
            ..Config::default()
        };

        match flags.get_value("config") {
            Some(path) => config.load(Path::new(path))?,
            None => {
                if let Some(path) = Self::default_path().filter(|p| p.exists()) {
                    config.load(&path)?;
                }
            }
        }

        if config.quiet && config.color == ColorMode::Auto {
            config.color = ColorMode::Never;
        }
        Ok(config)
    }

    pub fn load(&mut self, path: &Path) -> Result<(), ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => ConfigError::ConfigFileNotFound(path.to_path_buf()),
            _ => ConfigError::IoError(e),
        })?;

        for (index, line) in content.lines().enumerate() {
            self.process_line(line)
                .map_err(|e| e.at(path, index + 1))?;
        }

        debug!(path = %path.display(), "configuration loaded");
        Ok(())
    }

    fn process_line(&mut self, line: &str) -> Result<(), ConfigError> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(());
        }

        let (key, value) = line
            .split_once('=')
            .ok_or_else(|| ConfigError::Syntax(format!("expected key = value, got {:?}", line)))?;
        let key = key.trim();
        let value = unquote(value.trim());

        match key {
            "prompt" => self.prompt = value.to_string(),
            "color" => self.color = value.parse()?,
            other => warn!(key = other, "ignoring unknown configuration key"),
        }
        Ok(())
    }
}

fn unquote(value: &str) -> &str {
    let quoted = value.len() >= 2
        && ((value.starts_with('"') && value.ends_with('"'))
            || (value.starts_with('\'') && value.ends_with('\'')));
    if quoted {
        &value[1..value.len() - 1]
    } else {
        value
    }
}

#[derive(Debug)]
pub enum ConfigError {
    ConfigFileNotFound(PathBuf),
    IoError(io::Error),
    Syntax(String),
    InvalidValue { key: String, value: String },
    AtLine(PathBuf, usize, Box<ConfigError>),
}

impl ConfigError {
    fn at(self, path: &Path, line: usize) -> Self {
        ConfigError::AtLine(path.to_path_buf(), line, Box::new(self))
    }
}

impl From<io::Error> for ConfigError {
    fn from(e: io::Error) -> Self {
        ConfigError::IoError(e)
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ConfigFileNotFound(path) => {
                write!(f, "Config file not found: {}", path.display())
            }
            ConfigError::IoError(e) => write!(f, "IO error: {}", e),
            ConfigError::Syntax(msg) => write!(f, "syntax error: {}", msg),
            ConfigError::InvalidValue { key, value } => {
                write!(f, "invalid value {:?} for {}", value, key)
            }
            ConfigError::AtLine(path, line, inner) => {
                write!(f, "{}:{}: {}", path.display(), line, inner)
            }
        }
    }
}

impl std::error::Error for ConfigError {}
