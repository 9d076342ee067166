use std::env;
use std::io;
use std::path::PathBuf;

/// Resolves `cd` operands.
#[derive(Clone, Debug, Default)]
pub struct PathExpander;

impl PathExpander {
    pub fn new() -> Self {
        Self
    }

    /// `$HOME`, falling back to the platform home directory when it is unset.
    pub fn home_dir(&self) -> io::Result<PathBuf> {
        match env::var_os("HOME") {
            Some(home) if !home.is_empty() => Ok(PathBuf::from(home)),
            _ => dirs::home_dir()
                .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "HOME is not set")),
        }
    }

    /// Absolute operands are used as is; anything else becomes
    /// `<cwd>/<operand>` by plain concatenation.
    pub fn resolve(&self, operand: &str) -> io::Result<PathBuf> {
        if operand.starts_with('/') {
            return Ok(PathBuf::from(operand));
        }
        let cwd = env::current_dir()?;
        let mut joined = cwd.into_os_string();
        joined.push("/");
        joined.push(operand);
        Ok(PathBuf::from(joined))
    }

    /// Target of `cd` with an optional operand.
    pub fn cd_target(&self, operand: Option<&str>) -> io::Result<PathBuf> {
        match operand {
            None => self.home_dir(),
            Some(path) => self.resolve(path),
        }
    }
}
