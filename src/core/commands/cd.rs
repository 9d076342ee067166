use super::{Builtin, CommandError};
use crate::core::state::ShellState;
use crate::path::PathExpander;
use std::env;
use tracing::debug;

#[derive(Clone, Default)]
pub struct CdCommand {
    path_expander: PathExpander,
}

impl CdCommand {
    pub fn new() -> Self {
        Self {
            path_expander: PathExpander::new(),
        }
    }
}

impl Builtin for CdCommand {
    /// Extra operands after the first are ignored.
    fn execute(&self, args: &[String], _state: &mut ShellState) -> Result<(), CommandError> {
        let target = self
            .path_expander
            .cd_target(args.first().map(String::as_str))?;

        env::set_current_dir(&target)
            .map_err(|e| CommandError::ChangeDirectory(target.clone(), e))?;
        debug!(cwd = %target.display(), "changed directory");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::commands::CWD_LOCK;
    use std::path::PathBuf;

    struct RestoreCwd(PathBuf);

    impl Drop for RestoreCwd {
        fn drop(&mut self) {
            let _ = env::set_current_dir(&self.0);
        }
    }

    #[test]
    fn test_cd_home() {
        let _guard = CWD_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let _restore = RestoreCwd(env::current_dir().unwrap());
        let cmd = CdCommand::new();
        let mut state = ShellState::new();

        let home = PathExpander::new().home_dir().unwrap();
        assert!(cmd.execute(&[], &mut state).is_ok());
        assert_eq!(
            env::current_dir().unwrap().canonicalize().unwrap(),
            home.canonicalize().unwrap()
        );
    }

    #[test]
    fn test_cd_absolute_then_parent() {
        let _guard = CWD_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let _restore = RestoreCwd(env::current_dir().unwrap());
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("nested");
        std::fs::create_dir(&nested).unwrap();
        let cmd = CdCommand::new();
        let mut state = ShellState::new();

        cmd.execute(&[nested.to_string_lossy().into_owned()], &mut state)
            .unwrap();
        assert_eq!(
            env::current_dir().unwrap().canonicalize().unwrap(),
            nested.canonicalize().unwrap()
        );

        cmd.execute(&["..".to_string()], &mut state).unwrap();
        assert_eq!(
            env::current_dir().unwrap().canonicalize().unwrap(),
            dir.path().canonicalize().unwrap()
        );
    }

    #[test]
    fn test_cd_relative() {
        let _guard = CWD_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let _restore = RestoreCwd(env::current_dir().unwrap());
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("child")).unwrap();
        let cmd = CdCommand::new();
        let mut state = ShellState::new();

        env::set_current_dir(dir.path()).unwrap();
        cmd.execute(&["child".to_string()], &mut state).unwrap();
        assert_eq!(
            env::current_dir().unwrap().canonicalize().unwrap(),
            dir.path().join("child").canonicalize().unwrap()
        );
    }

    #[test]
    fn test_cd_invalid() {
        let _guard = CWD_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let before = env::current_dir().unwrap();
        let cmd = CdCommand::new();
        let mut state = ShellState::new();

        let result = cmd.execute(&["/nonexistent/path".to_string()], &mut state);
        assert!(matches!(result, Err(CommandError::ChangeDirectory(_, _))));
        assert_eq!(env::current_dir().unwrap(), before);
    }
}
