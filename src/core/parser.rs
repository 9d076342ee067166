use std::borrow::Cow;
use std::fmt;

/// Longest line accepted from the prompt.
pub const MAX_LINE_LENGTH: usize = 2048;
/// Most words a single command may carry, and the cap on tracked background jobs.
pub const MAX_ARGUMENTS: usize = 512;
/// Expanded to the shell's own pid before tokenization.
pub const PID_TOKEN: &str = "$$";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Foreground,
    Background,
}

/// One parsed command line.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Command {
    pub argv: Vec<String>,
    pub input: Option<String>,
    pub output: Option<String>,
    pub mode: Mode,
}

impl Command {
    pub fn name(&self) -> &str {
        self.argv.first().map(String::as_str).unwrap_or_default()
    }

    pub fn args(&self) -> &[String] {
        self.argv.get(1..).unwrap_or_default()
    }

    pub fn is_background(&self) -> bool {
        self.mode == Mode::Background
    }
}

/// Result of parsing a line. Blank lines and comments are `Ignorable` and
/// carry nothing else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedLine {
    Ignorable,
    Command(Command),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    MissingRedirectTarget(&'static str),
    MissingCommand,
    LineTooLong(usize),
    TooManyArguments(usize),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::MissingRedirectTarget(op) => {
                write!(f, "syntax error: expected a file name after '{}'", op)
            }
            ParseError::MissingCommand => write!(f, "syntax error: missing command"),
            ParseError::LineTooLong(len) => write!(
                f,
                "line too long: {} characters (limit {})",
                len, MAX_LINE_LENGTH
            ),
            ParseError::TooManyArguments(count) => write!(
                f,
                "too many arguments: {} (limit {})",
                count, MAX_ARGUMENTS
            ),
        }
    }
}

impl std::error::Error for ParseError {}

/// Blank lines and lines whose first non-space character is `#`.
pub fn is_ignorable(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.is_empty() || trimmed.starts_with('#')
}

/// Replaces every non-overlapping `$$` with `pid`. Substituted text is not rescanned.
pub fn expand_pid<'a>(line: &'a str, pid: &str) -> Cow<'a, str> {
    if line.contains(PID_TOKEN) {
        Cow::Owned(line.replace(PID_TOKEN, pid))
    } else {
        Cow::Borrowed(line)
    }
}

enum Expect {
    Word,
    Input,
    Output,
}

/// Parses one line (newline already stripped).
///
/// `foreground_only` degrades a trailing `&` to a foreground command without
/// reporting anything.
pub fn parse(line: &str, pid: &str, foreground_only: bool) -> Result<ParsedLine, ParseError> {
    if is_ignorable(line) {
        return Ok(ParsedLine::Ignorable);
    }
    let length = line.chars().count();
    if length > MAX_LINE_LENGTH {
        return Err(ParseError::LineTooLong(length));
    }

    let expanded = expand_pid(line, pid);
    let mut tokens: Vec<&str> = expanded.split(' ').filter(|t| !t.is_empty()).collect();
    if tokens.is_empty() {
        return Ok(ParsedLine::Ignorable);
    }

    let background = tokens.last() == Some(&"&");
    if background {
        tokens.pop();
    }

    let mut command = Command::default();
    let mut expect = Expect::Word;
    for token in tokens {
        match expect {
            Expect::Word => match token {
                "<" => expect = Expect::Input,
                ">" => expect = Expect::Output,
                word => command.argv.push(word.to_string()),
            },
            Expect::Input => {
                command.input = Some(token.to_string());
                expect = Expect::Word;
            }
            Expect::Output => {
                command.output = Some(token.to_string());
                expect = Expect::Word;
            }
        }
    }

    match expect {
        Expect::Input => return Err(ParseError::MissingRedirectTarget("<")),
        Expect::Output => return Err(ParseError::MissingRedirectTarget(">")),
        Expect::Word => {}
    }
    if command.argv.is_empty() {
        return Err(ParseError::MissingCommand);
    }
    if command.argv.len() > MAX_ARGUMENTS {
        return Err(ParseError::TooManyArguments(command.argv.len()));
    }

    if background && !foreground_only {
        command.mode = Mode::Background;
    }

    Ok(ParsedLine::Command(command))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command(line: &str) -> Command {
        match parse(line, "4242", false) {
            Ok(ParsedLine::Command(cmd)) => cmd,
            other => panic!("expected a command for {:?}, got {:?}", line, other),
        }
    }

    #[test]
    fn test_ignorable_lines() {
        for line in ["", "   ", "#", "# comment", "   # indented comment", "\t"] {
            assert_eq!(parse(line, "1", false), Ok(ParsedLine::Ignorable), "{:?}", line);
        }
        assert!(!is_ignorable("echo # not a comment"));
    }

    #[test]
    fn test_expand_pid() {
        assert_eq!(expand_pid("echo $$", "123"), "echo 123");
        assert_eq!(expand_pid("a$$b$$c", "9"), "a9b9c");
        assert_eq!(expand_pid("$$$", "7"), "7$");
        assert_eq!(expand_pid("$$$$", "7"), "77");
        assert!(matches!(expand_pid("no token $ here", "7"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_expansion_is_not_rescanned() {
        assert_eq!(expand_pid("$$", "$$"), "$$");
    }

    #[test]
    fn test_simple_command() {
        let cmd = command("ls -la /tmp");
        assert_eq!(cmd.argv, vec!["ls", "-la", "/tmp"]);
        assert_eq!(cmd.name(), "ls");
        assert_eq!(cmd.args(), ["-la", "/tmp"]);
        assert_eq!(cmd.input, None);
        assert_eq!(cmd.output, None);
        assert_eq!(cmd.mode, Mode::Foreground);
    }

    #[test]
    fn test_runs_of_spaces() {
        let cmd = command("  echo   a    b  ");
        assert_eq!(cmd.argv, vec!["echo", "a", "b"]);
    }

    #[test]
    fn test_redirection_anywhere() {
        let cmd = command("sort < in.txt -r > out.txt");
        assert_eq!(cmd.argv, vec!["sort", "-r"]);
        assert_eq!(cmd.input.as_deref(), Some("in.txt"));
        assert_eq!(cmd.output.as_deref(), Some("out.txt"));

        let cmd = command("wc > out < in");
        assert_eq!(cmd.argv, vec!["wc"]);
        assert_eq!(cmd.input.as_deref(), Some("in"));
        assert_eq!(cmd.output.as_deref(), Some("out"));
    }

    #[test]
    fn test_trailing_ampersand() {
        let cmd = command("sleep 5 &");
        assert_eq!(cmd.argv, vec!["sleep", "5"]);
        assert!(cmd.is_background());

        let cmd = command("cat < in > out &");
        assert!(cmd.is_background());
        assert_eq!(cmd.argv, vec!["cat"]);
    }

    #[test]
    fn test_mid_line_ampersand_is_literal() {
        let cmd = command("echo & done");
        assert_eq!(cmd.argv, vec!["echo", "&", "done"]);
        assert_eq!(cmd.mode, Mode::Foreground);

        let cmd = command("echo a&");
        assert_eq!(cmd.argv, vec!["echo", "a&"]);
        assert_eq!(cmd.mode, Mode::Foreground);
    }

    #[test]
    fn test_foreground_only_degrades_background() {
        match parse("sleep 5 &", "1", true) {
            Ok(ParsedLine::Command(cmd)) => {
                assert_eq!(cmd.argv, vec!["sleep", "5"]);
                assert_eq!(cmd.mode, Mode::Foreground);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_pid_expansion_before_tokenizing() {
        let cmd = command("echo $$ x$$y > out$$");
        assert_eq!(cmd.argv, vec!["echo", "4242", "x4242y"]);
        assert_eq!(cmd.output.as_deref(), Some("out4242"));
    }

    #[test]
    fn test_missing_redirect_target() {
        assert_eq!(
            parse("cat >", "1", false),
            Err(ParseError::MissingRedirectTarget(">"))
        );
        assert_eq!(
            parse("cat <", "1", false),
            Err(ParseError::MissingRedirectTarget("<"))
        );
        assert_eq!(
            parse("cat < &", "1", false),
            Err(ParseError::MissingRedirectTarget("<"))
        );
    }

    #[test]
    fn test_missing_command() {
        assert_eq!(parse("&", "1", false), Err(ParseError::MissingCommand));
        assert_eq!(parse("< in", "1", false), Err(ParseError::MissingCommand));
    }

    #[test]
    fn test_limits() {
        let long = "a".repeat(MAX_LINE_LENGTH + 1);
        assert_eq!(
            parse(&long, "1", false),
            Err(ParseError::LineTooLong(MAX_LINE_LENGTH + 1))
        );

        let many = vec!["x"; MAX_ARGUMENTS + 1].join(" ");
        assert_eq!(
            parse(&many, "1", false),
            Err(ParseError::TooManyArguments(MAX_ARGUMENTS + 1))
        );

        let exact = vec!["x"; MAX_ARGUMENTS].join(" ");
        assert!(parse(&exact, "1", false).is_ok());
    }

    #[test]
    fn test_long_comment_is_ignored() {
        let comment = format!("#{}", "x".repeat(3000));
        assert_eq!(parse(&comment, "1", false), Ok(ParsedLine::Ignorable));

        let blank = " ".repeat(MAX_LINE_LENGTH + 10);
        assert_eq!(parse(&blank, "1", false), Ok(ParsedLine::Ignorable));
    }
}
