//! Shell literal quoting.

use std::fmt::Write as _;

/// Quote `s` as a single shell word that evaluates back to exactly `s`.
///
/// The result is a concatenation of single-quoted segments. Single quotes are
/// emitted as `'"'"'` and control characters (0–31) as ANSI-C segments such
/// as `'$'\012''`, so no byte ever appears unquoted.
pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for ch in s.chars() {
        match ch {
            '\'' => out.push_str("'\"'\"'"),
            c if (c as u32) < 32 => {
                let _ = write!(out, "'$'\\{:03o}''", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}

/// A command as handed to a shell session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    /// Sent verbatim; the caller is responsible for its quoting.
    Line(String),
    /// Each token is quoted separately and the tokens are joined with spaces.
    Argv(Vec<String>),
}

impl ShellCommand {
    pub fn to_shell_string(&self) -> String {
        match self {
            ShellCommand::Line(line) => line.clone(),
            ShellCommand::Argv(tokens) => tokens
                .iter()
                .map(|t| quote(t))
                .collect::<Vec<_>>()
                .join(" "),
        }
    }
}

/// Render `command` as the text that is written to the shell.
pub fn command_to_string(command: &ShellCommand) -> String {
    command.to_shell_string()
}

impl From<&str> for ShellCommand {
    fn from(line: &str) -> Self {
        ShellCommand::Line(line.to_string())
    }
}

impl From<String> for ShellCommand {
    fn from(line: String) -> Self {
        ShellCommand::Line(line)
    }
}

impl From<Vec<String>> for ShellCommand {
    fn from(tokens: Vec<String>) -> Self {
        ShellCommand::Argv(tokens)
    }
}

impl From<Vec<&str>> for ShellCommand {
    fn from(tokens: Vec<&str>) -> Self {
        ShellCommand::Argv(tokens.into_iter().map(String::from).collect())
    }
}

impl From<&[&str]> for ShellCommand {
    fn from(tokens: &[&str]) -> Self {
        ShellCommand::Argv(tokens.iter().map(|t| t.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for ShellCommand {
    fn from(tokens: [&str; N]) -> Self {
        ShellCommand::Argv(tokens.iter().map(|t| t.to_string()).collect())
    }
}
