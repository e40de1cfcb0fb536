use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::error::StoreError;
use crate::runtime::Runtime;

use super::ShellEntry;

/// Shells that snippets can be written for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shell {
    Zsh,
    Bash,
}

impl Shell {
    /// Snippet file extension, including the dot.
    pub fn ext(&self) -> &'static str {
        match self {
            Shell::Zsh => ".zsh",
            Shell::Bash => ".bash",
        }
    }

    /// Pick the shell from a `$SHELL`-style value; zsh unless it names bash.
    pub fn from_shell_path(value: &str) -> Self {
        if value.contains("bash") && !value.contains("zsh") {
            Shell::Bash
        } else {
            Shell::Zsh
        }
    }

    pub fn detect<R: Runtime>(runtime: &R) -> Self {
        runtime
            .env_var("SHELL")
            .map(|value| Self::from_shell_path(&value))
            .unwrap_or(Shell::Zsh)
    }
}

impl fmt::Display for Shell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shell::Zsh => write!(f, "zsh"),
            Shell::Bash => write!(f, "bash"),
        }
    }
}

impl FromStr for Shell {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "zsh" => Ok(Shell::Zsh),
            "bash" => Ok(Shell::Bash),
            _ => Err(StoreError::validation(format!(
                "unsupported shell: {} (use zsh or bash)",
                s
            ))),
        }
    }
}

/// Shell code that sources every snippet of `entries`, in order.
pub fn render_activation(entries: &[ShellEntry]) -> String {
    let mut script = String::new();
    for entry in entries {
        for path in &entry.paths {
            script.push_str("source ");
            script.push_str(&double_quote(path));
            script.push('\n');
        }
    }
    script
}

fn double_quote(path: &Path) -> String {
    let raw = path.to_string_lossy();
    let mut quoted = String::with_capacity(raw.len() + 2);
    quoted.push('"');
    for c in raw.chars() {
        if matches!(c, '"' | '\\' | '$' | '`') {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}
