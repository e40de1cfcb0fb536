//! User interaction operations (confirmation prompts, editor).

use anyhow::{Context, Result, bail};
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::process::Command;

use super::RealRuntime;

/// Core, testable implementation that reads from any BufRead and writes to any Write.
pub(crate) fn confirm_with_io<R: BufRead, W: Write>(
    prompt: &str,
    input: &mut R,
    output: &mut W,
) -> Result<bool> {
    write!(output, "{} [y/N] ", prompt)?;
    output.flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;

    let response = line.trim().to_lowercase();
    Ok(response == "y" || response == "yes")
}

impl RealRuntime {
    pub(crate) fn confirm_impl(&self, prompt: &str) -> Result<bool> {
        let stdin = io::stdin();
        let mut stdout = io::stdout();
        let mut stdin_lock = stdin.lock();
        confirm_with_io(prompt, &mut stdin_lock, &mut stdout)
    }

    #[tracing::instrument(skip(self))]
    pub(crate) fn open_editor_impl(&self, editor: &str, path: &Path) -> Result<()> {
        let status = Command::new(editor)
            .arg(path)
            .status()
            .with_context(|| format!("Failed to run {}", editor))?;
        if !status.success() {
            bail!("{} exited with {}", editor, status);
        }
        Ok(())
    }
}
