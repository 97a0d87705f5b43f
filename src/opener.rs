use std::path::Path;
use std::process::Command;

use anyhow::{Context, Result, bail};

/// Opens a generated page with the configured viewer command.
#[derive(Debug, Clone)]
pub struct Opener {
    program: String,
    args: Vec<String>,
}

impl Opener {
    /// `command` is split on whitespace: the first word is the program, the rest
    /// are passed before the page path (`"firefox --new-window"`).
    pub fn new(command: &str) -> Self {
        let mut words = command.split_whitespace().map(str::to_string);
        let program = words.next().unwrap_or_default();
        Self {
            program,
            args: words.collect(),
        }
    }

    /// Run the viewer on `path` and wait for it to exit.
    pub fn open(&self, path: &Path) -> Result<()> {
        if self.program.is_empty() {
            bail!("no browser command configured");
        }
        let status = Command::new(&self.program)
            .args(&self.args)
            .arg(path)
            .status()
            .with_context(|| format!("failed to run {}", self.program))?;
        if !status.success() {
            bail!("{} exited with {status}", self.program);
        }
        tracing::debug!(program = %self.program, page = %path.display(), "viewer opened");
        Ok(())
    }
}
