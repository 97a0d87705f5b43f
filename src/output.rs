use std::fmt::Display;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// User-facing progress lines.
///
/// Artifact locations go to `out` so they can be piped; diagnostics go to `err`.
/// Write failures on either stream are ignored: losing a status line must not
/// end a watch session.
pub struct Reporter<O, E> {
    out: O,
    err: E,
}

impl Reporter<io::Stdout, io::Stderr> {
    pub fn stdio() -> Self {
        Self::new(io::stdout(), io::stderr())
    }
}

impl<O: Write, E: Write> Reporter<O, E> {
    pub fn new(out: O, err: E) -> Self {
        Self { out, err }
    }

    pub fn generated(&mut self, path: &Path) {
        let _ = writeln!(self.out, "Generated: {}", path.display());
    }

    pub fn regenerated(&mut self, path: &Path) {
        let _ = writeln!(self.out, "Regenerated: {}", path.display());
    }

    pub fn watching(&mut self) {
        let _ = writeln!(self.out, "Watching for changes... (Ctrl+C to stop)");
    }

    pub fn stopping(&mut self) {
        let _ = writeln!(self.out, "\nStopping watcher...");
    }

    pub fn error(&mut self, err: &dyn Display) {
        let _ = writeln!(self.err, "error: {err}");
    }

    pub fn watcher_error(&mut self, err: &dyn Display) {
        let _ = writeln!(self.err, "watcher error: {err}");
    }

    pub fn into_inner(self) -> (O, E) {
        (self.out, self.err)
    }
}

/// Print generated pages, one per line or as a JSON array.
pub fn print_files<W: Write>(out: &mut W, files: &[PathBuf], json: bool) -> io::Result<()> {
    if json {
        serde_json::to_writer_pretty(&mut *out, files).map_err(io::Error::other)?;
        writeln!(out)?;
        return Ok(());
    }
    for file in files {
        writeln!(out, "{}", file.display())?;
    }
    Ok(())
}
