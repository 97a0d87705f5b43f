use std::fmt;
use std::path::{Path, PathBuf};

use crate::render::{ConvertError, Converter};
use crate::writer::OutputWriter;

/// Which step of a regeneration failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Read,
    Convert,
    Write,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Read => "read",
            Phase::Convert => "convert",
            Phase::Write => "write",
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RegenError {
    #[error("failed to read file: {0}")]
    Read(#[source] std::io::Error),
    #[error("failed to render: {0}")]
    Convert(#[source] ConvertError),
    #[error("failed to write: {0}")]
    Write(#[source] std::io::Error),
}

impl RegenError {
    pub fn phase(&self) -> Phase {
        match self {
            RegenError::Read(_) => Phase::Read,
            RegenError::Convert(_) => Phase::Convert,
            RegenError::Write(_) => Phase::Write,
        }
    }
}

/// One read → convert → write cycle for a source file.
///
/// The watch loop runs this on a blocking thread, hence `'static`.
pub trait Regenerate: Send + Sync + 'static {
    fn regenerate(&self, source: &Path) -> Result<PathBuf, RegenError>;
}

/// Pairs a converter with an output writer; both are built once per session.
#[derive(Debug, Clone)]
pub struct Regenerator<C, W> {
    converter: C,
    writer: W,
}

impl<C, W> Regenerator<C, W> {
    pub fn new(converter: C, writer: W) -> Self {
        Self { converter, writer }
    }
}

impl<C, W> Regenerate for Regenerator<C, W>
where
    C: Converter + 'static,
    W: OutputWriter + 'static,
{
    fn regenerate(&self, source: &Path) -> Result<PathBuf, RegenError> {
        let markdown = std::fs::read(source).map_err(RegenError::Read)?;
        let rendered = self
            .converter
            .convert(&markdown)
            .map_err(RegenError::Convert)?;
        let output = self
            .writer
            .write(source, &rendered)
            .map_err(RegenError::Write)?;
        tracing::debug!(
            source = %source.display(),
            output = %output.display(),
            bytes = rendered.len(),
            "regenerated"
        );
        Ok(output)
    }
}
