//! Destinations a finished pipeline drains into.
//!
//! Every sink writes one line per output line followed by `\n`, including
//! after the last line.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use log::{debug, info};

use crate::error::{PipelineError, Result};
use crate::stage::Lines;

/// Consumes a line sequence.
pub trait Sink {
    /// Pull every line and store it. Returns the number of lines written.
    ///
    /// The first error, from upstream or from the sink itself, stops the
    /// run and is returned. Lines already written stay written.
    fn consume(self, lines: Lines<'_>) -> Result<usize>;
}

/// Writes to a file, creating or truncating it.
///
/// The file is created before the first line is pulled, so a failing
/// pipeline leaves a partial (possibly empty) file behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

/// Shorthand for `FileSink::new`, for `pipeline.to(file("out.txt"))`.
pub fn file(path: impl Into<PathBuf>) -> FileSink {
    FileSink::new(path)
}

impl Sink for FileSink {
    fn consume(self, lines: Lines<'_>) -> Result<usize> {
        let context = self.path.display().to_string();
        debug!("opening {context} for writing");
        let file = File::create(&self.path).map_err(|e| PipelineError::io(&context, e))?;
        let count = write_lines(BufWriter::new(file), lines, &context)?;
        info!("wrote {count} lines to {context}");
        Ok(count)
    }
}

/// Writes to any `io::Write`, such as stdout.
pub struct WriterSink<W: Write> {
    writer: W,
    label: String,
}

impl<W: Write> WriterSink<W> {
    /// `label` names the destination in error messages.
    pub fn new(writer: W, label: impl Into<String>) -> Self {
        Self {
            writer,
            label: label.into(),
        }
    }
}

impl<W: Write> Sink for WriterSink<W> {
    fn consume(self, lines: Lines<'_>) -> Result<usize> {
        let count = write_lines(self.writer, lines, &self.label)?;
        debug!("wrote {count} lines to {}", self.label);
        Ok(count)
    }
}

/// Appends to an in-memory buffer.
impl Sink for &mut Vec<String> {
    fn consume(self, lines: Lines<'_>) -> Result<usize> {
        let before = self.len();
        for line in lines {
            self.push(line?);
        }
        Ok(self.len() - before)
    }
}

fn write_lines<W: Write>(mut writer: W, lines: Lines<'_>, context: &str) -> Result<usize> {
    let mut count = 0;
    for line in lines {
        let line = line?;
        writeln!(writer, "{line}").map_err(|e| PipelineError::io(context, e))?;
        count += 1;
    }
    writer.flush().map_err(|e| PipelineError::io(context, e))?;
    Ok(count)
}
