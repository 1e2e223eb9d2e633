//! The `Pipeline` type: a source, the stages applied to it, and the
//! terminal operations that run it.
//!
//! Building a pipeline never reads a line. `pipe` wraps the current
//! sequence in the new stage and hands back a new pipeline; the old one is
//! moved and cannot be reused. Lines are pulled only by `collect`, `to`,
//! or by iterating the pipeline, and each line travels through every stage
//! before the next one is read, except where a barrier stage (`sort`,
//! `tail`, `wc`) has to gather its whole input first.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use log::debug;

use crate::error::{PipelineError, Result};
use crate::sink::Sink;
use crate::stage::{self, Lines, Stage};

/// A lazily evaluated chain of line stages.
pub struct Pipeline<'a> {
    lines: Lines<'a>,
    stages: Vec<&'static str>,
}

impl<'a> Pipeline<'a> {
    /// Wrap an existing line sequence, errors included.
    pub fn new(lines: Lines<'a>) -> Self {
        Self {
            lines,
            stages: Vec::new(),
        }
    }

    /// Wrap an iterator of lines. Nothing is copied or read up front.
    pub fn from_lines<I>(lines: I) -> Self
    where
        I: IntoIterator + 'a,
        I::IntoIter: 'a,
        I::Item: Into<String>,
    {
        Self::new(Box::new(lines.into_iter().map(|line| Ok(line.into()))))
    }

    /// Read lines from `reader`, stripping `\n` and `\r\n` terminators.
    ///
    /// `label` names the input in error messages.
    pub fn from_reader<R>(reader: R, label: impl Into<String>) -> Self
    where
        R: BufRead + 'a,
    {
        let label = label.into();
        Self::new(Box::new(
            reader
                .lines()
                .map(move |line| line.map_err(|e| PipelineError::io(&label, e))),
        ))
    }

    /// Open `path` and read it line by line.
    ///
    /// The file is opened here, so a missing or unreadable path fails
    /// immediately. Later read errors surface while the pipeline runs. The
    /// handle is closed when the pipeline is consumed or dropped.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let context = path.display().to_string();
        let file = File::open(path).map_err(|e| PipelineError::io(&context, e))?;
        debug!("opened {context} for reading");
        Ok(Self::from_reader(BufReader::new(file), context))
    }

    /// Append `stage`. Constant time; no line is read.
    pub fn pipe<S>(self, stage: S) -> Self
    where
        S: Stage<'a> + 'a,
    {
        self.pipe_boxed(Box::new(stage))
    }

    /// Append a stage chosen at runtime.
    pub fn pipe_boxed(mut self, stage: Box<dyn Stage<'a> + 'a>) -> Self {
        let name = stage.name();
        debug!("appending stage #{} `{name}`", self.stages.len() + 1);
        self.stages.push(name);
        Self {
            lines: stage.apply(self.lines),
            stages: self.stages,
        }
    }

    /// Names of the stages applied so far, in order.
    pub fn stage_names(&self) -> &[&'static str] {
        &self.stages
    }

    pub fn grep(self, pattern: impl Into<String>) -> Self {
        self.pipe(stage::grep(pattern))
    }

    pub fn grep_v(self, pattern: impl Into<String>) -> Self {
        self.pipe(stage::grep_v(pattern))
    }

    pub fn cut(self, delimiter: impl Into<String>, index: usize) -> Self {
        self.pipe(stage::cut(delimiter, index))
    }

    /// See `stage::sort`: buffers the whole input.
    pub fn sort(self) -> Self {
        self.pipe(stage::sort())
    }

    pub fn uniq(self) -> Self {
        self.pipe(stage::uniq())
    }

    pub fn nl(self) -> Self {
        self.pipe(stage::nl())
    }

    pub fn dos2unix(self) -> Self {
        self.pipe(stage::dos2unix())
    }

    pub fn compact(self) -> Self {
        self.pipe(stage::compact())
    }

    pub fn concat(self, other: Pipeline<'a>) -> Self {
        self.pipe(stage::concat(other))
    }

    pub fn head(self, n: usize) -> Self {
        self.pipe(stage::head(n))
    }

    pub fn tail(self, n: usize) -> Self {
        self.pipe(stage::tail(n))
    }

    pub fn sed(self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.pipe(stage::sed(from, to))
    }

    pub fn upper(self) -> Self {
        self.pipe(stage::upper())
    }

    pub fn lower(self) -> Self {
        self.pipe(stage::lower())
    }

    pub fn wc(self) -> Self {
        self.pipe(stage::wc())
    }

    /// Run the pipeline and gather every line in order.
    pub fn collect(self) -> Result<Vec<String>> {
        debug!("collecting pipeline [{}]", self.stages.join(" | "));
        self.lines.collect()
    }

    /// Run the pipeline into `sink`, returning the number of lines written.
    ///
    /// The first error aborts the run. A sink that was already opened may
    /// hold the lines written before the failure.
    pub fn to<S: Sink>(self, sink: S) -> Result<usize> {
        debug!("draining pipeline [{}]", self.stages.join(" | "));
        sink.consume(self.lines)
    }

    /// Give back the underlying lazy sequence.
    pub fn into_lines(self) -> Lines<'a> {
        self.lines
    }
}

impl<'a> IntoIterator for Pipeline<'a> {
    type Item = Result<String>;
    type IntoIter = Lines<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.lines
    }
}

impl std::fmt::Debug for Pipeline<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("stages", &self.stages)
            .finish_non_exhaustive()
    }
}

/// Start a pipeline from in-memory lines.
pub fn unixify<'a, I>(lines: I) -> Pipeline<'a>
where
    I: IntoIterator + 'a,
    I::IntoIter: 'a,
    I::Item: Into<String>,
{
    Pipeline::from_lines(lines)
}

/// Start a pipeline from a file, like `cat path | ...`.
pub fn cat(path: impl AsRef<Path>) -> Result<Pipeline<'static>> {
    Pipeline::from_file(path)
}
