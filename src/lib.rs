//! # unix-stream
//!
//! Composable, lazily evaluated line pipelines built from Unix-style
//! stages: `grep`, `cut`, `sort`, `uniq`, `nl`, `dos2unix`, `compact`,
//! `cat` and a few more.
//!
//! ## Overview
//!
//! - **Sources** produce a line sequence: in-memory lines (`unixify`), a
//!   file (`cat`), or any `BufRead`.
//! - **Stages** transform one sequence into another. They are applied in
//!   the order they are piped and pull one line at a time; `sort`, `tail`
//!   and `wc` are barriers that read their whole input first.
//! - **Terminal operations** run the pipeline: `collect` into a `Vec`, or
//!   `to` a [`Sink`] such as a file.
//!
//! The same matching and field-extraction logic is available as plain
//! closures in [`predicates`] and [`functions`].
//!
//! ## Example
//!
//! ```
//! use unix_stream::unixify;
//!
//! let result = unixify(["id,name", "1,foo", "2,bar"])
//!     .grep("bar")
//!     .cut(",", 2)
//!     .sort()
//!     .uniq()
//!     .nl()
//!     .collect()
//!     .unwrap();
//!
//! assert_eq!(result, vec!["1 bar"]);
//! ```
//!
//! ```no_run
//! use unix_stream::{cat, file, grep, nl, sort, uniq};
//!
//! // cat input.txt | grep a | sort | uniq | nl > output.txt
//! cat("input.txt")?
//!     .pipe(grep("a"))
//!     .pipe(sort())
//!     .pipe(uniq())
//!     .pipe(nl())
//!     .to(file("output.txt"))?;
//! # Ok::<(), unix_stream::PipelineError>(())
//! ```

pub mod dsl;
pub mod error;
pub mod functions;
pub mod pipeline;
pub mod predicates;
pub mod sink;
pub mod stage;

pub use dsl::{Command, build_pipeline, command_to_stage, parse_commands};
pub use error::{PipelineError, Result};
pub use pipeline::{Pipeline, cat, unixify};
pub use sink::{FileSink, Sink, WriterSink, file};
pub use stage::{
    Lines, Stage, compact, concat, cut, dos2unix, grep, grep_v, head, lower, nl, sed, sort, tail,
    uniq, upper, wc,
};
