//! Error type shared by sources, stages, sinks and the command DSL.

use std::io;

use thiserror::Error;

/// Errors raised while building or running a pipeline.
///
/// Every variant aborts the pipeline; nothing is retried or skipped.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A source could not be read or a sink could not be written.
    #[error("I/O failure on {context}: {source}")]
    Io {
        /// The path or stream involved.
        context: String,
        #[source]
        source: io::Error,
    },

    /// `cut` asked for a field the line does not have.
    #[error("field {index} out of range: line has {available} field(s): {line:?}")]
    InvalidFieldIndex {
        index: usize,
        available: usize,
        line: String,
    },

    /// Malformed pipeline text.
    #[error("cannot parse `{segment}`: {message}")]
    Parse { segment: String, message: String },
}

impl PipelineError {
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        PipelineError::Io {
            context: context.into(),
            source,
        }
    }

    pub(crate) fn parse(segment: &str, message: impl Into<String>) -> Self {
        PipelineError::Parse {
            segment: segment.to_string(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
