//! Line mapping functions usable outside a pipeline.
//!
//! ```
//! use unix_stream::functions;
//!
//! let second = functions::cut(",", 2);
//! assert_eq!(second("2,bar").unwrap(), "bar");
//! assert!(second("no-delimiter").is_err());
//! ```

use crate::error::{PipelineError, Result};

/// Field extraction behind both `functions::cut` and the `Cut` stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSelector {
    delimiter: String,
    index: usize,
}

impl FieldSelector {
    /// `index` is 1-based. Index 0 never matches and fails on every line.
    pub fn new(delimiter: impl Into<String>, index: usize) -> Self {
        Self {
            delimiter: delimiter.into(),
            index,
        }
    }

    /// Returns the selected field, or `InvalidFieldIndex` if the line has
    /// fewer fields. An empty delimiter treats the whole line as one field.
    pub fn extract(&self, line: &str) -> Result<String> {
        let field = if self.index == 0 {
            None
        } else if self.delimiter.is_empty() {
            (self.index == 1).then_some(line)
        } else {
            line.split(self.delimiter.as_str()).nth(self.index - 1)
        };

        field
            .map(str::to_string)
            .ok_or_else(|| PipelineError::InvalidFieldIndex {
                index: self.index,
                available: self.field_count(line),
                line: line.to_string(),
            })
    }

    fn field_count(&self, line: &str) -> usize {
        if self.delimiter.is_empty() {
            1
        } else {
            line.split(self.delimiter.as_str()).count()
        }
    }
}

/// Mapping that extracts the `index`-th (1-based) `delimiter`-separated field.
pub fn cut(delimiter: impl Into<String>, index: usize) -> impl Fn(&str) -> Result<String> {
    let selector = FieldSelector::new(delimiter, index);
    move |line| selector.extract(line)
}

/// Mapping that trims a line and collapses internal whitespace runs to one space.
pub fn compact(line: &str) -> String {
    line.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Mapping that rewrites every `\r\n` in the text to `\n`.
///
/// A run like `\r\r\n` becomes `\n`, so the result never contains `\r\n`
/// and applying it twice changes nothing. A lone `\r` is kept.
pub fn dos2unix(line: &str) -> String {
    if !line.contains("\r\n") {
        return line.to_string();
    }
    let pieces: Vec<&str> = line.split('\n').collect();
    let last = pieces.len() - 1;
    pieces
        .into_iter()
        .enumerate()
        .map(|(i, piece)| {
            if i < last {
                piece.trim_end_matches('\r')
            } else {
                piece
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
