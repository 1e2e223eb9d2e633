//! Line-transforming stages.
//!
//! A `Stage` turns one lazy line sequence into another. Most stages wrap
//! the upstream iterator and pull one line at a time. The barrier stages
//! (`sort`, `tail`, `wc`) must see all of their input before they can
//! emit anything, so they hold it in memory on the first pull.
//!
//! Errors produced upstream pass through every stage untouched and end
//! the pipeline at its terminal operation.

use std::collections::VecDeque;

use log::debug;

use crate::error::Result;
use crate::functions::{self, FieldSelector};
use crate::pipeline::Pipeline;
use crate::predicates::Pattern;

/// A lazily produced, consume-once sequence of lines.
pub type Lines<'a> = Box<dyn Iterator<Item = Result<String>> + 'a>;

/// A transform from one line sequence to another.
///
/// Parameters are fixed when the stage is built. `apply` consumes the
/// stage, so any per-run state lives in the iterator it returns.
pub trait Stage<'a> {
    /// Short name used in logs and diagnostics.
    fn name(&self) -> &'static str;

    /// Wrap `input` in this stage's transform. Must not pull from `input`.
    fn apply(self: Box<Self>, input: Lines<'a>) -> Lines<'a>;
}

// ---------------------------------------------------------------------------
// Streaming stages
// ---------------------------------------------------------------------------

/// Keeps lines containing (or, inverted, not containing) a substring.
#[derive(Debug, Clone)]
pub struct Grep {
    pattern: Pattern,
    invert: bool,
}

impl<'a> Stage<'a> for Grep {
    fn name(&self) -> &'static str {
        if self.invert { "grep -v" } else { "grep" }
    }

    fn apply(self: Box<Self>, input: Lines<'a>) -> Lines<'a> {
        let Grep { pattern, invert } = *self;
        Box::new(input.filter(move |line| match line {
            Ok(text) => pattern.matches(text) != invert,
            Err(_) => true,
        }))
    }
}

/// Replaces each line by one of its delimiter-separated fields.
#[derive(Debug, Clone)]
pub struct Cut {
    selector: FieldSelector,
}

impl<'a> Stage<'a> for Cut {
    fn name(&self) -> &'static str {
        "cut"
    }

    fn apply(self: Box<Self>, input: Lines<'a>) -> Lines<'a> {
        let selector = self.selector;
        Box::new(input.map(move |line| line.and_then(|text| selector.extract(&text))))
    }
}

/// Collapses runs of consecutive equal lines.
#[derive(Debug, Clone, Copy, Default)]
pub struct Uniq;

impl<'a> Stage<'a> for Uniq {
    fn name(&self) -> &'static str {
        "uniq"
    }

    fn apply(self: Box<Self>, input: Lines<'a>) -> Lines<'a> {
        let mut previous: Option<String> = None;
        Box::new(input.filter(move |line| match line {
            Ok(text) if previous.as_ref() == Some(text) => false,
            Ok(text) => {
                previous = Some(text.clone());
                true
            }
            Err(_) => true,
        }))
    }
}

/// Prefixes each line with its 1-based position and a space.
#[derive(Debug, Clone, Copy, Default)]
pub struct NumberLines;

impl<'a> Stage<'a> for NumberLines {
    fn name(&self) -> &'static str {
        "nl"
    }

    fn apply(self: Box<Self>, input: Lines<'a>) -> Lines<'a> {
        let mut counter = 0usize;
        Box::new(input.map(move |line| {
            line.map(|text| {
                counter += 1;
                format!("{counter} {text}")
            })
        }))
    }
}

/// Rewrites `\r\n` to `\n` inside each line's text.
#[derive(Debug, Clone, Copy, Default)]
pub struct Dos2Unix;

impl<'a> Stage<'a> for Dos2Unix {
    fn name(&self) -> &'static str {
        "dos2unix"
    }

    fn apply(self: Box<Self>, input: Lines<'a>) -> Lines<'a> {
        Box::new(input.map(|line| line.map(|text| functions::dos2unix(&text))))
    }
}

/// Trims each line and squeezes internal whitespace to single spaces.
#[derive(Debug, Clone, Copy, Default)]
pub struct Compact;

impl<'a> Stage<'a> for Compact {
    fn name(&self) -> &'static str {
        "compact"
    }

    fn apply(self: Box<Self>, input: Lines<'a>) -> Lines<'a> {
        Box::new(input.map(|line| line.map(|text| functions::compact(&text))))
    }
}

/// Appends a second sequence after the input.
pub struct Concat<'a> {
    other: Lines<'a>,
}

impl<'a> Stage<'a> for Concat<'a> {
    fn name(&self) -> &'static str {
        "cat"
    }

    fn apply(self: Box<Self>, input: Lines<'a>) -> Lines<'a> {
        Box::new(input.chain(self.other))
    }
}

/// Keeps the first `n` lines. Upstream is not pulled past line `n`.
#[derive(Debug, Clone, Copy)]
pub struct Head {
    n: usize,
}

impl<'a> Stage<'a> for Head {
    fn name(&self) -> &'static str {
        "head"
    }

    fn apply(self: Box<Self>, input: Lines<'a>) -> Lines<'a> {
        Box::new(input.take(self.n))
    }
}

/// Replaces every occurrence of one literal string with another.
#[derive(Debug, Clone)]
pub struct Sed {
    from: String,
    to: String,
}

impl<'a> Stage<'a> for Sed {
    fn name(&self) -> &'static str {
        "sed"
    }

    fn apply(self: Box<Self>, input: Lines<'a>) -> Lines<'a> {
        let Sed { from, to } = *self;
        if from.is_empty() {
            return input;
        }
        Box::new(input.map(move |line| line.map(|text| text.replace(&from, &to))))
    }
}

/// UPPER - converts lines to uppercase.
#[derive(Debug, Clone, Copy, Default)]
pub struct Upper;

impl<'a> Stage<'a> for Upper {
    fn name(&self) -> &'static str {
        "upper"
    }

    fn apply(self: Box<Self>, input: Lines<'a>) -> Lines<'a> {
        Box::new(input.map(|line| line.map(|text| text.to_uppercase())))
    }
}

/// LOWER - converts lines to lowercase.
#[derive(Debug, Clone, Copy, Default)]
pub struct Lower;

impl<'a> Stage<'a> for Lower {
    fn name(&self) -> &'static str {
        "lower"
    }

    fn apply(self: Box<Self>, input: Lines<'a>) -> Lines<'a> {
        Box::new(input.map(|line| line.map(|text| text.to_lowercase())))
    }
}

// ---------------------------------------------------------------------------
// Barrier stages
// ---------------------------------------------------------------------------

/// Drains the whole upstream on the first pull, then replays the result.
///
/// If upstream fails, the error is yielded once and nothing else follows.
struct Barrier<'a, F> {
    pending: Option<(Lines<'a>, F)>,
    ready: std::vec::IntoIter<String>,
}

impl<'a, F> Barrier<'a, F>
where
    F: FnOnce(Lines<'a>) -> Result<Vec<String>> + 'a,
{
    fn boxed(input: Lines<'a>, drain: F) -> Lines<'a> {
        Box::new(Barrier {
            pending: Some((input, drain)),
            ready: Vec::new().into_iter(),
        })
    }
}

impl<'a, F> Iterator for Barrier<'a, F>
where
    F: FnOnce(Lines<'a>) -> Result<Vec<String>>,
{
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some((input, drain)) = self.pending.take() {
            match drain(input) {
                Ok(lines) => self.ready = lines.into_iter(),
                Err(e) => return Some(Err(e)),
            }
        }
        self.ready.next().map(Ok)
    }
}

/// Sorts all lines in ascending byte-wise order.
///
/// Barrier: the whole input is held in memory before the first line is
/// emitted. The sort is stable.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sort;

impl<'a> Stage<'a> for Sort {
    fn name(&self) -> &'static str {
        "sort"
    }

    fn apply(self: Box<Self>, input: Lines<'a>) -> Lines<'a> {
        Barrier::boxed(input, |input| {
            let mut lines = input.collect::<Result<Vec<_>>>()?;
            lines.sort();
            debug!("sort materialized {} lines", lines.len());
            Ok(lines)
        })
    }
}

/// Keeps the last `n` lines.
///
/// Barrier: nothing is emitted until upstream ends. At most `n` lines are
/// buffered.
#[derive(Debug, Clone, Copy)]
pub struct Tail {
    n: usize,
}

impl<'a> Stage<'a> for Tail {
    fn name(&self) -> &'static str {
        "tail"
    }

    fn apply(self: Box<Self>, input: Lines<'a>) -> Lines<'a> {
        let n = self.n;
        Barrier::boxed(input, move |input| {
            let mut window = VecDeque::with_capacity(n.min(1024));
            for line in input {
                let line = line?;
                if n == 0 {
                    continue;
                }
                if window.len() == n {
                    window.pop_front();
                }
                window.push_back(line);
            }
            Ok(window.into())
        })
    }
}

/// Replaces the input with a single line holding its line count.
///
/// Barrier: emits only after upstream ends.
#[derive(Debug, Clone, Copy, Default)]
pub struct LineCount;

impl<'a> Stage<'a> for LineCount {
    fn name(&self) -> &'static str {
        "wc"
    }

    fn apply(self: Box<Self>, input: Lines<'a>) -> Lines<'a> {
        Barrier::boxed(input, |input| {
            let mut count = 0usize;
            for line in input {
                line?;
                count += 1;
            }
            Ok(vec![count.to_string()])
        })
    }
}

// ---------------------------------------------------------------------------
// Constructors
// ---------------------------------------------------------------------------

/// `grep pattern`: keep lines containing `pattern`.
pub fn grep(pattern: impl Into<String>) -> Grep {
    Grep {
        pattern: Pattern::new(pattern),
        invert: false,
    }
}

/// `grep -v pattern`: keep lines not containing `pattern`.
pub fn grep_v(pattern: impl Into<String>) -> Grep {
    Grep {
        pattern: Pattern::new(pattern),
        invert: true,
    }
}

/// `cut -d delimiter -f index` with a 1-based index.
///
/// Fails with `InvalidFieldIndex` on the first line that lacks the field.
pub fn cut(delimiter: impl Into<String>, index: usize) -> Cut {
    Cut {
        selector: FieldSelector::new(delimiter, index),
    }
}

/// `sort`. Barrier stage: buffers all input.
pub fn sort() -> Sort {
    Sort
}

/// `uniq`: drops adjacent duplicates only. Sort first for global dedup.
pub fn uniq() -> Uniq {
    Uniq
}

/// `nl`: number output lines from 1.
pub fn nl() -> NumberLines {
    NumberLines
}

pub fn dos2unix() -> Dos2Unix {
    Dos2Unix
}

pub fn compact() -> Compact {
    Compact
}

/// Append every line of `other` after the input.
pub fn concat(other: Pipeline<'_>) -> Concat<'_> {
    Concat {
        other: other.into_lines(),
    }
}

pub fn head(n: usize) -> Head {
    Head { n }
}

/// `tail -n n`. Barrier stage: buffers up to `n` lines.
pub fn tail(n: usize) -> Tail {
    Tail { n }
}

/// Literal, global substitution (`sed 's/from/to/g'` without regex).
pub fn sed(from: impl Into<String>, to: impl Into<String>) -> Sed {
    Sed {
        from: from.into(),
        to: to.into(),
    }
}

pub fn upper() -> Upper {
    Upper
}

pub fn lower() -> Lower {
    Lower
}

/// `wc -l`. Barrier stage: emits one line after all input is counted.
pub fn wc() -> LineCount {
    LineCount
}
