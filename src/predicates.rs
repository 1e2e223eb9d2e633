//! Line predicates usable outside a pipeline.
//!
//! ```
//! use unix_stream::predicates;
//!
//! let lines = ["id,name", "1,foo", "2,bar"];
//! let keep = predicates::grep("a");
//! let hits: Vec<&str> = lines.into_iter().filter(|&l| keep(l)).collect();
//! assert_eq!(hits, vec!["id,name", "2,bar"]);
//! ```

/// Substring matcher behind both `predicates::grep` and the `Grep` stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    text: String,
}

impl Pattern {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// True if `line` contains the pattern. The empty pattern matches every line.
    pub fn matches(&self, line: &str) -> bool {
        line.contains(self.text.as_str())
    }
}

/// Predicate keeping lines that contain `pattern`.
pub fn grep(pattern: impl Into<String>) -> impl Fn(&str) -> bool {
    let pattern = Pattern::new(pattern);
    move |line| pattern.matches(line)
}

/// Predicate keeping lines that do not contain `pattern`.
pub fn grep_v(pattern: impl Into<String>) -> impl Fn(&str) -> bool {
    let pattern = Pattern::new(pattern);
    move |line| !pattern.matches(line)
}
