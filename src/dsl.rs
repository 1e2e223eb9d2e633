//! Text form of a pipeline, shell style:
//!
//! ```text
//! grep "2," | cut , 2 | sort | uniq | nl
//! ```
//!
//! - `|` separates stages
//! - arguments are split on whitespace; wrap them in double quotes to keep
//!   spaces or `|`, with `\"` and `\\` escapes inside quotes
//! - stage names are case-insensitive
//! - an unquoted `#` at the start of a word comments out the rest of the line
//!
//! Supported stages:
//! - `grep PATTERN` / `grep -v PATTERN` - keep (or drop) lines containing PATTERN
//! - `cut DELIM N` - keep the N-th (1-based) DELIM-separated field
//! - `sort` - sort all lines (buffers the whole input)
//! - `uniq` - collapse adjacent duplicates
//! - `nl` - number lines from 1
//! - `dos2unix` - turn `\r\n` into `\n`
//! - `compact` - trim and squeeze whitespace
//! - `head N` / `tail N` - first / last N lines
//! - `sed FROM TO` - replace every FROM with TO
//! - `upper` / `lower` - change case
//! - `wc` - replace input with its line count
//! - `cat PATH` - append the lines of PATH

use log::debug;

use crate::error::{PipelineError, Result};
use crate::pipeline::Pipeline;
use crate::stage::{self, Stage};

/// Parsed pipeline command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// grep PATTERN
    Grep { pattern: String },
    /// grep -v PATTERN
    GrepV { pattern: String },
    /// cut DELIM N
    Cut { delimiter: String, index: usize },
    Sort,
    Uniq,
    Nl,
    Dos2Unix,
    Compact,
    /// head N
    Head { n: usize },
    /// tail N
    Tail { n: usize },
    /// sed FROM TO
    Sed { from: String, to: String },
    Upper,
    Lower,
    Wc,
    /// cat PATH - concatenate a file after the input
    Cat { path: String },
}

impl Command {
    /// Get the stage name for messages.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Grep { .. } => "grep",
            Command::GrepV { .. } => "grep -v",
            Command::Cut { .. } => "cut",
            Command::Sort => "sort",
            Command::Uniq => "uniq",
            Command::Nl => "nl",
            Command::Dos2Unix => "dos2unix",
            Command::Compact => "compact",
            Command::Head { .. } => "head",
            Command::Tail { .. } => "tail",
            Command::Sed { .. } => "sed",
            Command::Upper => "upper",
            Command::Lower => "lower",
            Command::Wc => "wc",
            Command::Cat { .. } => "cat",
        }
    }

    /// True for stages that read their whole input before emitting.
    pub fn is_barrier(&self) -> bool {
        matches!(self, Command::Sort | Command::Tail { .. } | Command::Wc)
    }
}

/// Parse pipeline text into commands.
///
/// Blank or comment-only text yields no commands. An empty segment between
/// two `|` is an error.
pub fn parse_commands(text: &str) -> Result<Vec<Command>> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }

    split_segments(text)?.iter().map(parse_command).collect()
}

/// A segment's raw text plus its tokens.
struct Segment {
    text: String,
    tokens: Vec<String>,
}

/// Split on unquoted `|`, tokenizing each segment on the way.
fn split_segments(text: &str) -> Result<Vec<Segment>> {
    let mut segments = Vec::new();
    let mut raw = String::new();
    let mut tokens = Vec::new();
    let mut token: Option<String> = None;
    let mut chars = text.chars();

    while let Some(c) = chars.next() {
        match c {
            '|' => {
                tokens.extend(token.take());
                segments.push(finish_segment(&mut raw, &mut tokens)?);
            }
            '"' => {
                raw.push(c);
                let quoted = token.get_or_insert_with(String::new);
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\\') => match chars.next() {
                            Some(escaped @ ('"' | '\\')) => {
                                raw.push('\\');
                                raw.push(escaped);
                                quoted.push(escaped);
                            }
                            Some(other) => {
                                raw.push('\\');
                                raw.push(other);
                                quoted.push('\\');
                                quoted.push(other);
                            }
                            None => {
                                return Err(PipelineError::parse(&raw, "unterminated quote"));
                            }
                        },
                        Some(other) => {
                            raw.push(other);
                            quoted.push(other);
                        }
                        None => {
                            return Err(PipelineError::parse(&raw, "unterminated quote"));
                        }
                    }
                }
                raw.push('"');
            }
            '#' if token.is_none() => {
                for skipped in chars.by_ref() {
                    if skipped == '\n' {
                        break;
                    }
                }
            }
            c if c.is_whitespace() => {
                raw.push(c);
                tokens.extend(token.take());
            }
            c => {
                raw.push(c);
                token.get_or_insert_with(String::new).push(c);
            }
        }
    }

    tokens.extend(token.take());
    if segments.is_empty() && tokens.is_empty() {
        return Ok(segments);
    }
    segments.push(finish_segment(&mut raw, &mut tokens)?);
    Ok(segments)
}

fn finish_segment(raw: &mut String, tokens: &mut Vec<String>) -> Result<Segment> {
    let text = raw.trim().to_string();
    if tokens.is_empty() {
        return Err(PipelineError::parse(&text, "empty stage"));
    }
    raw.clear();
    Ok(Segment {
        text,
        tokens: std::mem::take(tokens),
    })
}

/// Parse one segment into a command.
fn parse_command(segment: &Segment) -> Result<Command> {
    let text = segment.text.as_str();
    let (name, args) = match segment.tokens.split_first() {
        Some((name, args)) => (name.to_lowercase(), args),
        None => return Err(PipelineError::parse(text, "empty stage")),
    };

    let command = match (name.as_str(), args) {
        ("grep", [flag, pattern]) if flag == "-v" => Command::GrepV {
            pattern: pattern.clone(),
        },
        ("grep", [flag]) if flag == "-v" => return Err(usage(text, "grep -v PATTERN")),
        ("grep", [pattern]) => Command::Grep {
            pattern: pattern.clone(),
        },
        ("grep", _) => return Err(usage(text, "grep [-v] PATTERN")),
        ("cut", [delimiter, index]) => Command::Cut {
            delimiter: delimiter.clone(),
            index: parse_count(text, index)?,
        },
        ("cut", _) => return Err(usage(text, "cut DELIM N")),
        ("head", [n]) => Command::Head {
            n: parse_count(text, n)?,
        },
        ("head", _) => return Err(usage(text, "head N")),
        ("tail", [n]) => Command::Tail {
            n: parse_count(text, n)?,
        },
        ("tail", _) => return Err(usage(text, "tail N")),
        ("sed", [from, to]) => Command::Sed {
            from: from.clone(),
            to: to.clone(),
        },
        ("sed", _) => return Err(usage(text, "sed FROM TO")),
        ("cat", [path]) => Command::Cat { path: path.clone() },
        ("cat", _) => return Err(usage(text, "cat PATH")),
        ("sort", []) => Command::Sort,
        ("uniq", []) => Command::Uniq,
        ("nl", []) => Command::Nl,
        ("dos2unix", []) => Command::Dos2Unix,
        ("compact", []) => Command::Compact,
        ("upper", []) => Command::Upper,
        ("lower", []) => Command::Lower,
        ("wc", []) => Command::Wc,
        ("sort" | "uniq" | "nl" | "dos2unix" | "compact" | "upper" | "lower" | "wc", _) => {
            return Err(PipelineError::parse(
                text,
                format!("{name} takes no arguments"),
            ));
        }
        (other, _) => {
            return Err(PipelineError::parse(
                text,
                format!("unknown stage `{other}`"),
            ));
        }
    };

    Ok(command)
}

fn usage(segment: &str, form: &str) -> PipelineError {
    PipelineError::parse(segment, format!("expected `{form}`"))
}

fn parse_count(segment: &str, value: &str) -> Result<usize> {
    value
        .parse()
        .map_err(|_| PipelineError::parse(segment, format!("`{value}` is not a number")))
}

/// Create a stage from a parsed command.
///
/// `cat PATH` opens its file here, so a missing path fails before the
/// pipeline runs.
pub fn command_to_stage<'a>(cmd: &Command) -> Result<Box<dyn Stage<'a> + 'a>> {
    let stage: Box<dyn Stage<'a> + 'a> = match cmd {
        Command::Grep { pattern } => Box::new(stage::grep(pattern.as_str())),
        Command::GrepV { pattern } => Box::new(stage::grep_v(pattern.as_str())),
        Command::Cut { delimiter, index } => Box::new(stage::cut(delimiter.as_str(), *index)),
        Command::Sort => Box::new(stage::sort()),
        Command::Uniq => Box::new(stage::uniq()),
        Command::Nl => Box::new(stage::nl()),
        Command::Dos2Unix => Box::new(stage::dos2unix()),
        Command::Compact => Box::new(stage::compact()),
        Command::Head { n } => Box::new(stage::head(*n)),
        Command::Tail { n } => Box::new(stage::tail(*n)),
        Command::Sed { from, to } => Box::new(stage::sed(from.as_str(), to.as_str())),
        Command::Upper => Box::new(stage::upper()),
        Command::Lower => Box::new(stage::lower()),
        Command::Wc => Box::new(stage::wc()),
        Command::Cat { path } => Box::new(stage::concat(Pipeline::from_file(path)?)),
    };
    Ok(stage)
}

/// Parse `text` and apply every command to `source`, in order.
pub fn build_pipeline<'a>(source: Pipeline<'a>, text: &str) -> Result<Pipeline<'a>> {
    parse_commands(text)?
        .iter()
        .try_fold(source, |pipeline, cmd| {
            if cmd.is_barrier() {
                debug!("`{}` buffers its whole input", cmd.name());
            }
            Ok(pipeline.pipe_boxed(command_to_stage(cmd)?))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::unixify;

    fn parse_one(text: &str) -> Command {
        let mut commands = parse_commands(text).unwrap();
        assert_eq!(commands.len(), 1);
        commands.remove(0)
    }

    #[test]
    fn test_parse_grep() {
        assert_eq!(
            parse_one("grep bar"),
            Command::Grep {
                pattern: "bar".to_string()
            }
        );
    }

    #[test]
    fn test_parse_grep_v() {
        assert_eq!(
            parse_one("GREP -v bar"),
            Command::GrepV {
                pattern: "bar".to_string()
            }
        );
    }

    #[test]
    fn test_parse_quoted_pattern() {
        assert_eq!(
            parse_one(r#"grep "a | b \"c\"""#),
            Command::Grep {
                pattern: r#"a | b "c""#.to_string()
            }
        );
    }

    #[test]
    fn test_parse_empty_quoted_argument() {
        assert_eq!(
            parse_one(r#"grep """#),
            Command::Grep {
                pattern: String::new()
            }
        );
    }

    #[test]
    fn test_parse_cut() {
        assert_eq!(
            parse_one("cut , 2"),
            Command::Cut {
                delimiter: ",".to_string(),
                index: 2
            }
        );
    }

    #[test]
    fn test_parse_cut_space_delimiter() {
        assert_eq!(
            parse_one(r#"cut " " 1"#),
            Command::Cut {
                delimiter: " ".to_string(),
                index: 1
            }
        );
    }

    #[test]
    fn test_parse_sed() {
        assert_eq!(
            parse_one("sed foo bar"),
            Command::Sed {
                from: "foo".to_string(),
                to: "bar".to_string()
            }
        );
    }

    #[test]
    fn test_parse_chain() {
        let commands = parse_commands("grep a | sort | uniq | nl").unwrap();
        let names: Vec<_> = commands.iter().map(Command::name).collect();
        assert_eq!(names, vec!["grep", "sort", "uniq", "nl"]);
    }

    #[test]
    fn test_parse_blank_is_empty() {
        assert!(parse_commands("   ").unwrap().is_empty());
    }

    #[test]
    fn test_empty_segment_rejected() {
        let err = parse_commands("sort | | nl").unwrap_err();
        assert!(err.to_string().contains("empty stage"));
    }

    #[test]
    fn test_unknown_stage() {
        let err = parse_commands("sort | frobnicate").unwrap_err();
        assert!(err.to_string().contains("unknown stage `frobnicate`"));
    }

    #[test]
    fn test_bad_count() {
        let err = parse_commands("head many").unwrap_err();
        assert!(err.to_string().contains("`many` is not a number"));
    }

    #[test]
    fn test_wrong_arity() {
        assert!(parse_commands("cut ,").is_err());
        assert!(parse_commands("sort -r").is_err());
        assert!(parse_commands("grep").is_err());
    }

    #[test]
    fn test_grep_v_without_pattern() {
        let err = parse_commands("grep -v").unwrap_err();
        assert!(err.to_string().contains("expected `grep -v PATTERN`"));
        assert!(parse_commands("sort | grep -v | nl").is_err());
    }

    #[test]
    fn test_comment_only_is_empty() {
        assert!(parse_commands("# nothing to do").unwrap().is_empty());
        assert!(parse_commands("  # one\n# two\n").unwrap().is_empty());
    }

    #[test]
    fn test_trailing_comment_ignored() {
        let commands = parse_commands("grep a | sort # keep it ordered").unwrap();
        let names: Vec<_> = commands.iter().map(Command::name).collect();
        assert_eq!(names, vec!["grep", "sort"]);
    }

    #[test]
    fn test_comment_lines_between_stages() {
        let text = "grep a   # only a lines\n| uniq\n# numbered\n| nl";
        let commands = parse_commands(text).unwrap();
        let names: Vec<_> = commands.iter().map(Command::name).collect();
        assert_eq!(names, vec!["grep", "uniq", "nl"]);
    }

    #[test]
    fn test_hash_inside_word_or_quotes_is_literal() {
        assert_eq!(
            parse_one(r##"grep "#""##),
            Command::Grep {
                pattern: "#".to_string()
            }
        );
        assert_eq!(
            parse_one("grep a#b"),
            Command::Grep {
                pattern: "a#b".to_string()
            }
        );
    }

    #[test]
    fn test_comment_hiding_whole_stage_is_empty_segment() {
        let err = parse_commands("sort | # uniq").unwrap_err();
        assert!(err.to_string().contains("empty stage"));
    }

    #[test]
    fn test_unterminated_quote() {
        let err = parse_commands(r#"grep "abc"#).unwrap_err();
        assert!(err.to_string().contains("unterminated quote"));
    }

    #[test]
    fn test_barrier_flags() {
        assert!(Command::Sort.is_barrier());
        assert!(Command::Tail { n: 1 }.is_barrier());
        assert!(!Command::Uniq.is_barrier());
    }

    #[test]
    fn test_build_pipeline() {
        let source = unixify(["id,name", "1,foo", "2,bar"]);
        let out = build_pipeline(source, "grep bar | cut , 2 | sort | uniq | nl")
            .unwrap()
            .collect()
            .unwrap();
        assert_eq!(out, vec!["1 bar"]);
    }

    #[test]
    fn test_build_pipeline_with_barriers() {
        let source = unixify(["c", "a", "b"]);
        let p = build_pipeline(source, "sort | tail 2 | wc").unwrap();
        assert_eq!(p.stage_names(), &["sort", "tail", "wc"]);
        assert_eq!(p.collect().unwrap(), vec!["2"]);
    }

    #[test]
    fn test_build_pipeline_records_stage_names() {
        let p = build_pipeline(unixify(["a"]), "grep -v x | wc").unwrap();
        assert_eq!(p.stage_names(), &["grep -v", "wc"]);
    }

    #[test]
    fn test_cat_missing_file_fails_at_build() {
        let dir = tempfile::tempdir().unwrap();
        let text = format!("cat \"{}\"", dir.path().join("nope.txt").display());
        let err = build_pipeline(unixify(["a"]), &text).unwrap_err();
        assert!(matches!(err, PipelineError::Io { .. }));
    }
}
