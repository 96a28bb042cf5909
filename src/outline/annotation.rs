//! Jump annotation grammar.
//!
//! A line may end with one annotation pointing at a code block:
//!
//! | Form        | Syntax          | Resolved index                 | Updates counter |
//! |-------------|-----------------|--------------------------------|-----------------|
//! | Explicit    | `>lang[n]`      | `n`                            | yes             |
//! | Increment   | `>lang++`       | last (default 0) + 1           | yes             |
//! | Advance     | `>lang+=n`      | last (default 0) + n           | yes             |
//! | Repeat      | `>lang`         | last (default 1)               | no              |
//!
//! `lang` is one or more ASCII letters. Annotations only count at the end of
//! the line. There is no escape: a title that really ends in `>word` is
//! always read as an annotation.

use super::node::{EMPTY_NODE_PLACEHOLDER, Jump};
use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Which annotation form a line used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::IntoStaticStr)]
#[strum(serialize_all = "kebab-case")]
pub enum JumpForm {
    /// `>lang[n]`
    Explicit(u32),
    /// `>lang++`
    Increment,
    /// `>lang+=n`
    Advance(u32),
    /// `>lang`
    Repeat,
}

impl JumpForm {
    pub fn name(&self) -> &'static str {
        self.into()
    }
}

/// A trailing annotation found on a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation<'a> {
    pub language: &'a str,
    pub form: JumpForm,
    /// Byte offset where the annotation (and the whitespace before it) starts
    pub start: usize,
}

struct Patterns {
    explicit: Regex,
    increment: Regex,
    advance: Regex,
    repeat: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| Patterns {
        explicit: Regex::new(r"\s*>([A-Za-z]+)\[(\d+)\]\s*$").unwrap(),
        increment: Regex::new(r"\s*>([A-Za-z]+)\+\+\s*$").unwrap(),
        advance: Regex::new(r"\s*>([A-Za-z]+)\+=(\d+)\s*$").unwrap(),
        repeat: Regex::new(r"\s*>([A-Za-z]+)\s*$").unwrap(),
    })
}

/// Find the trailing jump annotation of a line, if any.
///
/// Forms are tried explicit, increment, advance, repeat; the first match
/// wins. A number too large for `u32` means no annotation.
pub fn match_annotation(line: &str) -> Option<Annotation<'_>> {
    let p = patterns();

    if let Some(caps) = p.explicit.captures(line) {
        let n = caps[2].parse::<u32>().ok()?;
        return Some(Annotation {
            language: caps.get(1)?.as_str(),
            form: JumpForm::Explicit(n),
            start: caps.get(0)?.start(),
        });
    }

    if let Some(caps) = p.increment.captures(line) {
        return Some(Annotation {
            language: caps.get(1)?.as_str(),
            form: JumpForm::Increment,
            start: caps.get(0)?.start(),
        });
    }

    if let Some(caps) = p.advance.captures(line) {
        let n = caps[2].parse::<u32>().ok()?;
        return Some(Annotation {
            language: caps.get(1)?.as_str(),
            form: JumpForm::Advance(n),
            start: caps.get(0)?.start(),
        });
    }

    let caps = p.repeat.captures(line)?;
    Some(Annotation {
        language: caps.get(1)?.as_str(),
        form: JumpForm::Repeat,
        start: caps.get(0)?.start(),
    })
}

/// Per-language running index, scoped to one pass over a document.
#[derive(Debug, Clone, Default)]
pub struct JumpCounters {
    last: HashMap<String, u32>,
}

impl JumpCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last resolved index for `language`, as written (case-sensitive).
    pub fn last(&self, language: &str) -> Option<u32> {
        self.last.get(language).copied()
    }

    /// Resolve an annotation to an index, advancing the counter unless the
    /// form is [`JumpForm::Repeat`].
    pub fn resolve(&mut self, language: &str, form: JumpForm) -> u32 {
        let index = match form {
            JumpForm::Explicit(n) => n,
            JumpForm::Increment => self.last(language).unwrap_or(0).saturating_add(1),
            JumpForm::Advance(n) => self.last(language).unwrap_or(0).saturating_add(n),
            JumpForm::Repeat => return self.last(language).unwrap_or(1),
        };
        self.last.insert(language.to_string(), index);
        index
    }
}

/// Title and jump derived from one trimmed source line.
#[derive(Debug, Clone, PartialEq)]
pub struct LineContent {
    pub title: String,
    pub jump: Option<Jump>,
}

/// Interpret a trimmed line: extract its annotation, resolve the jump index
/// against `counters`, and strip the annotation from the title.
pub fn interpret_line(trimmed: &str, counters: &mut JumpCounters) -> LineContent {
    let clean: String = trimmed.chars().filter(|c| *c != '\r' && *c != '\n').collect();

    let (title, jump) = match match_annotation(&clean) {
        Some(annotation) => {
            let index = counters.resolve(annotation.language, annotation.form);
            let jump = Jump {
                language: annotation.language.to_string(),
                index,
            };
            (clean[..annotation.start].trim(), Some(jump))
        }
        None => (clean.as_str(), None),
    };

    let title = if title == EMPTY_NODE_PLACEHOLDER {
        String::new()
    } else {
        title.to_string()
    };

    LineContent { title, jump }
}
