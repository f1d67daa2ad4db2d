use crate::error::{ActionError, Result};
use std::fmt;
use std::str::FromStr;

/// Escapes a single segment so that user-supplied keys can never be
/// mistaken for separators: `~` → `~0`, `/` → `~1`, `.` → `~2`.
pub fn escape_segment(segment: &str) -> String {
    let mut escaped = String::with_capacity(segment.len());
    for ch in segment.chars() {
        match ch {
            '~' => escaped.push_str("~0"),
            '/' => escaped.push_str("~1"),
            '.' => escaped.push_str("~2"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Reverses [`escape_segment`]. A `~` not followed by a known digit is kept.
pub fn unescape_segment(segment: &str) -> String {
    let mut unescaped = String::with_capacity(segment.len());
    let mut chars = segment.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '~' {
            unescaped.push(ch);
            continue;
        }

        match chars.peek() {
            Some('0') => unescaped.push('~'),
            Some('1') => unescaped.push('/'),
            Some('2') => unescaped.push('.'),
            _ => {
                unescaped.push('~');
                continue;
            }
        }
        chars.next();
    }

    unescaped
}

/// Path into the variable store, e.g. `project.path` or `input/a~1b`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VariablePath {
    segments: Vec<String>,
}

impl VariablePath {
    pub fn parse(path: &str) -> Result<Self> {
        let trimmed = path.trim();
        if trimmed.is_empty() {
            return Err(ActionError::invalid_input(
                "Variable path cannot be empty.",
            ));
        }

        let mut segments = Vec::new();
        for raw in trimmed.split(['.', '/']) {
            if raw.is_empty() {
                return Err(ActionError::invalid_input(format!(
                    "Variable path `{trimmed}` contains an empty segment."
                )));
            }
            segments.push(unescape_segment(raw));
        }

        Ok(Self { segments })
    }

    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment.into());
        Self { segments }
    }

    pub fn starts_with(&self, other: &VariablePath) -> bool {
        self.segments.starts_with(&other.segments)
    }
}

impl FromStr for VariablePath {
    type Err = ActionError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for VariablePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let escaped: Vec<String> =
            self.segments.iter().map(|s| escape_segment(s)).collect();
        f.write_str(&escaped.join("."))
    }
}
