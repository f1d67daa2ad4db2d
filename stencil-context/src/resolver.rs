//! Literal vs. reference resolution of option values.
//!
//! A string that is exactly one `${path}` placeholder resolves to the raw
//! value stored at `path`. Placeholders embedded in other text are
//! interpolated into a string. Strings without placeholders, and every
//! non-string value, are literals. `\${` produces a literal `${`.

use crate::error::{ActionError, Result};
use crate::path::VariablePath;
use crate::store::VariableStore;
use futures::future::try_join_all;
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

fn placeholder_regex() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| {
        Regex::new(r"(\\)?\$\{([^{}]*)\}").expect("placeholder pattern is valid")
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Text(String),
    Reference(String),
}

fn parse_template(template: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut text = String::new();
    let mut last = 0;

    for captures in placeholder_regex().captures_iter(template) {
        let Some(whole) = captures.get(0) else {
            continue;
        };
        text.push_str(&template[last..whole.start()]);
        last = whole.end();

        if captures.get(1).is_some() {
            // escaped: keep `${...}` without the backslash
            text.push_str(&whole.as_str()[1..]);
            continue;
        }

        if !text.is_empty() {
            segments.push(Segment::Text(std::mem::take(&mut text)));
        }
        let expression = captures.get(2).map_or("", |m| m.as_str());
        segments.push(Segment::Reference(expression.trim().to_string()));
    }

    text.push_str(&template[last..]);
    if !text.is_empty() {
        segments.push(Segment::Text(text));
    }

    segments
}

/// Returns true when `value` contains at least one unescaped placeholder.
pub fn is_reference(value: &Value) -> bool {
    match value {
        Value::String(s) => parse_template(s)
            .iter()
            .any(|segment| matches!(segment, Segment::Reference(_))),
        _ => false,
    }
}

pub fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Resolves candidates against a [`VariableStore`].
#[derive(Clone, Default)]
pub struct ExpressionResolver {
    store: VariableStore,
}

impl ExpressionResolver {
    pub fn new(store: VariableStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &VariableStore {
        &self.store
    }

    /// Resolves any candidate, preserving the type of whole references.
    pub async fn resolve_value(&self, candidate: &Value) -> Result<Value> {
        let Value::String(template) = candidate else {
            return Ok(candidate.clone());
        };

        let mut segments = parse_template(template);
        match segments.as_mut_slice() {
            [] => Ok(Value::String(String::new())),
            [Segment::Text(text)] => Ok(Value::String(std::mem::take(text))),
            [Segment::Reference(expression)] => self.lookup(expression).await,
            _ => self.interpolate(&segments).await.map(Value::String),
        }
    }

    pub async fn resolve_string(&self, candidate: &Value) -> Result<String> {
        match self.resolve_value(candidate).await? {
            Value::String(s) => Ok(s),
            other => Err(mismatch(candidate, "string", &other)),
        }
    }

    pub async fn resolve_boolean(&self, candidate: &Value) -> Result<bool> {
        match self.resolve_value(candidate).await? {
            Value::Bool(b) => Ok(b),
            other => Err(mismatch(candidate, "boolean", &other)),
        }
    }

    /// Resolves a list element-wise. String items are references, anything
    /// else passes through. Fails as a whole if any item fails.
    pub async fn resolve_list(&self, items: &[Value]) -> Result<Vec<Value>> {
        try_join_all(items.iter().map(|item| self.resolve_value(item))).await
    }

    async fn lookup(&self, expression: &str) -> Result<Value> {
        let path = VariablePath::parse(expression)?;
        self.store.get(&path).await
    }

    async fn interpolate(&self, segments: &[Segment]) -> Result<String> {
        let parts = try_join_all(segments.iter().map(|segment| async move {
            match segment {
                Segment::Text(text) => Ok(text.clone()),
                Segment::Reference(expression) => {
                    let value = self.lookup(expression).await?;
                    stringify(expression, value)
                }
            }
        }))
        .await?;

        Ok(parts.concat())
    }
}

fn stringify(expression: &str, value: Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Null => Ok("null".to_string()),
        other => Err(ActionError::invalid_input(format!(
            "Cannot interpolate `{expression}` into a string because it resolves to {} {}.",
            article(value_kind(&other)),
            value_kind(&other)
        ))),
    }
}

fn mismatch(candidate: &Value, expected: &str, actual: &Value) -> ActionError {
    let shown = match candidate {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    let kind = value_kind(actual);

    ActionError::invalid_input(format!(
        "Expected `{shown}` to resolve to {} {expected}, but got {} {kind}.",
        article(expected),
        article(kind),
    ))
}

fn article(word: &str) -> &'static str {
    match word.chars().next() {
        Some('a' | 'e' | 'i' | 'o' | 'u') => "an",
        _ => "a",
    }
}
