//! Span-aware reader for JSON manifests and the JSON5 subset authors use
//! in hand-written templates: comments, trailing commas, single-quoted
//! strings and unquoted keys.

use serde_json::{json, Map, Number, Value};
use stencil_context::{Position, SourceLocation, SyntaxError};
use stencil_core::SOURCE_KEY;

const MAX_DEPTH: usize = 128;

/// Keys of an action definition whose values are nested definitions.
const NESTED_ACTION_KEYS: [&str; 3] = ["actions", "action", "otherwise"];

/// A parsed value together with the span it occupies in the document.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub node: Node,
    pub start: Position,
    pub end: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Vec<Spanned>),
    /// Entries in document order. Duplicate keys are kept; the last one
    /// wins on conversion.
    Object(Vec<(String, Spanned)>),
}

impl Spanned {
    /// Plain JSON, without provenance.
    pub fn into_value(self) -> Value {
        match self.node {
            Node::Null => Value::Null,
            Node::Bool(b) => Value::Bool(b),
            Node::Number(n) => Value::Number(n),
            Node::String(s) => Value::String(s),
            Node::Array(items) => {
                Value::Array(items.into_iter().map(Spanned::into_value).collect())
            }
            Node::Object(entries) => Value::Object(
                entries
                    .into_iter()
                    .map(|(key, value)| (key, value.into_value()))
                    .collect(),
            ),
        }
    }

    pub fn location(&self, url: &str) -> SourceLocation {
        SourceLocation {
            url: url.to_string(),
            start: self.start,
            end: self.end,
        }
    }
}

/// Parses `source` into a span tree.
pub fn parse(source: &str, url: &str) -> Result<Spanned, SyntaxError> {
    let mut parser = Parser::new(source, url);
    parser.skip_trivia()?;
    let root = parser.parse_value(0)?;
    parser.skip_trivia()?;

    if parser.peek().is_some() {
        return Err(parser.error_here("Unexpected content after the document."));
    }

    Ok(root)
}

/// Parses a manifest and records the location of every action definition
/// under [`SOURCE_KEY`].
pub fn parse_manifest(source: &str, url: &str) -> Result<Value, SyntaxError> {
    let root = parse(source, url)?;
    Ok(manifest_value(root, url))
}

/// Converts a manifest tree to JSON. Top-level `actions` entries and the
/// nested definitions of `run`, `try` and friends receive a `$source`.
pub fn manifest_value(root: Spanned, url: &str) -> Value {
    match root.node {
        Node::Object(entries) => Value::Object(
            entries
                .into_iter()
                .map(|(key, value)| {
                    let value = if key == "actions" {
                        definitions_value(value, url)
                    } else {
                        value.into_value()
                    };
                    (key, value)
                })
                .collect(),
        ),
        _ => root.into_value(),
    }
}

/// A single definition or a list of them.
fn definitions_value(spanned: Spanned, url: &str) -> Value {
    match spanned.node {
        Node::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| definition_value(item, url))
                .collect(),
        ),
        Node::Object(_) => definition_value(spanned, url),
        _ => spanned.into_value(),
    }
}

fn definition_value(spanned: Spanned, url: &str) -> Value {
    let location = location_value(&spanned.location(url));
    let entries = match spanned.node {
        Node::Object(entries) => entries,
        node => return Spanned { node, ..spanned }.into_value(),
    };

    let mut object = Map::new();
    object.insert(SOURCE_KEY.to_string(), location);
    for (key, value) in entries {
        let value = if NESTED_ACTION_KEYS.contains(&key.as_str()) {
            definitions_value(value, url)
        } else {
            value.into_value()
        };
        object.insert(key, value);
    }

    Value::Object(object)
}

fn location_value(location: &SourceLocation) -> Value {
    let position = |p: &Position| {
        json!({"index": p.index, "line": p.line, "column": p.column})
    };

    json!({
        "url": location.url,
        "start": position(&location.start),
        "end": position(&location.end),
    })
}

struct Parser<'a> {
    source: &'a str,
    url: &'a str,
    index: usize,
    line: usize,
    column: usize,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str, url: &'a str) -> Self {
        Self {
            source,
            url,
            index: 0,
            line: 1,
            column: 1,
        }
    }

    fn position(&self) -> Position {
        Position::new(self.index, self.line, self.column)
    }

    fn peek(&self) -> Option<char> {
        self.source[self.index..].chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        self.source[self.index..].chars().nth(1)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.index += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn error(&self, message: impl Into<String>, start: Position) -> SyntaxError {
        SyntaxError {
            message: message.into(),
            location: SourceLocation {
                url: self.url.to_string(),
                start,
                end: self.position(),
            },
        }
    }

    /// Error spanning the character under the cursor.
    fn error_here(&self, message: impl Into<String>) -> SyntaxError {
        let start = self.position();
        let mut end = start;
        if let Some(c) = self.peek() {
            end.index += c.len_utf8();
            end.column += 1;
        }

        SyntaxError {
            message: message.into(),
            location: SourceLocation {
                url: self.url.to_string(),
                start,
                end,
            },
        }
    }

    fn skip_trivia(&mut self) -> Result<(), SyntaxError> {
        loop {
            match (self.peek(), self.peek_second()) {
                (Some(c), _) if c.is_whitespace() || c == '\u{feff}' => {
                    self.bump();
                }
                (Some('/'), Some('/')) => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.bump();
                    }
                }
                (Some('/'), Some('*')) => {
                    let start = self.position();
                    self.bump();
                    self.bump();
                    loop {
                        match self.bump() {
                            Some('*') if self.peek() == Some('/') => {
                                self.bump();
                                break;
                            }
                            Some(_) => {}
                            None => {
                                return Err(self.error("Unterminated comment.", start))
                            }
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn parse_value(&mut self, depth: usize) -> Result<Spanned, SyntaxError> {
        if depth > MAX_DEPTH {
            return Err(self.error_here("Document is nested too deeply."));
        }

        let start = self.position();
        let node = match self.peek() {
            None => return Err(self.error_here("Unexpected end of document.")),
            Some('{') => self.parse_object(depth)?,
            Some('[') => self.parse_array(depth)?,
            Some(quote @ ('"' | '\'')) => Node::String(self.parse_string(quote)?),
            Some(c) if c == '-' || c == '+' || c == '.' || c.is_ascii_digit() => {
                Node::Number(self.parse_number()?)
            }
            Some(c) if is_identifier_start(c) => {
                let word = self.parse_identifier();
                match word.as_str() {
                    "null" => Node::Null,
                    "true" => Node::Bool(true),
                    "false" => Node::Bool(false),
                    _ => {
                        return Err(
                            self.error(format!("Unexpected identifier `{word}`."), start)
                        )
                    }
                }
            }
            Some(c) => return Err(self.error_here(format!("Unexpected character `{c}`."))),
        };

        Ok(Spanned {
            node,
            start,
            end: self.position(),
        })
    }

    fn parse_object(&mut self, depth: usize) -> Result<Node, SyntaxError> {
        let start = self.position();
        self.bump();
        let mut entries = Vec::new();

        loop {
            self.skip_trivia()?;
            match self.peek() {
                Some('}') => {
                    self.bump();
                    break;
                }
                None => return Err(self.error("Unterminated object.", start)),
                _ => {}
            }

            let key = self.parse_key()?;
            self.skip_trivia()?;
            if self.peek() != Some(':') {
                return Err(self.error_here("Expected `:` after property name."));
            }
            self.bump();
            self.skip_trivia()?;

            let value = self.parse_value(depth + 1)?;
            entries.push((key, value));

            self.skip_trivia()?;
            match self.peek() {
                Some(',') => {
                    self.bump();
                }
                Some('}') => {
                    self.bump();
                    break;
                }
                None => return Err(self.error("Unterminated object.", start)),
                Some(_) => return Err(self.error_here("Expected `,` or `}`.")),
            }
        }

        Ok(Node::Object(entries))
    }

    fn parse_array(&mut self, depth: usize) -> Result<Node, SyntaxError> {
        let start = self.position();
        self.bump();
        let mut items = Vec::new();

        loop {
            self.skip_trivia()?;
            match self.peek() {
                Some(']') => {
                    self.bump();
                    break;
                }
                None => return Err(self.error("Unterminated array.", start)),
                _ => {}
            }

            items.push(self.parse_value(depth + 1)?);

            self.skip_trivia()?;
            match self.peek() {
                Some(',') => {
                    self.bump();
                }
                Some(']') => {
                    self.bump();
                    break;
                }
                None => return Err(self.error("Unterminated array.", start)),
                Some(_) => return Err(self.error_here("Expected `,` or `]`.")),
            }
        }

        Ok(Node::Array(items))
    }

    fn parse_key(&mut self) -> Result<String, SyntaxError> {
        match self.peek() {
            Some(quote @ ('"' | '\'')) => self.parse_string(quote),
            Some(c) if is_identifier_start(c) => Ok(self.parse_identifier()),
            _ => Err(self.error_here("Expected a property name.")),
        }
    }

    fn parse_identifier(&mut self) -> String {
        let start = self.index;
        while let Some(c) = self.peek() {
            if !is_identifier_part(c) {
                break;
            }
            self.bump();
        }
        self.source[start..self.index].to_string()
    }

    fn parse_string(&mut self, quote: char) -> Result<String, SyntaxError> {
        let start = self.position();
        self.bump();
        let mut out = String::new();

        loop {
            match self.bump() {
                None | Some('\n') => {
                    return Err(self.error("Unterminated string.", start))
                }
                Some(c) if c == quote => return Ok(out),
                Some('\\') => self.parse_escape(&mut out)?,
                Some(c) => out.push(c),
            }
        }
    }

    fn parse_escape(&mut self, out: &mut String) -> Result<(), SyntaxError> {
        let start = self.position();
        match self.bump() {
            None => return Err(self.error("Unterminated string.", start)),
            Some('b') => out.push('\u{8}'),
            Some('f') => out.push('\u{c}'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('v') => out.push('\u{b}'),
            Some('0') if !self.peek().is_some_and(|c| c.is_ascii_digit()) => {
                out.push('\0')
            }
            // Line continuation.
            Some('\n') => {}
            Some('\r') => {
                if self.peek() == Some('\n') {
                    self.bump();
                }
            }
            Some('u') => {
                let high = self.parse_hex4(start)?;
                let code = if (0xd800..0xdc00).contains(&high) {
                    if self.peek() != Some('\\') || self.peek_second() != Some('u') {
                        return Err(self.error("Unpaired surrogate in escape.", start));
                    }
                    self.bump();
                    self.bump();
                    let low = self.parse_hex4(start)?;
                    if !(0xdc00..0xe000).contains(&low) {
                        return Err(self.error("Unpaired surrogate in escape.", start));
                    }
                    0x10000 + ((high - 0xd800) << 10) + (low - 0xdc00)
                } else {
                    high
                };
                let c = char::from_u32(code)
                    .ok_or_else(|| self.error("Invalid unicode escape.", start))?;
                out.push(c);
            }
            Some(c) if c.is_ascii_digit() => {
                return Err(self.error("Invalid escape sequence.", start))
            }
            Some(c) => out.push(c),
        }
        Ok(())
    }

    fn parse_hex4(&mut self, start: Position) -> Result<u32, SyntaxError> {
        let mut code = 0;
        for _ in 0..4 {
            let digit = self
                .bump()
                .and_then(|c| c.to_digit(16))
                .ok_or_else(|| self.error("Invalid unicode escape.", start))?;
            code = code * 16 + digit;
        }
        Ok(code)
    }

    fn parse_number(&mut self) -> Result<Number, SyntaxError> {
        let start = self.position();
        let begin = self.index;

        if matches!(self.peek(), Some('+' | '-')) {
            self.bump();
        }
        let mut previous = None;
        while let Some(c) = self.peek() {
            let exponent_sign =
                matches!(c, '+' | '-') && matches!(previous, Some('e' | 'E'));
            if !(c.is_ascii_alphanumeric() || c == '.' || exponent_sign) {
                break;
            }
            previous = Some(c);
            self.bump();
        }

        let text = &self.source[begin..self.index];
        let invalid = || self.error(format!("Invalid number `{text}`."), start);

        let (negative, digits) = match text.as_bytes().first() {
            Some(b'-') => (true, &text[1..]),
            Some(b'+') => (false, &text[1..]),
            _ => (false, text),
        };

        if let Some(hex) = digits
            .strip_prefix("0x")
            .or_else(|| digits.strip_prefix("0X"))
        {
            let magnitude = i64::from_str_radix(hex, 16).map_err(|_| invalid())?;
            return Ok(Number::from(if negative { -magnitude } else { magnitude }));
        }

        let mut normalized = String::with_capacity(text.len() + 2);
        if negative {
            normalized.push('-');
        }
        if digits.starts_with('.') {
            normalized.push('0');
        }
        normalized.push_str(digits);
        if digits.ends_with('.') {
            normalized.push('0');
        }

        serde_json::from_str::<Number>(&normalized).map_err(|_| invalid())
    }
}

fn is_identifier_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

fn is_identifier_part(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "file:///template/manifest.json5";

    #[test]
    fn test_parse_plain_json() {
        let value = parse(r#"{"a": [1, 2.5, -3], "b": null, "c": "xé"}"#, URL)
            .unwrap()
            .into_value();

        assert_eq!(value, json!({"a": [1, 2.5, -3], "b": null, "c": "xé"}));
    }

    #[test]
    fn test_parse_json5_subset() {
        let source = r#"
            // leading comment
            {
                title: 'Demo', /* inline */
                "count": +3,
                ratio: .5,
                hex: 0x1F,
                list: [1, 2,],
                quote: 'it\'s',
            }
        "#;

        let value = parse(source, URL).unwrap().into_value();

        assert_eq!(
            value,
            json!({
                "title": "Demo",
                "count": 3,
                "ratio": 0.5,
                "hex": 31,
                "list": [1, 2],
                "quote": "it's"
            })
        );
    }

    #[test]
    fn test_surrogate_pair_escape() {
        let value = parse(r#""\ud83d\ude00""#, URL).unwrap().into_value();
        assert_eq!(value, json!("😀"));
    }

    #[test]
    fn test_spans_track_lines_and_columns() {
        let root = parse("{\n  \"a\": [true]\n}", URL).unwrap();
        let Node::Object(entries) = &root.node else {
            panic!("expected object");
        };
        let (_, value) = &entries[0];

        assert_eq!(value.start, Position::new(9, 2, 8));
        assert_eq!(value.end, Position::new(15, 2, 14));
        assert_eq!(root.end.line, 3);
    }

    #[test]
    fn test_syntax_error_location() {
        let error = parse("{\n  \"a\": 1\n  \"b\": 2\n}", URL).unwrap_err();

        assert_eq!(error.message, "Expected `,` or `}`.");
        assert_eq!(error.location.url, URL);
        assert_eq!(error.location.start.line, 3);
        assert_eq!(error.location.start.column, 3);
    }

    #[test]
    fn test_unterminated_string_points_at_opening_quote() {
        let error = parse("{\"a\": \"open}", URL).unwrap_err();

        assert_eq!(error.message, "Unterminated string.");
        assert_eq!(error.location.start.column, 7);
    }

    #[test]
    fn test_trailing_content_is_rejected() {
        let error = parse("{} {}", URL).unwrap_err();
        assert_eq!(error.location.start.index, 3);
    }

    #[test]
    fn test_unknown_identifier_is_rejected() {
        let error = parse("[undefined]", URL).unwrap_err();
        assert_eq!(error.message, "Unexpected identifier `undefined`.");
    }

    #[test]
    fn test_manifest_value_annotates_definitions() {
        let source = r#"{
  "options": {"name": {"type": "string"}},
  "actions": [
    {"name": "run", "actions": [
      {"name": "print", "message": {"action": "not a definition"}}
    ]},
    {"name": "try", "action": {"name": "fail"}, "otherwise": {"name": "print"}}
  ]
}"#;

        let value = parse_manifest(source, URL).unwrap();
        let actions = &value["actions"];

        assert!(value["options"]["name"].get(SOURCE_KEY).is_none());
        assert_eq!(actions[0][SOURCE_KEY]["start"]["line"], json!(4));
        assert_eq!(actions[0]["actions"][0][SOURCE_KEY]["start"]["line"], json!(5));
        assert!(actions[0]["actions"][0]["message"].get(SOURCE_KEY).is_none());
        assert_eq!(actions[1]["action"][SOURCE_KEY]["url"], json!(URL));
        assert_eq!(actions[1]["otherwise"][SOURCE_KEY]["start"]["line"], json!(7));
    }
}
