use serde::{Deserialize, Serialize};
use std::fmt;

pub type Result<T, E = ActionError> = std::result::Result<T, E>;

/// Closed classification attached to every [`ActionError`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorReason {
    Precondition,
    InvalidConfiguration,
    AccessDenied,
    InvalidInput,
    NotFound,
    NotSupported,
    UnexpectedResult,
    #[default]
    Other,
}

impl ErrorReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorReason::Precondition => "PRECONDITION",
            ErrorReason::InvalidConfiguration => "INVALID_CONFIGURATION",
            ErrorReason::AccessDenied => "ACCESS_DENIED",
            ErrorReason::InvalidInput => "INVALID_INPUT",
            ErrorReason::NotFound => "NOT_FOUND",
            ErrorReason::NotSupported => "NOT_SUPPORTED",
            ErrorReason::UnexpectedResult => "UNEXPECTED_RESULT",
            ErrorReason::Other => "OTHER",
        }
    }
}

impl fmt::Display for ErrorReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A position inside a manifest document. `line` and `column` are 1-based,
/// `index` is the byte offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub index: usize,
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(index: usize, line: usize, column: usize) -> Self {
        Self {
            index,
            line,
            column,
        }
    }
}

/// Span of a manifest fragment in the document it was loaded from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    pub url: String,
    pub start: Position,
    pub end: Position,
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.url, self.start.line, self.start.column)
    }
}

/// One failing step, recorded while the failure unwinds through `run`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceFrame {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceLocation>,
}

impl TraceFrame {
    pub fn new(name: impl Into<String>, source: Option<SourceLocation>) -> Self {
        Self {
            name: name.into(),
            source,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HelpLink {
    pub url: String,
    pub label: String,
}

/// Malformed manifest document.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct SyntaxError {
    pub message: String,
    pub location: SourceLocation,
}

#[derive(Debug, thiserror::Error)]
pub enum ErrorCause {
    #[error(transparent)]
    Action(ActionError),
    #[error(transparent)]
    Syntax(SyntaxError),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<ActionError> for ErrorCause {
    fn from(error: ActionError) -> Self {
        ErrorCause::Action(error)
    }
}

impl From<SyntaxError> for ErrorCause {
    fn from(error: SyntaxError) -> Self {
        ErrorCause::Syntax(error)
    }
}

/// Error raised by actions, the resolver and the variable store.
///
/// The value is built once and then only extended: `run` returns a new
/// error with one more trace frame via [`ActionError::with_frame`].
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct ActionError {
    message: String,
    reason: ErrorReason,
    #[source]
    cause: Option<Box<ErrorCause>>,
    suggestions: Vec<String>,
    details: Vec<String>,
    links: Vec<HelpLink>,
    tracing: Vec<TraceFrame>,
}

impl ActionError {
    pub fn new(message: impl Into<String>, reason: ErrorReason) -> Self {
        Self {
            message: message.into(),
            reason,
            cause: None,
            suggestions: Vec::new(),
            details: Vec::new(),
            links: Vec::new(),
            tracing: Vec::new(),
        }
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::new(message, ErrorReason::Other)
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(message, ErrorReason::InvalidInput)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(message, ErrorReason::NotFound)
    }

    pub fn precondition(message: impl Into<String>) -> Self {
        Self::new(message, ErrorReason::Precondition)
    }

    pub fn access_denied(message: impl Into<String>) -> Self {
        Self::new(message, ErrorReason::AccessDenied)
    }

    pub fn not_supported(message: impl Into<String>) -> Self {
        Self::new(message, ErrorReason::NotSupported)
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::new(message, ErrorReason::UnexpectedResult)
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn with_cause(mut self, cause: impl Into<ErrorCause>) -> Self {
        self.cause = Some(Box::new(cause.into()));
        self
    }

    pub fn with_suggestions(mut self, suggestions: Vec<String>) -> Self {
        self.suggestions = suggestions;
        self
    }

    pub fn with_details(mut self, details: Vec<String>) -> Self {
        self.details = details;
        self
    }

    pub fn with_links(mut self, links: Vec<HelpLink>) -> Self {
        self.links = links;
        self
    }

    pub fn with_tracing(mut self, tracing: Vec<TraceFrame>) -> Self {
        self.tracing = tracing;
        self
    }

    /// Appends the frame of an enclosing step. Frames read innermost-first.
    pub fn with_frame(mut self, frame: TraceFrame) -> Self {
        self.tracing.push(frame);
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn reason(&self) -> ErrorReason {
        self.reason
    }

    pub fn cause(&self) -> Option<&ErrorCause> {
        self.cause.as_deref()
    }

    pub fn suggestions(&self) -> &[String] {
        &self.suggestions
    }

    pub fn details(&self) -> &[String] {
        &self.details
    }

    pub fn links(&self) -> &[HelpLink] {
        &self.links
    }

    pub fn tracing(&self) -> &[TraceFrame] {
        &self.tracing
    }

    /// Location of the malformed document when this error was caused
    /// directly by a syntax error.
    pub fn syntax_location(&self) -> Option<&SourceLocation> {
        match self.cause() {
            Some(ErrorCause::Syntax(syntax)) => Some(&syntax.location),
            _ => None,
        }
    }
}

impl From<SyntaxError> for ActionError {
    fn from(error: SyntaxError) -> Self {
        ActionError::invalid_input(error.message.clone()).with_cause(error)
    }
}

impl From<anyhow::Error> for ActionError {
    fn from(error: anyhow::Error) -> Self {
        ActionError::other(error.to_string()).with_cause(error)
    }
}

impl From<std::io::Error> for ActionError {
    fn from(error: std::io::Error) -> Self {
        let reason = match error.kind() {
            std::io::ErrorKind::NotFound => ErrorReason::NotFound,
            std::io::ErrorKind::PermissionDenied => ErrorReason::AccessDenied,
            _ => ErrorReason::Other,
        };

        ActionError::new(error.to_string(), reason)
            .with_cause(anyhow::Error::new(error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    fn location(line: usize) -> SourceLocation {
        SourceLocation {
            url: "file:///template.json".to_string(),
            start: Position::new(0, line, 1),
            end: Position::new(10, line, 11),
        }
    }

    #[test]
    fn test_default_reason_is_other() {
        assert_eq!(ErrorReason::default(), ErrorReason::Other);
        assert_eq!(ActionError::other("boom").reason(), ErrorReason::Other);
    }

    #[test]
    fn test_reason_serializes_in_screaming_case() {
        let json = serde_json::to_string(&ErrorReason::InvalidInput).unwrap();
        assert_eq!(json, "\"INVALID_INPUT\"");
        assert_eq!(ErrorReason::NotFound.to_string(), "NOT_FOUND");
    }

    #[test]
    fn test_frames_are_appended_in_order() {
        let error = ActionError::not_found("missing")
            .with_frame(TraceFrame::new("download", None))
            .with_frame(TraceFrame::new("run", Some(location(3))));

        let names: Vec<_> =
            error.tracing().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["download", "run"]);
    }

    #[test]
    fn test_syntax_location_only_for_direct_cause() {
        let syntax = SyntaxError {
            message: "Unexpected token".to_string(),
            location: location(7),
        };
        let error = ActionError::from(syntax);
        assert_eq!(error.syntax_location().map(|l| l.start.line), Some(7));

        let wrapped = ActionError::other("import failed").with_cause(error);
        assert!(wrapped.syntax_location().is_none());
    }

    #[test]
    fn test_cause_is_exposed_as_source() {
        let root = ActionError::precondition("not logged in");
        let error = ActionError::other("failed").with_cause(root);

        let source = error.source().expect("source");
        assert_eq!(source.to_string(), "not logged in");
    }

    #[test]
    fn test_io_errors_map_to_reasons() {
        let missing = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        assert_eq!(ActionError::from(missing).reason(), ErrorReason::NotFound);

        let denied =
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "no");
        assert_eq!(
            ActionError::from(denied).reason(),
            ErrorReason::AccessDenied
        );
    }
}
