use std::error::Error as _;
use std::fmt::Write as _;
use stencil_context::{ActionError, ErrorReason};

/// Renders a failed run for the terminal: the message, then its details,
/// causes, suggestions, links and the failing steps innermost first.
pub fn render_error(error: &ActionError) -> String {
    let mut out = format!("error: {}", error.message());
    if error.reason() != ErrorReason::Other {
        let _ = write!(out, " [{}]", error.reason());
    }
    out.push('\n');

    for detail in error.details() {
        let _ = writeln!(out, "  {detail}");
    }

    let mut source = error.source();
    while let Some(cause) = source {
        let _ = writeln!(out, "  caused by: {cause}");
        source = cause.source();
    }

    for frame in error.tracing() {
        match &frame.source {
            Some(location) => {
                let _ = writeln!(
                    out,
                    "  in step `{}` at line {} ({location})",
                    frame.name, location.start.line
                );
            }
            None => {
                let _ = writeln!(out, "  in step `{}`", frame.name);
            }
        }
    }

    for suggestion in error.suggestions() {
        let _ = writeln!(out, "  help: {suggestion}");
    }

    for link in error.links() {
        let _ = writeln!(out, "  see: {} <{}>", link.label, link.url);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use stencil_context::{HelpLink, Position, SourceLocation, TraceFrame};

    #[test]
    fn test_render_error() {
        let location = SourceLocation {
            url: "file:///t/manifest.json".to_string(),
            start: Position::new(120, 12, 5),
            end: Position::new(140, 12, 25),
        };
        let error = ActionError::not_found("Download failed.")
            .with_details(vec!["The server returned 404.".to_string()])
            .with_cause(ActionError::other("connection closed"))
            .with_suggestions(vec!["Check the URL.".to_string()])
            .with_links(vec![HelpLink {
                url: "https://example.com/help".to_string(),
                label: "Troubleshooting".to_string(),
            }])
            .with_frame(TraceFrame::new("download", Some(location)))
            .with_frame(TraceFrame::new("run", None));

        let rendered = render_error(&error);

        assert_eq!(
            rendered,
            "error: Download failed. [NOT_FOUND]\n\
             \x20 The server returned 404.\n\
             \x20 caused by: connection closed\n\
             \x20 in step `download` at line 12 (file:///t/manifest.json:12:5)\n\
             \x20 in step `run`\n\
             \x20 help: Check the URL.\n\
             \x20 see: Troubleshooting <https://example.com/help>\n"
        );
    }

    #[test]
    fn test_render_plain_error() {
        assert_eq!(render_error(&ActionError::other("boom")), "error: boom\n");
    }
}
