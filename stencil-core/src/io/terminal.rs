use super::{Input, Output};
use futures::future::BoxFuture;
use stencil_context::{ActionError, Result};

/// Input for unattended runs: answers with the default when there is one.
#[derive(Debug, Default, Clone, Copy)]
pub struct NonInteractiveInput;

fn unavailable(message: &str) -> ActionError {
    ActionError::precondition(format!(
        "Cannot ask \"{message}\" because interactive input is disabled."
    ))
    .with_suggestions(vec![
        "Run the command in an interactive terminal or provide the value as an option."
            .to_string(),
    ])
}

impl Input for NonInteractiveInput {
    fn prompt<'a>(
        &'a self,
        message: &'a str,
        default: Option<&'a str>,
    ) -> BoxFuture<'a, Result<String>> {
        Box::pin(async move {
            default.map(str::to_string).ok_or_else(|| unavailable(message))
        })
    }

    fn confirm<'a>(
        &'a self,
        message: &'a str,
        default: Option<bool>,
    ) -> BoxFuture<'a, Result<bool>> {
        Box::pin(async move { default.ok_or_else(|| unavailable(message)) })
    }

    fn select<'a>(
        &'a self,
        message: &'a str,
        choices: &'a [String],
        default: Option<usize>,
    ) -> BoxFuture<'a, Result<usize>> {
        Box::pin(async move {
            default
                .filter(|index| *index < choices.len())
                .ok_or_else(|| unavailable(message))
        })
    }
}

/// Output that forwards notifications to the tracing subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingOutput;

impl Output for TracingOutput {
    fn inform(&self, message: &str) {
        tracing::info!(target: "stencil::output", "{}", message);
    }

    fn warn(&self, message: &str) {
        tracing::warn!(target: "stencil::output", "{}", message);
    }
}
