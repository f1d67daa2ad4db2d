//! Terminal collaborators backed by `dialoguer`.

use futures::future::BoxFuture;
use stencil_context::{ActionError, Result};
use stencil_core::io::{Input, Output};

/// Interactive prompts on the controlling terminal. Each prompt runs on the
/// blocking pool.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleInput;

async fn blocking<T, F>(prompt: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> dialoguer::Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(prompt)
        .await
        .map_err(|e| ActionError::unexpected(format!("Prompt task failed: {e}.")))?
        .map_err(|e| {
            ActionError::unexpected(format!("Cannot read input: {e}."))
                .with_cause(anyhow::Error::new(e))
        })
}

impl Input for ConsoleInput {
    fn prompt<'a>(
        &'a self,
        message: &'a str,
        default: Option<&'a str>,
    ) -> BoxFuture<'a, Result<String>> {
        let message = message.to_string();
        let default = default.map(str::to_string);
        Box::pin(blocking(move || {
            let mut input = dialoguer::Input::<String>::new().with_prompt(message);
            if let Some(default) = default {
                input = input.default(default);
            }
            input.interact_text()
        }))
    }

    fn confirm<'a>(
        &'a self,
        message: &'a str,
        default: Option<bool>,
    ) -> BoxFuture<'a, Result<bool>> {
        let message = message.to_string();
        Box::pin(blocking(move || {
            let mut confirm = dialoguer::Confirm::new().with_prompt(message);
            if let Some(default) = default {
                confirm = confirm.default(default);
            }
            confirm.interact()
        }))
    }

    fn select<'a>(
        &'a self,
        message: &'a str,
        choices: &'a [String],
        default: Option<usize>,
    ) -> BoxFuture<'a, Result<usize>> {
        let message = message.to_string();
        let choices = choices.to_vec();
        Box::pin(blocking(move || {
            dialoguer::Select::new()
                .with_prompt(message)
                .items(&choices)
                .default(default.unwrap_or(0))
                .interact()
        }))
    }
}

/// Messages for the user go to stdout, warnings to stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleOutput;

impl Output for ConsoleOutput {
    fn inform(&self, message: &str) {
        println!("{message}");
    }

    fn warn(&self, message: &str) {
        eprintln!("warning: {message}");
    }
}
