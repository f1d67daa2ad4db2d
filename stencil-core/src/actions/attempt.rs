use crate::action::{Action, ActionFuture};
use crate::context::ActionContext;
use crate::definition::ActionDefinition;
use futures::future::try_join_all;
use serde::Deserialize;
use serde_json::Value;
use stencil_context::{ActionError, HelpLink, Result};

#[derive(Debug, Clone, Deserialize)]
pub struct TryOptions {
    pub action: ActionDefinition,
    #[serde(default)]
    pub otherwise: Option<ActionDefinition>,
    #[serde(default)]
    pub help: Option<HelpOptions>,
}

/// User-facing rewrite of a failure. Every string is resolvable.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HelpOptions {
    #[serde(default)]
    pub message: Option<Value>,
    #[serde(default)]
    pub suggestions: Option<Vec<Value>>,
    #[serde(default)]
    pub links: Option<Vec<LinkOptions>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LinkOptions {
    pub url: Value,
    pub label: Value,
}

/// Runs `action`; on failure runs `otherwise` (dropping the original
/// error), or rewrites the error with `help`, or rethrows it unchanged.
#[derive(Debug, Default, Clone, Copy)]
pub struct TryAction;

impl Action for TryAction {
    type Options = TryOptions;

    fn execute<'a>(
        &'a self,
        options: TryOptions,
        context: &'a ActionContext,
    ) -> ActionFuture<'a> {
        Box::pin(async move {
            let error = match context.execute(&options.action).await {
                Ok(()) => return Ok(()),
                Err(error) => error,
            };

            if let Some(otherwise) = &options.otherwise {
                tracing::debug!(
                    action = %options.action.name,
                    fallback = %otherwise.name,
                    "action failed, running fallback"
                );
                return context.execute(otherwise).await;
            }

            match &options.help {
                Some(help) => Err(enrich(error, help, context).await),
                None => Err(error),
            }
        })
    }
}

/// Rewrites `error` with the resolved `help`. If a help string cannot be
/// resolved, the original error is kept and the resolution failure is
/// added to its details.
async fn enrich(error: ActionError, help: &HelpOptions, context: &ActionContext) -> ActionError {
    match resolve_help(&error, help, context).await {
        Ok((message, suggestions, links)) => ActionError::new(message, error.reason())
            .with_suggestions(suggestions)
            .with_links(links)
            .with_details(error.details().to_vec())
            .with_tracing(error.tracing().to_vec())
            .with_cause(error),
        Err(unresolved) => {
            tracing::warn!(error = %unresolved, "could not resolve help for failed action");
            let mut details = error.details().to_vec();
            details.push(format!("Help could not be resolved: {unresolved}"));
            ActionError::new(error.message().to_string(), error.reason())
                .with_suggestions(error.suggestions().to_vec())
                .with_links(error.links().to_vec())
                .with_details(details)
                .with_tracing(error.tracing().to_vec())
                .with_cause(error)
        }
    }
}

async fn resolve_help(
    error: &ActionError,
    help: &HelpOptions,
    context: &ActionContext,
) -> Result<(String, Vec<String>, Vec<HelpLink>)> {
    let message = match &help.message {
        Some(message) => context.resolve_string(message).await?,
        None => error.message().to_string(),
    };

    let suggestions = match &help.suggestions {
        Some(items) => try_join_all(
            items.iter().map(|item| context.resolve_string(item)),
        )
        .await?,
        None => error.suggestions().to_vec(),
    };

    let links = match &help.links {
        Some(items) => {
            try_join_all(items.iter().map(|link| async move {
                Ok::<_, ActionError>(HelpLink {
                    url: context.resolve_string(&link.url).await?,
                    label: context.resolve_string(&link.label).await?,
                })
            }))
            .await?
        }
        None => error.links().to_vec(),
    };

    Ok((message, suggestions, links))
}
