use crate::action::{Action, ActionFuture};
use crate::context::ActionContext;
use futures::future::try_join_all;
use serde::Deserialize;
use serde_json::Value;
use stencil_context::{ActionError, ErrorReason};

#[derive(Debug, Clone, Deserialize)]
pub struct FailOptions {
    pub message: Value,
    #[serde(default)]
    pub reason: ErrorReason,
    #[serde(default)]
    pub suggestions: Vec<Value>,
    #[serde(default)]
    pub details: Vec<Value>,
}

/// Aborts the manifest with a typed error.
#[derive(Debug, Default, Clone, Copy)]
pub struct FailAction;

impl Action for FailAction {
    type Options = FailOptions;

    fn execute<'a>(
        &'a self,
        options: FailOptions,
        context: &'a ActionContext,
    ) -> ActionFuture<'a> {
        Box::pin(async move {
            let message = context.resolve_string(&options.message).await?;
            let suggestions = try_join_all(
                options.suggestions.iter().map(|s| context.resolve_string(s)),
            )
            .await?;
            let details = try_join_all(
                options.details.iter().map(|d| context.resolve_string(d)),
            )
            .await?;

            Err(ActionError::new(message, options.reason)
                .with_suggestions(suggestions)
                .with_details(details))
        })
    }
}
