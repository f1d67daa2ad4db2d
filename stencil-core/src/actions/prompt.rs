use crate::action::{Action, ActionFuture};
use crate::context::ActionContext;
use serde::Deserialize;
use serde_json::Value;
use stencil_context::ActionError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptKind {
    #[default]
    Text,
    Confirm,
    Select,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PromptOptions {
    pub message: Value,
    /// Variable the answer is written to.
    pub result: Value,
    #[serde(default, rename = "type")]
    pub kind: PromptKind,
    #[serde(default)]
    pub choices: Vec<Value>,
    #[serde(default)]
    pub default: Option<Value>,
}

/// Asks the user and stores the answer.
#[derive(Debug, Default, Clone, Copy)]
pub struct PromptAction;

impl Action for PromptAction {
    type Options = PromptOptions;

    fn execute<'a>(
        &'a self,
        options: PromptOptions,
        context: &'a ActionContext,
    ) -> ActionFuture<'a> {
        Box::pin(async move {
            let message = context.resolve_string(&options.message).await?;
            let result = context.resolve_string(&options.result).await?;
            let input = context.input();

            let answer = match options.kind {
                PromptKind::Text => {
                    let default = match &options.default {
                        Some(value) => Some(context.resolve_string(value).await?),
                        None => None,
                    };
                    Value::String(input.prompt(&message, default.as_deref()).await?)
                }
                PromptKind::Confirm => {
                    let default = match &options.default {
                        Some(value) => Some(context.resolve_boolean(value).await?),
                        None => None,
                    };
                    Value::Bool(input.confirm(&message, default).await?)
                }
                PromptKind::Select => {
                    let mut choices = Vec::with_capacity(options.choices.len());
                    for choice in &options.choices {
                        choices.push(context.resolve_string(choice).await?);
                    }
                    if choices.is_empty() {
                        return Err(ActionError::invalid_input(
                            "A select prompt needs at least one choice.",
                        ));
                    }

                    let default = match &options.default {
                        Some(value) => {
                            let wanted = context.resolve_string(value).await?;
                            choices.iter().position(|c| *c == wanted)
                        }
                        None => None,
                    };
                    let index = input.select(&message, &choices, default).await?;
                    let selected = choices.get(index).cloned().ok_or_else(|| {
                        ActionError::unexpected(format!(
                            "Selected choice {index} does not exist."
                        ))
                    })?;
                    Value::String(selected)
                }
            };

            context.set(&result, answer).await
        })
    }
}
