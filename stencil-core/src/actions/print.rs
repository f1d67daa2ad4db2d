use crate::action::{Action, ActionFuture};
use crate::context::ActionContext;
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrintLevel {
    #[default]
    Info,
    Warning,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PrintOptions {
    pub message: Value,
    #[serde(default)]
    pub level: PrintLevel,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct PrintAction;

impl Action for PrintAction {
    type Options = PrintOptions;

    fn execute<'a>(
        &'a self,
        options: PrintOptions,
        context: &'a ActionContext,
    ) -> ActionFuture<'a> {
        Box::pin(async move {
            let message = context.resolve_string(&options.message).await?;
            match options.level {
                PrintLevel::Info => context.output().inform(&message),
                PrintLevel::Warning => context.output().warn(&message),
            }
            Ok(())
        })
    }
}
