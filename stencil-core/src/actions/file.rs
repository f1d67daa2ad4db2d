use crate::action::{Action, ActionFuture};
use crate::context::ActionContext;
use crate::io::{Codemod, Replacement, TextReplacementCodemod};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Clone, Deserialize)]
pub struct ReadFileOptions {
    pub path: Value,
    /// Variable the content is written to.
    pub result: Value,
    #[serde(default)]
    pub optional: Option<Value>,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ReadFileAction;

impl Action for ReadFileAction {
    type Options = ReadFileOptions;

    fn execute<'a>(
        &'a self,
        options: ReadFileOptions,
        context: &'a ActionContext,
    ) -> ActionFuture<'a> {
        Box::pin(async move {
            let path = context.resolve_string(&options.path).await?;
            let result = context.resolve_string(&options.result).await?;
            let optional = match &options.optional {
                Some(flag) => context.resolve_boolean(flag).await?,
                None => false,
            };

            if optional && !context.file_system().exists(&path).await? {
                tracing::debug!(path = %path, "optional file missing");
                return Ok(());
            }

            let content = context.file_system().read_text(&path).await?;
            context.set(&result, Value::String(content)).await
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WriteFileOptions {
    pub path: Value,
    pub content: Value,
    #[serde(default)]
    pub overwrite: Option<Value>,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct WriteFileAction;

impl Action for WriteFileAction {
    type Options = WriteFileOptions;

    fn execute<'a>(
        &'a self,
        options: WriteFileOptions,
        context: &'a ActionContext,
    ) -> ActionFuture<'a> {
        Box::pin(async move {
            let path = context.resolve_string(&options.path).await?;
            let content = context.resolve_string(&options.content).await?;
            let overwrite = match &options.overwrite {
                Some(flag) => context.resolve_boolean(flag).await?,
                None => false,
            };

            context
                .file_system()
                .write_text(&path, &content, overwrite)
                .await?;
            tracing::info!(path = %path, "file written");
            Ok(())
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReplacementOptions {
    pub pattern: Value,
    pub value: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReplaceFileContentOptions {
    pub path: Value,
    pub replacements: Vec<ReplacementOptions>,
}

/// Applies regex replacements to a file in place.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReplaceFileContentAction;

impl Action for ReplaceFileContentAction {
    type Options = ReplaceFileContentOptions;

    fn execute<'a>(
        &'a self,
        options: ReplaceFileContentOptions,
        context: &'a ActionContext,
    ) -> ActionFuture<'a> {
        Box::pin(async move {
            let path = context.resolve_string(&options.path).await?;

            let mut replacements = Vec::with_capacity(options.replacements.len());
            for replacement in &options.replacements {
                replacements.push(Replacement {
                    pattern: context.resolve_string(&replacement.pattern).await?,
                    value: context.resolve_string(&replacement.value).await?,
                });
            }

            let file_system = context.file_system();
            let content = file_system.read_text(&path).await?;
            let outcome = TextReplacementCodemod.apply(content, &replacements).await?;

            if outcome.modified {
                file_system.write_text(&path, &outcome.result, true).await?;
                tracing::info!(path = %path, "file content replaced");
            } else {
                tracing::debug!(path = %path, "no replacement matched");
            }
            Ok(())
        })
    }
}
