use super::{Codemod, CodemodResult};
use futures::future::BoxFuture;
use regex::Regex;
use serde::Deserialize;
use stencil_context::{ActionError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Replacement {
    /// Regular expression matched against the whole text.
    pub pattern: String,
    /// Replacement text; `$1` refers to the first capture group.
    pub value: String,
}

/// Regex-based text codemod.
#[derive(Debug, Default, Clone, Copy)]
pub struct TextReplacementCodemod;

impl Codemod<String> for TextReplacementCodemod {
    type Options = Vec<Replacement>;

    fn apply<'a>(
        &'a self,
        input: String,
        options: &'a Self::Options,
    ) -> BoxFuture<'a, Result<CodemodResult<String>>> {
        Box::pin(async move {
            let mut output = input.clone();

            for replacement in options {
                let pattern = Regex::new(&replacement.pattern).map_err(|e| {
                    ActionError::invalid_input(format!(
                        "Invalid pattern `{}`: {e}",
                        replacement.pattern
                    ))
                })?;
                output = pattern
                    .replace_all(&output, replacement.value.as_str())
                    .into_owned();
            }

            Ok(CodemodResult {
                modified: output != input,
                result: output,
            })
        })
    }
}
