use crate::action::{Action, ActionFuture};
use crate::context::ActionContext;
use serde::Deserialize;
use serde_json::{Map, Value};
use stencil_context::Result;

#[derive(Debug, Clone, Deserialize)]
pub struct DefineOptions {
    /// Variable path → candidate list (or a single candidate).
    pub variables: Map<String, Value>,
}

/// Assigns each variable the first candidate that resolves.
///
/// String candidates are references and may fail; array candidates are
/// resolved element-wise and fail as a whole; any other literal always
/// succeeds. A variable whose candidates all fail is left unset.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefineAction;

impl Action for DefineAction {
    type Options = DefineOptions;

    fn execute<'a>(
        &'a self,
        options: DefineOptions,
        context: &'a ActionContext,
    ) -> ActionFuture<'a> {
        Box::pin(async move {
            for (name, candidates) in options.variables {
                let candidates = match candidates {
                    Value::Array(items) => items,
                    single => vec![single],
                };

                match first_resolved(&name, &candidates, context).await {
                    Some(value) => context.set(&name, value).await?,
                    None => tracing::debug!(
                        variable = %name,
                        "no candidate resolved, leaving variable unset"
                    ),
                }
            }

            Ok(())
        })
    }
}

async fn first_resolved(
    name: &str,
    candidates: &[Value],
    context: &ActionContext,
) -> Option<Value> {
    for (index, candidate) in candidates.iter().enumerate() {
        let resolved: Result<Value> = match candidate {
            Value::String(_) => context.resolve_value(candidate).await,
            Value::Array(items) => {
                context.resolve_list(items).await.map(Value::Array)
            }
            literal => return Some(literal.clone()),
        };

        match resolved {
            Ok(value) => return Some(value),
            Err(e) => tracing::debug!(
                variable = %name,
                candidate = index,
                error = %e,
                "candidate discarded"
            ),
        }
    }

    None
}
