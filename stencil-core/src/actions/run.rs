use crate::action::{Action, ActionFuture};
use crate::context::ActionContext;
use crate::definition::{ActionDefinition, OneOrMany};
use serde::Deserialize;
use stencil_context::{ActionError, Result, TraceFrame};

#[derive(Debug, Clone, Deserialize)]
pub struct RunOptions {
    pub actions: OneOrMany<ActionDefinition>,
}

/// Sequential composition. Stops at the first failure and appends the
/// failing step's frame to the error.
#[derive(Debug, Default, Clone, Copy)]
pub struct RunAction;

impl Action for RunAction {
    type Options = RunOptions;

    fn execute<'a>(
        &'a self,
        options: RunOptions,
        context: &'a ActionContext,
    ) -> ActionFuture<'a> {
        Box::pin(async move {
            let definitions = options.actions.into_vec();
            run_actions(&definitions, context).await
        })
    }
}

/// Executes `definitions` in order, one at a time.
pub async fn run_actions(
    definitions: &[ActionDefinition],
    context: &ActionContext,
) -> Result<()> {
    for definition in definitions {
        if let Err(error) = context.execute(definition).await {
            let frame = frame_for(definition, &error);
            return Err(error.with_frame(frame));
        }
    }

    Ok(())
}

/// A failure caused by a malformed nested document points at that
/// document for the step that loaded it. Enclosing steps keep their own
/// declared source.
fn frame_for(definition: &ActionDefinition, error: &ActionError) -> TraceFrame {
    let source = match error.syntax_location() {
        Some(location) if error.tracing().is_empty() => Some(location.clone()),
        _ => definition.source.clone(),
    };

    TraceFrame::new(definition.name.clone(), source)
}
