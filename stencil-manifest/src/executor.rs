use crate::manifest::Manifest;
use crate::options::bind_options;
use serde_json::{Map, Value};
use std::time::Instant;
use stencil_context::Result;
use stencil_core::io::Resource;
use stencil_core::{run_actions, ActionContext};
use tracing::Instrument;

/// Runs a loaded manifest: binds its options, then executes its steps in
/// order against the context's store.
pub struct ManifestExecutor {
    context: ActionContext,
}

impl ManifestExecutor {
    pub fn new(context: ActionContext) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &ActionContext {
        &self.context
    }

    pub async fn execute(
        &self,
        manifest: &Resource<Manifest>,
        values: &Map<String, Value>,
    ) -> Result<()> {
        let context = self.context.scoped(manifest.url.clone());
        let span = tracing::info_span!(
            "manifest",
            execution_id = %context.execution_id(),
            url = %manifest.url
        );

        async {
            let started = Instant::now();
            tracing::info!(steps = manifest.value.actions.len(), "manifest starting");

            bind_options(&manifest.value.options, values, context.resolver()).await?;
            let result = run_actions(&manifest.value.actions, &context).await;

            match &result {
                Ok(()) => tracing::info!(
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "manifest completed"
                ),
                Err(e) => tracing::error!(
                    reason = %e.reason(),
                    error = %e,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "manifest failed"
                ),
            }
            result
        }
        .instrument(span)
        .await
    }
}
