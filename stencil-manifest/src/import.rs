use crate::loader::ManifestLoader;
use crate::options::bind_options;
use crate::provider::SchemeProvider;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use stencil_core::io::Provider;
use stencil_core::{run_actions, Action, ActionContext, ActionFuture};

#[derive(Debug, Clone, Deserialize)]
pub struct ImportOptions {
    /// URL of the manifest, relative to the importing manifest.
    pub template: Value,
    #[serde(default)]
    pub options: Map<String, Value>,
}

/// Runs another manifest in place.
///
/// The imported actions see the same variable store; relative URLs inside
/// them resolve against the imported manifest's location. A malformed
/// document fails with its syntax error as the direct cause, so the trace
/// frame points into the imported file.
#[derive(Clone)]
pub struct ImportAction {
    provider: Arc<dyn Provider<String>>,
}

impl ImportAction {
    pub fn new(provider: Arc<dyn Provider<String>>) -> Self {
        Self { provider }
    }
}

impl Default for ImportAction {
    fn default() -> Self {
        Self::new(Arc::new(SchemeProvider::default()))
    }
}

impl Action for ImportAction {
    type Options = ImportOptions;

    fn execute<'a>(
        &'a self,
        options: ImportOptions,
        context: &'a ActionContext,
    ) -> ActionFuture<'a> {
        Box::pin(async move {
            let template = context.resolve_string(&options.template).await?;
            let url = context.resolve_url(&template)?;

            let mut values = Map::new();
            for (name, value) in &options.options {
                values.insert(name.clone(), context.resolve_value(value).await?);
            }

            let resource = ManifestLoader::load(self.provider.as_ref(), &url).await?;
            tracing::info!(url = %resource.url, "importing template");

            let scoped = context.scoped(resource.url);
            bind_options(&resource.value.options, &values, scoped.resolver()).await?;
            run_actions(&resource.value.actions, &scoped).await
        })
    }
}
