use crate::config::RunConfig;
use crate::console::{ConsoleInput, ConsoleOutput};
use crate::project::define_project;
use serde_json::{Map, Value};
use std::sync::Arc;
use stencil_context::{ActionError, Result};
use stencil_core::io::{Input, LocalFileSystem, NonInteractiveInput, Resource};
use stencil_core::{ActionContext, ActionRegistry};
use stencil_manifest::{register_manifest_actions, Manifest, ManifestExecutor, ManifestLoader, SchemeProvider};

/// Registry with every built-in action, `import` included.
pub fn default_registry() -> ActionRegistry {
    register_manifest_actions(ActionRegistry::with_builtin_actions())
}

/// Context wired to the terminal and to the project directory.
pub fn build_context(config: &RunConfig) -> ActionContext {
    let input: Arc<dyn Input> = if config.interactive {
        Arc::new(ConsoleInput)
    } else {
        Arc::new(NonInteractiveInput)
    };

    ActionContext::new(Arc::new(default_registry()), config.base_url.clone())
        .with_input(input)
        .with_output(Arc::new(ConsoleOutput))
        .with_file_system(Arc::new(LocalFileSystem::new(&config.project_path)))
}

/// Loads the manifest `reference` points at, a path or a URL relative to
/// the configured base URL.
pub async fn load_manifest(config: &RunConfig, reference: &str) -> Result<Resource<Manifest>> {
    let url = config.base_url.join(reference).map_err(|e| {
        ActionError::invalid_input(format!("Invalid manifest reference `{reference}`: {e}."))
    })?;
    ManifestLoader::load(&SchemeProvider::default(), &url).await
}

/// Loads and runs a manifest with the given option values.
pub async fn run_manifest(
    config: &RunConfig,
    reference: &str,
    values: &Map<String, Value>,
) -> Result<()> {
    let manifest = load_manifest(config, reference).await?;
    let context = build_context(config);
    define_project(context.store(), &config.project_path).await?;

    ManifestExecutor::new(context).execute(&manifest, values).await
}
