use crate::definition::ActionDefinition;
use crate::io::{FileSystem, Input, LocalFileSystem, NonInteractiveInput, Output, TracingOutput};
use crate::registry::ActionRegistry;
use serde_json::Value;
use std::sync::Arc;
use stencil_context::{
    ActionError, ExpressionResolver, Result, VariablePath, VariableStore,
};
use tracing::Instrument;
use url::Url;
use uuid::Uuid;

/// Everything an action sees while it runs: the shared variable store and
/// resolver, the registry used for nested dispatch and the ambient
/// collaborators.
///
/// Cloning is cheap and shares the store. [`ActionContext::scoped`] derives
/// a sub-context with another base URL over the same store.
#[derive(Clone)]
pub struct ActionContext {
    execution_id: String,
    resolver: ExpressionResolver,
    registry: Arc<ActionRegistry>,
    input: Arc<dyn Input>,
    output: Arc<dyn Output>,
    file_system: Arc<dyn FileSystem>,
    base_url: Url,
}

impl ActionContext {
    pub fn new(registry: Arc<ActionRegistry>, base_url: Url) -> Self {
        Self {
            execution_id: Uuid::new_v4().to_string(),
            resolver: ExpressionResolver::new(VariableStore::new()),
            registry,
            input: Arc::new(NonInteractiveInput),
            output: Arc::new(TracingOutput),
            file_system: Arc::new(LocalFileSystem::new(".")),
            base_url,
        }
    }

    pub fn with_execution_id(mut self, execution_id: impl Into<String>) -> Self {
        self.execution_id = execution_id.into();
        self
    }

    pub fn with_store(mut self, store: VariableStore) -> Self {
        self.resolver = ExpressionResolver::new(store);
        self
    }

    pub fn with_input(mut self, input: Arc<dyn Input>) -> Self {
        self.input = input;
        self
    }

    pub fn with_output(mut self, output: Arc<dyn Output>) -> Self {
        self.output = output;
        self
    }

    pub fn with_file_system(mut self, file_system: Arc<dyn FileSystem>) -> Self {
        self.file_system = file_system;
        self
    }

    /// Sub-context sharing the store, resolving relative URLs against
    /// `base_url`.
    pub fn scoped(&self, base_url: Url) -> Self {
        Self {
            base_url,
            ..self.clone()
        }
    }

    pub fn execution_id(&self) -> &str {
        &self.execution_id
    }

    pub fn store(&self) -> &VariableStore {
        self.resolver.store()
    }

    pub fn resolver(&self) -> &ExpressionResolver {
        &self.resolver
    }

    pub fn registry(&self) -> &ActionRegistry {
        &self.registry
    }

    pub fn input(&self) -> &dyn Input {
        self.input.as_ref()
    }

    pub fn output(&self) -> &dyn Output {
        self.output.as_ref()
    }

    pub fn file_system(&self) -> &dyn FileSystem {
        self.file_system.as_ref()
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Joins `reference` onto the base URL.
    pub fn resolve_url(&self, reference: &str) -> Result<Url> {
        self.base_url.join(reference).map_err(|e| {
            ActionError::invalid_input(format!("Invalid URL `{reference}`: {e}."))
        })
    }

    pub async fn get(&self, path: &str) -> Result<Value> {
        self.store().get(&VariablePath::parse(path)?).await
    }

    pub async fn set(&self, path: &str, value: Value) -> Result<()> {
        self.store().set(&VariablePath::parse(path)?, value).await
    }

    pub async fn resolve_value(&self, candidate: &Value) -> Result<Value> {
        self.resolver.resolve_value(candidate).await
    }

    pub async fn resolve_string(&self, candidate: &Value) -> Result<String> {
        self.resolver.resolve_string(candidate).await
    }

    pub async fn resolve_boolean(&self, candidate: &Value) -> Result<bool> {
        self.resolver.resolve_boolean(candidate).await
    }

    pub async fn resolve_list(&self, items: &[Value]) -> Result<Vec<Value>> {
        self.resolver.resolve_list(items).await
    }

    /// Looks up and executes a single definition. Adds no trace frame.
    pub async fn execute(&self, definition: &ActionDefinition) -> Result<()> {
        let action = self.registry.get(&definition.name).ok_or_else(|| {
            ActionError::invalid_input(format!(
                "Unknown action `{}`.",
                definition.name
            ))
            .with_details(vec![format!(
                "Available actions: {}.",
                self.registry.names().join(", ")
            )])
        })?;

        let span = tracing::debug_span!(
            "action",
            execution_id = %self.execution_id,
            name = %definition.name
        );

        async {
            tracing::debug!("action starting");
            let result = action.execute_raw(&definition.options, self).await;
            match &result {
                Ok(()) => tracing::debug!("action success"),
                Err(e) => {
                    tracing::debug!(reason = %e.reason(), error = %e, "action failed")
                }
            }
            result
        }
        .instrument(span)
        .await
    }
}
