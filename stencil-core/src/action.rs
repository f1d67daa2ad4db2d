use crate::context::ActionContext;
use futures::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use stencil_context::{ActionError, Result};

/// Future returned by every action.
pub type ActionFuture<'a> = BoxFuture<'a, Result<()>>;

/// A step kind. Receives its options already deserialised from the
/// definition and the context shared by every step of the execution.
///
/// Fields documented as resolvable must go through the context's
/// `resolve_*` family before use.
pub trait Action: Send + Sync + 'static {
    type Options: DeserializeOwned + Send + 'static;

    fn execute<'a>(
        &'a self,
        options: Self::Options,
        context: &'a ActionContext,
    ) -> ActionFuture<'a>;
}

/// Object-safe form of [`Action`] stored in the registry.
pub trait DynAction: Send + Sync {
    fn execute_raw<'a>(
        &'a self,
        options: &'a Map<String, Value>,
        context: &'a ActionContext,
    ) -> ActionFuture<'a>;
}

impl<A: Action> DynAction for A {
    fn execute_raw<'a>(
        &'a self,
        options: &'a Map<String, Value>,
        context: &'a ActionContext,
    ) -> ActionFuture<'a> {
        match parse_options::<A::Options>(options) {
            Ok(options) => self.execute(options, context),
            Err(error) => Box::pin(async move { Err(error) }),
        }
    }
}

pub fn parse_options<T: DeserializeOwned>(
    options: &Map<String, Value>,
) -> Result<T> {
    serde_json::from_value(Value::Object(options.clone())).map_err(|e| {
        ActionError::invalid_input(format!("Invalid action options: {e}."))
    })
}
