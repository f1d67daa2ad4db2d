//! # Stencil Core
//!
//! The action contract, the registry that maps names to implementations,
//! the execution context and the control-flow actions (`define`, `try`,
//! `run`) every template is composed of.

#![cfg_attr(docsrs, feature(doc_cfg))]

mod action;
pub mod actions;
mod context;
mod definition;
pub mod io;
mod registry;


pub use action::{parse_options, Action, ActionFuture, DynAction};
pub use actions::run_actions;
pub use context::ActionContext;
pub use definition::{ActionDefinition, OneOrMany, SOURCE_KEY};
pub use registry::ActionRegistry;

/// Prelude module for core functionality
pub mod prelude {
    pub use crate::{
        run_actions, Action, ActionContext, ActionDefinition, ActionFuture,
        ActionRegistry,
    };
    pub use stencil_context::{
        ActionError, ErrorReason, Result, SourceLocation, TraceFrame,
        VariablePath, VariableStore,
    };
}
