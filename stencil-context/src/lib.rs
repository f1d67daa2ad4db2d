//! # Stencil Context
//!
//! Variable store, expression resolution and the error/tracing model shared
//! by every template action.

mod error;
mod path;
mod resolver;
mod store;

pub use error::{
    ActionError, ErrorCause, ErrorReason, HelpLink, Position, Result,
    SourceLocation, SyntaxError, TraceFrame,
};
pub use path::{escape_segment, unescape_segment, VariablePath};
pub use resolver::{is_reference, value_kind, ExpressionResolver};
pub use store::{producer, Producer, ProducerFuture, VariableStore};
