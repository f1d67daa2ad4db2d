//! # Stencil - Template Action Runtime
//!
//! Stencil runs the steps of a template manifest, each step an action that
//! reads and writes a shared, lazily evaluated variable store.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use serde_json::Map;
//! use stencil::RunConfig;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = RunConfig::for_project(".")?;
//!     stencil::run_manifest(&config, "templates/setup.json", &Map::new()).await?;
//!     Ok(())
//! }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]

mod config;
mod console;
mod diagnostic;
mod project;
mod runner;

// Re-export core functionality
pub use stencil_context as context;
pub use stencil_core::*;
pub use stencil_logger as logger;
pub use stencil_manifest as manifest;

pub use config::RunConfig;
pub use console::{ConsoleInput, ConsoleOutput};
pub use diagnostic::render_error;
pub use project::define_project;
pub use runner::{build_context, default_registry, load_manifest, run_manifest};

/// Prelude module for easy imports
pub mod prelude {
    pub use crate::{default_registry, render_error, run_manifest, RunConfig};
    pub use stencil_core::prelude::*;
    pub use stencil_manifest::prelude::*;
}
