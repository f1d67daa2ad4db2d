//! # Stencil Manifest
//!
//! Manifest documents: the JSON/JSON5/YAML readers, the manifest model,
//! option binding, resource providers and the `import` action.

pub mod document;
mod executor;
mod import;
mod loader;
mod manifest;
mod options;
mod provider;

pub use executor::ManifestExecutor;
pub use import::{ImportAction, ImportOptions};
pub use loader::{ManifestFormat, ManifestLoader};
pub use manifest::{Manifest, OptionDefinition, OptionType};
pub use options::{bind_options, option_path, INPUT_NAMESPACE};
#[cfg(feature = "http")]
pub use provider::HttpProvider;
pub use provider::{FileProvider, SchemeProvider};

use stencil_core::ActionRegistry;

/// Adds the actions of this crate to `registry`.
pub fn register_manifest_actions(registry: ActionRegistry) -> ActionRegistry {
    registry.register("import", ImportAction::default())
}

/// Prelude module for manifest functionality
pub mod prelude {
    pub use crate::{
        ImportAction, Manifest, ManifestExecutor, ManifestLoader, OptionDefinition,
        SchemeProvider,
    };
}
