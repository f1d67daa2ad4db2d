use crate::document;
use crate::manifest::Manifest;
use std::path::Path;
use stencil_context::{ActionError, Position, Result, SourceLocation, SyntaxError};
use stencil_core::io::{Provider, Resource};
use url::Url;

/// Manifest document formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestFormat {
    /// JSON and its JSON5 subset. Definitions carry source locations.
    Json,
    Yaml,
}

impl ManifestFormat {
    /// Picks the format from the URL's extension, defaulting to JSON.
    pub fn detect(url: &Url) -> Self {
        let path = url.path().to_ascii_lowercase();
        if path.ends_with(".yaml") || path.ends_with(".yml") {
            ManifestFormat::Yaml
        } else {
            ManifestFormat::Json
        }
    }
}

/// Loads manifests from text, files or any [`Provider`].
pub struct ManifestLoader;

impl ManifestLoader {
    /// Parses a JSON or JSON5 manifest served from `url`.
    pub fn from_json_str(content: &str, url: &Url) -> Result<Manifest> {
        let value = document::parse_manifest(content, url.as_str())?;
        Manifest::from_value(value)
    }

    /// Parses a YAML manifest served from `url`.
    pub fn from_yaml_str(content: &str, url: &Url) -> Result<Manifest> {
        let value: serde_json::Value =
            serde_yaml::from_str(content).map_err(|e| yaml_syntax_error(&e, url))?;
        Manifest::from_value(value)
    }

    pub fn from_str(content: &str, url: &Url) -> Result<Manifest> {
        match ManifestFormat::detect(url) {
            ManifestFormat::Json => Self::from_json_str(content, url),
            ManifestFormat::Yaml => Self::from_yaml_str(content, url),
        }
    }

    /// Reads a manifest from the local disk.
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Resource<Manifest>> {
        let path = std::path::absolute(path.as_ref())?;
        let url = Url::from_file_path(&path).map_err(|_| {
            ActionError::invalid_input(format!(
                "`{}` is not a valid manifest path.",
                path.display()
            ))
        })?;

        let content = tokio::fs::read_to_string(&path).await.map_err(|e| {
            let message = format!("Cannot read manifest `{}`: {e}.", path.display());
            ActionError::from(e).with_message(message)
        })?;

        let manifest = Self::from_str(&content, &url)?;
        Ok(Resource {
            url,
            value: manifest,
        })
    }

    /// Fetches and parses the manifest at `url`. Relative references in the
    /// manifest resolve against the URL the provider finally served.
    pub async fn load(
        provider: &dyn Provider<String>,
        url: &Url,
    ) -> Result<Resource<Manifest>> {
        let resource = provider.get(url).await?;
        let manifest = Self::from_str(&resource.value, &resource.url)?;

        tracing::debug!(
            url = %resource.url,
            actions = manifest.actions.len(),
            options = manifest.options.len(),
            "manifest loaded"
        );

        Ok(Resource {
            url: resource.url,
            value: manifest,
        })
    }
}

fn yaml_syntax_error(error: &serde_yaml::Error, url: &Url) -> SyntaxError {
    let start = error
        .location()
        .map(|l| Position::new(l.index(), l.line(), l.column()))
        .unwrap_or_else(|| Position::new(0, 1, 1));

    SyntaxError {
        message: format!("Invalid YAML: {error}."),
        location: SourceLocation {
            url: url.to_string(),
            start,
            end: start,
        },
    }
}
