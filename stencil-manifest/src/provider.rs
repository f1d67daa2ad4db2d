use futures::future::BoxFuture;
use std::collections::HashMap;
use std::sync::Arc;
use stencil_context::{ActionError, Result};
use stencil_core::io::{Provider, Resource};
use url::Url;

/// Reads `file:` URLs from the local disk.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileProvider;

impl Provider<String> for FileProvider {
    fn get<'a>(&'a self, url: &'a Url) -> BoxFuture<'a, Result<Resource<String>>> {
        Box::pin(async move {
            if url.scheme() != "file" {
                return Err(ActionError::not_supported(format!(
                    "Cannot read `{url}` from the file system."
                )));
            }

            let path = url.to_file_path().map_err(|_| {
                ActionError::invalid_input(format!("`{url}` is not a valid file URL."))
            })?;

            let value = tokio::fs::read_to_string(&path).await.map_err(|e| {
                let message = format!("Cannot read `{}`: {e}.", path.display());
                ActionError::from(e).with_message(message)
            })?;

            tracing::debug!(url = %url, bytes = value.len(), "resource loaded");
            Ok(Resource {
                url: url.clone(),
                value,
            })
        })
    }
}

/// Fetches `http:` and `https:` URLs. The returned resource carries the URL
/// after redirects.
#[cfg(feature = "http")]
#[derive(Debug, Default, Clone)]
pub struct HttpProvider {
    client: reqwest::Client,
}

#[cfg(feature = "http")]
impl HttpProvider {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[cfg(feature = "http")]
impl Provider<String> for HttpProvider {
    fn get<'a>(&'a self, url: &'a Url) -> BoxFuture<'a, Result<Resource<String>>> {
        Box::pin(async move {
            let failed = |e: reqwest::Error| {
                ActionError::other(format!("Cannot fetch `{url}`: {e}."))
                    .with_cause(anyhow::Error::new(e))
            };

            let response = self.client.get(url.clone()).send().await.map_err(failed)?;
            let status = response.status();
            if status == reqwest::StatusCode::NOT_FOUND {
                return Err(ActionError::not_found(format!("`{url}` does not exist.")));
            }
            let response = response.error_for_status().map_err(failed)?;

            let final_url = response.url().clone();
            let value = response.text().await.map_err(failed)?;

            tracing::debug!(url = %final_url, status = %status, "resource fetched");
            Ok(Resource {
                url: final_url,
                value,
            })
        })
    }
}

/// Dispatches on the URL scheme.
#[derive(Clone)]
pub struct SchemeProvider {
    providers: HashMap<String, Arc<dyn Provider<String>>>,
}

impl SchemeProvider {
    /// A provider with no registered schemes.
    pub fn empty() -> Self {
        Self {
            providers: HashMap::new(),
        }
    }

    pub fn register(
        mut self,
        scheme: impl Into<String>,
        provider: Arc<dyn Provider<String>>,
    ) -> Self {
        self.providers.insert(scheme.into(), provider);
        self
    }
}

impl Default for SchemeProvider {
    /// `file:` and, with the `http` feature, `http:` and `https:`.
    fn default() -> Self {
        let providers = Self::empty().register("file", Arc::new(FileProvider));

        #[cfg(feature = "http")]
        let providers = {
            let http: Arc<dyn Provider<String>> = Arc::new(HttpProvider::default());
            providers.register("http", http.clone()).register("https", http)
        };

        providers
    }
}

impl Provider<String> for SchemeProvider {
    fn get<'a>(&'a self, url: &'a Url) -> BoxFuture<'a, Result<Resource<String>>> {
        match self.providers.get(url.scheme()) {
            Some(provider) => provider.get(url),
            None => Box::pin(async move {
                let mut schemes: Vec<_> = self.providers.keys().cloned().collect();
                schemes.sort();
                Err(ActionError::not_supported(format!(
                    "Unsupported URL scheme `{}`.",
                    url.scheme()
                ))
                .with_details(vec![format!("Supported schemes: {}.", schemes.join(", "))]))
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stencil_context::ErrorReason;

    #[tokio::test]
    async fn test_file_provider_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manifest.json");
        std::fs::write(&path, "{}").unwrap();
        let url = Url::from_file_path(&path).unwrap();

        let resource = FileProvider.get(&url).await.unwrap();

        assert_eq!(resource.value, "{}");
        assert_eq!(resource.url, url);
    }

    #[tokio::test]
    async fn test_file_provider_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let url = Url::from_file_path(dir.path().join("missing.json")).unwrap();

        let error = FileProvider.get(&url).await.unwrap_err();

        assert_eq!(error.reason(), ErrorReason::NotFound);
    }

    #[tokio::test]
    async fn test_scheme_provider_rejects_unknown_scheme() {
        let url = Url::parse("ftp://example.com/manifest.json").unwrap();

        let error = SchemeProvider::default().get(&url).await.unwrap_err();

        assert_eq!(error.reason(), ErrorReason::NotSupported);
        assert!(error.details()[0].contains("file"));
    }
}
