use std::path::PathBuf;
use url::Url;

/// Settings for one template run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Relative manifest references resolve against this URL.
    pub base_url: Url,
    /// Root of the project the template works on. File actions cannot
    /// leave it.
    pub project_path: PathBuf,
    /// When false, prompts answer with their default or fail.
    pub interactive: bool,
    pub json_logs: bool,
}

impl RunConfig {
    /// Configuration rooted at `project_path`, resolving manifests against
    /// it.
    pub fn for_project(project_path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let project_path = std::path::absolute(project_path.into())?;
        let base_url = Url::from_directory_path(&project_path).map_err(|_| {
            anyhow::anyhow!("`{}` cannot be used as a base URL", project_path.display())
        })?;

        Ok(Self {
            base_url,
            project_path,
            interactive: false,
            json_logs: false,
        })
    }

    pub fn with_interactive(mut self, interactive: bool) -> Self {
        self.interactive = interactive;
        self
    }

    pub fn with_json_logs(mut self, json_logs: bool) -> Self {
        self.json_logs = json_logs;
        self
    }
}

impl Default for RunConfig {
    /// Rooted at the current directory, non-interactive, plain logs.
    fn default() -> Self {
        let project_path = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self::for_project(&project_path).unwrap_or_else(|_| Self {
            base_url: Url::parse("file:///").expect("static URL is valid"),
            project_path,
            interactive: false,
            json_logs: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_project_sets_directory_base_url() {
        let dir = tempfile::tempdir().unwrap();
        let config = RunConfig::for_project(dir.path()).unwrap();

        assert!(config.base_url.as_str().ends_with('/'));
        assert_eq!(config.base_url.to_file_path().unwrap(), config.project_path);
        assert!(!config.interactive);
    }

    #[test]
    fn test_builders() {
        let config = RunConfig::default().with_interactive(true).with_json_logs(true);
        assert!(config.interactive);
        assert!(config.json_logs);
    }
}
