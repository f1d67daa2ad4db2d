use serde_json::Value;
use std::path::{Path, PathBuf};
use stencil_context::{producer, Result, VariablePath, VariableStore};

/// Writes the `project.*` facts: `project.path` immediately, and
/// `project.name` as a deferred value read from the project's
/// `package.json`, falling back to the directory name.
pub async fn define_project(store: &VariableStore, path: &Path) -> Result<()> {
    store
        .set_str("project.path", Value::String(path.display().to_string()))
        .await?;

    let root = path.to_path_buf();
    store
        .define_deferred(
            &VariablePath::parse("project.name")?,
            producer(move || project_name(root.clone())),
        )
        .await
}

async fn project_name(root: PathBuf) -> Result<Value> {
    let manifest = root.join("package.json");
    if let Ok(content) = tokio::fs::read_to_string(&manifest).await {
        match serde_json::from_str::<Value>(&content) {
            Ok(package) => {
                if let Some(name) = package.get("name").and_then(Value::as_str) {
                    return Ok(Value::String(name.to_string()));
                }
            }
            Err(e) => tracing::debug!(path = %manifest.display(), error = %e, "unreadable package.json"),
        }
    }

    let name = root
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(Value::String(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_project_name_from_package_json() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("package.json"), r#"{"name": "storefront"}"#).unwrap();
        let store = VariableStore::new();

        define_project(&store, dir.path()).await.unwrap();

        assert_eq!(store.get_str("project.name").await.unwrap(), json!("storefront"));
        assert_eq!(
            store.get_str("project.path").await.unwrap(),
            json!(dir.path().display().to_string())
        );
    }

    #[tokio::test]
    async fn test_project_name_falls_back_to_directory() {
        let dir = tempfile::tempdir().unwrap();
        let project = dir.path().join("my-app");
        std::fs::create_dir(&project).unwrap();
        let store = VariableStore::new();

        define_project(&store, &project).await.unwrap();

        assert_eq!(store.get_str("project.name").await.unwrap(), json!("my-app"));
    }
}
