use super::FileSystem;
use futures::future::BoxFuture;
use std::path::{Component, Path, PathBuf};
use stencil_context::{ActionError, Result};

/// File system bounded to a root directory.
#[derive(Debug, Clone)]
pub struct LocalFileSystem {
    root: PathBuf,
}

impl LocalFileSystem {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Maps `path` under the root, rejecting paths that escape it.
    fn resolve(&self, path: &str) -> Result<PathBuf> {
        let mut relative = PathBuf::new();

        for component in Path::new(path).components() {
            match component {
                Component::Normal(part) => relative.push(part),
                Component::CurDir => {}
                Component::ParentDir => {
                    if !relative.pop() {
                        return Err(escapes_root(path));
                    }
                }
                Component::RootDir | Component::Prefix(_) => {
                    return Err(escapes_root(path));
                }
            }
        }

        Ok(self.root.join(relative))
    }
}

fn escapes_root(path: &str) -> ActionError {
    ActionError::access_denied(format!(
        "Path `{path}` is outside of the project directory."
    ))
}

impl FileSystem for LocalFileSystem {
    fn exists<'a>(&'a self, path: &'a str) -> BoxFuture<'a, Result<bool>> {
        Box::pin(async move {
            let target = self.resolve(path)?;
            Ok(tokio::fs::try_exists(target).await?)
        })
    }

    fn is_directory<'a>(&'a self, path: &'a str) -> BoxFuture<'a, Result<bool>> {
        Box::pin(async move {
            let target = self.resolve(path)?;
            match tokio::fs::metadata(target).await {
                Ok(metadata) => Ok(metadata.is_dir()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
                Err(e) => Err(e.into()),
            }
        })
    }

    fn read_text<'a>(&'a self, path: &'a str) -> BoxFuture<'a, Result<String>> {
        Box::pin(async move {
            let target = self.resolve(path)?;
            tokio::fs::read_to_string(&target).await.map_err(|e| {
                ActionError::from(e).with_message(format!("Unable to read file `{path}`."))
            })
        })
    }

    fn write_text<'a>(
        &'a self,
        path: &'a str,
        content: &'a str,
        overwrite: bool,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let target = self.resolve(path)?;

            if !overwrite && tokio::fs::try_exists(&target).await? {
                return Err(ActionError::precondition(format!(
                    "File `{path}` already exists."
                ))
                .with_suggestions(vec![
                    "Set `overwrite` to true to replace the existing file.".to_string(),
                ]));
            }

            if let Some(parent) = target.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(&target, content).await?;
            Ok(())
        })
    }

    fn create_directory<'a>(&'a self, path: &'a str) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let target = self.resolve(path)?;
            tokio::fs::create_dir_all(target).await?;
            Ok(())
        })
    }

    fn delete<'a>(&'a self, path: &'a str) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let target = self.resolve(path)?;
            if target == self.root {
                return Err(ActionError::access_denied(
                    "Refusing to delete the project directory.",
                ));
            }

            let metadata = tokio::fs::symlink_metadata(&target).await?;
            if metadata.is_dir() {
                tokio::fs::remove_dir_all(&target).await?;
            } else {
                tokio::fs::remove_file(&target).await?;
            }
            Ok(())
        })
    }

    fn list<'a>(
        &'a self,
        path: &'a str,
        recursive: bool,
    ) -> BoxFuture<'a, Result<Vec<String>>> {
        Box::pin(async move {
            let base = self.resolve(path)?;
            let mut pending = vec![PathBuf::new()];
            let mut entries = Vec::new();

            while let Some(relative) = pending.pop() {
                let mut reader = tokio::fs::read_dir(base.join(&relative)).await?;
                while let Some(entry) = reader.next_entry().await? {
                    let child = relative.join(entry.file_name());
                    if recursive && entry.file_type().await?.is_dir() {
                        pending.push(child.clone());
                    }
                    entries.push(child.to_string_lossy().replace('\\', "/"));
                }
            }

            entries.sort();
            Ok(entries)
        })
    }
}
