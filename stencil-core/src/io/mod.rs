//! Collaborators consumed by actions. The engine itself never touches them.

mod codemod;
mod fs;
mod terminal;

pub use codemod::{Replacement, TextReplacementCodemod};
pub use fs::LocalFileSystem;
pub use terminal::{NonInteractiveInput, TracingOutput};

use futures::future::BoxFuture;
use stencil_context::Result;
use url::Url;

/// Interactive prompts.
pub trait Input: Send + Sync {
    fn prompt<'a>(
        &'a self,
        message: &'a str,
        default: Option<&'a str>,
    ) -> BoxFuture<'a, Result<String>>;

    fn confirm<'a>(
        &'a self,
        message: &'a str,
        default: Option<bool>,
    ) -> BoxFuture<'a, Result<bool>>;

    /// Returns the index of the selected choice.
    fn select<'a>(
        &'a self,
        message: &'a str,
        choices: &'a [String],
        default: Option<usize>,
    ) -> BoxFuture<'a, Result<usize>>;
}

/// Status notifications shown to the user.
pub trait Output: Send + Sync {
    fn inform(&self, message: &str);

    fn warn(&self, message: &str);
}

/// File access used by I/O actions. Paths are relative to the
/// implementation's root.
pub trait FileSystem: Send + Sync {
    fn exists<'a>(&'a self, path: &'a str) -> BoxFuture<'a, Result<bool>>;

    fn is_directory<'a>(&'a self, path: &'a str) -> BoxFuture<'a, Result<bool>>;

    fn read_text<'a>(&'a self, path: &'a str) -> BoxFuture<'a, Result<String>>;

    fn write_text<'a>(
        &'a self,
        path: &'a str,
        content: &'a str,
        overwrite: bool,
    ) -> BoxFuture<'a, Result<()>>;

    fn create_directory<'a>(&'a self, path: &'a str) -> BoxFuture<'a, Result<()>>;

    fn delete<'a>(&'a self, path: &'a str) -> BoxFuture<'a, Result<()>>;

    /// Lists entries below `path`, relative to it, in sorted order.
    fn list<'a>(
        &'a self,
        path: &'a str,
        recursive: bool,
    ) -> BoxFuture<'a, Result<Vec<String>>>;
}

/// A fetched resource and the URL it was finally served from.
#[derive(Debug, Clone, PartialEq)]
pub struct Resource<T> {
    pub url: Url,
    pub value: T,
}

pub trait Provider<T>: Send + Sync {
    fn get<'a>(&'a self, url: &'a Url) -> BoxFuture<'a, Result<Resource<T>>>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct CodemodResult<T> {
    pub modified: bool,
    pub result: T,
}

/// Source transformation applied by codemod actions.
pub trait Codemod<T>: Send + Sync {
    type Options: Send + Sync;

    fn apply<'a>(
        &'a self,
        input: T,
        options: &'a Self::Options,
    ) -> BoxFuture<'a, Result<CodemodResult<T>>>;
}
