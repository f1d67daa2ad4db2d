//! Built-in action kinds.

mod attempt;
mod define;
mod fail;
mod file;
mod print;
mod prompt;
mod run;

pub use attempt::{HelpOptions, LinkOptions, TryAction, TryOptions};
pub use define::{DefineAction, DefineOptions};
pub use fail::{FailAction, FailOptions};
pub use file::{
    ReadFileAction, ReadFileOptions, ReplaceFileContentAction,
    ReplaceFileContentOptions, ReplacementOptions, WriteFileAction,
    WriteFileOptions,
};
pub use print::{PrintAction, PrintLevel, PrintOptions};
pub use prompt::{PromptAction, PromptKind, PromptOptions};
pub use run::{run_actions, RunAction, RunOptions};
