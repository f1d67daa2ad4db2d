use crate::action::{Action, DynAction};
use crate::actions::{
    DefineAction, FailAction, PrintAction, PromptAction, ReadFileAction,
    ReplaceFileContentAction, RunAction, TryAction, WriteFileAction,
};
use std::collections::HashMap;
use std::sync::Arc;

/// Name → implementation mapping, built once before execution starts.
#[derive(Clone, Default)]
pub struct ActionRegistry {
    actions: HashMap<String, Arc<dyn DynAction>>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the control-flow actions and the basic actions of this
    /// crate.
    pub fn with_builtin_actions() -> Self {
        Self::new()
            .register("define", DefineAction)
            .register("try", TryAction)
            .register("run", RunAction)
            .register("print", PrintAction)
            .register("fail", FailAction)
            .register("prompt", PromptAction)
            .register("read-file", ReadFileAction)
            .register("write-file", WriteFileAction)
            .register("replace-file-content", ReplaceFileContentAction)
    }

    pub fn register<A: Action>(mut self, name: impl Into<String>, action: A) -> Self {
        self.insert(name, action);
        self
    }

    pub fn insert<A: Action>(&mut self, name: impl Into<String>, action: A) {
        self.actions.insert(name.into(), Arc::new(action));
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn DynAction>> {
        self.actions.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.actions.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> =
            self.actions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
