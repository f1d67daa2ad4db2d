use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use stencil_context::SourceLocation;

/// Reserved key under which manifest loaders record where a definition was
/// declared.
pub const SOURCE_KEY: &str = "$source";

/// A step as declared in a manifest: its kind plus kind-specific options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionDefinition {
    pub name: String,
    #[serde(
        rename = "$source",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub source: Option<SourceLocation>,
    #[serde(flatten)]
    pub options: Map<String, Value>,
}

impl ActionDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: None,
            options: Map::new(),
        }
    }

    pub fn with_option(mut self, key: impl Into<String>, value: Value) -> Self {
        self.options.insert(key.into(), value);
        self
    }

    pub fn with_source(mut self, source: SourceLocation) -> Self {
        self.source = Some(source);
        self
    }
}

/// Either a single definition or a list of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> OneOrMany<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::Many(items) => items,
            OneOrMany::One(item) => vec![item],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use stencil_context::Position;

    #[test]
    fn test_deserialize_splits_name_source_and_options() {
        let definition: ActionDefinition = serde_json::from_value(json!({
            "name": "print",
            "message": "hello",
            "$source": {
                "url": "file:///t.json",
                "start": {"index": 4, "line": 2, "column": 3},
                "end": {"index": 40, "line": 5, "column": 4}
            }
        }))
        .unwrap();

        assert_eq!(definition.name, "print");
        assert_eq!(definition.options.get("message"), Some(&json!("hello")));
        assert!(!definition.options.contains_key(SOURCE_KEY));
        assert_eq!(
            definition.source.map(|s| s.start),
            Some(Position::new(4, 2, 3))
        );
    }

    #[test]
    fn test_missing_name_is_rejected() {
        let result: Result<ActionDefinition, _> =
            serde_json::from_value(json!({"message": "hello"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_one_or_many() {
        let one: OneOrMany<ActionDefinition> =
            serde_json::from_value(json!({"name": "print"})).unwrap();
        assert_eq!(one.into_vec().len(), 1);

        let many: OneOrMany<ActionDefinition> =
            serde_json::from_value(json!([{"name": "a"}, {"name": "b"}]))
                .unwrap();
        let names: Vec<_> = many.into_vec().into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["a", "b"]);
    }
}
