use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use stencil_context::{ActionError, ErrorReason, Result};
use stencil_core::ActionDefinition;

/// A template manifest: declared inputs plus the steps to run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub options: BTreeMap<String, OptionDefinition>,
    #[serde(default)]
    pub actions: Vec<ActionDefinition>,
}

impl Manifest {
    /// Interprets an already parsed document.
    pub fn from_value(value: Value) -> Result<Self> {
        serde_json::from_value(value).map_err(|e| {
            ActionError::new(
                format!("Invalid manifest: {e}."),
                ErrorReason::InvalidConfiguration,
            )
        })
    }
}

/// Declared input of a manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionDefinition {
    #[serde(rename = "type")]
    pub kind: OptionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<Value>,
    /// A literal, or a `${path}` expression evaluated on first read.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default)]
    pub required: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionType {
    String,
    Number,
    Boolean,
    Array,
}

impl OptionType {
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            OptionType::String => value.is_string(),
            OptionType::Number => value.is_number(),
            OptionType::Boolean => value.is_boolean(),
            OptionType::Array => value.is_array(),
        }
    }
}

impl fmt::Display for OptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OptionType::String => "string",
            OptionType::Number => "number",
            OptionType::Boolean => "boolean",
            OptionType::Array => "array",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_manifest_from_value() {
        let manifest = Manifest::from_value(json!({
            "title": "Demo",
            "options": {
                "name": {"type": "string", "required": true},
                "features": {"type": "array", "default": ["a"]}
            },
            "actions": [{"name": "print", "message": "hi"}]
        }))
        .unwrap();

        assert_eq!(manifest.title.as_deref(), Some("Demo"));
        assert!(manifest.options["name"].required);
        assert_eq!(manifest.options["features"].kind, OptionType::Array);
        assert_eq!(manifest.actions[0].name, "print");
        assert_eq!(manifest.actions[0].options["message"], json!("hi"));
    }

    #[test]
    fn test_invalid_manifest_is_configuration_error() {
        let error = Manifest::from_value(json!({"actions": {"name": 1}})).unwrap_err();
        assert_eq!(error.reason(), ErrorReason::InvalidConfiguration);
    }

    #[test]
    fn test_option_type_accepts() {
        assert!(OptionType::Number.accepts(&json!(1.5)));
        assert!(!OptionType::Number.accepts(&json!("1.5")));
        assert!(OptionType::Array.accepts(&json!([])));
    }
}
