use crate::manifest::{OptionDefinition, OptionType};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use stencil_context::{
    is_reference, producer, value_kind, ActionError,
    ExpressionResolver, Result, VariablePath,
};

/// Namespace the bound option values are written to.
pub const INPUT_NAMESPACE: &str = "input";

/// Validates `values` against `definitions` and writes each option to
/// `input.<escaped-name>`.
///
/// String values are coerced to the declared type so that values coming
/// from the command line can be passed as-is. Defaults that are
/// expressions are installed as deferred values and resolved on first
/// read.
pub async fn bind_options(
    definitions: &BTreeMap<String, OptionDefinition>,
    values: &Map<String, Value>,
    resolver: &ExpressionResolver,
) -> Result<()> {
    if let Some(unknown) = values.keys().find(|name| !definitions.contains_key(*name)) {
        let known: Vec<_> = definitions.keys().map(String::as_str).collect();
        return Err(ActionError::invalid_input(format!("Unknown option `{unknown}`."))
            .with_details(vec![format!(
                "Available options: {}.",
                if known.is_empty() { "none".to_string() } else { known.join(", ") }
            )]));
    }

    for (name, definition) in definitions {
        let path = option_path(name);

        match (values.get(name), &definition.default) {
            (Some(value), _) => {
                let value = validate(name, definition, coerce(definition.kind, value))?;
                resolver.store().set(&path, value).await?;
            }
            (None, Some(default)) if is_reference(default) => {
                let captured = resolver.clone();
                let default = default.clone();
                let definition = definition.clone();
                let name = name.clone();
                resolver
                    .store()
                    .define_deferred(
                        &path,
                        producer(move || {
                            let resolver = captured.clone();
                            let default = default.clone();
                            let definition = definition.clone();
                            let name = name.clone();
                            async move {
                                let value = resolver.resolve_value(&default).await?;
                                validate(&name, &definition, value)
                            }
                        }),
                    )
                    .await?;
            }
            (None, Some(default)) => {
                let value = validate(name, definition, default.clone())?;
                resolver.store().set(&path, value).await?;
            }
            (None, None) if definition.required => {
                return Err(ActionError::invalid_input(format!(
                    "Missing required option `{name}`."
                ))
                .with_details(
                    definition.description.iter().map(|d| format!("{name}: {d}")).collect(),
                ));
            }
            (None, None) => {
                tracing::debug!(option = %name, "optional option not provided");
            }
        }
    }

    Ok(())
}

/// Store path of the option called `name`. The name is a single segment,
/// so it is written as `input.<escaped-name>` in expressions.
pub fn option_path(name: &str) -> VariablePath {
    VariablePath::from_segments([INPUT_NAMESPACE, name])
}

fn coerce(kind: OptionType, value: &Value) -> Value {
    let Value::String(text) = value else {
        return value.clone();
    };

    match kind {
        OptionType::Boolean => match text.trim() {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            _ => value.clone(),
        },
        OptionType::Number => serde_json::from_str::<serde_json::Number>(text.trim())
            .map(Value::Number)
            .unwrap_or_else(|_| value.clone()),
        OptionType::Array => Value::Array(
            text.split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(|item| Value::String(item.to_string()))
                .collect(),
        ),
        OptionType::String => value.clone(),
    }
}

fn validate(name: &str, definition: &OptionDefinition, value: Value) -> Result<Value> {
    if !definition.kind.accepts(&value) {
        return Err(ActionError::invalid_input(format!(
            "Option `{name}` expects a {}, but got a {}.",
            definition.kind,
            value_kind(&value)
        )));
    }

    if !definition.choices.is_empty() && !definition.choices.contains(&value) {
        let choices: Vec<_> = definition.choices.iter().map(Value::to_string).collect();
        return Err(ActionError::invalid_input(format!(
            "Option `{name}` must be one of {}, but got {value}.",
            choices.join(", ")
        )));
    }

    Ok(value)
}
