//! Validate tool call arguments against a parameter contract before execution.

use super::types::AgentToolParameters;

/// Validate supplied arguments against a tool's parameter contract.
///
/// Arguments must be a JSON object whose keys are all declared parameters and
/// which includes every required (no-default) parameter. Returns `Err(message)`
/// describing the first violation found.
pub fn validate_arguments(
    args: &serde_json::Value,
    parameters: &AgentToolParameters,
) -> Result<(), String> {
    let Some(obj) = args.as_object() else {
        return Err(format!("expected object arguments, got {}", json_type_name(args)));
    };

    let declared = parameters.declared();
    if let Some(key) = obj.keys().find(|k| !declared.contains(&k.as_str())) {
        return Err(format!("undeclared argument '{key}'"));
    }

    if let Some(name) = parameters.required().into_iter().find(|n| !obj.contains_key(*n)) {
        return Err(format!("missing required field '{name}'"));
    }

    Ok(())
}

/// Check that a parameter contract is well formed: an object schema whose
/// required names are all declared.
pub fn check_contract(parameters: &AgentToolParameters) -> Result<(), String> {
    match parameters.schema.get("type").and_then(|t| t.as_str()) {
        Some("object") => {}
        other => return Err(format!("parameters must be an object schema, got {other:?}")),
    }
    let declared = parameters.declared();
    if let Some(name) = parameters.required().into_iter().find(|n| !declared.contains(n)) {
        return Err(format!("required parameter '{name}' is not declared"));
    }
    Ok(())
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
