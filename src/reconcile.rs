//! Shape reconciliation: blank skeletons and deep merge.
//!
//! [`reconcile`] first builds a [`blank`] value for the response schema and
//! then [`merge`]s the model output over it, so every declared property is
//! present in the result even when the model left it out.

use serde_json::{Map, Value};

/// Type-appropriate empty instance of `schema`.
///
/// - object: every declared property, itself blanked
/// - array: `[]`
/// - string: `""`, number/integer: `0`, boolean: `false`
/// - anything else (including untyped nodes): `null`
pub fn blank(schema: &Value) -> Value {
    match schema_type(schema) {
        Some("object") => {
            let mut out = Map::new();
            if let Some(props) = schema.get("properties").and_then(Value::as_object) {
                for (name, prop) in props {
                    out.insert(name.clone(), blank(prop));
                }
            }
            Value::Object(out)
        }
        Some("array") => Value::Array(Vec::new()),
        Some("string") => Value::String(String::new()),
        Some("number") | Some("integer") => Value::from(0),
        Some("boolean") => Value::Bool(false),
        _ => Value::Null,
    }
}

fn schema_type(schema: &Value) -> Option<&str> {
    match schema.get("type") {
        Some(Value::String(t)) => Some(t.as_str()),
        // OpenAPI 3.1 nullable style: ["string", "null"]
        Some(Value::Array(types)) => types
            .iter()
            .filter_map(Value::as_str)
            .find(|t| *t != "null"),
        Some(_) => None,
        None if schema.get("properties").map(Value::is_object).unwrap_or(false) => Some("object"),
        None => None,
    }
}

/// Deep-merge `source` into `target` in place.
///
/// Composite values in `source` get a composite placeholder of the same kind
/// in `target` and are merged recursively. Primitives and `null` overwrite.
/// Keys missing from `source` keep their value in `target`, so an empty
/// object or array leaves `target` as it was.
pub fn merge(target: &mut Value, source: &Value) {
    match source {
        Value::Object(src) => {
            if src.is_empty() {
                return;
            }
            if !target.is_object() {
                *target = Value::Object(Map::new());
            }
            if let Value::Object(dst) = target {
                for (key, value) in src {
                    let slot = dst.entry(key.clone()).or_insert(Value::Null);
                    merge_slot(slot, value);
                }
            }
        }
        Value::Array(src) => {
            if src.is_empty() {
                return;
            }
            if !target.is_array() {
                *target = Value::Array(Vec::new());
            }
            if let Value::Array(dst) = target {
                for (index, value) in src.iter().enumerate() {
                    if dst.len() <= index {
                        dst.resize(index + 1, Value::Null);
                    }
                    merge_slot(&mut dst[index], value);
                }
            }
        }
        primitive => *target = primitive.clone(),
    }
}

// One key or index: force a placeholder of the source's kind, then recurse.
fn merge_slot(slot: &mut Value, value: &Value) {
    match value {
        Value::Object(_) if !slot.is_object() => *slot = Value::Object(Map::new()),
        Value::Array(_) if !slot.is_array() => *slot = Value::Array(Vec::new()),
        _ => {}
    }
    merge(slot, value);
}

/// `blank(schema)` with `value` merged over it.
pub fn reconcile(schema: &Value, value: &Value) -> Value {
    let mut out = blank(schema);
    merge(&mut out, value);
    out
}
