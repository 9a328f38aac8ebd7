//! OpenAPI document loading and local `$ref` resolution.
//!
//! Everything downstream of [`OpenApiDocument`] assumes a fully inlined
//! document: no `$ref` nodes pointing into `#/components` remain. Remote
//! references are rejected at load time.

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{OpenApiLlmError, Result};

/// A dereferenced OpenAPI document, immutable once built.
#[derive(Debug, Clone)]
pub struct OpenApiDocument {
    root: Value,
}

impl OpenApiDocument {
    /// Build from an already-parsed JSON value, resolving local refs.
    pub fn from_value(raw: Value) -> Result<Self> {
        if !raw.is_object() {
            return Err(OpenApiLlmError::Document {
                message: "document root must be an object".to_string(),
            });
        }
        let root = dereference(&raw)?;
        if !root.get("paths").map(Value::is_object).unwrap_or(false) {
            return Err(OpenApiLlmError::Document {
                message: "document has no `paths` object".to_string(),
            });
        }
        debug!(
            paths = root["paths"].as_object().map(|p| p.len()).unwrap_or(0),
            "loaded OpenAPI document"
        );
        Ok(Self { root })
    }

    /// Parse a JSON document.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let raw: Value = serde_json::from_str(text).map_err(|e| OpenApiLlmError::Document {
            message: e.to_string(),
        })?;
        Self::from_value(raw)
    }

    /// Parse a YAML document.
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let raw: Value = serde_yaml::from_str(text)?;
        Self::from_value(raw)
    }

    /// The whole dereferenced document.
    pub fn as_value(&self) -> &Value {
        &self.root
    }

    pub fn openapi_version(&self) -> Option<&str> {
        self.root.get("openapi").and_then(Value::as_str)
    }

    pub fn info(&self) -> Option<&Value> {
        self.root.get("info")
    }

    pub fn components(&self) -> Option<&Value> {
        self.root.get("components")
    }

    pub fn paths(&self) -> Option<&Map<String, Value>> {
        self.root.get("paths").and_then(Value::as_object)
    }

    /// Look up one operation. `method` must already be lower case.
    pub fn operation(&self, path: &str, method: &str) -> Option<&Value> {
        self.paths()?.get(path)?.get(method)
    }
}

/// Resolve every local `$ref` in `root` against `root` itself.
pub fn dereference(root: &Value) -> Result<Value> {
    let mut stack = Vec::new();
    resolve(root, root, &mut stack)
}

fn resolve(root: &Value, node: &Value, stack: &mut Vec<String>) -> Result<Value> {
    match node {
        Value::Object(map) => {
            if let Some(Value::String(reference)) = map.get("$ref") {
                return resolve_ref(root, map, reference, stack);
            }
            let mut out = Map::with_capacity(map.len());
            for (k, v) in map {
                out.insert(k.clone(), resolve(root, v, stack)?);
            }
            Ok(Value::Object(out))
        }
        Value::Array(items) => items
            .iter()
            .map(|v| resolve(root, v, stack))
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        other => Ok(other.clone()),
    }
}

fn resolve_ref(
    root: &Value,
    map: &Map<String, Value>,
    reference: &str,
    stack: &mut Vec<String>,
) -> Result<Value> {
    let pointer = reference
        .strip_prefix('#')
        .ok_or_else(|| OpenApiLlmError::Document {
            message: format!("remote reference not supported: {}", reference),
        })?;

    // Cycle: keep the ref as an opaque node.
    if stack.iter().any(|r| r == reference) {
        return Ok(Value::Object(map.clone()));
    }

    let target = root
        .pointer(pointer)
        .ok_or_else(|| OpenApiLlmError::Document {
            message: format!("unresolved reference: {}", reference),
        })?;

    stack.push(reference.to_string());
    let resolved = resolve(root, target, stack);
    stack.pop();
    let mut resolved = resolved?;

    // Siblings of `$ref` (OpenAPI 3.1 allows e.g. `description`) override the target.
    if map.len() > 1 {
        if let Value::Object(obj) = &mut resolved {
            for (k, v) in map {
                if k != "$ref" {
                    obj.insert(k.clone(), resolve(root, v, stack)?);
                }
            }
        }
    }
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn resolves_component_refs() {
        let raw = json!({
            "openapi": "3.1.0",
            "info": {"title": "t", "version": "1"},
            "paths": {
                "/a": {"post": {"requestBody": {"content": {"application/json": {
                    "schema": {"$ref": "#/components/schemas/A"}
                }}}}}
            },
            "components": {"schemas": {
                "A": {"type": "object", "properties": {"b": {"$ref": "#/components/schemas/B"}}},
                "B": {"type": "string"}
            }}
        });
        let doc = OpenApiDocument::from_value(raw).unwrap();
        let schema = &doc.operation("/a", "post").unwrap()["requestBody"]["content"]
            ["application/json"]["schema"];
        assert_eq!(
            schema,
            &json!({"type": "object", "properties": {"b": {"type": "string"}}})
        );
    }

    #[test]
    fn ref_siblings_override_target() {
        let raw = json!({
            "paths": {},
            "components": {"schemas": {
                "A": {"type": "string", "description": "old"},
                "B": {"$ref": "#/components/schemas/A", "description": "new"}
            }}
        });
        let doc = OpenApiDocument::from_value(raw).unwrap();
        assert_eq!(
            doc.components().unwrap()["schemas"]["B"],
            json!({"type": "string", "description": "new"})
        );
    }

    #[test]
    fn cyclic_refs_terminate() {
        let raw = json!({
            "paths": {},
            "components": {"schemas": {
                "Node": {"type": "object", "properties": {"next": {"$ref": "#/components/schemas/Node"}}}
            }}
        });
        let doc = OpenApiDocument::from_value(raw).unwrap();
        let node = &doc.components().unwrap()["schemas"]["Node"];
        assert_eq!(
            node["properties"]["next"]["properties"]["next"],
            json!({"$ref": "#/components/schemas/Node"})
        );
    }

    #[test]
    fn rejects_remote_and_dangling_refs() {
        let remote = json!({"paths": {"/a": {"$ref": "https://example.com/x.json"}}});
        assert!(matches!(
            OpenApiDocument::from_value(remote),
            Err(OpenApiLlmError::Document { .. })
        ));
        let dangling = json!({"paths": {"/a": {"$ref": "#/components/nope"}}});
        assert!(OpenApiDocument::from_value(dangling).is_err());
    }

    #[test]
    fn loads_yaml() {
        let yaml = r#"
openapi: 3.1.0
info:
  title: Demo
  version: "1.0"
paths:
  /ping:
    get:
      responses:
        "200":
          description: ok
"#;
        let doc = OpenApiDocument::from_yaml_str(yaml).unwrap();
        assert_eq!(doc.openapi_version(), Some("3.1.0"));
        assert!(doc.operation("/ping", "get").is_some());
        assert!(doc.operation("/ping", "post").is_none());
    }

    #[test]
    fn requires_paths() {
        assert!(OpenApiDocument::from_value(json!({"info": {}})).is_err());
        assert!(OpenApiDocument::from_json_str("[]").is_err());
    }
}
