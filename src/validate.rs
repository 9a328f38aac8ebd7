//! Schema lookup and JSON Schema validation against an operation slice.

use std::fmt;

use jsonschema::{Draft, JSONSchema};
use serde_json::{Map, Value};

use crate::error::{OpenApiLlmError, Result};
use crate::slice::OperationSlice;

const JSON_MEDIA_TYPE: &str = "application/json";

/// Which side of the operation a schema describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaKind {
    /// `requestBody` schema
    Request,
    /// `responses["200"]` schema
    Response,
}

impl fmt::Display for SchemaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaKind::Request => f.write_str("request"),
            SchemaKind::Response => f.write_str("response"),
        }
    }
}

/// Find the schema of `kind` in the slice's operation.
pub fn schema_for(slice: &OperationSlice, kind: SchemaKind) -> Result<&Value> {
    let content = match kind {
        SchemaKind::Request => slice.operation.get("requestBody"),
        SchemaKind::Response => slice
            .operation
            .get("responses")
            .and_then(|r| r.get("200")),
    }
    .and_then(|body| body.get("content"))
    .and_then(Value::as_object);

    content
        .and_then(media_schema)
        .ok_or_else(|| OpenApiLlmError::SchemaNotFound {
            kind,
            path: slice.path.clone(),
            method: slice.method.clone(),
        })
}

// Prefer application/json, otherwise the first media type that has a schema.
fn media_schema(content: &Map<String, Value>) -> Option<&Value> {
    content
        .get(JSON_MEDIA_TYPE)
        .and_then(|m| m.get("schema"))
        .or_else(|| content.values().find_map(|m| m.get("schema")))
}

/// Validate `value` against a bare JSON Schema.
pub fn validate_schema(schema: &Value, value: &Value, kind: SchemaKind) -> Result<()> {
    let compiled = JSONSchema::options()
        .with_draft(Draft::Draft202012)
        .compile(schema)
        .map_err(|e| OpenApiLlmError::InvalidSchema {
            kind,
            message: e.to_string(),
        })?;

    let result = compiled.validate(value);
    if let Err(errors) = result {
        let errors = errors
            .map(|e| {
                let at = e.instance_path.to_string();
                if at.is_empty() {
                    e.to_string()
                } else {
                    format!("{}: {}", at, e)
                }
            })
            .collect::<Vec<_>>();
        return Err(OpenApiLlmError::Validation { kind, errors });
    }
    Ok(())
}

/// Validate `value` against the slice's schema of `kind`.
pub fn validate(slice: &OperationSlice, value: &Value, kind: SchemaKind) -> Result<()> {
    let schema = schema_for(slice, kind)?;
    validate_schema(schema, value, kind)
}
