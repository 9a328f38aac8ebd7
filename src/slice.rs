//! Operation slicing: cut one `(path, method)` out of a document.

use serde_json::{json, Map, Value};

use crate::document::OpenApiDocument;
use crate::error::{OpenApiLlmError, Result};

/// The minimal document needed to describe one operation to the model.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationSlice {
    pub openapi: Option<String>,
    pub info: Value,
    pub components: Value,
    pub path: String,
    pub method: String,
    pub operation: Value,
}

impl OperationSlice {
    /// Render as a stand-alone OpenAPI document with a single path entry.
    pub fn to_value(&self) -> Value {
        let mut methods = Map::new();
        methods.insert(self.method.clone(), self.operation.clone());
        let mut paths = Map::new();
        paths.insert(self.path.clone(), Value::Object(methods));

        let mut doc = Map::new();
        if let Some(version) = &self.openapi {
            doc.insert("openapi".to_string(), json!(version));
        }
        doc.insert("info".to_string(), self.info.clone());
        doc.insert("components".to_string(), self.components.clone());
        doc.insert("paths".to_string(), Value::Object(paths));
        Value::Object(doc)
    }
}

/// Extract the slice for `path` and `method`; the method is matched in lower case.
pub fn slice(document: &OpenApiDocument, path: &str, method: &str) -> Result<OperationSlice> {
    let method = method.to_ascii_lowercase();
    let operation = document
        .operation(path, &method)
        .ok_or_else(|| OpenApiLlmError::OperationNotFound {
            path: path.to_string(),
            method: method.clone(),
        })?;

    Ok(OperationSlice {
        openapi: document.openapi_version().map(str::to_string),
        info: document.info().cloned().unwrap_or_else(|| json!({})),
        components: document.components().cloned().unwrap_or_else(|| json!({})),
        path: path.to_string(),
        method,
        operation: operation.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn doc() -> OpenApiDocument {
        OpenApiDocument::from_value(json!({
            "openapi": "3.1.0",
            "info": {"title": "Demo", "version": "1.0"},
            "paths": {
                "/a": {"get": {"summary": "get a"}, "post": {"summary": "post a"}},
                "/b": {"get": {"summary": "get b"}}
            },
            "components": {"schemas": {"X": {"type": "string"}}}
        }))
        .unwrap()
    }

    #[test]
    fn keeps_only_requested_operation() {
        let s = slice(&doc(), "/a", "POST").unwrap();
        assert_eq!(s.method, "post");
        assert_eq!(
            s.to_value(),
            json!({
                "openapi": "3.1.0",
                "info": {"title": "Demo", "version": "1.0"},
                "components": {"schemas": {"X": {"type": "string"}}},
                "paths": {"/a": {"post": {"summary": "post a"}}}
            })
        );
    }

    #[test]
    fn missing_path_or_method_is_not_found() {
        let d = doc();
        assert!(matches!(
            slice(&d, "/missing", "get"),
            Err(OpenApiLlmError::OperationNotFound { .. })
        ));
        assert!(matches!(
            slice(&d, "/b", "delete"),
            Err(OpenApiLlmError::OperationNotFound { .. })
        ));
    }

    #[test]
    fn absent_info_and_components_default_to_empty() {
        let d = OpenApiDocument::from_value(json!({"paths": {"/x": {"get": {}}}})).unwrap();
        let v = slice(&d, "/x", "get").unwrap().to_value();
        assert_eq!(v, json!({"info": {}, "components": {}, "paths": {"/x": {"get": {}}}}));
    }
}
