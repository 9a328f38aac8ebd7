//! Request payloads as supplied by callers and hooks.

use serde_json::Value;

use crate::error::Result;

/// A request payload: structured JSON or raw text holding JSON.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestPayload {
    Json(Value),
    Text(String),
}

impl RequestPayload {
    /// Resolve to JSON, parsing text payloads.
    pub fn into_json(self) -> Result<Value> {
        match self {
            RequestPayload::Json(v) => Ok(v),
            RequestPayload::Text(t) => Ok(serde_json::from_str(&t)?),
        }
    }
}

impl From<Value> for RequestPayload {
    fn from(v: Value) -> Self {
        RequestPayload::Json(v)
    }
}

impl From<String> for RequestPayload {
    fn from(t: String) -> Self {
        RequestPayload::Text(t)
    }
}

impl From<&str> for RequestPayload {
    fn from(t: &str) -> Self {
        RequestPayload::Text(t.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn text_payloads_are_parsed() {
        let p: RequestPayload = r#"{"text": "Paul"}"#.into();
        assert_eq!(p.into_json().unwrap(), json!({"text": "Paul"}));
    }

    #[test]
    fn json_payloads_pass_through() {
        let p: RequestPayload = json!("a string value").into();
        assert_eq!(p.into_json().unwrap(), json!("a string value"));
    }

    #[test]
    fn bad_text_is_an_error() {
        let p = RequestPayload::from("not json".to_string());
        assert!(p.into_json().is_err());
    }
}
