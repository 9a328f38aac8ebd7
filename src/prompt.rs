//! System prompt synthesis.
//!
//! The operation slice is serialized to JSON, its braces are escaped, and the
//! result is appended to the fixed instructions to form a [`PromptTemplate`],
//! which understands `{name}` variables and `{{` / `}}` escapes. The model
//! therefore sees the slice verbatim while the slice itself can never inject
//! template variables.

use std::collections::HashMap;

use crate::error::{OpenApiLlmError, Result};
use crate::slice::OperationSlice;

/// Fixed policy text handed to the model as the system turn.
pub const SYSTEM_INSTRUCTIONS: &str = "\
You are an API server. You receive the request payload of an HTTP call as the \
user message and you answer with the response body the operation described by \
the OpenAPI specification below would return.

Rules:
1. Always respond in JSON.
2. Treat every request as a best-effort call that always succeeds: answer with \
the shape of the 200 response.
3. Only use fields present in the request payload. Never fabricate or invent \
data that cannot be derived from it.
4. Leave a field blank when no input data justifies a value.
5. Never use the example values of the specification as the answer.
6. Do not wrap the answer in code fences such as ```json.";

/// Minimal `{var}` template with `{{` / `}}` escapes.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    template: String,
}

impl PromptTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    /// Substitute variables. Unknown variables and stray braces are errors.
    pub fn render(&self, vars: &HashMap<&str, String>) -> Result<String> {
        let mut out = String::with_capacity(self.template.len());
        let mut chars = self.template.chars().peekable();
        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    out.push('{');
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    out.push('}');
                }
                '{' => {
                    let mut name = String::new();
                    loop {
                        match chars.next() {
                            Some('}') => break,
                            Some(ch) => name.push(ch),
                            None => {
                                return Err(prompt_error(format!(
                                    "unterminated variable `{{{}`",
                                    name
                                )))
                            }
                        }
                    }
                    let value = vars
                        .get(name.trim())
                        .ok_or_else(|| prompt_error(format!("unknown variable `{}`", name)))?;
                    out.push_str(value);
                }
                '}' => return Err(prompt_error("unmatched `}`".to_string())),
                other => out.push(other),
            }
        }
        Ok(out)
    }
}

fn prompt_error(message: String) -> OpenApiLlmError {
    OpenApiLlmError::Prompt { message }
}

/// Double every brace so the text renders back to itself.
pub fn escape_braces(text: &str) -> String {
    text.replace('{', "{{").replace('}', "}}")
}

/// The system instruction for one operation as a template with no variables.
///
/// The slice is escaped, so any further templating layer sees only literal text.
pub fn system_template(slice: &OperationSlice) -> Result<PromptTemplate> {
    let spec = serde_json::to_string_pretty(&slice.to_value())?;
    Ok(PromptTemplate::new(format!(
        "{}\n\nOpenAPI specification:\n{}",
        SYSTEM_INSTRUCTIONS,
        escape_braces(&spec)
    )))
}

/// Render the system instruction for one operation.
pub fn build_system_prompt(slice: &OperationSlice) -> Result<String> {
    system_template(slice)?.render(&HashMap::new())
}
