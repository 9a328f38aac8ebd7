use std::sync::Arc;

use openapi_llm::{OpenApiDocument, OpenApiLlm, RequestPayload, RetryConfig, ScriptedModel};
use serde_json::json;

// Runs offline against a scripted model so the hook and retry flow is visible
// with RUST_LOG=openapi_llm=debug.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let document = OpenApiDocument::from_yaml_str(include_str!("hello_world.yaml"))?;

    let model = Arc::new(
        ScriptedModel::new()
            .with_reply("Sure! Here you go: {\"text\": ")
            .with_reply("```json\n{\"text\": \"hola paul\"}\n```"),
    );

    let llm = OpenApiLlm::builder(document)
        .provider(model.clone())
        .retry(RetryConfig::immediate(3))
        .build()?;

    // Default the language before the prompt is built.
    llm.set_pre_prompt_hook(|payload: RequestPayload| {
        let mut value = payload.into_json()?;
        if let Some(obj) = value.as_object_mut() {
            obj.entry("language").or_insert(json!("es"));
        }
        Ok(RequestPayload::Json(value))
    });

    // Capitalize the model text before it is validated.
    llm.set_post_response_hook(|text: String| Ok(text.replace("hola paul", "Hola Paul")));

    let greeting = llm
        .call_operation("/hello-world", "post", json!({"text": "Paul"}))
        .await?;

    println!("{}", serde_json::to_string_pretty(&greeting)?);
    println!("model calls: {}", model.calls());
    for call in model.recorded() {
        println!("user turn: {}", call.user);
    }
    Ok(())
}
