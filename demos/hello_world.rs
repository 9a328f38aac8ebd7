use openapi_llm::{ClientConfig, OpenApiDocument, OpenApiLlm};
use serde_json::json;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let document = OpenApiDocument::from_yaml_str(include_str!("hello_world.yaml"))?;

    // Any supported family works: gpt-*, gemini-*, mistral-*, claude-*
    let model = std::env::args().nth(1).unwrap_or_else(|| "gpt-4o-mini".to_string());
    let llm = OpenApiLlm::new(document, ClientConfig::from_env(model)?)?;

    let greeting = llm
        .call_operation(
            "/hello-world",
            "post",
            json!({"text": "Paul", "language": "es"}),
        )
        .await?;

    println!("{}", serde_json::to_string_pretty(&greeting)?);
    Ok(())
}
