use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use openapi_llm::{blank, normalize, OpenApiDocument, OpenApiLlm, RetryConfig, ScriptedModel};
use serde_json::json;
use std::sync::Arc;
use tokio::runtime::Runtime;

fn document() -> OpenApiDocument {
    OpenApiDocument::from_value(json!({
        "openapi": "3.1.0",
        "info": {"title": "Bench", "version": "1"},
        "paths": {"/orders/{id}": {"get": {"responses": {"200": {"content": {"application/json": {
            "schema": {"$ref": "#/components/schemas/Order"}
        }}}}}}},
        "components": {"schemas": {
            "Order": {"type": "object", "properties": {
                "id": {"type": "string"},
                "total": {"type": "number"},
                "paid": {"type": "boolean"},
                "customer": {"$ref": "#/components/schemas/Customer"},
                "lines": {"type": "array", "items": {"$ref": "#/components/schemas/Line"}}
            }},
            "Customer": {"type": "object", "properties": {
                "name": {"type": "string"},
                "email": {"type": "string"}
            }},
            "Line": {"type": "object", "properties": {
                "sku": {"type": "string"},
                "qty": {"type": "integer"}
            }}
        }}
    }))
    .unwrap()
}

const REPLY: &str = "```json\n{\"id\": \"o-1\", \"total\": 12.5, \"customer\": {\"name\": \"Ada\"}, \"lines\": [{\"sku\": \"a\", \"qty\": 2}]}\n```";

fn bench_pipeline(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();

    c.bench_function("normalize_fenced", |b| b.iter(|| normalize(REPLY)));

    let schema = document().as_value()["components"]["schemas"]["Order"].clone();
    c.bench_function("blank_order", |b| b.iter(|| blank(&schema)));

    // Single successful attempt
    c.bench_function("call_operation_first_try", |b| {
        b.to_async(&rt).iter_batched(
            || {
                OpenApiLlm::builder(document())
                    .provider(Arc::new(ScriptedModel::always(REPLY)))
                    .build()
                    .unwrap()
            },
            |llm| async move {
                llm.call_operation("/orders/{id}", "get", json!({"id": "o-1"}))
                    .await
                    .unwrap();
            },
            BatchSize::SmallInput,
        )
    });

    // Three bad replies, then success
    c.bench_function("call_operation_after_retries", |b| {
        b.to_async(&rt).iter_batched(
            || {
                let model = ScriptedModel::new()
                    .with_reply("not json")
                    .with_reply("{\"total\": \"twelve\"}")
                    .with_failure("overloaded")
                    .with_reply(REPLY);
                OpenApiLlm::builder(document())
                    .provider(Arc::new(model))
                    .retry(RetryConfig::immediate(3))
                    .build()
                    .unwrap()
            },
            |llm| async move {
                llm.call_operation("/orders/{id}", "get", json!({"id": "o-1"}))
                    .await
                    .unwrap();
            },
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(benches, bench_pipeline);
criterion_main!(benches);
