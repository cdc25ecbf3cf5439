//! Chat-completions provider tests against a mock HTTP server.

use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use docent::error::DocentError;
use docent::provider::{
    AzureOpenAiProvider, ModelProvider, OpenAiProvider, ProviderRequest, ToolDefinition,
};
use docent::types::*;

fn request(max_tokens: u32) -> ProviderRequest {
    ProviderRequest {
        messages: vec![ModelMessage::system("Be brief."), ModelMessage::user("hours?")],
        settings: GenerationSettings::builder()
            .max_tokens(max_tokens)
            .temperature(0.0)
            .tool_choice(ToolChoice::Auto)
            .build(),
        tools: Some(vec![ToolDefinition {
            name: "search".into(),
            description: "Search".into(),
            parameters: json!({
                "type": "object",
                "properties": { "query": { "type": "string" } },
                "required": ["query"]
            }),
        }]),
    }
}

fn completion(message: serde_json::Value, finish_reason: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-1",
        "choices": [{ "index": 0, "message": message, "finish_reason": finish_reason }],
        "usage": { "prompt_tokens": 12, "completion_tokens": 7, "total_tokens": 19 }
    })
}

#[tokio::test]
async fn openai_parses_text_answer() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({
            "model": "gpt-4o",
            "max_tokens": 600,
            "tool_choice": "auto",
            "messages": [
                { "role": "system", "content": "Be brief." },
                { "role": "user", "content": "hours?" }
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(
            json!({ "role": "assistant", "content": "9 to 5." }),
            "stop",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let provider = OpenAiProvider::new("gpt-4o", "sk-test", Some(server.uri()));
    let response = provider.generate_text(&request(600)).await.unwrap();

    assert_eq!(response.text, "9 to 5.");
    assert!(response.tool_calls.is_empty());
    assert_eq!(response.finish_reason, Some(FinishReason::Stop));
    assert_eq!(response.usage.total_tokens, 19);
}

#[tokio::test]
async fn openai_parses_tool_calls() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(
            json!({
                "role": "assistant",
                "content": null,
                "tool_calls": [
                    {
                        "id": "call_1",
                        "type": "function",
                        "function": { "name": "search", "arguments": "{\"query\":\"hours\"}" }
                    },
                    {
                        "id": "call_2",
                        "type": "function",
                        "function": { "name": "search", "arguments": "{not json" }
                    }
                ]
            }),
            "tool_calls",
        )))
        .mount(&server)
        .await;

    let provider = OpenAiProvider::new("gpt-4o", "sk-test", Some(server.uri()));
    let response = provider.generate_text(&request(600)).await.unwrap();

    assert_eq!(response.text, "");
    assert_eq!(response.finish_reason, Some(FinishReason::ToolCalls));
    assert_eq!(response.tool_calls.len(), 2);
    assert_eq!(response.tool_calls[0].id, "call_1");
    assert_eq!(response.tool_calls[0].arguments, json!({ "query": "hours" }));
    assert_eq!(response.tool_calls[1].arguments, json!("{not json"));
}

#[tokio::test]
async fn openai_reports_content_filter() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(
            json!({ "role": "assistant", "content": null }),
            "content_filter",
        )))
        .mount(&server)
        .await;

    let provider = OpenAiProvider::new("gpt-4o", "sk-test", Some(server.uri()));
    let response = provider.generate_text(&request(300)).await.unwrap();

    assert!(response.is_content_filtered());
}

#[tokio::test]
async fn openai_maps_error_statuses() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("authorization", "Bearer bad"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid key"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(header("authorization", "Bearer busy"))
        .respond_with(
            ResponseTemplate::new(429).set_body_json(json!({ "error": { "retry_after": 2 } })),
        )
        .mount(&server)
        .await;

    let bad = OpenAiProvider::new("gpt-4o", "bad", Some(server.uri()));
    let err = bad.generate_text(&request(600)).await.unwrap_err();
    assert!(matches!(err, DocentError::Authentication(_)));
    assert!(!err.is_retryable());

    let busy = OpenAiProvider::new("gpt-4o", "busy", Some(server.uri()));
    let err = busy.generate_text(&request(600)).await.unwrap_err();
    assert!(matches!(
        err,
        DocentError::RateLimited {
            retry_after_ms: Some(2000)
        }
    ));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn openai_rejects_empty_choices() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
        .mount(&server)
        .await;

    let provider = OpenAiProvider::new("gpt-4o", "sk-test", Some(server.uri()));
    let err = provider.generate_text(&request(600)).await.unwrap_err();
    assert!(matches!(err, DocentError::Api { status: 200, .. }));
}

#[tokio::test]
async fn azure_posts_to_deployment() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/openai/deployments/chat-gpt/chat/completions"))
        .and(query_param("api-version", "2024-06-01"))
        .and(header("api-key", "azure-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(
            json!({ "role": "assistant", "content": "Xin chào" }),
            "stop",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let provider = AzureOpenAiProvider::new(&server.uri(), "chat-gpt", "azure-key", "2024-06-01");
    assert_eq!(provider.provider_name(), "azure-openai");
    assert_eq!(provider.model_id(), "chat-gpt");

    let response = provider.generate_text(&request(600)).await.unwrap();
    assert_eq!(response.text, "Xin chào");

    let received = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&received[0].body).unwrap();
    assert!(body.get("model").is_none());
    assert_eq!(body["temperature"], 0.0);
}
