use commentgen::action::{ActionRequest, FAILURE_MESSAGE, SUCCESS_MESSAGE, handle_generate_action};
use commentgen::config::{ConfigBuilder, StaticConfigStore};
use commentgen::content::{Content, ContentId, InMemoryContentLookup};
use commentgen::orchestrator::CommentOrchestrator;
use commentgen::permission::{SessionTokenGate, Viewer};
use commentgen::transport::HttpTransport;
use httpmock::prelude::*;
use serde_json::json;

struct Fixture {
    orchestrator: CommentOrchestrator,
    viewer: Viewer,
    token: String,
}

fn fixture(server: &MockServer) -> Fixture {
    let viewer = Viewer::logged_in("session-42");
    let gate = SessionTokenGate::new();
    let token = gate.issue(&viewer).unwrap();

    let config = ConfigBuilder::default()
        .suggestion_api_key("seo-key")
        .completion_api_key("openai-key")
        .suggestion_endpoint(server.url("/es/resellerapi/termsuggestion"))
        .completion_endpoint(server.url("/v1/engines/davinci/completions"))
        .suggestion_count(2usize)
        .output_prefix("A comment in a blog post that writes about ")
        .build()
        .unwrap();

    let lookup = InMemoryContentLookup::new().with(Content {
        id: ContentId(7),
        title: "Brewing coffee at home".to_string(),
        permalink: "https://blog.example/coffee".to_string(),
    });

    Fixture {
        orchestrator: CommentOrchestrator::new(
            StaticConfigStore::new(config),
            lookup,
            gate,
            HttpTransport::new(),
        ),
        viewer,
        token,
    }
}

#[tokio::test]
async fn generates_comment_end_to_end() {
    let server = MockServer::start_async().await;
    let suggestions = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/es/resellerapi/termsuggestion")
                .query_param("apikey", "seo-key")
                .query_param("keyword", "Brewing coffee at home")
                .query_param("searchengine", "google.com")
                .query_param("url", "https://blog.example/coffee");
            then.status(200).json_body(json!({
                "termsuggestions": {
                    "ok": ["french press", "grind size", "water temperature"],
                    "more": ["espresso"]
                }
            }));
        })
        .await;
    let completions = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/engines/davinci/completions")
                .header("Authorization", "Bearer openai-key")
                .json_body_partial(
                    r#"{"prompt":"A comment in a blog post that writes about french press, grind size","max_tokens":150}"#,
                );
            then.status(200).json_body(json!({
                "id": "cmpl-9",
                "object": "text_completion",
                "choices": [
                    {"text": " Great tips on grind size!", "index": 0, "finish_reason": "stop"}
                ]
            }));
        })
        .await;

    let fixture = fixture(&server);
    let response = handle_generate_action(
        &fixture.orchestrator,
        &fixture.viewer,
        ActionRequest {
            post_id: "7".to_string(),
            security: fixture.token.clone(),
        },
        None,
    )
    .await;

    suggestions.assert_async().await;
    completions.assert_async().await;
    assert!(response.ok);
    assert_eq!(response.message, SUCCESS_MESSAGE);
    assert_eq!(response.comment.as_deref(), Some(" Great tips on grind size!"));
    assert_eq!(response.choices.unwrap().len(), 1);
}

#[tokio::test]
async fn empty_suggestions_never_reach_completion_service() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET);
            then.status(200)
                .json_body(json!({ "termsuggestions": { "ok": [], "more": [] } }));
        })
        .await;
    let completions = server
        .mock_async(|when, then| {
            when.method(POST);
            then.status(200).json_body(json!({ "choices": [{ "text": "unused" }] }));
        })
        .await;

    let fixture = fixture(&server);
    let response = handle_generate_action(
        &fixture.orchestrator,
        &fixture.viewer,
        ActionRequest {
            post_id: "7".to_string(),
            security: fixture.token.clone(),
        },
        None,
    )
    .await;

    assert!(!response.ok);
    assert_eq!(response.message, FAILURE_MESSAGE);
    assert_eq!(completions.hits_async().await, 0);
}

#[tokio::test]
async fn completion_failure_is_opaque() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET);
            then.status(200)
                .json_body(json!({ "termsuggestions": { "ok": ["latte art"] } }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST);
            then.status(429)
                .json_body(json!({ "error": { "message": "Rate limit reached" } }));
        })
        .await;

    let fixture = fixture(&server);
    let response = handle_generate_action(
        &fixture.orchestrator,
        &fixture.viewer,
        ActionRequest {
            post_id: "7".to_string(),
            security: fixture.token.clone(),
        },
        None,
    )
    .await;

    assert!(!response.ok);
    assert_eq!(response.message, FAILURE_MESSAGE);
    assert!(response.comment.is_none());
    assert!(response.choices.is_none());
}
