use formchat_core::agent::CompletionAgent;
use formchat_core::config::LlmConfig;
use formchat_core::session::ChatMessage;
use formchat_interaction::OpenAIApiAgent;
use httpmock::prelude::*;
use serde_json::json;

fn agent_for(server: &MockServer) -> OpenAIApiAgent {
    let config = LlmConfig {
        model: "gpt-test".to_string(),
        base_url: server.url("/v1"),
        timeout_secs: 5,
        max_tokens: Some(256),
    };
    OpenAIApiAgent::from_config("sk-test", &config).unwrap()
}

#[tokio::test]
async fn complete_sends_history_and_returns_first_choice() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/chat/completions")
                .header("Authorization", "Bearer sk-test")
                .json_body(json!({
                    "model": "gpt-test",
                    "messages": [
                        {"role": "system", "content": "Collect the fields."},
                        {"role": "user", "content": "I'm John"}
                    ],
                    "max_tokens": 256
                }));
            then.status(200).json_body(json!({
                "choices": [
                    {"message": {"role": "assistant", "content": "SET FirstName John\nSAY Thanks"}}
                ]
            }));
        })
        .await;

    let agent = agent_for(&server);
    let reply = agent
        .complete(&[
            ChatMessage::system("Collect the fields."),
            ChatMessage::user("I'm John"),
        ])
        .await
        .unwrap();

    assert_eq!(reply, "SET FirstName John\nSAY Thanks");
    mock.assert_async().await;
}

#[tokio::test]
async fn server_error_is_retryable_collaborator_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/chat/completions");
            then.status(503)
                .json_body(json!({"error": {"message": "overloaded"}}));
        })
        .await;

    let err = agent_for(&server)
        .complete(&[ChatMessage::user("hi")])
        .await
        .unwrap_err();

    assert!(err.is_collaborator());
    assert!(err.is_retryable());
    assert!(err.to_string().contains("overloaded"));
}

#[tokio::test]
async fn empty_choices_is_collaborator_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/chat/completions");
            then.status(200).json_body(json!({"choices": []}));
        })
        .await;

    let err = agent_for(&server)
        .complete(&[ChatMessage::user("hi")])
        .await
        .unwrap_err();

    assert!(err.is_collaborator());
    assert!(!err.is_retryable());
}
