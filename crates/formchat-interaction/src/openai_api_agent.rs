//! OpenAIApiAgent - Chat Completions REST client.
//!
//! Works against any OpenAI-compatible endpoint. The API key comes from
//! `OPENAI_API_KEY`; model, base URL and timeout come from `[llm]` in
//! `formchat.toml`.

use async_trait::async_trait;
use formchat_core::agent::CompletionAgent;
use formchat_core::config::LlmConfig;
use formchat_core::error::{FormChatError, Result};
use formchat_core::session::ChatMessage;
use reqwest::{Client, StatusCode, header::HeaderValue};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;
use tracing::{debug, warn};

/// Environment variable holding the API key.
pub const API_KEY_ENV_VAR: &str = "OPENAI_API_KEY";

/// Agent implementation that talks to the OpenAI HTTP API.
#[derive(Clone)]
pub struct OpenAIApiAgent {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    max_tokens: Option<u32>,
}

impl OpenAIApiAgent {
    /// Creates an agent for the public OpenAI endpoint.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        let defaults = LlmConfig::default();
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            model: model.into(),
            base_url: defaults.base_url,
            max_tokens: defaults.max_tokens,
        }
    }

    /// Builds an agent from `[llm]` settings and an explicit key.
    pub fn from_config(api_key: impl Into<String>, config: &LlmConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| FormChatError::config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            model: config.model.clone(),
            base_url: config.base_url.clone(),
            max_tokens: config.max_tokens,
        })
    }

    /// Builds an agent from `[llm]` settings, reading the key from `OPENAI_API_KEY`.
    pub fn try_from_env(config: &LlmConfig) -> Result<Self> {
        let api_key = env::var(API_KEY_ENV_VAR)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                FormChatError::config(format!("{API_KEY_ENV_VAR} environment variable is required"))
            })?;
        Self::from_config(api_key, config)
    }

    /// Overrides the endpoint base, e.g. `http://localhost:11434/v1`.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    async fn send_request(&self, body: &ChatCompletionRequest<'_>) -> Result<String> {
        let response = self
            .client
            .post(self.endpoint())
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("content-type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|err| FormChatError::Collaborator {
                status_code: None,
                message: format!("OpenAI API request failed: {err}"),
                is_retryable: err.is_connect() || err.is_timeout(),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let retry_after = parse_retry_after(response.headers().get("retry-after"));
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read OpenAI error body".to_string());
            return Err(map_http_error(status, body_text, retry_after));
        }

        let parsed: ChatCompletionResponse = response.json().await.map_err(|err| {
            FormChatError::collaborator(format!("Failed to parse OpenAI response: {err}"))
        })?;

        extract_text_response(parsed)
    }
}

#[async_trait]
impl CompletionAgent for OpenAIApiAgent {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages: messages
                .iter()
                .map(|m| RequestMessage {
                    role: m.role.as_str(),
                    content: &m.content,
                })
                .collect(),
            max_tokens: self.max_tokens,
        };

        debug!(model = %self.model, messages = messages.len(), "Requesting chat completion");
        self.send_request(&request).await
    }

    fn name(&self) -> &str {
        "openai"
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: String,
    messages: Vec<RequestMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Serialize)]
struct RequestMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

fn extract_text_response(response: ChatCompletionResponse) -> Result<String> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| FormChatError::collaborator("OpenAI API returned no content in the response"))
}

fn map_http_error(status: StatusCode, body: String, retry_after: Option<Duration>) -> FormChatError {
    let mut message = serde_json::from_str::<ErrorResponse>(&body)
        .map(|wrapper| wrapper.error.message)
        .unwrap_or(body);

    let is_retryable = matches!(
        status,
        StatusCode::TOO_MANY_REQUESTS
            | StatusCode::INTERNAL_SERVER_ERROR
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
    );

    if let Some(delay) = retry_after {
        warn!(status = status.as_u16(), retry_after_secs = delay.as_secs(), "OpenAI API asked to retry later");
        message = format!("{message} (retry after {}s)", delay.as_secs());
    }

    FormChatError::Collaborator {
        status_code: Some(status.as_u16()),
        message,
        is_retryable,
    }
}

fn parse_retry_after(header: Option<&HeaderValue>) -> Option<Duration> {
    let value = header?.to_str().ok()?;
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_base_url() {
        let agent = OpenAIApiAgent::new("key", "gpt").with_base_url("http://localhost:9999/v1/");
        assert_eq!(agent.endpoint(), "http://localhost:9999/v1/chat/completions");
    }

    #[test]
    fn test_map_http_error_extracts_message() {
        let err = map_http_error(
            StatusCode::TOO_MANY_REQUESTS,
            r#"{"error":{"message":"Rate limit reached","type":"requests"}}"#.to_string(),
            Some(Duration::from_secs(7)),
        );
        match err {
            FormChatError::Collaborator {
                status_code,
                message,
                is_retryable,
            } => {
                assert_eq!(status_code, Some(429));
                assert_eq!(message, "Rate limit reached (retry after 7s)");
                assert!(is_retryable);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_map_http_error_raw_body() {
        let err = map_http_error(StatusCode::UNAUTHORIZED, "nope".to_string(), None);
        assert!(err.is_collaborator());
        assert!(!err.is_retryable());
        assert!(err.to_string().contains("nope"));
    }

    #[test]
    fn test_parse_retry_after() {
        let header = HeaderValue::from_static("12");
        assert_eq!(parse_retry_after(Some(&header)), Some(Duration::from_secs(12)));
        let date = HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT");
        assert_eq!(parse_retry_after(Some(&date)), None);
        assert_eq!(parse_retry_after(None), None);
    }

    #[test]
    fn test_extract_text_response_requires_content() {
        let empty = ChatCompletionResponse { choices: vec![] };
        assert!(extract_text_response(empty).is_err());
    }
}
