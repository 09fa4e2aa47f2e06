use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub enum Role {
    #[serde(rename = "system")]
    System,
    #[serde(rename = "assistant")]
    Assistant,
    #[serde(rename = "user")]
    User,
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: &str) -> Self {
        Message {
            role,
            content: content.to_string(),
        }
    }
}

/// Body of a `POST /chat/completions` request.
#[derive(Clone, Serialize, Debug, PartialEq)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub temperature: f32,
}

// Only the fields needed to pull out the reply are modeled. Anything
// else the provider sends back is ignored.
#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

// OpenRouter reports some upstream failures as a 200 with an `error`
// object instead of `choices`.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// Everything that can go wrong while asking the model for a reply.
/// None of these are retried, the caller decides how to surface them.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("could not build HTTP client: {0}")]
    Client(reqwest::Error),
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("endpoint returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("endpoint reported an error: {0}")]
    Api(String),
    #[error("malformed completion response: {0}")]
    Malformed(String),
}

/// The seam between prompt assembly and the network. Anything that can
/// turn a `CompletionRequest` into reply text.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, ModelError>;
}

/// Client for an OpenAI compatible chat completion API.
#[derive(Clone, Debug)]
pub struct OpenAiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl OpenAiClient {
    /// A `timeout` of `None` leaves the request unbounded.
    pub fn new(
        base_url: &str,
        api_key: &str,
        timeout: Option<Duration>,
    ) -> Result<Self, ModelError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(ModelError::Client)?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
            api_key: api_key.to_string(),
        })
    }
}

#[async_trait]
impl ChatModel for OpenAiClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, ModelError> {
        completion(&self.client, request, &self.base_url, &self.api_key).await
    }
}

/// Sends a single, non-streaming chat completion and returns the
/// content of the first choice verbatim.
pub async fn completion(
    client: &reqwest::Client,
    request: &CompletionRequest,
    base_url: &str,
    api_key: &str,
) -> Result<String, ModelError> {
    let url = format!("{}/chat/completions", base_url.trim_end_matches("/"));
    let response = client
        .post(url)
        .bearer_auth(api_key)
        .header("Content-Type", "application/json")
        .json(request)
        .send()
        .await?;

    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(ModelError::Status {
            status: status.as_u16(),
            body,
        });
    }

    let parsed: CompletionResponse =
        serde_json::from_str(&body).map_err(|e| ModelError::Malformed(e.to_string()))?;

    if let Some(err) = parsed.error {
        return Err(ModelError::Api(err.message));
    }

    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| {
            ModelError::Malformed("response has no choices[0].message.content".to_string())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    fn request() -> CompletionRequest {
        CompletionRequest {
            model: "test-model".to_string(),
            messages: vec![
                Message::new(Role::System, "be rude"),
                Message::new(Role::User, "Hi"),
            ],
            temperature: 0.8,
        }
    }

    fn client(url: &str) -> OpenAiClient {
        OpenAiClient::new(url, "test-key", None).unwrap()
    }

    #[test]
    fn test_role_serialization() {
        assert_eq!(serde_json::to_string(&Role::System).unwrap(), r#""system""#);
        assert_eq!(
            serde_json::to_string(&Role::Assistant).unwrap(),
            r#""assistant""#
        );
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), r#""user""#);
    }

    #[test]
    fn test_completion_request_serialization() {
        let json = serde_json::to_value(request()).unwrap();
        assert_eq!(
            json,
            json!({
                "model": "test-model",
                "messages": [
                    {"role": "system", "content": "be rude"},
                    {"role": "user", "content": "Hi"}
                ],
                "temperature": 0.8f32
            })
        );
    }

    #[tokio::test]
    async fn test_completion_basic() {
        let mut server = mockito::Server::new_async().await;

        let response_body = r#"{
            "id": "chatcmpl-123",
            "object": "chat.completion",
            "created": 1694268190,
            "model": "test-model",
            "choices": [{
                "index": 0,
                "message": {
                    "role": "assistant",
                    "content": "Hello!"
                },
                "finish_reason": "stop"
            }]
        }"#;

        let mock = server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer test-key")
            .match_body(Matcher::PartialJson(json!({
                "model": "test-model",
                "messages": [
                    {"role": "system", "content": "be rude"},
                    {"role": "user", "content": "Hi"}
                ]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(response_body)
            .create_async()
            .await;

        let result = client(&server.url()).complete(&request()).await;

        mock.assert_async().await;
        assert_eq!(result.unwrap(), "Hello!");
    }

    #[tokio::test]
    async fn test_completion_trailing_slash_base_url() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_body(r#"{"choices":[{"message":{"content":"ok"}}]}"#)
            .create_async()
            .await;

        let url = format!("{}/", server.url());
        let result = client(&url).complete(&request()).await;

        mock.assert_async().await;
        assert_eq!(result.unwrap(), "ok");
    }

    #[tokio::test]
    async fn test_completion_non_success_status() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(401)
            .with_body(r#"{"error":{"message":"No auth credentials found"}}"#)
            .create_async()
            .await;

        let err = client(&server.url())
            .complete(&request())
            .await
            .unwrap_err();

        match &err {
            ModelError::Status { status, body } => {
                assert_eq!(*status, 401);
                assert!(body.contains("No auth credentials found"));
            }
            other => panic!("Expected Status error, got {:?}", other),
        }
        assert!(err.to_string().starts_with("endpoint returned 401"));
    }

    #[tokio::test]
    async fn test_completion_error_body_with_ok_status() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_body(r#"{"error":{"message":"Provider returned error","code":429}}"#)
            .create_async()
            .await;

        let err = client(&server.url())
            .complete(&request())
            .await
            .unwrap_err();

        assert!(matches!(err, ModelError::Api(ref m) if m == "Provider returned error"));
    }

    #[tokio::test]
    async fn test_completion_malformed_json() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_body("<html>not json</html>")
            .create_async()
            .await;

        let err = client(&server.url())
            .complete(&request())
            .await
            .unwrap_err();

        assert!(matches!(err, ModelError::Malformed(_)));
    }

    #[tokio::test]
    async fn test_completion_missing_content() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_body(r#"{"choices":[{"message":{"role":"assistant","content":null}}],"usage":{"total_tokens":12345}}"#)
            .create_async()
            .await;

        let err = client(&server.url())
            .complete(&request())
            .await
            .unwrap_err();

        assert!(matches!(err, ModelError::Malformed(_)));
        // The error ends up in history, so the raw body must not
        let text = err.to_string();
        assert!(text.contains("choices[0].message.content"));
        assert!(!text.contains("total_tokens"));
    }

    #[tokio::test]
    async fn test_completion_unreachable_endpoint() {
        // Nothing listens on port 9 (discard) on a test machine
        let err = client("http://127.0.0.1:9")
            .complete(&request())
            .await
            .unwrap_err();

        assert!(matches!(err, ModelError::Transport(_)));
        assert!(err.to_string().starts_with("request failed:"));
    }
}
