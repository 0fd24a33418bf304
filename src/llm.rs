//! Client for the hosted language model.
//!
//! Talks to an OpenAI-compatible chat-completions endpoint (Groq by default).
//! One client is built at startup and shared through `AppState`.

use crate::error::AppError;
use async_trait::async_trait;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Sends the conversation and returns the reply text.
    async fn complete(&self, messages: &[ChatMessage], temperature: f32) -> Result<String, AppError>;
}

pub struct GroqClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl GroqClient {
    pub fn new(api_key: String, base_url: String, model: String) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| AppError::LanguageModel(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
        })
    }
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Debug, Deserialize)]
struct ReplyMessage {
    #[serde(default)]
    content: Option<String>,
}

#[async_trait]
impl LanguageModel for GroqClient {
    async fn complete(&self, messages: &[ChatMessage], temperature: f32) -> Result<String, AppError> {
        let request = CompletionRequest {
            model: &self.model,
            messages,
            temperature,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::LanguageModel(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            warn!("🤖 Language model returned {}", status);
            return Err(AppError::LanguageModel(format!(
                "API returned status {}: {}",
                status, error_body
            )));
        }

        let completion: CompletionResponse = response
            .json()
            .await
            .map_err(|e| AppError::LanguageModel(format!("Failed to parse response: {}", e)))?;

        let text = completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| AppError::LanguageModel("No content in model response".to_string()))?;

        info!("🤖 Completion received from {} ({} chars)", self.model, text.len());
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> GroqClient {
        GroqClient::new("groq-key".into(), format!("{}/openai/v1/", server.uri()), "test-model".into())
            .unwrap()
    }

    #[tokio::test]
    async fn test_complete_returns_first_choice() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/openai/v1/chat/completions"))
            .and(header("authorization", "Bearer groq-key"))
            .and(body_partial_json(serde_json::json!({
                "model": "test-model",
                "messages": [{ "role": "user", "content": "hello" }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{ "message": { "role": "assistant", "content": "Sunny all week." } }]
            })))
            .mount(&server)
            .await;

        let reply = client_for(&server)
            .complete(&[ChatMessage::user("hello")], 0.3)
            .await
            .unwrap();
        assert_eq!(reply, "Sunny all week.");
    }

    #[tokio::test]
    async fn test_complete_surfaces_http_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .complete(&[ChatMessage::user("hello")], 0.3)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::LanguageModel(_)));
        assert!(err.to_string().contains("rate limited"));
    }

    #[tokio::test]
    async fn test_complete_rejects_empty_choices() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "choices": [] })))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .complete(&[ChatMessage::system("sys"), ChatMessage::user("hi")], 0.5)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("No content"));
    }
}
