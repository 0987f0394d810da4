//! Chat-completion client for the hosted answer model.
//!
//! Speaks the OpenAI-compatible `POST /chat/completions` shape, so the
//! configured base URL can point at any compatible host. Temperature is
//! pinned to zero and is deliberately not configurable: for a fixed model,
//! prompt, and document set, repeated questions must produce the same
//! answer. Each completion is a single attempt.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::config::ModelConfig;

const TEMPERATURE: f32 = 0.0;

const SYSTEM_MESSAGE: &str = "You answer questions about controlled SOP documents. \
Follow the instructions in the user message exactly.";

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("chat request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("chat API error {status}: {body}")]
    Api { status: u16, body: String },
    #[error("chat response contained no choices")]
    EmptyResponse,
}

#[derive(Debug)]
pub struct ChatClient {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
    model: String,
    max_tokens: u32,
}

impl ChatClient {
    pub fn new(config: &ModelConfig) -> anyhow::Result<Self> {
        let api_key = std::env::var(&config.api_key_env).map_err(|_| {
            anyhow::anyhow!("{} environment variable not set", config.api_key_env)
        })?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_key,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
        })
    }

    pub fn model_name(&self) -> &str {
        &self.model
    }

    /// Request one completion for the assembled prompt.
    pub async fn complete(&self, prompt: &str) -> Result<String, ChatError> {
        let body = ChatRequest {
            model: &self.model,
            temperature: TEMPERATURE,
            max_tokens: self.max_tokens,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_MESSAGE,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.api_base))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(ChatError::Api {
                status: status.as_u16(),
                body: body_text,
            });
        }

        let parsed: ChatResponse = response.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or(ChatError::EmptyResponse)
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    max_tokens: u32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn model_config(api_base: &str, key_env: &str) -> ModelConfig {
        ModelConfig {
            api_base: api_base.to_string(),
            api_key_env: key_env.to_string(),
            model: "test-model".to_string(),
            max_tokens: 256,
            timeout_secs: 5,
        }
    }

    #[tokio::test]
    async fn completes_with_zero_temperature() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/chat/completions")
                    .header("Authorization", "Bearer sk-chat")
                    .json_body_partial(r#"{ "model": "test-model", "temperature": 0.0 }"#);
                then.status(200).json_body(serde_json::json!({
                    "choices": [
                        { "message": { "role": "assistant", "content": "SOURCE_TYPE: CONTENT\nDon gloves first." } }
                    ]
                }));
            })
            .await;

        std::env::set_var("SOPA_CHAT_TEST_KEY", "sk-chat");
        let client = ChatClient::new(&model_config(&server.base_url(), "SOPA_CHAT_TEST_KEY")).unwrap();
        let reply = client.complete("What comes first?").await.unwrap();

        mock.assert_async().await;
        assert!(reply.contains("Don gloves first."));
    }

    #[tokio::test]
    async fn api_errors_are_terminal() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/chat/completions");
                then.status(503).body("overloaded");
            })
            .await;

        std::env::set_var("SOPA_CHAT_503_KEY", "sk-chat");
        let client = ChatClient::new(&model_config(&server.base_url(), "SOPA_CHAT_503_KEY")).unwrap();
        let err = client.complete("anything").await.unwrap_err();

        assert!(matches!(err, ChatError::Api { status: 503, .. }));
        mock.assert_hits_async(1).await;
    }

    #[tokio::test]
    async fn empty_choices_is_an_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/chat/completions");
                then.status(200)
                    .json_body(serde_json::json!({ "choices": [] }));
            })
            .await;

        std::env::set_var("SOPA_CHAT_EMPTY_KEY", "sk-chat");
        let client = ChatClient::new(&model_config(&server.base_url(), "SOPA_CHAT_EMPTY_KEY")).unwrap();
        let err = client.complete("anything").await.unwrap_err();
        assert!(matches!(err, ChatError::EmptyResponse));
    }

    #[test]
    fn missing_key_env_fails_construction() {
        std::env::remove_var("SOPA_CHAT_MISSING_KEY");
        let err = ChatClient::new(&model_config("http://localhost:9", "SOPA_CHAT_MISSING_KEY"))
            .unwrap_err();
        assert!(err.to_string().contains("SOPA_CHAT_MISSING_KEY"));
    }
}
