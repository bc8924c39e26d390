//! OpenAI-compatible assistant generator.
//!
//! Speaks the `/chat/completions` wire format directly: prior messages
//! map onto `user`/`assistant` roles, the new prompt is appended as the
//! final user turn, and the first choice's content is the reply. One
//! configurable endpoint serves any OpenAI-compatible backend.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use confab_core::generation::ResponseGenerator;
use confab_types::chat::{ChatMessage, Sender};
use confab_types::error::GenerationError;

use super::error_message;
use crate::config::AssistantConfig;

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct CompletionsRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
}

#[derive(Deserialize)]
struct CompletionsResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: String,
}

/// reqwest-backed implementation of [`ResponseGenerator`].
///
/// Does not derive Debug: the API key must never reach Debug output or
/// logs, and omitting Debug entirely is cheaper than auditing it.
pub struct OpenAiCompatGenerator {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<SecretString>,
}

impl OpenAiCompatGenerator {
    pub fn new(config: &AssistantConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .expect("failed to create reqwest client");
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
        }
    }
}

fn role_for(sender: Sender) -> &'static str {
    match sender {
        Sender::User => "user",
        Sender::Assistant => "assistant",
    }
}

impl ResponseGenerator for OpenAiCompatGenerator {
    async fn generate(
        &self,
        text: &str,
        prior: &[ChatMessage],
    ) -> Result<String, GenerationError> {
        let Some(api_key) = &self.api_key else {
            return Err(GenerationError::MissingCredential);
        };

        let mut messages: Vec<WireMessage<'_>> = prior
            .iter()
            .map(|message| WireMessage {
                role: role_for(message.sender),
                content: &message.text,
            })
            .collect();
        messages.push(WireMessage {
            role: "user",
            content: text,
        });

        let url = format!("{}/chat/completions", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key.expose_secret())
            .json(&CompletionsRequest {
                model: &self.model,
                messages,
            })
            .send()
            .await
            .map_err(|err| GenerationError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GenerationError::Status {
                code: status.as_u16(),
                message: error_message(response).await,
            });
        }

        let body: CompletionsResponse = response
            .json()
            .await
            .map_err(|err| GenerationError::Transport(err.to_string()))?;
        let reply = body
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .unwrap_or_default();
        if reply.trim().is_empty() {
            return Err(GenerationError::EmptyCompletion);
        }
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn generator_for(base_url: &str, api_key: Option<&str>) -> OpenAiCompatGenerator {
        let config = AssistantConfig {
            base_url: base_url.to_string(),
            model: "test-model".to_string(),
            api_key: api_key.map(SecretString::from),
            request_timeout_secs: 5,
        };
        OpenAiCompatGenerator::new(&config)
    }

    #[tokio::test]
    async fn generate_maps_prior_conversation_onto_wire_roles() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_json(serde_json::json!({
                "model": "test-model",
                "messages": [
                    {"role": "user", "content": "earlier question"},
                    {"role": "assistant", "content": "earlier answer"},
                    {"role": "user", "content": "new question"}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content": "the reply"}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let generator = generator_for(&server.uri(), Some("sk-test"));
        let prior = vec![
            ChatMessage::user("earlier question"),
            ChatMessage::assistant("earlier answer"),
        ];

        let reply = generator.generate("new question", &prior).await.unwrap();
        assert_eq!(reply, "the reply");
    }

    #[tokio::test]
    async fn generate_without_key_fails_before_any_request() {
        let server = MockServer::start().await;
        let generator = generator_for(&server.uri(), None);

        let err = generator.generate("hi", &[]).await.unwrap_err();
        assert!(matches!(err, GenerationError::MissingCredential));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn generate_rejects_empty_completion() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": []
            })))
            .mount(&server)
            .await;

        let generator = generator_for(&server.uri(), Some("sk-test"));
        let err = generator.generate("hi", &[]).await.unwrap_err();
        assert!(matches!(err, GenerationError::EmptyCompletion));
    }

    #[tokio::test]
    async fn generate_surfaces_provider_error_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
                "error": "rate limited"
            })))
            .mount(&server)
            .await;

        let generator = generator_for(&server.uri(), Some("sk-test"));
        let err = generator.generate("hi", &[]).await.unwrap_err();
        match err {
            GenerationError::Status { code, message } => {
                assert_eq!(code, 429);
                assert_eq!(message, "rate limited");
            }
            other => panic!("expected Status error, got {other:?}"),
        }
    }
}
