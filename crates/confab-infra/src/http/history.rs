//! HTTP client for the chat-history resource.
//!
//! Two operations, both whole-collection: `GET /chats/history/{user_id}`
//! and `PUT /chats/history`, each carrying the `{"chatHistory": [...]}`
//! envelope with a bearer `Authorization` header. There is no partial
//! update; the PUT replaces the stored history and is idempotent.

use std::time::Duration;

use reqwest::header::AUTHORIZATION;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use confab_core::history::HistoryClient;
use confab_types::chat::{ChatSession, SessionCollection};
use confab_types::error::HistoryError;
use confab_types::identity::Identity;

use super::error_message;
use crate::config::ApiConfig;
use crate::token::BearerCell;

#[derive(Serialize)]
struct ReplaceBody<'a> {
    #[serde(rename = "chatHistory")]
    chat_history: &'a [ChatSession],
}

#[derive(Deserialize)]
struct FetchBody {
    #[serde(rename = "chatHistory", default)]
    chat_history: Vec<ChatSession>,
}

/// reqwest-backed implementation of [`HistoryClient`].
///
/// The fetch path is keyed by the identity observed at call time; the
/// credential comes from the shared token cell. A call without both fails
/// with [`HistoryError::Unauthenticated`] before any request is made.
pub struct HttpHistoryClient {
    client: reqwest::Client,
    base_url: String,
    identity: watch::Receiver<Identity>,
    tokens: BearerCell,
}

impl HttpHistoryClient {
    pub fn new(
        config: &ApiConfig,
        identity: watch::Receiver<Identity>,
        tokens: BearerCell,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .expect("failed to create reqwest client");
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            identity,
            tokens,
        }
    }

    /// Current identity key and Authorization header value.
    fn credentials(&self) -> Result<(String, String), HistoryError> {
        let user_id = match &*self.identity.borrow() {
            Identity::Authenticated { user_id } => user_id.clone(),
            Identity::Guest => return Err(HistoryError::Unauthenticated),
        };
        let auth = self
            .tokens
            .bearer_header()
            .ok_or(HistoryError::Unauthenticated)?;
        Ok((user_id, auth))
    }
}

impl HistoryClient for HttpHistoryClient {
    async fn fetch_all(&self) -> Result<SessionCollection, HistoryError> {
        let (user_id, auth) = self.credentials()?;
        let url = format!("{}/chats/history/{user_id}", self.base_url);

        let response = self
            .client
            .get(&url)
            .header(AUTHORIZATION, auth)
            .send()
            .await
            .map_err(|err| HistoryError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(HistoryError::Status {
                code: status.as_u16(),
                message: error_message(response).await,
            });
        }

        let body: FetchBody = response
            .json()
            .await
            .map_err(|err| HistoryError::Decode(err.to_string()))?;
        Ok(SessionCollection::with_sessions(body.chat_history))
    }

    async fn replace_all(&self, collection: &SessionCollection) -> Result<(), HistoryError> {
        let (_, auth) = self.credentials()?;
        let url = format!("{}/chats/history", self.base_url);

        let response = self
            .client
            .put(&url)
            .header(AUTHORIZATION, auth)
            .json(&ReplaceBody {
                chat_history: collection.sessions(),
            })
            .send()
            .await
            .map_err(|err| HistoryError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(HistoryError::Status {
                code: status.as_u16(),
                message: error_message(response).await,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use secrecy::SecretString;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use confab_types::chat::ChatMessage;

    fn authed_client(base_url: &str) -> HttpHistoryClient {
        let tokens = BearerCell::new();
        tokens.set(SecretString::from("tok-1"));
        // The receiver keeps serving the last value after the sender drops.
        let (_tx, rx) = watch::channel(Identity::Authenticated {
            user_id: "u-1".to_string(),
        });
        let config = ApiConfig {
            base_url: base_url.to_string(),
            request_timeout_secs: 5,
        };
        HttpHistoryClient::new(&config, rx, tokens)
    }

    fn guest_client(base_url: &str) -> HttpHistoryClient {
        let (_tx, rx) = watch::channel(Identity::Guest);
        let config = ApiConfig {
            base_url: base_url.to_string(),
            request_timeout_secs: 5,
        };
        HttpHistoryClient::new(&config, rx, BearerCell::new())
    }

    fn sample_sessions() -> Vec<ChatSession> {
        let mut pinned = ChatSession::new("1700000000001", "pinned chat");
        pinned.pinned = true;
        pinned.messages = vec![
            ChatMessage::user("hello"),
            ChatMessage::assistant("hi there"),
        ];
        vec![pinned, ChatSession::new("1700000000000", "older chat")]
    }

    #[tokio::test]
    async fn fetch_all_decodes_history_envelope() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/chats/history/u-1"))
            .and(header("authorization", "Bearer tok-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "chatHistory": [
                    {
                        "id": "42",
                        "title": "a chat",
                        "messages": [{"id": "43", "text": "hi", "sender": "user"}],
                        "pinned": true
                    }
                ]
            })))
            .mount(&server)
            .await;

        let client = authed_client(&server.uri());
        let collection = client.fetch_all().await.unwrap();

        assert_eq!(collection.len(), 1);
        let session = &collection.sessions()[0];
        assert_eq!(session.id, "42");
        assert!(session.pinned);
        assert_eq!(session.messages[0].text, "hi");
    }

    #[tokio::test]
    async fn fetch_all_tolerates_missing_envelope_field() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/chats/history/u-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        let client = authed_client(&server.uri());
        assert!(client.fetch_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn replace_then_fetch_round_trips() {
        let server = MockServer::start().await;
        let sessions = sample_sessions();
        let envelope = serde_json::json!({
            "chatHistory": serde_json::to_value(&sessions).unwrap()
        });

        Mock::given(method("PUT"))
            .and(path("/chats/history"))
            .and(header("authorization", "Bearer tok-1"))
            .and(body_json(envelope.clone()))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/chats/history/u-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(envelope))
            .mount(&server)
            .await;

        let client = authed_client(&server.uri());
        let collection = SessionCollection::with_sessions(sessions.clone());
        client.replace_all(&collection).await.unwrap();

        // Equal by id, messages, title, pinned after the wire round trip.
        let fetched = client.fetch_all().await.unwrap();
        assert_eq!(fetched.sessions(), sessions.as_slice());
    }

    #[tokio::test]
    async fn server_error_surfaces_status_and_message() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/chats/history/u-1"))
            .respond_with(ResponseTemplate::new(403).set_body_json(serde_json::json!({
                "message": "Unauthorized access to chat history."
            })))
            .mount(&server)
            .await;

        let client = authed_client(&server.uri());
        let err = client.fetch_all().await.unwrap_err();

        match err {
            HistoryError::Status { code, message } => {
                assert_eq!(code, 403);
                assert_eq!(message, "Unauthorized access to chat history.");
            }
            other => panic!("expected Status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn guest_identity_fails_before_any_request() {
        let server = MockServer::start().await;
        let client = guest_client(&server.uri());

        let err = client.fetch_all().await.unwrap_err();
        assert!(matches!(err, HistoryError::Unauthenticated));
        assert!(server.received_requests().await.unwrap().is_empty());
    }
}
