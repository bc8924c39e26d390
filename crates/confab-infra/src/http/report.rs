//! HTTP sink for safety reports.
//!
//! Blocked messages are forwarded to `POST {base}/feedback` as
//! `{"message": ...}` with a bearer `Authorization` header. The engine
//! fires this out-of-band; a failed delivery is logged there, never
//! retried here.

use std::time::Duration;

use reqwest::header::AUTHORIZATION;
use serde::Serialize;

use confab_core::report::ReportSink;
use confab_types::error::ReportError;

use crate::config::ApiConfig;
use crate::token::BearerCell;

#[derive(Serialize)]
struct ReportBody<'a> {
    message: &'a str,
}

/// reqwest-backed implementation of [`ReportSink`].
pub struct HttpReportSink {
    client: reqwest::Client,
    base_url: String,
    tokens: BearerCell,
}

impl HttpReportSink {
    pub fn new(config: &ApiConfig, tokens: BearerCell) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .expect("failed to create reqwest client");
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            tokens,
        }
    }
}

impl ReportSink for HttpReportSink {
    async fn report(&self, text: &str) -> Result<(), ReportError> {
        let auth = self
            .tokens
            .bearer_header()
            .ok_or(ReportError::Unauthenticated)?;
        let url = format!("{}/feedback", self.base_url);

        let response = self
            .client
            .post(&url)
            .header(AUTHORIZATION, auth)
            .json(&ReportBody { message: text })
            .send()
            .await
            .map_err(|err| ReportError::Transport(err.to_string()))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(ReportError::Status(status.as_u16()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use secrecy::SecretString;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn sink_for(base_url: &str) -> HttpReportSink {
        let tokens = BearerCell::new();
        tokens.set(SecretString::from("tok-1"));
        let config = ApiConfig {
            base_url: base_url.to_string(),
            request_timeout_secs: 5,
        };
        HttpReportSink::new(&config, tokens)
    }

    #[tokio::test]
    async fn report_posts_message_envelope() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/feedback"))
            .and(header("authorization", "Bearer tok-1"))
            .and(body_json(serde_json::json!({"message": "bad text"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "message": "Feedback received successfully. Thank you!"
            })))
            .expect(1)
            .mount(&server)
            .await;

        sink_for(&server.uri()).report("bad text").await.unwrap();
    }

    #[tokio::test]
    async fn report_without_token_fails_before_any_request() {
        let server = MockServer::start().await;
        let config = ApiConfig {
            base_url: server.uri(),
            request_timeout_secs: 5,
        };
        let sink = HttpReportSink::new(&config, BearerCell::new());

        let err = sink.report("text").await.unwrap_err();
        assert!(matches!(err, ReportError::Unauthenticated));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn report_surfaces_server_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/feedback"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = sink_for(&server.uri()).report("text").await.unwrap_err();
        assert!(matches!(err, ReportError::Status(500)));
    }
}
