//! HTTP adapters for the remote collaborators.
//!
//! One module per resource: chat history, safety reports, assistant
//! generation. All three follow the same conventions: a dedicated
//! reqwest client with a per-client timeout, bearer auth where the
//! resource requires it, and error-body extraction below.

pub mod assistant;
pub mod history;
pub mod report;

/// Pull a human-readable message out of an error response.
///
/// The API reports failures as `{"message": ...}` or `{"error": ...}`;
/// fall back to the raw body when it is neither.
pub(crate) async fn error_message(response: reqwest::Response) -> String {
    #[derive(serde::Deserialize)]
    struct ErrorBody {
        message: Option<String>,
        error: Option<String>,
    }

    let raw = response.text().await.unwrap_or_default();
    match serde_json::from_str::<ErrorBody>(&raw) {
        Ok(body) => body.message.or(body.error).unwrap_or(raw),
        Err(_) => raw,
    }
}
