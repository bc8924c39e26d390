use thiserror::Error;

/// Errors from the remote chat-history resource.
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("not authenticated")]
    Unauthenticated,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("server rejected request with status {code}: {message}")]
    Status { code: u16, message: String },

    #[error("malformed history response: {0}")]
    Decode(String),
}

/// Errors from the device-local ephemeral store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(String),

    #[error("corrupt stored sequence: {0}")]
    Corrupt(String),
}

/// Errors from the assistant response generator.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("no generator credential configured")]
    MissingCredential,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("generator rejected request with status {code}: {message}")]
    Status { code: u16, message: String },

    #[error("generator returned an empty completion")]
    EmptyCompletion,
}

/// Errors from the out-of-band safety report sink.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("not authenticated")]
    Unauthenticated,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("report endpoint returned status {0}")]
    Status(u16),
}

/// Typed failures surfaced by the synchronization engine.
///
/// None of these is fatal: the engine stays usable after every one, and
/// the persistence variants never imply a rollback of the in-memory model.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("chat state is still loading, try again")]
    NotReady,

    #[error("message text is empty")]
    EmptyMessage,

    #[error("a send is already in flight for this conversation")]
    SendInFlight,

    #[error("guest message limit reached")]
    QuotaExceeded,

    #[error("message violates the safety policy")]
    PolicyViolation,

    #[error("failed to sync chat history: {0}")]
    History(#[from] HistoryError),

    #[error("failed to save temp chat: {0}")]
    Ephemeral(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_error_display() {
        let err = HistoryError::Status {
            code: 403,
            message: "Unauthorized access to chat history.".to_string(),
        };
        assert!(err.to_string().contains("403"));
        assert!(err.to_string().contains("Unauthorized"));
    }

    #[test]
    fn test_engine_error_wraps_history_error() {
        let err = EngineError::from(HistoryError::Unauthenticated);
        assert_eq!(
            err.to_string(),
            "failed to sync chat history: not authenticated"
        );
    }

    #[test]
    fn test_store_error_display() {
        let err = StoreError::Corrupt("expected value at line 1".to_string());
        assert!(err.to_string().starts_with("corrupt stored sequence"));
    }
}
