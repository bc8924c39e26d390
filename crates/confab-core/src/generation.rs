//! Assistant response generation port.
//!
//! The generation backend is an external collaborator; the engine only
//! needs "text in, text out, may fail". Implementations live in
//! confab-infra.

use std::future::Future;

use confab_types::chat::ChatMessage;
use confab_types::error::GenerationError;

/// Fallback assistant text appended when generation fails or times out.
///
/// The conversation must never visibly stall, so the engine absorbs the
/// failure with this fixed apology instead of propagating it.
pub const FALLBACK_APOLOGY: &str = "Sorry, I'm having trouble responding right now.";

/// Produces assistant replies.
pub trait ResponseGenerator: Send + Sync {
    /// Generate a reply to `text`, given the conversation so far.
    ///
    /// `prior` is the visible sequence before the new user message was
    /// appended. May take arbitrary time; the engine imposes no timeout of
    /// its own beyond what the implementation chooses.
    fn generate(
        &self,
        text: &str,
        prior: &[ChatMessage],
    ) -> impl Future<Output = Result<String, GenerationError>> + Send;
}
