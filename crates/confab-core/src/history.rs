//! Persistence ports for chat history.
//!
//! `HistoryClient` is the sole interface to server-held sessions;
//! `EphemeralStore` holds the single guest conversation on the device.
//! Implementations live in confab-infra. Both use native async fn in
//! traits (RPITIT).

use std::future::Future;

use confab_types::chat::{ChatMessage, SessionCollection};
use confab_types::error::{HistoryError, StoreError};

/// Client for the authenticated identity's sole remote history resource.
///
/// There is deliberately no partial-update, append, or patch operation:
/// every persisted change is a full-collection overwrite. This trades
/// write amplification for a trivially consistent server contract, and
/// must not be "improved" into per-session endpoints.
pub trait HistoryClient: Send + Sync {
    /// Fetch the identity's full session collection.
    fn fetch_all(
        &self,
    ) -> impl Future<Output = Result<SessionCollection, HistoryError>> + Send;

    /// Replace the identity's stored collection wholesale.
    ///
    /// Idempotent. No ordering guarantee beyond last-accepted-write-wins.
    fn replace_all(
        &self,
        collection: &SessionCollection,
    ) -> impl Future<Output = Result<(), HistoryError>> + Send;
}

/// Device-local storage for the single unauthenticated conversation.
///
/// Durable across restarts on the same device, never synced, never
/// visible to the server. Used exclusively in guest mode.
pub trait EphemeralStore: Send + Sync {
    /// Load the stored guest sequence; empty if nothing was saved.
    fn load_sequence(
        &self,
    ) -> impl Future<Output = Result<Vec<ChatMessage>, StoreError>> + Send;

    /// Replace the stored guest sequence wholesale.
    fn save_sequence(
        &self,
        sequence: &[ChatMessage],
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}
