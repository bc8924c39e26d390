//! Device auth session.
//!
//! Holds the current identity in a watch channel and the bearer
//! credential in the shared token cell. Login and logout flip both and
//! notify subscribers; the engine re-hydrates on each event. Credential
//! issuance and verification happen elsewhere -- this type only stores
//! what it is handed.

use std::sync::Arc;

use secrecy::SecretString;
use tokio::sync::watch;
use tracing::info;

use confab_core::auth::AuthSessionProvider;
use confab_types::identity::Identity;

use crate::token::BearerCell;

struct Shared {
    identity: watch::Sender<Identity>,
    tokens: BearerCell,
}

/// The device's view of who is logged in.
///
/// Cheap to clone; all clones share the same identity channel and token
/// cell, so a login through one is observed by every subscriber.
#[derive(Clone)]
pub struct DeviceAuthSession {
    shared: Arc<Shared>,
}

impl DeviceAuthSession {
    /// Create a guest session wired to the given token cell.
    pub fn new(tokens: BearerCell) -> Self {
        let (identity, _) = watch::channel(Identity::Guest);
        Self {
            shared: Arc::new(Shared { identity, tokens }),
        }
    }

    /// Store a verified credential and switch to authenticated.
    pub fn login(&self, user_id: impl Into<String>, token: SecretString) {
        let user_id = user_id.into();
        self.shared.tokens.set(token);
        info!(user_id = %user_id, "logged in");
        self.shared
            .identity
            .send_replace(Identity::Authenticated { user_id });
    }

    /// Drop the credential and switch back to guest.
    pub fn logout(&self) {
        self.shared.tokens.clear();
        info!("logged out");
        self.shared.identity.send_replace(Identity::Guest);
    }

    /// The shared token cell, for wiring into HTTP clients.
    pub fn tokens(&self) -> &BearerCell {
        &self.shared.tokens
    }
}

impl AuthSessionProvider for DeviceAuthSession {
    fn identity(&self) -> Identity {
        self.shared.identity.borrow().clone()
    }

    fn subscribe(&self) -> watch::Receiver<Identity> {
        self.shared.identity.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn login_stores_token_and_notifies() {
        let session = DeviceAuthSession::new(BearerCell::new());
        let mut events = session.subscribe();
        assert_eq!(session.identity(), Identity::Guest);

        session.login("u-1", SecretString::from("tok"));

        events.changed().await.unwrap();
        assert_eq!(
            session.identity(),
            Identity::Authenticated {
                user_id: "u-1".to_string()
            }
        );
        assert!(session.tokens().is_set());
    }

    #[tokio::test]
    async fn logout_clears_token_and_notifies() {
        let session = DeviceAuthSession::new(BearerCell::new());
        session.login("u-1", SecretString::from("tok"));
        let mut events = session.subscribe();

        session.logout();

        events.changed().await.unwrap();
        assert_eq!(session.identity(), Identity::Guest);
        assert!(!session.tokens().is_set());
    }

    #[tokio::test]
    async fn clones_observe_the_same_session() {
        let session = DeviceAuthSession::new(BearerCell::new());
        let clone = session.clone();
        session.login("u-1", SecretString::from("tok"));
        assert!(clone.identity().is_authenticated());
    }
}
