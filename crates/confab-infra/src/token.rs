//! Shared bearer-token cell.
//!
//! One cell is cloned into every HTTP client and the auth session, the
//! way a browser profile shares its token storage: device-scoped mutable
//! state, full-replace writes, last write wins.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use secrecy::{ExposeSecret, SecretString};

/// Device-scoped storage for the current bearer credential.
#[derive(Clone, Default)]
pub struct BearerCell {
    inner: Arc<Mutex<Option<SecretString>>>,
}

impl BearerCell {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a credential, replacing any previous one.
    pub fn set(&self, token: SecretString) {
        *self.lock() = Some(token);
    }

    /// Drop the stored credential.
    pub fn clear(&self) {
        *self.lock() = None;
    }

    pub fn is_set(&self) -> bool {
        self.lock().is_some()
    }

    /// Render the `Authorization` header value, if a token is stored.
    pub fn bearer_header(&self) -> Option<String> {
        self.lock()
            .as_ref()
            .map(|token| format!("Bearer {}", token.expose_secret()))
    }

    fn lock(&self) -> MutexGuard<'_, Option<SecretString>> {
        // A poisoned lock only means a writer panicked mid-store; the
        // Option inside is valid either way.
        self.inner.lock().unwrap_or_else(|err| err.into_inner())
    }
}

// Manual Debug so the token itself can never end up in logs.
impl fmt::Debug for BearerCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BearerCell")
            .field("set", &self.is_set())
            .finish()
    }
}
