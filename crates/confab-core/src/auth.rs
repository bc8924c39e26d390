//! Auth session port.
//!
//! Credential issuance, verification, and token lifecycle live outside
//! this crate. The engine consumes only the current identity and discrete
//! login/logout events, injected explicitly -- no ambient globals.

use tokio::sync::watch;

use confab_types::identity::Identity;

/// External source of the current identity.
pub trait AuthSessionProvider: Send + Sync {
    /// The identity as of now.
    fn identity(&self) -> Identity;

    /// Subscribe to identity changes.
    ///
    /// The receiver observes the new identity after each login or logout;
    /// the engine re-hydrates once per change.
    fn subscribe(&self) -> watch::Receiver<Identity>;
}
