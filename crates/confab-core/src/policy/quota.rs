//! Guest message quota gate.
//!
//! Guests may send a fixed number of messages before the engine surfaces
//! the paywall signal. Authenticated senders are unbounded.

use confab_types::identity::IdentityMode;

/// Number of messages an unauthenticated actor may send.
pub const GUEST_MESSAGE_LIMIT: usize = 10;

/// Stateless policy over the visible message count.
#[derive(Debug, Clone, Copy)]
pub struct QuotaGate {
    limit: usize,
}

impl Default for QuotaGate {
    fn default() -> Self {
        Self {
            limit: GUEST_MESSAGE_LIMIT,
        }
    }
}

impl QuotaGate {
    pub fn new(limit: usize) -> Self {
        Self { limit }
    }

    /// Whether another message may be accepted.
    ///
    /// Pure -- no side effects. Called once per send attempt, before any
    /// mutation. Returns false once a guest's visible sequence has reached
    /// the limit; always true for an authenticated sender.
    pub fn may_accept(&self, mode: IdentityMode, current_count: usize) -> bool {
        match mode {
            IdentityMode::Authenticated => true,
            IdentityMode::Guest => current_count < self.limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guest_below_limit_accepted() {
        let gate = QuotaGate::default();
        assert!(gate.may_accept(IdentityMode::Guest, 0));
        assert!(gate.may_accept(IdentityMode::Guest, 9));
    }

    #[test]
    fn test_guest_at_limit_rejected() {
        let gate = QuotaGate::default();
        assert!(!gate.may_accept(IdentityMode::Guest, 10));
        assert!(!gate.may_accept(IdentityMode::Guest, 11));
    }

    #[test]
    fn test_authenticated_unbounded() {
        let gate = QuotaGate::default();
        assert!(gate.may_accept(IdentityMode::Authenticated, 10));
        assert!(gate.may_accept(IdentityMode::Authenticated, 100_000));
    }

    #[test]
    fn test_custom_limit() {
        let gate = QuotaGate::new(2);
        assert!(gate.may_accept(IdentityMode::Guest, 1));
        assert!(!gate.may_accept(IdentityMode::Guest, 2));
    }
}
