//! Identity types for Confab.
//!
//! The engine never verifies credentials; it only consumes the current
//! identity from the external auth session and keys per-identity state
//! off the opaque user id.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Two-state identity flag driving storage backend and policy selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentityMode {
    Guest,
    Authenticated,
}

impl fmt::Display for IdentityMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentityMode::Guest => write!(f, "guest"),
            IdentityMode::Authenticated => write!(f, "authenticated"),
        }
    }
}

/// The current identity, as reported by the auth session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Identity {
    Guest,
    Authenticated {
        /// Opaque identity key used to address per-identity collections.
        user_id: String,
    },
}

impl Identity {
    pub fn mode(&self) -> IdentityMode {
        match self {
            Identity::Guest => IdentityMode::Guest,
            Identity::Authenticated { .. } => IdentityMode::Authenticated,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Identity::Authenticated { .. })
    }

    /// The identity key, present only when authenticated.
    pub fn user_id(&self) -> Option<&str> {
        match self {
            Identity::Guest => None,
            Identity::Authenticated { user_id } => Some(user_id),
        }
    }
}
