//! Identity-dependent send policies.
//!
//! The quota gate bounds unauthenticated senders; the content filter
//! screens authenticated ones. The engine applies both before any
//! mutation.

pub mod content;
pub mod quota;
