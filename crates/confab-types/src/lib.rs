//! Shared domain types for Confab.
//!
//! This crate contains the core domain types used across the Confab
//! workspace: chat messages, sessions, the per-identity session collection,
//! identity modes, and their associated error types.
//!
//! Zero infrastructure dependencies -- only serde, chrono, thiserror.

pub mod chat;
pub mod error;
pub mod identity;
