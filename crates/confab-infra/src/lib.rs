//! Infrastructure implementations for Confab.
//!
//! HTTP adapters for the remote collaborators (chat history, safety
//! reports, assistant generation), the file-backed temp chat store, the
//! device auth session, and configuration loading. Everything here
//! implements a port defined in `confab-core`.

pub mod auth;
pub mod config;
pub mod http;
pub mod local;
pub mod token;
