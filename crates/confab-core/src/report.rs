//! Out-of-band safety reporting port.
//!
//! When the content filter blocks a message, the engine notifies this
//! sink asynchronously. Delivery failure is logged and never blocks or
//! reverses the rejection.

use std::future::Future;

use confab_types::error::ReportError;

/// Receives the text of messages that failed content screening.
pub trait ReportSink: Send + Sync {
    fn report(&self, text: &str) -> impl Future<Output = Result<(), ReportError>> + Send;
}
