//! Transport seam between the session client and the server.

use async_trait::async_trait;
use thiserror::Error;

use crate::{Payload, Response};

/// Transport error.
///
/// Any of these counts as a failed exchange; the caller decides whether
/// to retry.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Request failed: {0}")]
    Request(String),
    #[error("Server returned status {status} for {address}")]
    Status { address: String, status: u16 },
    #[error("Response could not be decoded: {0}")]
    Decode(String),
    #[error("Transport closed")]
    Closed,
}

/// Trait for request/response transports.
///
/// `address` is `view_name/method_name` relative to wherever the
/// transport points; `payload` already carries the session tag.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform one exchange.
    async fn exchange(&self, address: &str, payload: &Payload) -> Result<Response, TransportError>;
}

