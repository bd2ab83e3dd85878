//! Transports for view session clients.
//!
//! Provides:
//! - Payload encoding helpers
//! - HTTP transport (feature: http)

pub mod encoding;

#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "http")]
pub use http::{HttpMethod, HttpTransport, HttpTransportConfig, HttpTransportError};
