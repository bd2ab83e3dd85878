//! HTTP transport for view endpoints.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client as HttpClient, Url};
use thiserror::Error;
use view_session_core::{Payload, Response, Transport, TransportError};

use crate::encoding::{decode_body, query_pairs};

/// HTTP verb used for exchanges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HttpMethod {
    /// Payload sent as a query string.
    #[default]
    Get,
    /// Payload sent as a JSON body.
    Post,
}

/// HTTP transport configuration.
#[derive(Debug, Clone)]
pub struct HttpTransportConfig {
    /// Base URL views are served under (e.g. `http://localhost:8080/WebAdmin`).
    pub base_url: String,

    /// Verb used for every exchange.
    pub method: HttpMethod,

    /// Per-request timeout.
    pub timeout: Duration,

    /// User agent string (set to None to disable the header).
    pub user_agent: Option<String>,
}

impl Default for HttpTransportConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            method: HttpMethod::Get,
            timeout: Duration::from_secs(30),
            user_agent: Some(format!("view-session/{}", env!("CARGO_PKG_VERSION"))),
        }
    }
}

/// HTTP transport construction error.
#[derive(Debug, Error)]
pub enum HttpTransportError {
    #[error("Invalid base URL {0:?}")]
    InvalidBaseUrl(String),
    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),
}

/// Transport issuing one HTTP request per exchange.
///
/// Any non-2xx status, connection failure, timeout or non-JSON body is a
/// failed exchange.
pub struct HttpTransport {
    base_url: String,
    method: HttpMethod,
    http_client: HttpClient,
}

impl HttpTransport {
    /// Create a new HTTP transport.
    ///
    /// # Errors
    /// Returns error if the base URL is not an http(s) URL or the client
    /// cannot be built.
    pub fn new(config: HttpTransportConfig) -> Result<Self, HttpTransportError> {
        let parsed = Url::parse(&config.base_url)
            .map_err(|_| HttpTransportError::InvalidBaseUrl(config.base_url.clone()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(HttpTransportError::InvalidBaseUrl(config.base_url));
        }

        let mut builder = HttpClient::builder().timeout(config.timeout);
        if let Some(user_agent) = &config.user_agent {
            builder = builder.user_agent(user_agent);
        }

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            method: config.method,
            http_client: builder.build()?,
        })
    }

    /// Full URL of `address`.
    #[must_use]
    pub fn url_for(&self, address: &str) -> String {
        format!("{}/{}", self.base_url, address.trim_start_matches('/'))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn exchange(&self, address: &str, payload: &Payload) -> Result<Response, TransportError> {
        let url = self.url_for(address);
        let request = match self.method {
            HttpMethod::Get => self.http_client.get(&url).query(&query_pairs(payload)),
            HttpMethod::Post => self.http_client.post(&url).json(payload),
        };

        let response = request
            .send()
            .await
            .map_err(|e| TransportError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!(%url, status = status.as_u16(), "Request rejected");
            return Err(TransportError::Status {
                address: address.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError::Request(e.to_string()))?;
        decode_body(&body)
    }
}
