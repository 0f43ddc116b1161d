//! Transport abstraction layer.
//!
//! This module provides a sealed `Transport` trait that performs exactly one
//! HTTP call per [`OutboundRequest`] and hands back the raw outcome. It never
//! interprets status codes: turning a response into data or an error is the
//! job of [`crate::client`].
//!
//! # Examples
//!
//! ```rust,no_run
//! use commerce_mcp_bridge::transport::{HttpMethod, HttpTransport, OutboundRequest, Transport};
//! use url::Url;
//!
//! # async fn example() -> commerce_mcp_bridge::error::Result<()> {
//! let transport = HttpTransport::new()?;
//!
//! let url = Url::parse("https://shop.example.com/rest/V1/categories/2").unwrap();
//! let request = OutboundRequest::new(HttpMethod::Get, url, None);
//!
//! let response = transport.send(&request, "Bearer token").await?;
//! println!("Status: {}", response.status);
//! # Ok(())
//! # }
//! ```

#[allow(
    redundant_imports,
    reason = "Future needed for RPITIT despite being in Edition 2024 prelude"
)]
use std::future::Future;

use url::Url;

use crate::error::{BridgeError, Result};

pub mod config;
pub mod http;
mod sealed;

pub use config::{HttpConfig, HttpVersion};
pub use http::HttpTransport;

/// HTTP methods the platform API uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    /// `GET`
    Get,
    /// `POST`
    Post,
    /// `PUT`
    Put,
    /// `DELETE`
    Delete,
}

impl HttpMethod {
    /// Upper-case method name as it appears on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One outbound call, built per request and never persisted.
///
/// `url` carries the query string exactly as it will be sent. `query` holds
/// the same parameters decoded; the OAuth 1.0a signer reads them from here.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    /// Request method.
    pub method: HttpMethod,
    /// Absolute URL, query included.
    pub url: Url,
    /// Decoded query parameters in wire order.
    pub query: Vec<(String, String)>,
    /// JSON body, if any.
    pub body: Option<Vec<u8>>,
}

impl OutboundRequest {
    /// Creates a request, decoding the query parameters from `url`.
    #[must_use]
    pub fn new(method: HttpMethod, url: Url, body: Option<Vec<u8>>) -> Self {
        let query = url.query_pairs().map(|(k, v)| (k.into_owned(), v.into_owned())).collect();
        Self { method, url, query, body }
    }
}

/// Raw response from a transport call.
///
/// Contains the response body, HTTP status code, and response headers.
#[derive(Debug)]
pub struct TransportResponse {
    /// HTTP status code.
    pub status: u16,
    /// Raw response body bytes.
    pub body: Vec<u8>,
    /// Response headers.
    pub headers: Vec<(String, String)>,
}

impl TransportResponse {
    /// Whether the status is in the 2xx range.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// Transport protocol abstraction.
///
/// This trait is sealed; only implementations within this crate exist.
///
/// Implementations:
/// - attach `Accept: application/json` to every request and
///   `Content-Type: application/json` when a body is present;
/// - attach the given `Authorization` value verbatim;
/// - make exactly one attempt and return non-2xx responses as data.
pub trait Transport: sealed::private::Sealed + Send + Sync {
    /// Sends `request` with the given `Authorization` header value.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::ValidationError`] if the authorization value
    /// contains control characters, or [`BridgeError::TransportError`] if no
    /// response was received.
    fn send<'a>(
        &'a self,
        request: &'a OutboundRequest,
        authorization: &'a str,
    ) -> impl Future<Output = Result<TransportResponse>> + Send + 'a;

    /// Returns the protocol name for logging.
    fn protocol_name(&self) -> &'static str;
}

/// Checks an endpoint before it is joined onto the base URL.
///
/// Endpoints must be absolute paths and must not contain traversal segments
/// or control characters. Only the path is checked for traversal; the query
/// string carries filter values, where `..` is ordinary text.
pub(crate) fn validate_endpoint(endpoint: &str) -> Result<()> {
    if !endpoint.starts_with('/') {
        return Err(BridgeError::ValidationError(format!(
            "endpoint must start with '/': {endpoint}"
        )));
    }
    let path = endpoint.split_once('?').map_or(endpoint, |(path, _)| path);
    if path.split('/').any(is_parent_segment) {
        return Err(BridgeError::ValidationError(format!(
            "endpoint path must not contain '..' segments: {path}"
        )));
    }
    if endpoint.chars().any(char::is_control) {
        return Err(BridgeError::ValidationError(
            "endpoint must not contain control characters".to_owned(),
        ));
    }
    Ok(())
}

/// `..` in literal or percent-encoded form (`%2e%2e`, `.%2E`).
fn is_parent_segment(segment: &str) -> bool {
    urlencoding::decode(segment).is_ok_and(|decoded| decoded == "..")
}

/// Validates header name and value for CRLF injection prevention.
pub(crate) fn validate_header(name: &str, value: &str) -> Result<()> {
    let invalid = |s: &str| s.contains('\r') || s.contains('\n') || s.contains('\0');
    if invalid(name) {
        return Err(BridgeError::ValidationError(
            "invalid header name: control characters not allowed".to_owned(),
        ));
    }
    if invalid(value) {
        return Err(BridgeError::ValidationError(format!(
            "invalid value for header {name}: control characters not allowed"
        )));
    }
    Ok(())
}
