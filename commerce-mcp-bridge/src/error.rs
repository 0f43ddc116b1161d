//! Error types for the commerce MCP bridge.
//!
//! All errors implement the standard [`std::error::Error`] trait via [`thiserror::Error`].
//!
//! # Error Categories
//!
//! - **Configuration** ([`BridgeError::ConfigurationError`]): credential resolution failed
//!   at startup. Fatal.
//! - **Authentication** ([`BridgeError::AuthError`]): signing or token exchange failed.
//! - **Validation** ([`BridgeError::ValidationError`]): input rejected before any network call.
//! - **Transport** ([`BridgeError::TransportError`]): the HTTP call itself failed.
//! - **Upstream** ([`BridgeError::UpstreamError`]): the platform answered with a non-2xx status.
//! - **Response** ([`BridgeError::ResponseError`]): a 2xx body could not be parsed.
//!
//! # Examples
//!
//! ```
//! use commerce_mcp_bridge::error::{BridgeError, Result};
//!
//! fn check_page_size(page_size: u32) -> Result<u32> {
//!     if page_size == 0 || page_size > 10 {
//!         return Err(BridgeError::ValidationError(format!(
//!             "pageSize must be between 1 and 10, got {page_size}"
//!         )));
//!     }
//!     Ok(page_size)
//! }
//!
//! assert!(check_page_size(11).is_err());
//! ```

use thiserror::Error;

/// Result type alias for bridge operations.
///
/// All fallible functions in this crate return this type.
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Errors that can occur in the commerce MCP bridge.
///
/// The `Display` output of every variant is meant to end up in tool output,
/// so messages name the offending value and, for HTTP failures, always contain
/// the substring `status code NNN`.
#[must_use = "errors should be handled, propagated, or explicitly panicked"]
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Credential configuration is missing, incomplete, or ambiguous.
    ///
    /// Raised while resolving [`Credentials`](crate::auth::Credentials) at process
    /// start.
    ///
    /// # Recovery
    ///
    /// None at runtime. Fix the environment and restart the server.
    #[error("configuration error: {0}")]
    ConfigurationError(String),

    /// Request signing or bearer token exchange failed.
    ///
    /// Common causes include:
    /// - Token endpoint rejected the client id/secret
    /// - Token endpoint unreachable or returned a malformed body
    /// - System clock before the Unix epoch (signed mode timestamps)
    ///
    /// A failed exchange never poisons the token cache; the next call tries again.
    #[error("authentication failed: {0}")]
    AuthError(String),

    /// Input rejected before any network call.
    ///
    /// Covers out-of-range paging values, malformed filters or sort orders, and
    /// endpoints that fail path hygiene checks.
    ///
    /// # Examples
    ///
    /// ```
    /// use commerce_mcp_bridge::error::BridgeError;
    ///
    /// let err = BridgeError::ValidationError("pageSize must be between 1 and 10, got 11".into());
    /// assert!(err.to_string().contains("pageSize"));
    /// ```
    #[error("validation failed: {0}")]
    ValidationError(String),

    /// HTTP request failed before a response was received.
    ///
    /// Wraps [`reqwest::Error`]: timeouts, refused connections, DNS and TLS failures.
    ///
    /// # Recovery
    ///
    /// The bridge never retries. Callers decide whether repeating the operation is
    /// safe; for writes it usually is not.
    #[error("transport error: {0}")]
    TransportError(#[from] reqwest::Error),

    /// The platform returned a non-2xx status.
    ///
    /// `message` is the platform's error message with placeholders resolved, or
    /// the raw body when it is not the platform's JSON error shape.
    ///
    /// # Examples
    ///
    /// ```
    /// use commerce_mcp_bridge::error::BridgeError;
    ///
    /// let err = BridgeError::UpstreamError {
    ///     status: 404,
    ///     message: "No such entity with id = 999999".into(),
    /// };
    /// assert!(err.to_string().contains("status code 404"));
    /// ```
    #[error("request failed with status code {status}: {message}")]
    UpstreamError {
        /// HTTP status code.
        status: u16,
        /// Upstream error message.
        message: String,
    },

    /// A successful response body did not match the expected shape.
    #[error("invalid response: {0}")]
    ResponseError(String),
}

impl BridgeError {
    /// Returns the upstream HTTP status, if this error carries one.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::UpstreamError { status, .. } => Some(*status),
            _ => None,
        }
    }
}
