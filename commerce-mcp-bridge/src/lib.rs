//! Commerce MCP Bridge: authenticated REST access to a commerce platform for MCP tools
//!
//! A Rust library that exposes a Magento-style commerce platform REST API
//! (`/rest/V1/...`) to an LLM-facing MCP server. It handles the parts every
//! tool needs:
//!
//! - **Authentication**: OAuth 1.0a one-legged request signing, or a bearer
//!   token obtained through the client-credentials flow and cached per client
//! - **Dispatch**: one HTTP call per operation, never retried (except a single
//!   replay after a bearer-token rejection)
//! - **Normalization**: every outcome becomes parsed data or an error message
//!   carrying the upstream status code, wrapped as [`ApiResult`]
//! - **Search**: flat filter/sort/paging input compiled into the platform's
//!   nested `searchCriteria` query encoding
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │   MCP tools     │  commerce-mcp-server
//! └────────┬────────┘
//!          │ get / post / put / delete, build_search_criteria_from_input
//! ┌────────▼────────────────────────────────────────┐
//! │        Commerce MCP Bridge (this crate)         │
//! │  ┌──────────────┐  ┌───────────┐  ┌──────────┐  │
//! │  │CommerceClient│──│   auth    │  │  search  │  │
//! │  │ + normalizer │  │ (OAuth1 / │  │ compiler │  │
//! │  └──────┬───────┘  │  bearer)  │  └──────────┘  │
//! │         │          └───────────┘                │
//! └─────────┼───────────────────────────────────────┘
//!           │ HTTPS + Authorization
//! ┌─────────▼───────┐
//! │ Commerce REST   │  {baseUrl}{endpoint}
//! └─────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use commerce_mcp_bridge::{
//!     ApiResult, CommerceClient, Credentials,
//!     search::{Filter, SearchInput, build_search_criteria_from_input},
//! };
//! use serde_json::Value;
//!
//! # async fn example() -> commerce_mcp_bridge::Result<()> {
//! let client = CommerceClient::new(Credentials::from_env()?)?;
//!
//! let criteria = build_search_criteria_from_input(&SearchInput {
//!     filters: Some(vec![Filter::eq("name", "Default Category")]),
//!     ..Default::default()
//! })?;
//! let endpoint = criteria.endpoint("/categories/list");
//!
//! let result: ApiResult<Value> = ApiResult::from_result(&endpoint, client.get(&endpoint).await);
//! println!("{}", serde_json::to_string_pretty(&result).unwrap_or_default());
//! # Ok(())
//! # }
//! ```
//!
//! # Module Organization
//!
//! - [`auth`]: credential resolution, OAuth 1.0a signing, bearer token cache
//! - [`client`]: [`CommerceClient`] and the response normalizer
//! - [`search`]: `searchCriteria` compiler
//! - [`payload`]: optional-field request body builder
//! - [`transport`]: HTTP transport and its configuration
//! - [`error`]: error taxonomy
//!
//! # Configuration
//!
//! Credentials come from the environment and select exactly one mode:
//!
//! | Mode | Variables |
//! |------|-----------|
//! | signed | `COMMERCE_BASE_URL`, `COMMERCE_CONSUMER_KEY`, `COMMERCE_CONSUMER_SECRET`, `COMMERCE_ACCESS_TOKEN`, `COMMERCE_ACCESS_TOKEN_SECRET` |
//! | bearer | `COMMERCE_BASE_URL`, `OAUTH_CLIENT_ID`, `OAUTH_CLIENT_SECRET`, optional `OAUTH_SCOPES`, optional `OAUTH_HOST` |
//!
//! Setting variables for both modes, or only part of one, is a
//! [`BridgeError::ConfigurationError`].
//!
//! # Error Handling
//!
//! All operations return [`Result<T, BridgeError>`](error::Result). Consumers
//! usually wrap the outcome with [`ApiResult::from_result`]:
//!
//! ```rust,no_run
//! use commerce_mcp_bridge::{BridgeError, CommerceClient};
//! use serde_json::Value;
//!
//! # async fn example(client: &CommerceClient) {
//! match client.get::<Value>("/categories/999999").await {
//!     Ok(category) => println!("{category}"),
//!     Err(BridgeError::UpstreamError { status: 404, message }) => {
//!         eprintln!("not found: {message}");
//!     }
//!     Err(BridgeError::ValidationError(msg)) => {
//!         eprintln!("rejected before sending: {msg}");
//!     }
//!     Err(e) => eprintln!("other error: {e}"),
//! }
//! # }
//! ```

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![allow(
    clippy::multiple_crate_versions,
    reason = "transitive dependencies from reqwest and schemars"
)]

pub mod auth;
pub mod client;
pub mod error;
pub mod payload;
pub mod search;
pub mod transport;

pub use auth::Credentials;
pub use client::{ApiResult, CommerceClient};
pub use error::{BridgeError, Result};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        let _ = std::marker::PhantomData::<(BridgeError, CommerceClient, ApiResult<()>)>;
    }
}
