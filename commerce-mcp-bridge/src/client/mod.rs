//! Platform REST client.
//!
//! [`CommerceClient`] performs one authenticated HTTP call per operation
//! against `{baseUrl}{endpoint}` and normalizes the outcome. Calls are never
//! retried, with one exception: in bearer mode a 401 invalidates the rejected
//! token and the request is replayed once with a fresh one.
//!
//! # Examples
//!
//! ```rust,no_run
//! use commerce_mcp_bridge::{ApiResult, CommerceClient, Credentials};
//! use serde_json::Value;
//!
//! # async fn example() -> commerce_mcp_bridge::Result<()> {
//! let client = CommerceClient::new(Credentials::from_env()?)?;
//!
//! let endpoint = "/categories/2";
//! let result: ApiResult<Value> = ApiResult::from_result(endpoint, client.get(endpoint).await);
//! println!("{}", serde_json::to_string_pretty(&result).unwrap_or_default());
//! # Ok(())
//! # }
//! ```

pub mod response;

pub use response::ApiResult;
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, instrument, warn};
use url::Url;

use crate::{
    auth::{Authenticator, Credentials},
    error::{BridgeError, Result},
    transport::{
        HttpConfig, HttpMethod, HttpTransport, OutboundRequest, Transport, TransportResponse,
        validate_endpoint,
    },
};

/// Authenticated client for the platform REST API.
#[derive(Debug)]
pub struct CommerceClient {
    base_url: String,
    transport: HttpTransport,
    auth: Authenticator,
}

impl CommerceClient {
    /// Creates a client with default HTTP settings.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built or the token endpoint
    /// is invalid.
    pub fn new(credentials: Credentials) -> Result<Self> {
        Self::with_config(credentials, &HttpConfig::default())
    }

    /// Creates a client with custom HTTP settings.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::ConfigurationError`] if `config` is out of bounds
    /// or the token endpoint is invalid.
    pub fn with_config(credentials: Credentials, config: &HttpConfig) -> Result<Self> {
        let transport = HttpTransport::with_config(config)?;
        let auth = Authenticator::new(&credentials, transport.client().clone())?;
        debug!(mode = auth.mode(), protocol = transport.protocol_name(), "client ready");

        Ok(Self { base_url: credentials.base_url().to_owned(), transport, auth })
    }

    /// Base URL every endpoint is appended to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Sends `GET {endpoint}` and parses the response body.
    ///
    /// # Errors
    ///
    /// Returns error on validation, authentication, transport, or upstream failure.
    pub async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T> {
        self.request(HttpMethod::Get, endpoint, None).await
    }

    /// Sends `POST {endpoint}` with a JSON body.
    ///
    /// # Errors
    ///
    /// Returns error on validation, authentication, transport, or upstream failure.
    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<T> {
        self.request(HttpMethod::Post, endpoint, Some(encode_body(body)?)).await
    }

    /// Sends `PUT {endpoint}` with a JSON body.
    ///
    /// # Errors
    ///
    /// Returns error on validation, authentication, transport, or upstream failure.
    pub async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<T> {
        self.request(HttpMethod::Put, endpoint, Some(encode_body(body)?)).await
    }

    /// Sends `DELETE {endpoint}`.
    ///
    /// # Errors
    ///
    /// Returns error on validation, authentication, transport, or upstream failure.
    pub async fn delete<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T> {
        self.request(HttpMethod::Delete, endpoint, None).await
    }

    #[instrument(skip(self, body), fields(mode = self.auth.mode()))]
    async fn request<T: DeserializeOwned>(
        &self,
        method: HttpMethod,
        endpoint: &str,
        body: Option<Vec<u8>>,
    ) -> Result<T> {
        validate_endpoint(endpoint)?;
        let url = Url::parse(&format!("{}{endpoint}", self.base_url)).map_err(|e| {
            BridgeError::ValidationError(format!("invalid endpoint {endpoint}: {e}"))
        })?;
        let request = OutboundRequest::new(method, url, body);

        let response = self.dispatch(&request).await?;
        let result = response::decode(&response);

        match &result {
            Ok(_) => debug!(status = response.status, "request succeeded"),
            Err(e) => warn!(status = response.status, error = %e, "request failed"),
        }
        result
    }

    async fn dispatch(&self, request: &OutboundRequest) -> Result<TransportResponse> {
        let authorization = self.auth.authorize(request).await?;
        let response = self.transport.send(request, &authorization.header).await?;

        if response.status == 401 && self.auth.reject(&authorization).await {
            warn!("bearer token rejected, replaying once with a fresh token");
            let authorization = self.auth.authorize(request).await?;
            return self.transport.send(request, &authorization.header).await;
        }

        Ok(response)
    }
}

fn encode_body<B: Serialize + ?Sized>(body: &B) -> Result<Vec<u8>> {
    serde_json::to_vec(body)
        .map_err(|e| BridgeError::ValidationError(format!("request body is not valid JSON: {e}")))
}
