//! HTTP transport implementation.
//!
//! This module provides HTTP/1.1 and HTTP/2 transport using reqwest.

use reqwest::{
    Client,
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
};
use tracing::{debug, instrument};

use super::config::{HttpConfig, HttpVersion};
use crate::{
    error::{BridgeError, Result},
    transport::{
        HttpMethod, OutboundRequest, Transport, TransportResponse, sealed, validate_header,
    },
};

const JSON: &str = "application/json";

/// HTTP/1.1 and HTTP/2 transport using reqwest.
///
/// Supports automatic connection pooling, keep-alive, and HTTP/2 multiplexing.
/// The underlying [`Client`] is cheap to clone and is shared with the bearer
/// token exchange so both use one connection pool.
///
/// # Examples
///
/// ```
/// use commerce_mcp_bridge::transport::{HttpConfig, HttpTransport, HttpVersion, Transport};
///
/// let config =
///     HttpConfig { timeout_secs: 60, http_version: HttpVersion::Http1, ..Default::default() };
/// let transport = HttpTransport::with_config(&config).unwrap();
/// assert_eq!(transport.protocol_name(), "http/1.1");
/// ```
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    http_version: HttpVersion,
}

impl sealed::private::Sealed for HttpTransport {}

impl HttpTransport {
    /// Creates a new HTTP transport with default settings.
    ///
    /// Default configuration:
    /// - Pool max idle per host: 100
    /// - Timeout: 30 seconds
    /// - Connect timeout: 10 seconds
    /// - HTTP version: Auto (prefer HTTP/2)
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client creation fails.
    pub fn new() -> Result<Self> {
        Self::with_config(&HttpConfig::default())
    }

    /// Creates HTTP transport with custom configuration.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::ConfigurationError`] if the configuration is out of
    /// bounds, or [`BridgeError::TransportError`] if the client cannot be built.
    pub fn with_config(config: &HttpConfig) -> Result<Self> {
        config.validate()?;

        let mut builder = Client::builder()
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .timeout(config.timeout())
            .connect_timeout(config.connect_timeout());

        builder = match config.http_version {
            HttpVersion::Http1 => builder.http1_only(),
            HttpVersion::Http2 => builder.http2_prior_knowledge(),
            HttpVersion::Auto => builder,
        };

        let client = builder.build()?;

        Ok(Self { client, http_version: config.http_version })
    }

    /// The underlying reqwest client.
    #[must_use]
    pub fn client(&self) -> &Client {
        &self.client
    }

    #[instrument(
        skip(self, request, authorization),
        fields(method = %request.method, path = request.url.path(), params = request.query.len())
    )]
    async fn execute_request(
        &self,
        request: &OutboundRequest,
        authorization: &str,
    ) -> Result<TransportResponse> {
        validate_header(AUTHORIZATION.as_str(), authorization)?;

        let mut builder = match request.method {
            HttpMethod::Get => self.client.get(request.url.clone()),
            HttpMethod::Post => self.client.post(request.url.clone()),
            HttpMethod::Put => self.client.put(request.url.clone()),
            HttpMethod::Delete => self.client.delete(request.url.clone()),
        };

        builder = builder.header(ACCEPT, JSON).header(AUTHORIZATION, authorization);

        if let Some(body) = &request.body {
            builder = builder.header(CONTENT_TYPE, JSON).body(body.clone());
        }

        let response = builder.send().await?;

        let status = response.status().as_u16();

        let headers: Vec<(String, String)> = response
            .headers()
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or("").to_owned()))
            .collect();

        let body = response.bytes().await.map_err(BridgeError::TransportError)?.to_vec();

        debug!(status, bytes = body.len(), "received response");
        Ok(TransportResponse { status, body, headers })
    }
}

impl Transport for HttpTransport {
    async fn send<'a>(
        &'a self,
        request: &'a OutboundRequest,
        authorization: &'a str,
    ) -> Result<TransportResponse> {
        self.execute_request(request, authorization).await
    }

    fn protocol_name(&self) -> &'static str {
        match self.http_version {
            HttpVersion::Http1 => "http/1.1",
            HttpVersion::Http2 => "http/2",
            HttpVersion::Auto => "http",
        }
    }
}

#[cfg(test)]
mod tests {
    use mockito::{Matcher, Server};
    use url::Url;

    use super::*;

    fn request(method: HttpMethod, url: &str, body: Option<&[u8]>) -> OutboundRequest {
        OutboundRequest::new(method, Url::parse(url).unwrap(), body.map(<[u8]>::to_vec))
    }

    #[test]
    fn test_http_transport_new() {
        let transport = HttpTransport::new().unwrap();
        assert_eq!(transport.protocol_name(), "http");
    }

    #[test]
    fn test_http_transport_protocol_name() {
        let config = HttpConfig { http_version: HttpVersion::Http1, ..Default::default() };
        assert_eq!(HttpTransport::with_config(&config).unwrap().protocol_name(), "http/1.1");

        let config = HttpConfig { http_version: HttpVersion::Http2, ..Default::default() };
        assert_eq!(HttpTransport::with_config(&config).unwrap().protocol_name(), "http/2");
    }

    #[test]
    fn test_http_transport_rejects_invalid_config() {
        let config = HttpConfig { timeout_secs: 0, ..Default::default() };
        assert!(matches!(
            HttpTransport::with_config(&config),
            Err(BridgeError::ConfigurationError(_))
        ));
    }

    #[tokio::test]
    async fn test_get_sends_accept_and_authorization() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/rest/V1/categories/2")
            .match_header("accept", JSON)
            .match_header("authorization", "Bearer abc")
            .match_header("content-type", Matcher::Missing)
            .with_status(200)
            .with_header("content-type", JSON)
            .with_body(r#"{"id":2}"#)
            .create_async()
            .await;

        let transport = HttpTransport::new().unwrap();
        let url = format!("{}/rest/V1/categories/2", server.url());
        let response =
            transport.send(&request(HttpMethod::Get, &url, None), "Bearer abc").await.unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.body, br#"{"id":2}"#);
        assert!(response.headers.iter().any(|(k, v)| k == "content-type" && v == JSON));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_query_string_sent_verbatim() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/rest/V1/products")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded(
                    "searchCriteria[filterGroups][0][filters][0][value]".into(),
                    "Default Category".into(),
                ),
                Matcher::UrlEncoded("searchCriteria[pageSize]".into(), "10".into()),
            ]))
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        let transport = HttpTransport::new().unwrap();
        let url = format!(
            "{}/rest/V1/products?searchCriteria[filterGroups][0][filters][0][value]=Default%20Category&searchCriteria[pageSize]=10",
            server.url()
        );
        let response = transport.send(&request(HttpMethod::Get, &url, None), "x").await.unwrap();

        assert_eq!(response.status, 200);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_post_sends_json_body() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/rest/V1/categories")
            .match_header("content-type", JSON)
            .match_body(Matcher::JsonString(r#"{"category":{"name":"Shoes"}}"#.into()))
            .with_status(200)
            .with_body(r#"{"id":42,"name":"Shoes"}"#)
            .create_async()
            .await;

        let transport = HttpTransport::new().unwrap();
        let url = format!("{}/rest/V1/categories", server.url());
        let body = br#"{"category":{"name":"Shoes"}}"#;
        let response =
            transport.send(&request(HttpMethod::Post, &url, Some(body)), "x").await.unwrap();

        assert_eq!(response.status, 200);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_put_and_delete_methods() {
        let mut server = Server::new_async().await;
        let put = server
            .mock("PUT", "/rest/V1/categories/5")
            .match_header("content-type", JSON)
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;
        let delete = server
            .mock("DELETE", "/rest/V1/categories/5")
            .with_status(200)
            .with_body("true")
            .create_async()
            .await;

        let transport = HttpTransport::new().unwrap();
        let url = format!("{}/rest/V1/categories/5", server.url());

        transport.send(&request(HttpMethod::Put, &url, Some(b"{}")), "x").await.unwrap();
        let response = transport.send(&request(HttpMethod::Delete, &url, None), "x").await.unwrap();

        assert_eq!(response.body, b"true");
        put.assert_async().await;
        delete.assert_async().await;
    }

    #[tokio::test]
    async fn test_error_status_returned_as_response() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/rest/V1/categories/999999")
            .with_status(404)
            .with_body(r#"{"message":"No such entity"}"#)
            .expect(1)
            .create_async()
            .await;

        let transport = HttpTransport::new().unwrap();
        let url = format!("{}/rest/V1/categories/999999", server.url());
        let response = transport.send(&request(HttpMethod::Get, &url, None), "x").await.unwrap();

        assert_eq!(response.status, 404);
        assert!(!response.is_success());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_rejects_crlf_in_authorization() {
        let transport = HttpTransport::new().unwrap();
        let request = request(HttpMethod::Get, "http://127.0.0.1:9/never", None);

        let result = transport.send(&request, "Bearer abc\r\nX-Injected: 1").await;
        assert!(matches!(result, Err(BridgeError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_connection_failure_is_transport_error() {
        let transport = HttpTransport::new().unwrap();
        // Port 9 (discard) is not expected to accept connections in test environments.
        let request = request(HttpMethod::Get, "http://127.0.0.1:9/rest/V1/categories", None);

        let result = transport.send(&request, "x").await;
        assert!(matches!(result, Err(BridgeError::TransportError(_))));
    }
}
