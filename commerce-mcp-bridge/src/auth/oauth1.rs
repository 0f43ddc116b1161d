//! One-legged OAuth 1.0a request signing (RFC 5849) with HMAC-SHA256.
//!
//! The platform issues the access token and secret out of band, so there is no
//! request-token handshake: every request is signed directly with the
//! consumer and token secrets. A fresh nonce and timestamp go into every
//! signature.

use std::time::SystemTime;

use base64::{Engine, engine::general_purpose::STANDARD};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::instrument;
use url::Url;
use uuid::Uuid;

use crate::{
    auth::credentials::SignedCredentials,
    error::{BridgeError, Result},
    transport::{HttpMethod, OutboundRequest},
};

type HmacSha256 = Hmac<Sha256>;

/// Value of `oauth_signature_method`.
pub const SIGNATURE_METHOD: &str = "HMAC-SHA256";

/// Value of `oauth_version`.
pub const OAUTH_VERSION: &str = "1.0";

/// Authorization material for one signed request.
#[derive(Debug, Clone)]
pub struct OAuthSignature {
    /// Complete `Authorization` header value.
    pub authorization: String,
    /// Base64 signature, unencoded.
    pub signature: String,
    /// Nonce used for this request.
    pub nonce: String,
    /// Unix timestamp in seconds used for this request.
    pub timestamp: u64,
}

/// Signs requests with a fixed consumer key/secret and access token/secret.
pub struct OAuth1Signer {
    consumer_key: String,
    consumer_secret: String,
    access_token: String,
    access_token_secret: String,
}

impl std::fmt::Debug for OAuth1Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuth1Signer")
            .field("consumer_key", &self.consumer_key)
            .finish_non_exhaustive()
    }
}

impl OAuth1Signer {
    /// Creates a signer from signed-mode credentials.
    #[must_use]
    pub fn new(credentials: &SignedCredentials) -> Self {
        Self {
            consumer_key: credentials.consumer_key.clone(),
            consumer_secret: credentials.consumer_secret.clone(),
            access_token: credentials.access_token.clone(),
            access_token_secret: credentials.access_token_secret.clone(),
        }
    }

    /// Signs a request to `url`, including its query parameters in the base string.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::AuthError`] if the system clock is before the Unix epoch.
    ///
    /// # Examples
    ///
    /// ```
    /// use commerce_mcp_bridge::{
    ///     auth::{OAuth1Signer, SignedCredentials},
    ///     transport::{HttpMethod, OutboundRequest},
    /// };
    /// use url::Url;
    ///
    /// let signer = OAuth1Signer::new(&SignedCredentials {
    ///     consumer_key: "ck".into(),
    ///     consumer_secret: "cs".into(),
    ///     access_token: "at".into(),
    ///     access_token_secret: "ats".into(),
    ///     base_url: "https://shop.example.com/rest/V1".into(),
    /// });
    ///
    /// let url = Url::parse("https://shop.example.com/rest/V1/categories/2").unwrap();
    /// let request = OutboundRequest::new(HttpMethod::Get, url, None);
    /// let signed = signer.sign_request(&request)?;
    /// assert!(signed.authorization.starts_with("OAuth "));
    /// # Ok::<(), commerce_mcp_bridge::BridgeError>(())
    /// ```
    #[instrument(skip_all, fields(method = request.method.as_str(), path = request.url.path()))]
    pub fn sign_request(&self, request: &OutboundRequest) -> Result<OAuthSignature> {
        let timestamp = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .map_err(|e| BridgeError::AuthError(format!("system time error: {e}")))?
            .as_secs();
        let nonce = Uuid::new_v4().simple().to_string();

        self.sign_with(request, &nonce, timestamp)
    }

    /// Signs with an explicit nonce and timestamp.
    ///
    /// Query parameters are taken from `request.query`, already decoded.
    pub(crate) fn sign_with(
        &self,
        request: &OutboundRequest,
        nonce: &str,
        timestamp: u64,
    ) -> Result<OAuthSignature> {
        let timestamp_str = timestamp.to_string();
        let oauth_params: [(&str, &str); 6] = [
            ("oauth_consumer_key", self.consumer_key.as_str()),
            ("oauth_nonce", nonce),
            ("oauth_signature_method", SIGNATURE_METHOD),
            ("oauth_timestamp", timestamp_str.as_str()),
            ("oauth_token", self.access_token.as_str()),
            ("oauth_version", OAUTH_VERSION),
        ];

        let mut params = request.query.clone();
        params.extend(oauth_params.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())));

        let base = signature_base_string(request.method, &request.url, &params);
        let signature = self.compute_signature(&base)?;

        let mut header_params: Vec<(&str, &str)> = oauth_params.to_vec();
        header_params.push(("oauth_signature", signature.as_str()));
        header_params.sort_unstable_by(|a, b| a.0.cmp(b.0));

        let authorization = format!(
            "OAuth {}",
            header_params
                .iter()
                .map(|(k, v)| format!("{k}=\"{}\"", percent_encode(v)))
                .collect::<Vec<_>>()
                .join(", ")
        );

        Ok(OAuthSignature { authorization, signature, nonce: nonce.to_owned(), timestamp })
    }

    fn compute_signature(&self, base: &str) -> Result<String> {
        let key = format!(
            "{}&{}",
            percent_encode(&self.consumer_secret),
            percent_encode(&self.access_token_secret)
        );
        let mut mac = HmacSha256::new_from_slice(key.as_bytes())
            .map_err(|e| BridgeError::AuthError(format!("invalid signing key: {e}")))?;
        mac.update(base.as_bytes());
        Ok(STANDARD.encode(mac.finalize().into_bytes()))
    }
}

/// Percent-encodes per RFC 3986, leaving only `A-Z a-z 0-9 - . _ ~` unescaped.
#[must_use]
pub fn percent_encode(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

/// Normalized request URL: lowercase scheme and host, no default port, no query.
#[must_use]
pub fn normalize_url(url: &Url) -> String {
    let scheme = url.scheme().to_ascii_lowercase();
    let host = url.host_str().unwrap_or_default().to_ascii_lowercase();
    // `Url::port` is `None` for the scheme's default port.
    match url.port() {
        Some(port) => format!("{scheme}://{host}:{port}{}", url.path()),
        None => format!("{scheme}://{host}{}", url.path()),
    }
}

/// Builds the signature base string `METHOD&url&params`.
///
/// `params` holds decoded pairs; each is encoded once, then the sorted
/// parameter string is encoded again as a whole.
#[must_use]
pub fn signature_base_string(method: HttpMethod, url: &Url, params: &[(String, String)]) -> String {
    let mut encoded: Vec<(String, String)> =
        params.iter().map(|(k, v)| (percent_encode(k), percent_encode(v))).collect();
    encoded.sort_unstable();

    let param_string =
        encoded.iter().map(|(k, v)| format!("{k}={v}")).collect::<Vec<_>>().join("&");

    format!(
        "{}&{}&{}",
        method.as_str(),
        percent_encode(&normalize_url(url)),
        percent_encode(&param_string)
    )
}
