//! Credential resolution from process configuration.
//!
//! Exactly one authentication mode is selected, once, at startup. Presence of
//! variables from both modes is rejected as ambiguous rather than resolved by
//! precedence.

use std::fmt;

use url::Url;

use crate::error::{BridgeError, Result};

/// Platform REST base URL, e.g. `https://shop.example.com/rest/V1`.
pub const ENV_BASE_URL: &str = "COMMERCE_BASE_URL";
/// Signed mode: consumer key.
pub const ENV_CONSUMER_KEY: &str = "COMMERCE_CONSUMER_KEY";
/// Signed mode: consumer secret.
pub const ENV_CONSUMER_SECRET: &str = "COMMERCE_CONSUMER_SECRET";
/// Signed mode: pre-issued access token.
pub const ENV_ACCESS_TOKEN: &str = "COMMERCE_ACCESS_TOKEN";
/// Signed mode: pre-issued access token secret.
pub const ENV_ACCESS_TOKEN_SECRET: &str = "COMMERCE_ACCESS_TOKEN_SECRET";
/// Bearer mode: client id.
pub const ENV_CLIENT_ID: &str = "OAUTH_CLIENT_ID";
/// Bearer mode: client secret.
pub const ENV_CLIENT_SECRET: &str = "OAUTH_CLIENT_SECRET";
/// Bearer mode: optional comma-separated scopes.
pub const ENV_SCOPES: &str = "OAUTH_SCOPES";
/// Bearer mode: optional token host.
pub const ENV_TOKEN_HOST: &str = "OAUTH_HOST";

const SIGNED_VARS: [&str; 4] =
    [ENV_CONSUMER_KEY, ENV_CONSUMER_SECRET, ENV_ACCESS_TOKEN, ENV_ACCESS_TOKEN_SECRET];
const BEARER_VARS: [&str; 2] = [ENV_CLIENT_ID, ENV_CLIENT_SECRET];

const REDACTED: &str = "***";

/// Authentication mode and its secret material.
///
/// Built once by [`Credentials::from_env`] and immutable afterwards.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// One-legged OAuth 1.0a signing with pre-issued token material.
    Signed(SignedCredentials),
    /// Client-credentials exchange for a short-lived bearer token.
    BearerFlow(BearerCredentials),
}

/// Signed-mode credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct SignedCredentials {
    /// Consumer key.
    pub consumer_key: String,
    /// Consumer secret.
    pub consumer_secret: String,
    /// Access token.
    pub access_token: String,
    /// Access token secret.
    pub access_token_secret: String,
    /// REST base URL without trailing slash.
    pub base_url: String,
}

/// Bearer-flow credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerCredentials {
    /// OAuth client id.
    pub client_id: String,
    /// OAuth client secret.
    pub client_secret: String,
    /// Requested scopes, in configuration order.
    pub scopes: Vec<String>,
    /// Token host override. `None` uses the default identity host.
    pub token_host: Option<String>,
    /// REST base URL without trailing slash.
    pub base_url: String,
}

impl Credentials {
    /// Resolves credentials from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::ConfigurationError`] when the base URL is missing or
    /// invalid, when a mode is only partially configured, when both modes are
    /// configured, or when neither is.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolves credentials through an arbitrary variable lookup.
    ///
    /// Empty and whitespace-only values are treated as unset.
    ///
    /// # Errors
    ///
    /// See [`Credentials::from_env`].
    ///
    /// # Examples
    ///
    /// ```
    /// use std::collections::HashMap;
    ///
    /// use commerce_mcp_bridge::auth::Credentials;
    ///
    /// let vars = HashMap::from([
    ///     ("COMMERCE_BASE_URL", "https://shop.example.com/rest/V1"),
    ///     ("OAUTH_CLIENT_ID", "client"),
    ///     ("OAUTH_CLIENT_SECRET", "secret"),
    /// ]);
    /// let credentials =
    ///     Credentials::from_lookup(|name| vars.get(name).map(|v| (*v).to_owned()))?;
    /// assert!(matches!(credentials, Credentials::BearerFlow(_)));
    /// # Ok::<(), commerce_mcp_bridge::BridgeError>(())
    /// ```
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name).map(|v| v.trim().to_owned()).filter(|v| !v.is_empty())
        };

        let signed_present: Vec<&str> =
            SIGNED_VARS.iter().copied().filter(|name| get(name).is_some()).collect();
        let bearer_present: Vec<&str> =
            BEARER_VARS.iter().copied().filter(|name| get(name).is_some()).collect();

        if !signed_present.is_empty() && !bearer_present.is_empty() {
            return Err(BridgeError::ConfigurationError(format!(
                "ambiguous credentials: both signed ({}) and bearer ({}) variables are set; \
                 configure exactly one mode",
                signed_present.join(", "),
                bearer_present.join(", ")
            )));
        }

        if signed_present.is_empty() && bearer_present.is_empty() {
            return Err(BridgeError::ConfigurationError(format!(
                "no credentials configured: set {} for signed requests or {} for the bearer flow",
                SIGNED_VARS.join(", "),
                BEARER_VARS.join(", ")
            )));
        }

        let base_url = get(ENV_BASE_URL)
            .ok_or_else(|| BridgeError::ConfigurationError(format!("{ENV_BASE_URL} is not set")))
            .and_then(|raw| normalize_base_url(&raw))?;

        if bearer_present.is_empty() {
            let missing: Vec<&str> =
                SIGNED_VARS.iter().copied().filter(|name| get(name).is_none()).collect();
            if !missing.is_empty() {
                return Err(BridgeError::ConfigurationError(format!(
                    "incomplete signed credentials: missing {}",
                    missing.join(", ")
                )));
            }
            return Ok(Self::Signed(SignedCredentials {
                consumer_key: get(ENV_CONSUMER_KEY).unwrap_or_default(),
                consumer_secret: get(ENV_CONSUMER_SECRET).unwrap_or_default(),
                access_token: get(ENV_ACCESS_TOKEN).unwrap_or_default(),
                access_token_secret: get(ENV_ACCESS_TOKEN_SECRET).unwrap_or_default(),
                base_url,
            }));
        }

        let missing: Vec<&str> =
            BEARER_VARS.iter().copied().filter(|name| get(name).is_none()).collect();
        if !missing.is_empty() {
            return Err(BridgeError::ConfigurationError(format!(
                "incomplete bearer credentials: missing {}",
                missing.join(", ")
            )));
        }

        let token_host = get(ENV_TOKEN_HOST).map(|raw| normalize_base_url(&raw)).transpose()?;
        let scopes = get(ENV_SCOPES)
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|scope| !scope.is_empty())
                    .map(str::to_owned)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self::BearerFlow(BearerCredentials {
            client_id: get(ENV_CLIENT_ID).unwrap_or_default(),
            client_secret: get(ENV_CLIENT_SECRET).unwrap_or_default(),
            scopes,
            token_host,
            base_url,
        }))
    }

    /// REST base URL shared by both modes.
    #[must_use]
    pub fn base_url(&self) -> &str {
        match self {
            Self::Signed(signed) => &signed.base_url,
            Self::BearerFlow(bearer) => &bearer.base_url,
        }
    }

    /// Short mode name for logs.
    #[must_use]
    pub const fn mode(&self) -> &'static str {
        match self {
            Self::Signed(_) => "signed",
            Self::BearerFlow(_) => "bearer",
        }
    }
}

/// Validates an absolute http(s) URL and trims trailing slashes.
fn normalize_base_url(raw: &str) -> Result<String> {
    let parsed = Url::parse(raw)
        .map_err(|e| BridgeError::ConfigurationError(format!("invalid URL '{raw}': {e}")))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(BridgeError::ConfigurationError(format!(
            "URL must use http or https, got '{}': {raw}",
            parsed.scheme()
        )));
    }
    if parsed.host_str().is_none() {
        return Err(BridgeError::ConfigurationError(format!("URL missing host: {raw}")));
    }
    if parsed.query().is_some() || parsed.fragment().is_some() {
        return Err(BridgeError::ConfigurationError(format!(
            "URL must not carry a query or fragment: {raw}"
        )));
    }

    Ok(raw.trim_end_matches('/').to_owned())
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Signed(signed) => f.debug_tuple("Signed").field(signed).finish(),
            Self::BearerFlow(bearer) => f.debug_tuple("BearerFlow").field(bearer).finish(),
        }
    }
}

impl fmt::Debug for SignedCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignedCredentials")
            .field("consumer_key", &self.consumer_key)
            .field("consumer_secret", &REDACTED)
            .field("access_token", &REDACTED)
            .field("access_token_secret", &REDACTED)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl fmt::Debug for BearerCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BearerCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &REDACTED)
            .field("scopes", &self.scopes)
            .field("token_host", &self.token_host)
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn resolve(vars: &[(&str, &str)]) -> Result<Credentials> {
        let map: HashMap<String, String> =
            vars.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect();
        Credentials::from_lookup(|name| map.get(name).cloned())
    }

    const SIGNED: [(&str, &str); 5] = [
        (ENV_BASE_URL, "https://shop.example.com/rest/V1/"),
        (ENV_CONSUMER_KEY, "ck"),
        (ENV_CONSUMER_SECRET, "cs"),
        (ENV_ACCESS_TOKEN, "at"),
        (ENV_ACCESS_TOKEN_SECRET, "ats"),
    ];

    #[test]
    fn test_resolves_signed_mode() {
        let credentials = resolve(&SIGNED).unwrap();
        let Credentials::Signed(signed) = credentials else {
            panic!("expected signed credentials");
        };
        assert_eq!(signed.consumer_key, "ck");
        assert_eq!(signed.access_token_secret, "ats");
        assert_eq!(signed.base_url, "https://shop.example.com/rest/V1");
    }

    #[test]
    fn test_resolves_bearer_mode_with_scopes_and_host() {
        let credentials = resolve(&[
            (ENV_BASE_URL, "https://shop.example.com/rest/V1"),
            (ENV_CLIENT_ID, "client"),
            (ENV_CLIENT_SECRET, "secret"),
            (ENV_SCOPES, "openid, commerce.api ,,"),
            (ENV_TOKEN_HOST, "https://ims.example.com/"),
        ])
        .unwrap();

        let Credentials::BearerFlow(bearer) = credentials else {
            panic!("expected bearer credentials");
        };
        assert_eq!(bearer.scopes, vec!["openid".to_owned(), "commerce.api".to_owned()]);
        assert_eq!(bearer.token_host.as_deref(), Some("https://ims.example.com"));
    }

    #[test]
    fn test_bearer_mode_optional_fields_absent() {
        let credentials = resolve(&[
            (ENV_BASE_URL, "https://shop.example.com/rest/V1"),
            (ENV_CLIENT_ID, "client"),
            (ENV_CLIENT_SECRET, "secret"),
        ])
        .unwrap();
        let Credentials::BearerFlow(bearer) = credentials else {
            panic!("expected bearer credentials");
        };
        assert!(bearer.scopes.is_empty());
        assert!(bearer.token_host.is_none());
    }

    #[test]
    fn test_rejects_ambiguous_configuration() {
        let mut vars = SIGNED.to_vec();
        vars.push((ENV_CLIENT_ID, "client"));

        let err = resolve(&vars).unwrap_err();
        assert!(matches!(err, BridgeError::ConfigurationError(_)));
        assert!(err.to_string().contains("ambiguous"));
        assert!(err.to_string().contains(ENV_CLIENT_ID));
    }

    #[test]
    fn test_partial_signed_configuration_names_missing_fields() {
        let err = resolve(&[
            (ENV_BASE_URL, "https://shop.example.com/rest/V1"),
            (ENV_CONSUMER_KEY, "ck"),
            (ENV_ACCESS_TOKEN, "   "),
        ])
        .unwrap_err();

        let message = err.to_string();
        assert!(message.contains(ENV_CONSUMER_SECRET));
        assert!(message.contains(ENV_ACCESS_TOKEN));
        assert!(message.contains(ENV_ACCESS_TOKEN_SECRET));
        assert!(!message.contains(ENV_CONSUMER_KEY));
    }

    #[test]
    fn test_partial_bearer_configuration() {
        let err = resolve(&[
            (ENV_BASE_URL, "https://shop.example.com/rest/V1"),
            (ENV_CLIENT_ID, "client"),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("missing OAUTH_CLIENT_SECRET"));
    }

    #[test]
    fn test_rejects_missing_base_url() {
        let vars: Vec<_> = SIGNED.iter().copied().filter(|(k, _)| *k != ENV_BASE_URL).collect();
        let err = resolve(&vars).unwrap_err();
        assert!(err.to_string().contains("COMMERCE_BASE_URL is not set"));
    }

    #[test]
    fn test_rejects_non_http_base_url() {
        let mut vars = SIGNED.to_vec();
        vars[0] = (ENV_BASE_URL, "ftp://shop.example.com");
        let err = resolve(&vars).unwrap_err();
        assert!(matches!(err, BridgeError::ConfigurationError(_)));
    }

    #[test]
    fn test_rejects_empty_configuration() {
        let err = resolve(&[]).unwrap_err();
        assert!(err.to_string().contains("no credentials configured"));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let credentials = resolve(&SIGNED).unwrap();
        let debug = format!("{credentials:?}");
        assert!(debug.contains("ck"));
        assert!(!debug.contains("\"cs\""));
        assert!(!debug.contains("\"ats\""));
        assert!(debug.contains(REDACTED));
    }

    #[test]
    fn test_mode_and_base_url_accessors() {
        let credentials = resolve(&SIGNED).unwrap();
        assert_eq!(credentials.mode(), "signed");
        assert_eq!(credentials.base_url(), "https://shop.example.com/rest/V1");
    }
}
