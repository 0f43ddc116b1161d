//! Authentication for outbound platform calls.
//!
//! Two modes exist and exactly one is active per process:
//!
//! - **Signed**: every request carries a fresh OAuth 1.0a signature computed
//!   from a fixed consumer key/secret and a pre-issued access token/secret.
//! - **Bearer flow**: client credentials are exchanged for a short-lived
//!   access token, cached in a [`TokenCache`] and re-acquired on expiry.
//!
//! [`Authenticator`] turns resolved [`Credentials`] into per-request
//! `Authorization` header values.

pub mod credentials;
pub mod oauth1;
pub mod token;

pub use credentials::{BearerCredentials, Credentials, SignedCredentials};
pub use oauth1::{OAuth1Signer, OAuthSignature};
pub use token::{AccessToken, ClientCredentialsExchange, TokenCache};
use crate::{error::Result, transport::OutboundRequest};

/// `Authorization` header value for one request.
#[derive(Debug, Clone)]
pub struct Authorization {
    /// Header value sent to the platform.
    pub header: String,
    /// Raw bearer token the header was built from, if any.
    pub bearer_token: Option<String>,
}

/// Produces request authentication for the active mode.
#[derive(Debug)]
pub enum Authenticator {
    /// Per-request OAuth 1.0a signing.
    Signed(OAuth1Signer),
    /// Cached bearer token from the client-credentials exchange.
    Bearer(TokenCache),
}

impl Authenticator {
    /// Builds the authenticator for `credentials`, sharing `http` with the
    /// token exchange.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::BridgeError::ConfigurationError`] if the token
    /// endpoint URL cannot be built.
    pub fn new(credentials: &Credentials, http: reqwest::Client) -> Result<Self> {
        match credentials {
            Credentials::Signed(signed) => Ok(Self::Signed(OAuth1Signer::new(signed))),
            Credentials::BearerFlow(bearer) => {
                let exchange = ClientCredentialsExchange::new(http, bearer)?;
                Ok(Self::Bearer(TokenCache::new(exchange)))
            }
        }
    }

    /// Returns the `Authorization` value for a request.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::BridgeError::AuthError`] if signing or the token
    /// exchange fails.
    pub async fn authorize(&self, request: &OutboundRequest) -> Result<Authorization> {
        match self {
            Self::Signed(signer) => {
                let signature = signer.sign_request(request)?;
                Ok(Authorization { header: signature.authorization, bearer_token: None })
            }
            Self::Bearer(cache) => {
                let token = cache.token().await?;
                Ok(Authorization {
                    header: format!("Bearer {}", token.value()),
                    bearer_token: Some(token.value().to_owned()),
                })
            }
        }
    }

    /// Reacts to a 401 for a request authorized with `authorization`.
    ///
    /// Returns `true` when the request may be replayed once with fresh
    /// authorization. Signed requests are never replayed.
    pub async fn reject(&self, authorization: &Authorization) -> bool {
        match (self, &authorization.bearer_token) {
            (Self::Bearer(cache), Some(token)) => {
                cache.invalidate(token).await;
                true
            }
            _ => false,
        }
    }

    /// Mode name for logging.
    #[must_use]
    pub const fn mode(&self) -> &'static str {
        match self {
            Self::Signed(_) => "signed",
            Self::Bearer(_) => "bearer",
        }
    }
}
