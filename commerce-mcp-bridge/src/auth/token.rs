//! Bearer-flow token acquisition and caching.
//!
//! [`TokenCache`] is owned by the client instance. Reads of a fresh token only
//! take a shared lock. When the token is missing or stale, callers join a
//! single in-flight exchange: the first caller spawns it, everyone else awaits
//! the same [`Shared`] future and observes the same outcome. The spawned task
//! alone stores the new token and clears the in-flight slot. A failed exchange
//! leaves the cached token untouched, so the next call starts over.

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use futures::{
    FutureExt,
    future::{BoxFuture, Shared},
};
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::{
    auth::credentials::BearerCredentials,
    error::{BridgeError, Result},
};

/// Identity host used when `OAUTH_HOST` is not configured.
pub const DEFAULT_TOKEN_HOST: &str = "https://ims-na1.adobelogin.com";

/// Token endpoint path on the identity host.
pub const TOKEN_PATH: &str = "/ims/token/v3";

/// Lifetime assumed when the token response omits `expires_in`.
const DEFAULT_EXPIRES_IN_SECS: u64 = 3600;

/// Tokens are treated as stale this long before they actually expire.
const EXPIRY_SKEW: Duration = Duration::from_secs(60);

/// A bearer token and the instant after which it must not be used.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    value: String,
    expires_at: Instant,
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("value", &"***")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

impl AccessToken {
    /// Creates a token valid for `expires_in`, minus the refresh skew.
    #[must_use]
    pub fn new(value: impl Into<String>, expires_in: Duration) -> Self {
        let now = Instant::now();
        let expires_at = now + expires_in.saturating_sub(EXPIRY_SKEW);
        Self { value: value.into(), expires_at }
    }

    /// Raw token value for the `Authorization: Bearer` header.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Whether the token can still be used.
    #[must_use]
    pub fn is_fresh(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

/// Performs the client-credentials exchange against the token endpoint.
pub struct ClientCredentialsExchange {
    http: Client,
    token_url: Url,
    client_id: String,
    client_secret: String,
    scopes: Vec<String>,
}

impl std::fmt::Debug for ClientCredentialsExchange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientCredentialsExchange")
            .field("token_url", &self.token_url.as_str())
            .field("client_id", &self.client_id)
            .field("scopes", &self.scopes)
            .finish_non_exhaustive()
    }
}

impl ClientCredentialsExchange {
    /// Creates an exchange for the given credentials.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::ConfigurationError`] if the token URL cannot be built.
    pub fn new(http: Client, credentials: &BearerCredentials) -> Result<Self> {
        let host = credentials.token_host.as_deref().unwrap_or(DEFAULT_TOKEN_HOST);
        let token_url = Url::parse(&format!("{}{TOKEN_PATH}", host.trim_end_matches('/')))
            .map_err(|e| BridgeError::ConfigurationError(format!("invalid token host: {e}")))?;

        Ok(Self {
            http,
            token_url,
            client_id: credentials.client_id.clone(),
            client_secret: credentials.client_secret.clone(),
            scopes: credentials.scopes.clone(),
        })
    }

    /// Token endpoint URL.
    #[must_use]
    pub fn token_url(&self) -> &Url {
        &self.token_url
    }

    /// Exchanges the client credentials for a new access token.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::AuthError`] for any failure: transport, non-2xx
    /// status, or a response without `access_token`.
    #[instrument(skip(self), fields(token_url = %self.token_url))]
    pub async fn exchange(&self) -> Result<AccessToken> {
        let scope = self.scopes.join(",");
        let mut form: Vec<(&str, &str)> = vec![
            ("grant_type", "client_credentials"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
        ];
        if !scope.is_empty() {
            form.push(("scope", scope.as_str()));
        }

        let response = self
            .http
            .post(self.token_url.clone())
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&form)
            .send()
            .await
            .map_err(|e| BridgeError::AuthError(format!("token request failed: {e}")))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| BridgeError::AuthError(format!("token response unreadable: {e}")))?;

        if !status.is_success() {
            let detail = serde_json::from_slice::<TokenErrorResponse>(&body)
                .ok()
                .and_then(|e| e.error_description.or(e.error))
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown error").to_owned());
            return Err(BridgeError::AuthError(format!(
                "token endpoint returned status code {}: {detail}",
                status.as_u16()
            )));
        }

        let token: TokenResponse = serde_json::from_slice(&body)
            .map_err(|e| BridgeError::AuthError(format!("malformed token response: {e}")))?;
        let expires_in = token.expires_in.unwrap_or(DEFAULT_EXPIRES_IN_SECS);

        info!(expires_in, "acquired bearer token");
        Ok(AccessToken::new(token.access_token, Duration::from_secs(expires_in)))
    }
}

type SharedExchange = Shared<BoxFuture<'static, std::result::Result<AccessToken, String>>>;

#[derive(Default)]
struct InFlight {
    generation: u64,
    exchange: Option<SharedExchange>,
}

struct CacheState {
    exchange: ClientCredentialsExchange,
    token: RwLock<Option<AccessToken>>,
    in_flight: Mutex<InFlight>,
}

impl CacheState {
    async fn cached(&self) -> Option<AccessToken> {
        self.token.read().await.as_ref().filter(|token| token.is_fresh()).cloned()
    }

    /// Runs one exchange, publishes its token, and frees the in-flight slot.
    ///
    /// Only this task writes exchange results into the cache. Waiters just
    /// read the shared outcome.
    async fn refresh(self: Arc<Self>, generation: u64) -> std::result::Result<AccessToken, String> {
        let outcome = self.exchange.exchange().await.map_err(|e| e.to_string());

        if let Ok(token) = &outcome {
            *self.token.write().await = Some(token.clone());
        }

        let mut in_flight = self.in_flight.lock().await;
        if in_flight.generation == generation {
            in_flight.exchange = None;
        }
        outcome
    }
}

/// Single-flight cache for the bearer token.
///
/// Each exchange runs on its own task, so dropping every caller mid-flight
/// still leaves the cache consistent once the exchange settles.
pub struct TokenCache {
    state: Arc<CacheState>,
}

impl std::fmt::Debug for TokenCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCache").field("exchange", &self.state.exchange).finish_non_exhaustive()
    }
}

impl TokenCache {
    /// Creates an empty cache backed by `exchange`.
    #[must_use]
    pub fn new(exchange: ClientCredentialsExchange) -> Self {
        Self {
            state: Arc::new(CacheState {
                exchange,
                token: RwLock::new(None),
                in_flight: Mutex::new(InFlight::default()),
            }),
        }
    }

    /// Returns a fresh token, exchanging credentials if necessary.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::AuthError`] if the exchange fails. Every caller
    /// waiting on that exchange receives the same error.
    pub async fn token(&self) -> Result<AccessToken> {
        if let Some(token) = self.cached().await {
            return Ok(token);
        }

        let exchange = {
            let mut in_flight = self.state.in_flight.lock().await;

            // A refresh may have completed while we waited for the lock.
            if let Some(token) = self.cached().await {
                return Ok(token);
            }

            if let Some(exchange) = &in_flight.exchange {
                exchange.clone()
            } else {
                in_flight.generation += 1;
                let generation = in_flight.generation;
                let task = tokio::spawn(Arc::clone(&self.state).refresh(generation));
                let exchange: SharedExchange = async move {
                    task.await.unwrap_or_else(|e| Err(format!("token exchange task failed: {e}")))
                }
                .boxed()
                .shared();
                in_flight.exchange = Some(exchange.clone());
                debug!(generation, "starting token exchange");
                exchange
            }
        };

        exchange.await.map_err(|message| {
            warn!(error = %message, "token exchange failed");
            // Exchange errors already carry the "authentication failed" prefix.
            BridgeError::AuthError(
                message.strip_prefix("authentication failed: ").unwrap_or(&message).to_owned(),
            )
        })
    }

    /// Drops the cached token if it is still `rejected`.
    ///
    /// Called after the platform answers 401. A token that was already replaced
    /// by a concurrent refresh is left alone.
    pub async fn invalidate(&self, rejected: &str) {
        let mut slot = self.state.token.write().await;
        if slot.as_ref().is_some_and(|current| current.value() == rejected) {
            debug!("invalidating rejected bearer token");
            *slot = None;
        }
    }

    async fn cached(&self) -> Option<AccessToken> {
        self.state.cached().await
    }
}
