//! API-key to bearer-token exchange with lazy refresh
//!
//! Manages the token lifecycle for one client instance:
//! - Exchanges the API key at the token endpoint on first use
//! - Re-exchanges once the credential is within the refresh skew of expiry
//! - Formats the `Authorization` header with the vendor's scheme word
//!
//! The credential lock is never held across the exchange. Without
//! single-flight, N callers that observe an expired credential at the same
//! time each run their own exchange; the last one to finish wins.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::header::{HeaderValue, ACCEPT, USER_AGENT};
use reqwest::StatusCode;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::credential::{Credential, CredentialStore};
use super::scheme::{ApiKey, AuthScheme};
use crate::error::{AuthError, ClientError, ClientResult, TokenErrorBody};
use crate::time::{Clock, SystemClock};

/// Refresh this long before the server-declared expiry
pub const DEFAULT_REFRESH_SKEW: Duration = Duration::from_secs(300);

const GRANT_TYPE: &str = "api_key";

/// Token endpoint success body
///
/// `token_type` and `scope` may also be present; neither affects the header.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
}

/// Exchanges an API key for short-lived tokens and keeps one cached
pub struct TokenAuthenticator {
    http: reqwest::Client,
    token_url: Url,
    api_key: ApiKey,
    client_id: String,
    scheme: AuthScheme,
    refresh_skew: Duration,
    store: CredentialStore,
    clock: Arc<dyn Clock>,
    refresh_guard: Option<tokio::sync::Mutex<()>>,
    request_timeout: Option<Duration>,
    user_agent: Option<HeaderValue>,
}

impl std::fmt::Debug for TokenAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenAuthenticator")
            .field("token_url", &self.token_url.as_str())
            .field("client_id", &self.client_id)
            .field("scheme", &self.scheme)
            .field("refresh_skew", &self.refresh_skew)
            .field("single_flight", &self.refresh_guard.is_some())
            .field("request_timeout", &self.request_timeout)
            .finish_non_exhaustive()
    }
}

impl TokenAuthenticator {
    /// Start building an authenticator
    ///
    /// # Arguments
    /// * `http` - Client used for the token exchange
    /// * `token_url` - Token endpoint
    /// * `api_key` - Long-lived key sent as `apikey`
    pub fn builder(
        http: reqwest::Client,
        token_url: Url,
        api_key: impl Into<ApiKey>,
    ) -> TokenAuthenticatorBuilder {
        TokenAuthenticatorBuilder {
            http,
            token_url,
            api_key: api_key.into(),
            client_id: String::new(),
            scheme: AuthScheme::Bearer,
            refresh_skew: DEFAULT_REFRESH_SKEW,
            clock: Arc::new(SystemClock),
            single_flight: false,
            request_timeout: None,
            user_agent: None,
        }
    }

    /// Make sure a usable credential is installed and return it
    ///
    /// Returns the cached credential when it is still outside the refresh
    /// skew; otherwise performs one token exchange and returns the credential
    /// it installed. The returned copy stays valid for the caller even if the
    /// store is invalidated afterwards.
    ///
    /// # Errors
    /// - [`ClientError::Transport`] if the token endpoint is unreachable
    /// - [`ClientError::Auth`] if the endpoint rejects the key or answers
    ///   with an unusable body
    /// - [`ClientError::Cancelled`] if `cancel` fires first
    ///
    /// The previous credential is left untouched on any failure.
    pub async fn ensure_valid(&self, cancel: &CancellationToken) -> ClientResult<Credential> {
        if let Some(credential) = self.store.usable(self.clock.now(), self.refresh_skew) {
            return Ok(credential);
        }

        let Some(guard) = &self.refresh_guard else {
            return self.refresh(cancel).await;
        };

        let _permit = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(ClientError::Cancelled),
            permit = guard.lock() => permit,
        };

        if let Some(credential) = self.store.usable(self.clock.now(), self.refresh_skew) {
            debug!("credential refreshed by a concurrent caller");
            return Ok(credential);
        }

        self.refresh(cancel).await
    }

    /// `Authorization` header value for `credential`
    ///
    /// # Errors
    /// Returns [`AuthError::InvalidHeaderValue`] if the token cannot be
    /// placed in a header.
    pub fn header_value(&self, credential: &Credential) -> ClientResult<HeaderValue> {
        Ok(self.scheme.header_value(credential.token())?)
    }

    /// Drop the cached credential so the next call re-exchanges
    ///
    /// Useful after a resource endpoint answered 401 for a token that has
    /// been revoked server-side.
    pub fn invalidate(&self) {
        self.store.clear();
        debug!("credential invalidated");
    }

    /// Expiry of the installed credential, `None` before the first exchange
    pub fn credential_expiry(&self) -> Option<DateTime<Utc>> {
        let credential = self.store.snapshot();
        (!credential.is_empty()).then(|| credential.expires_at())
    }

    pub fn scheme(&self) -> &AuthScheme {
        &self.scheme
    }

    #[instrument(skip_all, fields(token_url = %self.token_url))]
    async fn refresh(&self, cancel: &CancellationToken) -> ClientResult<Credential> {
        if self.api_key.is_empty() {
            return Err(AuthError::MissingApiKey.into());
        }

        let credential = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(ClientError::Cancelled),
            result = self.exchange() => result?,
        };

        let expires_at = credential.expires_at();
        self.store.install(credential.clone());
        info!(%expires_at, "access token refreshed");
        Ok(credential)
    }

    async fn exchange(&self) -> ClientResult<Credential> {
        let params = [
            ("apikey", self.api_key.expose()),
            ("grant_type", GRANT_TYPE),
            ("client_id", self.client_id.as_str()),
        ];

        debug!("exchanging API key for access token");

        let mut request =
            self.http.post(self.token_url.clone()).header(ACCEPT, "application/json").form(&params);
        if let Some(user_agent) = &self.user_agent {
            request = request.header(USER_AGENT, user_agent.clone());
        }
        if let Some(timeout) = self.request_timeout {
            request = request.timeout(timeout);
        }

        let response = request
            .send()
            .await
            .map_err(|err| {
                warn!(error = %err, "token endpoint unreachable");
                ClientError::Transport(err)
            })?;

        let status = response.status();
        let body = response.text().await?;

        if status != StatusCode::OK {
            let message = serde_json::from_str::<TokenErrorBody>(&body)
                .map(|err| err.to_string())
                .unwrap_or_else(|_| status.to_string());
            warn!(%status, %message, "token exchange rejected");
            return Err(AuthError::Rejected { status, message }.into());
        }

        let parsed: TokenResponse = serde_json::from_str(&body)
            .map_err(|err| AuthError::MalformedResponse(err.to_string()))?;

        let token = parsed
            .access_token
            .filter(|token| !token.is_empty())
            .ok_or_else(|| AuthError::MalformedResponse("missing access_token".to_string()))?;
        let expires_in = parsed
            .expires_in
            .ok_or_else(|| AuthError::MalformedResponse("missing expires_in".to_string()))?;

        Ok(Credential::issued_at(token, self.clock.now(), expires_in))
    }
}

/// Builder for [`TokenAuthenticator`]
pub struct TokenAuthenticatorBuilder {
    http: reqwest::Client,
    token_url: Url,
    api_key: ApiKey,
    client_id: String,
    scheme: AuthScheme,
    refresh_skew: Duration,
    clock: Arc<dyn Clock>,
    single_flight: bool,
    request_timeout: Option<Duration>,
    user_agent: Option<HeaderValue>,
}

impl TokenAuthenticatorBuilder {
    /// Fixed `client_id` form field expected by the vendor
    #[must_use]
    pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = client_id.into();
        self
    }

    #[must_use]
    pub fn scheme(mut self, scheme: AuthScheme) -> Self {
        self.scheme = scheme;
        self
    }

    #[must_use]
    pub fn refresh_skew(mut self, skew: Duration) -> Self {
        self.refresh_skew = skew;
        self
    }

    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Coalesce concurrent refreshes into a single exchange
    #[must_use]
    pub fn single_flight(mut self, enabled: bool) -> Self {
        self.single_flight = enabled;
        self
    }

    /// Timeout applied to each exchange, on top of whatever the HTTP client
    /// itself enforces
    #[must_use]
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// `User-Agent` sent with each exchange
    #[must_use]
    pub fn user_agent(mut self, user_agent: HeaderValue) -> Self {
        self.user_agent = Some(user_agent);
        self
    }

    pub fn build(self) -> TokenAuthenticator {
        TokenAuthenticator {
            http: self.http,
            token_url: self.token_url,
            api_key: self.api_key,
            client_id: self.client_id,
            scheme: self.scheme,
            refresh_skew: self.refresh_skew,
            store: CredentialStore::new(),
            clock: self.clock,
            refresh_guard: self.single_flight.then(|| tokio::sync::Mutex::new(())),
            request_timeout: self.request_timeout,
            user_agent: self.user_agent,
        }
    }
}
