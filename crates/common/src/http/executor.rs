//! Authenticated request execution
//!
//! One call = one authorization lookup, one HTTP exchange, one decode. The
//! executor never retries; classification of failures is left to
//! [`ClientError`] and [`ApiError`].

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::auth::{AccessTokenProvider, TokenAuthenticator};
use crate::config::{ClientConfig, Endpoints};
use crate::error::{ApiError, ClientError, ClientResult};

const JSON: &str = "application/json";

/// Which response statuses count as success for a call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpectedStatus {
    /// Exactly this status code
    Exact(StatusCode),
    /// Any 2xx
    AnySuccess,
}

impl ExpectedStatus {
    pub const OK: Self = Self::Exact(StatusCode::OK);
    pub const CREATED: Self = Self::Exact(StatusCode::CREATED);
    pub const ACCEPTED: Self = Self::Exact(StatusCode::ACCEPTED);
    pub const NO_CONTENT: Self = Self::Exact(StatusCode::NO_CONTENT);

    pub fn accepts(self, status: StatusCode) -> bool {
        match self {
            Self::Exact(expected) => status == expected,
            Self::AnySuccess => status.is_success(),
        }
    }
}

impl From<StatusCode> for ExpectedStatus {
    fn from(status: StatusCode) -> Self {
        Self::Exact(status)
    }
}

/// Build the HTTP client for a configuration
///
/// A caller-supplied client is used as-is; the executor still applies the
/// configured timeout and user agent on every request.
///
/// # Errors
/// Returns [`ClientError::Config`] if the client cannot be built.
pub fn build_http_client(config: &ClientConfig) -> ClientResult<reqwest::Client> {
    if let Some(client) = config.http_client() {
        return Ok(client.clone());
    }

    reqwest::Client::builder()
        .timeout(config.timeout())
        .user_agent(config.user_agent())
        .build()
        .map_err(|e| ClientError::Config(format!("Failed to build HTTP client: {e}")))
}

fn user_agent_header(config: &ClientConfig) -> ClientResult<HeaderValue> {
    HeaderValue::from_str(config.user_agent()).map_err(|e| {
        ClientError::Config(format!("Invalid user agent '{}': {e}", config.user_agent()))
    })
}

struct Inner {
    http: reqwest::Client,
    auth: Arc<dyn AccessTokenProvider>,
    endpoints: Endpoints,
    user_agent: HeaderValue,
    timeout: Duration,
}

/// Executes authenticated JSON requests against one vendor API
///
/// Cheap to clone; clones share the HTTP connection pool and credential.
#[derive(Clone)]
pub struct RequestExecutor {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for RequestExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestExecutor")
            .field("base_url", &self.inner.endpoints.base_url().as_str())
            .field("timeout", &self.inner.timeout)
            .finish_non_exhaustive()
    }
}

impl RequestExecutor {
    /// Create an executor over an existing HTTP client and token provider
    ///
    /// # Errors
    /// Returns [`ClientError::Config`] if the configured user agent is not a
    /// valid header value.
    pub fn new(
        config: &ClientConfig,
        http: reqwest::Client,
        auth: Arc<dyn AccessTokenProvider>,
    ) -> ClientResult<Self> {
        let user_agent = user_agent_header(config)?;

        Ok(Self {
            inner: Arc::new(Inner {
                http,
                auth,
                endpoints: config.endpoints().clone(),
                user_agent,
                timeout: config.timeout(),
            }),
        })
    }

    /// Wire up HTTP client, token authenticator and executor for a config
    ///
    /// The authenticator is returned too so callers can inspect or invalidate
    /// the credential.
    ///
    /// The token exchange gets the same timeout and user agent as resource
    /// requests, including over a caller-supplied HTTP client.
    ///
    /// # Errors
    /// Returns [`ClientError::Config`] if the HTTP client cannot be built or
    /// the user agent is not a valid header value.
    pub fn connect(config: &ClientConfig) -> ClientResult<(Self, Arc<TokenAuthenticator>)> {
        let http = build_http_client(config)?;
        let auth = Arc::new(
            TokenAuthenticator::builder(
                http.clone(),
                config.endpoints().token_url().clone(),
                config.api_key().clone(),
            )
            .client_id(config.client_id())
            .scheme(config.auth_scheme().clone())
            .refresh_skew(config.refresh_skew())
            .clock(config.clock())
            .single_flight(config.single_flight_refresh())
            .request_timeout(config.timeout())
            .user_agent(user_agent_header(config)?)
            .build(),
        );

        let executor = Self::new(config, http, Arc::clone(&auth) as Arc<dyn AccessTokenProvider>)?;
        Ok((executor, auth))
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.inner.endpoints
    }

    /// Resolve a resource path against the base URL
    ///
    /// # Errors
    /// Returns [`ClientError::Config`] if the result is not a valid URL.
    pub fn url(&self, path: &str) -> ClientResult<Url> {
        self.inner.endpoints.resolve(path)
    }

    /// Build a resource URL from path segments, percent-encoding each
    ///
    /// # Errors
    /// Returns [`ClientError::Config`] if the base URL cannot carry a path.
    pub fn resource_url<S: AsRef<str>>(&self, segments: &[S]) -> ClientResult<Url> {
        self.inner.endpoints.resource(segments)
    }

    /// Execute a request and decode the JSON response
    ///
    /// Bodies of 204/205 responses (and empty bodies) decode as JSON `null`,
    /// so `()` and `Option<T>` targets succeed on them.
    ///
    /// # Errors
    /// - [`ClientError::Cancelled`] if `cancel` fires before completion
    /// - [`ClientError::Auth`] / [`ClientError::Transport`] from authorization
    /// - [`ClientError::Encode`] if `body` cannot be serialized
    /// - [`ClientError::Transport`] for network failures and timeouts
    /// - [`ClientError::Api`] if the status is not accepted by `expected`
    /// - [`ClientError::Decode`] if an accepted body does not fit `T`
    #[instrument(skip_all, fields(method = %method, url = %url))]
    pub async fn execute<B, T>(
        &self,
        cancel: &CancellationToken,
        method: Method,
        url: Url,
        body: Option<&B>,
        expected: ExpectedStatus,
    ) -> ClientResult<T>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let payload = body.map(serde_json::to_vec).transpose().map_err(ClientError::Encode)?;

        let (status, bytes) = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(ClientError::Cancelled),
            result = self.send(cancel, method, url, payload, expected) => result?,
        };

        decode(status, &bytes)
    }

    /// Execute a request whose response body is irrelevant
    ///
    /// # Errors
    /// Same as [`execute`](Self::execute), minus decoding.
    pub async fn execute_empty<B>(
        &self,
        cancel: &CancellationToken,
        method: Method,
        url: Url,
        body: Option<&B>,
        expected: ExpectedStatus,
    ) -> ClientResult<()>
    where
        B: Serialize + ?Sized + Sync,
    {
        let payload = body.map(serde_json::to_vec).transpose().map_err(ClientError::Encode)?;

        tokio::select! {
            biased;
            () = cancel.cancelled() => Err(ClientError::Cancelled),
            result = self.send(cancel, method, url, payload, expected) => result.map(|_| ()),
        }
    }

    /// GET expecting `200 OK`
    pub async fn get<T: DeserializeOwned>(
        &self,
        cancel: &CancellationToken,
        url: Url,
    ) -> ClientResult<T> {
        self.execute::<(), T>(cancel, Method::GET, url, None, ExpectedStatus::OK).await
    }

    /// POST a JSON body
    pub async fn post<B, T>(
        &self,
        cancel: &CancellationToken,
        url: Url,
        body: &B,
        expected: ExpectedStatus,
    ) -> ClientResult<T>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        self.execute(cancel, Method::POST, url, Some(body), expected).await
    }

    /// PATCH a JSON body expecting `200 OK`
    pub async fn patch<B, T>(&self, cancel: &CancellationToken, url: Url, body: &B) -> ClientResult<T>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        self.execute(cancel, Method::PATCH, url, Some(body), ExpectedStatus::OK).await
    }

    /// PUT a JSON body expecting `200 OK`
    pub async fn put<B, T>(&self, cancel: &CancellationToken, url: Url, body: &B) -> ClientResult<T>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        self.execute(cancel, Method::PUT, url, Some(body), ExpectedStatus::OK).await
    }

    /// DELETE accepting any 2xx
    pub async fn delete(&self, cancel: &CancellationToken, url: Url) -> ClientResult<()> {
        self.execute_empty::<()>(cancel, Method::DELETE, url, None, ExpectedStatus::AnySuccess)
            .await
    }

    async fn send(
        &self,
        cancel: &CancellationToken,
        method: Method,
        url: Url,
        payload: Option<Vec<u8>>,
        expected: ExpectedStatus,
    ) -> ClientResult<(StatusCode, bytes::Bytes)> {
        let authorization = self.inner.auth.authorization(cancel).await?;

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, authorization);
        headers.insert(ACCEPT, HeaderValue::from_static(JSON));
        headers.insert(USER_AGENT, self.inner.user_agent.clone());

        let mut request = self
            .inner
            .http
            .request(method, url.clone())
            .timeout(self.inner.timeout)
            .headers(headers);
        if let Some(payload) = payload {
            request = request.header(CONTENT_TYPE, JSON).body(payload);
        }

        debug!("sending request");

        let response = request.send().await.map_err(|err| {
            warn!(error = %err, "request failed before a response arrived");
            ClientError::Transport(err)
        })?;

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.bytes().await?;

        if !expected.accepts(status) {
            let body = String::from_utf8_lossy(&bytes).into_owned();
            let err = ApiError::from_response(status, url.as_str(), body)
                .with_retry_after_from(&headers);
            warn!(
                %status,
                category = %err.category(),
                code = err.code().unwrap_or_default(),
                "API returned non-success status"
            );
            return Err(err.into());
        }

        debug!(%status, bytes = bytes.len(), "response received");
        Ok((status, bytes))
    }
}

fn decode<T: DeserializeOwned>(status: StatusCode, bytes: &[u8]) -> ClientResult<T> {
    let no_body = matches!(status, StatusCode::NO_CONTENT | StatusCode::RESET_CONTENT)
        || bytes.iter().all(u8::is_ascii_whitespace);

    let result = if no_body {
        serde_json::from_value(serde_json::Value::Null)
    } else {
        serde_json::from_slice(bytes)
    };

    result.map_err(|source| ClientError::Decode { status, source })
}
