//! Error types shared by every Skyport client
//!
//! All failures surface as a [`ClientError`]. The variants map one-to-one onto
//! the failure kinds a caller has to tell apart:
//!
//! | Kind | Variant | Raised by |
//! |------|---------|-----------|
//! | Transport | [`ClientError::Transport`] | network, DNS, TLS, request timeout |
//! | Auth | [`ClientError::Auth`] | token exchange rejected or malformed |
//! | Api | [`ClientError::Api`] | non-success status from a resource endpoint |
//! | Decode | [`ClientError::Decode`] | success status but unparsable body |
//! | Timeout | [`ClientError::Timeout`] | poller deadline exceeded |
//! | Cancelled | [`ClientError::Cancelled`] | caller cancellation observed |
//!
//! [`ApiError`] carries the HTTP status and the vendor payload. Its
//! [`ApiErrorCategory`] is a pure function of the status code, so callers can
//! build their own retry policy on top of it; nothing in this crate retries.

use std::fmt;
use std::time::Duration;

use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// Result type alias for client operations
pub type ClientResult<T> = Result<T, ClientError>;

/// Coarse failure kind, independent of the variant payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Network, DNS, TLS or request-timeout failure
    Transport,
    /// Token exchange failed or returned something unusable
    Auth,
    /// Resource endpoint answered with an unaccepted status
    Api,
    /// Response body could not be decoded
    Decode,
    /// Request body could not be encoded
    Encode,
    /// Poller gave up waiting
    Timeout,
    /// Caller cancelled the operation
    Cancelled,
    /// Operation reached a terminal state other than success
    OperationFailed,
    /// Invalid client configuration
    Config,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Transport => "transport",
            Self::Auth => "auth",
            Self::Api => "api",
            Self::Decode => "decode",
            Self::Encode => "encode",
            Self::Timeout => "timeout",
            Self::Cancelled => "cancelled",
            Self::OperationFailed => "operation-failed",
            Self::Config => "config",
        };
        f.write_str(label)
    }
}

/// Top-level error returned by every client operation
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Authentication failed: {0}")]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Failed to decode response body (status {status}): {source}")]
    Decode {
        status: StatusCode,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("Timed out after {timeout:?} waiting for '{resource_id}'")]
    Timeout { resource_id: String, timeout: Duration },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Operation '{resource_id}' ended in state '{status}'{}", format_hints(.hints))]
    OperationFailed { resource_id: String, status: String, hints: Vec<String> },

    #[error("Configuration error: {0}")]
    Config(String),
}

fn format_hints(hints: &[String]) -> String {
    if hints.is_empty() {
        String::new()
    } else {
        format!(": {}", hints.join("; "))
    }
}

impl ClientError {
    /// Get the failure kind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Transport(_) => ErrorKind::Transport,
            Self::Auth(_) => ErrorKind::Auth,
            Self::Api(_) => ErrorKind::Api,
            Self::Decode { .. } => ErrorKind::Decode,
            Self::Encode(_) => ErrorKind::Encode,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::OperationFailed { .. } => ErrorKind::OperationFailed,
            Self::Config(_) => ErrorKind::Config,
        }
    }

    /// HTTP status attached to this error, when there is one
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Transport(err) => err.status(),
            Self::Auth(AuthError::Rejected { status, .. }) => Some(*status),
            Self::Api(err) => Some(err.status()),
            Self::Decode { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Vendor-supplied message, when the error body could be decoded
    pub fn vendor_message(&self) -> Option<&str> {
        match self {
            Self::Api(err) => err.message(),
            Self::Auth(AuthError::Rejected { message, .. }) => Some(message.as_str()),
            _ => None,
        }
    }

    /// Borrow the API error, if this is one
    pub fn as_api(&self) -> Option<&ApiError> {
        match self {
            Self::Api(err) => Some(err),
            _ => None,
        }
    }

    /// Whether a caller-side retry has a reasonable chance of succeeding
    ///
    /// Transport failures, rate limiting and server errors qualify. Nothing in
    /// this crate acts on it.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Api(err) => err.category().is_retryable(),
            _ => false,
        }
    }
}

/// Token exchange failures
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("API key is empty")]
    MissingApiKey,

    #[error("token endpoint returned {status}: {message}")]
    Rejected { status: StatusCode, message: String },

    #[error("malformed token response: {0}")]
    MalformedResponse(String),

    #[error("access token cannot be used as a header value")]
    InvalidHeaderValue,
}

/// Standard OAuth-style error body returned by token endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct TokenErrorBody {
    pub error: String,
    pub error_description: Option<String>,
}

impl fmt::Display for TokenErrorBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.error_description {
            Some(desc) => write!(f, "{}: {}", self.error, desc),
            None => write!(f, "{}", self.error),
        }
    }
}

/// Categories of API errors
///
/// Derived from the status code alone; exactly one category applies to any
/// given status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiErrorCategory {
    /// 400
    BadRequest,
    /// 401
    Unauthorized,
    /// 403
    Forbidden,
    /// 404
    NotFound,
    /// 409
    Conflict,
    /// 422
    Validation,
    /// 429
    RateLimited,
    /// 5xx
    Server,
    /// Any other 4xx
    Client,
    /// A 1xx/2xx/3xx status that the call site did not accept
    Unexpected,
}

impl ApiErrorCategory {
    /// Classify a status code
    pub fn from_status(status: StatusCode) -> Self {
        match status.as_u16() {
            400 => Self::BadRequest,
            401 => Self::Unauthorized,
            403 => Self::Forbidden,
            404 => Self::NotFound,
            409 => Self::Conflict,
            422 => Self::Validation,
            429 => Self::RateLimited,
            500..=599 => Self::Server,
            400..=499 => Self::Client,
            _ => Self::Unexpected,
        }
    }

    /// Returns true for rate limiting and server errors
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::RateLimited | Self::Server)
    }
}

impl fmt::Display for ApiErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadRequest => write!(f, "Bad Request"),
            Self::Unauthorized => write!(f, "Unauthorized"),
            Self::Forbidden => write!(f, "Forbidden"),
            Self::NotFound => write!(f, "Not Found"),
            Self::Conflict => write!(f, "Conflict"),
            Self::Validation => write!(f, "Validation Error"),
            Self::RateLimited => write!(f, "Rate Limited"),
            Self::Server => write!(f, "Server Error"),
            Self::Client => write!(f, "Client Error"),
            Self::Unexpected => write!(f, "Unexpected Status"),
        }
    }
}

/// Structured error payload returned by vendor resource endpoints
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct VendorErrorBody {
    #[serde(default, alias = "error_code", alias = "errorCode")]
    pub code: Option<String>,
    #[serde(default, alias = "detail", alias = "description")]
    pub message: Option<String>,
}

/// Non-success response from a resource endpoint
#[derive(Debug, Clone)]
pub struct ApiError {
    status: StatusCode,
    url: String,
    vendor: Option<VendorErrorBody>,
    body: String,
    retry_after: Option<Duration>,
}

impl ApiError {
    /// Build an API error from a raw response
    ///
    /// The vendor payload is decoded when the body is JSON with at least one
    /// of `code` / `message`; the raw body is kept either way.
    pub fn from_response(status: StatusCode, url: impl Into<String>, body: String) -> Self {
        let vendor = serde_json::from_str::<VendorErrorBody>(&body)
            .ok()
            .filter(|payload| payload.code.is_some() || payload.message.is_some());

        Self { status, url: url.into(), vendor, body, retry_after: None }
    }

    /// Attach a `Retry-After` hint parsed from response headers
    #[must_use]
    pub fn with_retry_after_from(mut self, headers: &HeaderMap) -> Self {
        self.retry_after = headers
            .get(RETRY_AFTER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<u64>().ok())
            .map(Duration::from_secs);
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Vendor error code, e.g. `VALIDATION_ERROR`
    pub fn code(&self) -> Option<&str> {
        self.vendor.as_ref().and_then(|v| v.code.as_deref())
    }

    /// Vendor error message
    pub fn message(&self) -> Option<&str> {
        self.vendor.as_ref().and_then(|v| v.message.as_deref())
    }

    /// Raw response body
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Server-suggested delay before retrying
    pub fn retry_after(&self) -> Option<Duration> {
        self.retry_after
    }

    pub fn category(&self) -> ApiErrorCategory {
        ApiErrorCategory::from_status(self.status)
    }

    pub fn is_bad_request(&self) -> bool {
        self.category() == ApiErrorCategory::BadRequest
    }

    pub fn is_unauthorized(&self) -> bool {
        self.category() == ApiErrorCategory::Unauthorized
    }

    pub fn is_forbidden(&self) -> bool {
        self.category() == ApiErrorCategory::Forbidden
    }

    pub fn is_not_found(&self) -> bool {
        self.category() == ApiErrorCategory::NotFound
    }

    pub fn is_conflict(&self) -> bool {
        self.category() == ApiErrorCategory::Conflict
    }

    pub fn is_validation(&self) -> bool {
        self.category() == ApiErrorCategory::Validation
    }

    pub fn is_rate_limited(&self) -> bool {
        self.category() == ApiErrorCategory::RateLimited
    }

    pub fn is_server_error(&self) -> bool {
        self.category() == ApiErrorCategory::Server
    }

    pub fn is_client_error(&self) -> bool {
        self.category() == ApiErrorCategory::Client
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} returned status {}", self.url, self.status)?;
        match (self.code(), self.message()) {
            (Some(code), Some(message)) => write!(f, ": {code}: {message}"),
            (None, Some(message)) => write!(f, ": {message}"),
            (Some(code), None) => write!(f, ": {code}"),
            (None, None) if !self.body.is_empty() => write!(f, ": {}", self.body),
            (None, None) => Ok(()),
        }
    }
}

impl std::error::Error for ApiError {}

#[cfg(test)]
mod tests {
    use reqwest::header::HeaderValue;

    use super::*;

    fn api_error(status: u16) -> ApiError {
        ApiError::from_response(
            StatusCode::from_u16(status).unwrap(),
            "https://api.test/resource",
            String::new(),
        )
    }

    fn predicates(err: &ApiError) -> [bool; 9] {
        [
            err.is_bad_request(),
            err.is_unauthorized(),
            err.is_forbidden(),
            err.is_not_found(),
            err.is_conflict(),
            err.is_validation(),
            err.is_rate_limited(),
            err.is_server_error(),
            err.is_client_error(),
        ]
    }

    #[test]
    fn test_category_per_status() {
        assert_eq!(api_error(400).category(), ApiErrorCategory::BadRequest);
        assert_eq!(api_error(401).category(), ApiErrorCategory::Unauthorized);
        assert_eq!(api_error(403).category(), ApiErrorCategory::Forbidden);
        assert_eq!(api_error(404).category(), ApiErrorCategory::NotFound);
        assert_eq!(api_error(409).category(), ApiErrorCategory::Conflict);
        assert_eq!(api_error(422).category(), ApiErrorCategory::Validation);
        assert_eq!(api_error(429).category(), ApiErrorCategory::RateLimited);
        assert_eq!(api_error(500).category(), ApiErrorCategory::Server);
        assert_eq!(api_error(503).category(), ApiErrorCategory::Server);
        assert_eq!(api_error(418).category(), ApiErrorCategory::Client);
        assert_eq!(api_error(200).category(), ApiErrorCategory::Unexpected);
        assert_eq!(api_error(302).category(), ApiErrorCategory::Unexpected);
    }

    #[test]
    fn test_classification_is_mutually_exclusive() {
        for status in [400, 401, 403, 404, 405, 409, 410, 422, 429, 500, 502, 599] {
            let err = api_error(status);
            let matching = predicates(&err).iter().filter(|hit| **hit).count();
            assert_eq!(matching, 1, "status {status} matched {matching} categories");
        }

        let not_found = api_error(404);
        assert!(not_found.is_not_found());
        assert!(!not_found.is_client_error());
        assert!(api_error(429).is_rate_limited());
        assert!(api_error(500).is_server_error());
    }

    #[test]
    fn test_vendor_payload_decoding() {
        let err = ApiError::from_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            "https://api.test/orders",
            r#"{"code":"VALIDATION_ERROR","message":"Invalid field"}"#.to_string(),
        );

        assert!(err.is_validation());
        assert_eq!(err.code(), Some("VALIDATION_ERROR"));
        assert_eq!(err.message(), Some("Invalid field"));
        assert_eq!(
            err.to_string(),
            "https://api.test/orders returned status 422 Unprocessable Entity: VALIDATION_ERROR: Invalid field"
        );
    }

    #[test]
    fn test_non_json_body_is_kept_raw() {
        let err = ApiError::from_response(
            StatusCode::BAD_GATEWAY,
            "https://api.test/orders",
            "upstream unavailable".to_string(),
        );

        assert_eq!(err.code(), None);
        assert_eq!(err.message(), None);
        assert_eq!(err.body(), "upstream unavailable");
        assert!(err.to_string().ends_with("upstream unavailable"));
    }

    #[test]
    fn test_unrelated_json_is_not_a_vendor_payload() {
        let err = ApiError::from_response(
            StatusCode::NOT_FOUND,
            "https://api.test/orders/1",
            r#"{"unexpected":true}"#.to_string(),
        );

        assert_eq!(err.code(), None);
        assert_eq!(err.message(), None);
    }

    #[test]
    fn test_retry_after_header() {
        let mut headers = HeaderMap::new();
        headers.insert(RETRY_AFTER, HeaderValue::from_static("42"));

        let err = api_error(429).with_retry_after_from(&headers);
        assert_eq!(err.retry_after(), Some(Duration::from_secs(42)));

        let no_hint = api_error(429).with_retry_after_from(&HeaderMap::new());
        assert_eq!(no_hint.retry_after(), None);
    }

    #[test]
    fn test_client_error_accessors() {
        let err = ClientError::from(ApiError::from_response(
            StatusCode::TOO_MANY_REQUESTS,
            "https://api.test/orders",
            r#"{"message":"slow down"}"#.to_string(),
        ));

        assert_eq!(err.kind(), ErrorKind::Api);
        assert_eq!(err.status(), Some(StatusCode::TOO_MANY_REQUESTS));
        assert_eq!(err.vendor_message(), Some("slow down"));
        assert!(err.is_retryable());

        let cancelled = ClientError::Cancelled;
        assert_eq!(cancelled.kind(), ErrorKind::Cancelled);
        assert_eq!(cancelled.status(), None);
        assert!(!cancelled.is_retryable());
    }

    #[test]
    fn test_operation_failed_display_includes_hints() {
        let err = ClientError::OperationFailed {
            resource_id: "ord-1".to_string(),
            status: "failed".to_string(),
            hints: vec!["cloud cover too high".to_string(), "retry later".to_string()],
        };

        assert_eq!(
            err.to_string(),
            "Operation 'ord-1' ended in state 'failed': cloud cover too high; retry later"
        );
    }
}
