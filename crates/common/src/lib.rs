//! Shared client layer for Skyport vendor SDKs.
//!
//! Every vendor SDK is built from the same four pieces:
//! - [`auth`]: API-key exchange and skew-aware token refresh
//! - [`http`]: authenticated JSON request execution with typed errors
//! - [`poll`]: waiting on long-running operations
//! - [`pagination`]: lazy streams over linked pages
//!
//! Vendor crates only add endpoint bundles, wire types and operation
//! methods on top.
//!
//! # Features
//!
//! - `test-utils`: wiremock helpers, mock-server client config and tracing
//!   setup for downstream tests

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

// Foundation
// -----------------------------------------------------------------------
pub mod config;
pub mod error;
pub mod time;

// Client layer
// ---------------------------------------------------------------------
pub mod auth;
pub mod http;
pub mod pagination;
pub mod poll;

// Testing utilities
// ---------------------------------------------------------------
#[cfg(any(feature = "test-utils", test))]
pub mod testing;

// Re-export commonly used types and traits for convenience
// ------------------------
pub use auth::{AccessTokenProvider, ApiKey, AuthScheme, TokenAuthenticator};
pub use config::{ClientConfig, ClientConfigBuilder, EndpointSet, Endpoints};
pub use error::{
    ApiError, ApiErrorCategory, AuthError, ClientError, ClientResult, ErrorKind, VendorErrorBody,
};
pub use http::{ExpectedStatus, RequestExecutor};
pub use pagination::{paginate, FlatNext, HalLinks, ItemStream, Page, Paginated};
pub use poll::{
    wait_for_success, wait_for_terminal, wait_until_terminal, OperationStatus, PollState,
    TrackedOperation, WaitOptions,
};
pub use time::{Clock, MockClock, SystemClock};
pub use tokio_util::sync::CancellationToken;
