//! HTTP layer
//!
//! [`RequestExecutor`] is the only component that talks to resource
//! endpoints. It asks an [`AccessTokenProvider`](crate::auth::AccessTokenProvider)
//! for the `Authorization` header, sends one JSON request and either decodes
//! the body or returns a classified error.

pub mod executor;

pub use executor::{build_http_client, ExpectedStatus, RequestExecutor};
pub use reqwest::{Method, StatusCode};
