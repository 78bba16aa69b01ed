//! Client for the Skyport SAR tasking API.
//!
//! Covers tasking orders, imaging-window searches and compute orders.
//! Authentication, request execution, polling and pagination come from
//! [`skyport_common`].
//!
//! ```no_run
//! use skyport_radar::{RadarClient, TaskingStatus};
//! use skyport_common::CancellationToken;
//!
//! # async fn example() -> skyport_common::ClientResult<()> {
//! let client = RadarClient::new("my-api-key")?;
//! let cancel = CancellationToken::new();
//!
//! let order = client.wait_for_tasking_order_completion(&cancel, "to-123", None).await?;
//! assert_eq!(order.status, TaskingStatus::Completed);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

pub mod client;
pub mod compute;
pub mod config;
pub mod feasibility;
pub mod tasking;

pub use client::RadarClient;
pub use compute::{ComputeOrder, ComputeOrderRequest, ComputeStatus};
pub use feasibility::{ImagingWindow, ImagingWindowSearch, ImagingWindowSearchRequest, SearchStatus};
pub use tasking::{ListTaskingOrdersQuery, TaskingOrder, TaskingOrderRequest, TaskingStatus};
