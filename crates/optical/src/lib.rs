//! Client for the Skyport optical imagery ordering API.
//!
//! Catalog scenes are added to a shopcart, priced and submitted as an order;
//! the order is then tracked until delivery.
//!
//! ```no_run
//! use skyport_optical::{OpticalClient, ShopcartItemRequest, SubmitShopcartRequest};
//! use skyport_common::CancellationToken;
//!
//! # async fn example() -> skyport_common::ClientResult<()> {
//! let client = OpticalClient::new("my-api-key")?;
//! let cancel = CancellationToken::new();
//!
//! client
//!     .add_shopcart_item(&cancel, &ShopcartItemRequest {
//!         product_id: "scene-123".to_string(),
//!         product_type: "ortho".to_string(),
//!         processing_level: None,
//!         aoi: None,
//!     })
//!     .await?;
//! let order = client.submit_shopcart(&cancel, &SubmitShopcartRequest::default()).await?;
//! let delivered = client.wait_for_delivery(&cancel, &order.id, None).await?;
//! println!("{} deliveries", delivered.deliveries.len());
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

pub mod client;
pub mod config;
pub mod orders;
pub mod shopcart;

pub use client::OpticalClient;
pub use orders::{Delivery, ListOrdersQuery, Order, OrderStatus};
pub use shopcart::{
    Price, PriceLine, PricingRequest, Quote, Shopcart, ShopcartItem, ShopcartItemRequest,
    SubmitShopcartRequest,
};
