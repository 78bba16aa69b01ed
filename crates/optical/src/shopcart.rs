//! Shopcart: collect catalog items, price them, submit as an order

use serde::{Deserialize, Serialize};
use serde_json::Value;
use skyport_common::http::Method;
use skyport_common::{CancellationToken, ClientResult, ExpectedStatus};

use crate::client::OpticalClient;
use crate::orders::Order;

/// Amount in a given currency
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Price {
    pub amount: f64,
    pub currency: String,
}

/// Body of `POST /shopcart/items`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShopcartItemRequest {
    /// Catalog scene identifier
    pub product_id: String,
    pub product_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_level: Option<String>,
    /// GeoJSON clip geometry; whole scene when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aoi: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ShopcartItem {
    pub id: String,
    pub product_id: String,
    #[serde(default)]
    pub product_type: Option<String>,
    #[serde(default)]
    pub price: Option<Price>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Shopcart {
    #[serde(default)]
    pub items: Vec<ShopcartItem>,
    #[serde(default)]
    pub total: Option<Price>,
}

impl Shopcart {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Body of `POST /pricing`; an empty list prices the whole shopcart
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PricingRequest {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub item_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PriceLine {
    pub item_id: String,
    pub price: Price,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Quote {
    pub total: Price,
    #[serde(default)]
    pub lines: Vec<PriceLine>,
}

/// Body of `POST /shopcart/submit`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SubmitShopcartRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_reference: Option<String>,
    /// Delivery format, e.g. `geotiff`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_format: Option<String>,
}

impl OpticalClient {
    /// Add an item to the shopcart (`201 Created`)
    ///
    /// # Errors
    /// Any [`skyport_common::ClientError`] from the request executor.
    pub async fn add_shopcart_item(
        &self,
        cancel: &CancellationToken,
        item: &ShopcartItemRequest,
    ) -> ClientResult<ShopcartItem> {
        let url = self.executor.resource_url(&["shopcart", "items"])?;
        self.executor.post(cancel, url, item, ExpectedStatus::CREATED).await
    }

    /// # Errors
    /// Any [`skyport_common::ClientError`] from the request executor.
    pub async fn get_shopcart(&self, cancel: &CancellationToken) -> ClientResult<Shopcart> {
        let url = self.executor.resource_url(&["shopcart"])?;
        self.executor.get(cancel, url).await
    }

    /// Remove an item (`204 No Content`)
    ///
    /// # Errors
    /// Any [`skyport_common::ClientError`] from the request executor; a
    /// missing item is a not-found API error.
    pub async fn remove_shopcart_item(
        &self,
        cancel: &CancellationToken,
        item_id: &str,
    ) -> ClientResult<()> {
        let url = self.executor.resource_url(&["shopcart", "items", item_id])?;
        self.executor
            .execute_empty::<()>(cancel, Method::DELETE, url, None, ExpectedStatus::NO_CONTENT)
            .await
    }

    /// Quote the shopcart without submitting it
    ///
    /// # Errors
    /// Any [`skyport_common::ClientError`] from the request executor.
    pub async fn price_shopcart(
        &self,
        cancel: &CancellationToken,
        request: &PricingRequest,
    ) -> ClientResult<Quote> {
        let url = self.executor.resource_url(&["pricing"])?;
        self.executor.post(cancel, url, request, ExpectedStatus::OK).await
    }

    /// Turn the shopcart into an order (`201 Created`)
    ///
    /// The shopcart is emptied server-side. Track the order with
    /// [`wait_for_delivery`](Self::wait_for_delivery).
    ///
    /// # Errors
    /// Any [`skyport_common::ClientError`] from the request executor.
    pub async fn submit_shopcart(
        &self,
        cancel: &CancellationToken,
        request: &SubmitShopcartRequest,
    ) -> ClientResult<Order> {
        let url = self.executor.resource_url(&["shopcart", "submit"])?;
        self.executor.post(cancel, url, request, ExpectedStatus::CREATED).await
    }
}
