//! Imagery orders created from a submitted shopcart

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use skyport_common::pagination::with_query;
use skyport_common::{
    paginate, wait_for_success, wait_for_terminal, CancellationToken, ClientResult, FlatNext,
    ItemStream, OperationStatus, TrackedOperation, WaitOptions,
};

use crate::client::OpticalClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Created,
    Pending,
    Processing,
    Delivered,
    Failed,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Delivered => "delivered",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl OperationStatus for OrderStatus {
    fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered | Self::Failed | Self::Cancelled)
    }

    fn is_success(&self) -> bool {
        matches!(self, Self::Delivered)
    }

    fn label(&self) -> &str {
        self.as_str()
    }
}

/// One downloadable product of a delivered order
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Delivery {
    pub item_id: String,
    pub url: String,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Order {
    pub id: String,
    pub status: OrderStatus,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub customer_reference: Option<String>,
    #[serde(default)]
    pub deliveries: Vec<Delivery>,
    /// Processing messages; populated when an order fails
    #[serde(default, alias = "messages")]
    pub diagnostics: Vec<String>,
}

impl TrackedOperation for Order {
    type Status = OrderStatus;

    fn id(&self) -> &str {
        &self.id
    }

    fn status(&self) -> &OrderStatus {
        &self.status
    }

    fn diagnostics(&self) -> Vec<String> {
        self.diagnostics.clone()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListOrdersQuery {
    pub status: Option<OrderStatus>,
    pub customer_reference: Option<String>,
    pub limit: Option<u32>,
}

impl ListOrdersQuery {
    fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(status) = self.status {
            pairs.push(("status", status.to_string()));
        }
        if let Some(reference) = &self.customer_reference {
            pairs.push(("customer_reference", reference.clone()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.to_string()));
        }
        pairs
    }
}

impl OpticalClient {
    /// # Errors
    /// Any [`skyport_common::ClientError`] from the request executor.
    pub async fn get_order(
        &self,
        cancel: &CancellationToken,
        order_id: &str,
    ) -> ClientResult<Order> {
        let url = self.executor.resource_url(&["orders", order_id])?;
        self.executor.get(cancel, url).await
    }

    /// Stream orders matching `query`, following `next` links
    ///
    /// # Errors
    /// Returns [`skyport_common::ClientError::Config`] if the list URL cannot
    /// be built.
    pub fn list_orders(
        &self,
        cancel: &CancellationToken,
        query: &ListOrdersQuery,
    ) -> ClientResult<ItemStream<Order>> {
        let first = with_query(self.executor.resource_url(&["orders"])?, query.pairs());
        Ok(paginate::<FlatNext<Order>>(self.executor.clone(), cancel.clone(), first))
    }

    /// Wait for the order to be delivered, failed or cancelled
    ///
    /// # Errors
    /// Fetch errors, [`skyport_common::ClientError::Timeout`] or
    /// [`skyport_common::ClientError::Cancelled`].
    pub async fn wait_for_order(
        &self,
        cancel: &CancellationToken,
        order_id: &str,
        options: Option<WaitOptions>,
    ) -> ClientResult<Order> {
        let options = options.unwrap_or_else(WaitOptions::long_running);
        wait_for_terminal(cancel, order_id, options, || self.get_order(cancel, order_id)).await
    }

    /// Wait for delivery; a failed or cancelled order is an error carrying
    /// the order's diagnostics as hints
    ///
    /// # Errors
    /// Everything [`wait_for_order`](Self::wait_for_order) returns, plus
    /// [`skyport_common::ClientError::OperationFailed`].
    pub async fn wait_for_delivery(
        &self,
        cancel: &CancellationToken,
        order_id: &str,
        options: Option<WaitOptions>,
    ) -> ClientResult<Order> {
        let options = options.unwrap_or_else(WaitOptions::long_running);
        wait_for_success(cancel, order_id, options, || self.get_order(cancel, order_id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert!(OrderStatus::Delivered.is_success());
        assert!(OrderStatus::Failed.is_terminal());
        assert!(!OrderStatus::Failed.is_success());
        assert!(!OrderStatus::Processing.is_terminal());
        assert_eq!(OrderStatus::Pending.to_string(), "pending");
    }

    #[test]
    fn test_messages_alias_fills_diagnostics() {
        let order: Order = serde_json::from_str(
            r#"{"id":"o-7","status":"failed","messages":["scene no longer archived"]}"#,
        )
        .unwrap();
        assert_eq!(order.diagnostics, vec!["scene no longer archived".to_string()]);
        assert_eq!(TrackedOperation::diagnostics(&order), order.diagnostics);
        assert!(order.deliveries.is_empty());
    }

    #[test]
    fn test_query_pairs() {
        let query = ListOrdersQuery {
            status: Some(OrderStatus::Delivered),
            customer_reference: Some("proj 42".to_string()),
            limit: None,
        };
        assert_eq!(
            query.pairs(),
            vec![("status", "delivered".to_string()), ("customer_reference", "proj 42".to_string())]
        );
    }
}
