//! Tasking orders
//!
//! A tasking order asks the constellation to acquire an area during a time
//! window. Orders are accepted asynchronously and can take hours to reach a
//! terminal state, so the wait helpers default to
//! [`WaitOptions::long_running`].

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use skyport_common::pagination::with_query;
use skyport_common::{
    paginate, wait_for_success, wait_for_terminal, CancellationToken, ClientResult,
    ExpectedStatus, HalLinks, ItemStream, OperationStatus, TrackedOperation, WaitOptions,
};

use crate::client::RadarClient;

/// Tasking order lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskingStatus {
    Submitted,
    Accepted,
    Scheduled,
    Acquiring,
    Completed,
    Failed,
    Cancelled,
    Rejected,
}

impl TaskingStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Submitted => "submitted",
            Self::Accepted => "accepted",
            Self::Scheduled => "scheduled",
            Self::Acquiring => "acquiring",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
            Self::Rejected => "rejected",
        }
    }
}

impl OperationStatus for TaskingStatus {
    fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled | Self::Rejected)
    }

    fn is_success(&self) -> bool {
        matches!(self, Self::Completed)
    }

    fn label(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for TaskingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of `POST /tasking/orders`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskingOrderRequest {
    pub name: String,
    /// GeoJSON geometry of the area of interest
    pub geometry: Value,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    pub product_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imaging_mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
}

/// A tasking order as returned by the API
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TaskingOrder {
    pub id: String,
    pub status: TaskingStatus,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub window_start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub window_end: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    /// Reasons given for a rejected or failed order
    #[serde(default)]
    pub status_reasons: Vec<String>,
}

impl TrackedOperation for TaskingOrder {
    type Status = TaskingStatus;

    fn id(&self) -> &str {
        &self.id
    }

    fn status(&self) -> &TaskingStatus {
        &self.status
    }

    fn diagnostics(&self) -> Vec<String> {
        self.status_reasons.clone()
    }
}

/// Filters for listing tasking orders
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListTaskingOrdersQuery {
    pub status: Option<TaskingStatus>,
    pub created_after: Option<DateTime<Utc>>,
    pub page_size: Option<u32>,
}

impl ListTaskingOrdersQuery {
    fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(status) = self.status {
            pairs.push(("status", status.as_str().to_string()));
        }
        if let Some(created_after) = self.created_after {
            pairs.push(("created_after", created_after.to_rfc3339()));
        }
        if let Some(page_size) = self.page_size {
            pairs.push(("page_size", page_size.to_string()));
        }
        pairs
    }
}

#[derive(Serialize)]
struct StatusPatch {
    status: TaskingStatus,
}

impl RadarClient {
    /// Submit a new tasking order (`201 Created`)
    ///
    /// # Errors
    /// Any [`skyport_common::ClientError`] from the request executor.
    pub async fn submit_tasking_order(
        &self,
        cancel: &CancellationToken,
        request: &TaskingOrderRequest,
    ) -> ClientResult<TaskingOrder> {
        let url = self.executor.resource_url(&["tasking", "orders"])?;
        self.executor.post(cancel, url, request, ExpectedStatus::CREATED).await
    }

    /// Fetch one tasking order
    ///
    /// # Errors
    /// Any [`skyport_common::ClientError`] from the request executor.
    pub async fn get_tasking_order(
        &self,
        cancel: &CancellationToken,
        order_id: &str,
    ) -> ClientResult<TaskingOrder> {
        let url = self.executor.resource_url(&["tasking", "orders", order_id])?;
        self.executor.get(cancel, url).await
    }

    /// Ask the provider to cancel an order
    ///
    /// The returned order may still be in a non-terminal state; the
    /// cancellation is confirmed asynchronously.
    ///
    /// # Errors
    /// Any [`skyport_common::ClientError`] from the request executor.
    pub async fn cancel_tasking_order(
        &self,
        cancel: &CancellationToken,
        order_id: &str,
    ) -> ClientResult<TaskingOrder> {
        let url = self.executor.resource_url(&["tasking", "orders", order_id])?;
        self.executor.patch(cancel, url, &StatusPatch { status: TaskingStatus::Cancelled }).await
    }

    /// Stream all tasking orders matching `query`
    ///
    /// Pages are fetched lazily as the stream is consumed.
    ///
    /// # Errors
    /// Returns [`skyport_common::ClientError::Config`] if the list URL cannot
    /// be built; fetch errors are yielded by the stream.
    pub fn list_tasking_orders(
        &self,
        cancel: &CancellationToken,
        query: &ListTaskingOrdersQuery,
    ) -> ClientResult<ItemStream<TaskingOrder>> {
        let first = with_query(self.executor.resource_url(&["tasking", "orders"])?, query.pairs());
        Ok(paginate::<HalLinks<TaskingOrder>>(self.executor.clone(), cancel.clone(), first))
    }

    /// Wait until the order reaches any terminal status
    ///
    /// # Errors
    /// Fetch errors, [`skyport_common::ClientError::Timeout`] or
    /// [`skyport_common::ClientError::Cancelled`].
    pub async fn wait_for_tasking_order(
        &self,
        cancel: &CancellationToken,
        order_id: &str,
        options: Option<WaitOptions>,
    ) -> ClientResult<TaskingOrder> {
        let options = options.unwrap_or_else(WaitOptions::long_running);
        wait_for_terminal(cancel, order_id, options, || self.get_tasking_order(cancel, order_id))
            .await
    }

    /// Wait until the order completes
    ///
    /// # Errors
    /// Everything [`wait_for_tasking_order`](Self::wait_for_tasking_order)
    /// returns, plus [`skyport_common::ClientError::OperationFailed`] if the
    /// order ends failed, cancelled or rejected.
    pub async fn wait_for_tasking_order_completion(
        &self,
        cancel: &CancellationToken,
        order_id: &str,
        options: Option<WaitOptions>,
    ) -> ClientResult<TaskingOrder> {
        let options = options.unwrap_or_else(WaitOptions::long_running);
        wait_for_success(cancel, order_id, options, || self.get_tasking_order(cancel, order_id))
            .await
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_terminal_statuses() {
        let terminal = [
            TaskingStatus::Completed,
            TaskingStatus::Failed,
            TaskingStatus::Cancelled,
            TaskingStatus::Rejected,
        ];
        for status in terminal {
            assert!(status.is_terminal(), "{status} should be terminal");
        }
        for status in [
            TaskingStatus::Submitted,
            TaskingStatus::Accepted,
            TaskingStatus::Scheduled,
            TaskingStatus::Acquiring,
        ] {
            assert!(!status.is_terminal(), "{status} should not be terminal");
        }
        assert!(TaskingStatus::Completed.is_success());
        assert!(!TaskingStatus::Rejected.is_success());
    }

    #[test]
    fn test_order_decodes_with_minimal_fields() {
        let order: TaskingOrder =
            serde_json::from_str(r#"{"id":"to-1","status":"scheduled"}"#).unwrap();
        assert_eq!(order.status, TaskingStatus::Scheduled);
        assert!(order.status_reasons.is_empty());
    }

    #[test]
    fn test_query_pairs() {
        let query = ListTaskingOrdersQuery {
            status: Some(TaskingStatus::Acquiring),
            created_after: Some(Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap()),
            page_size: Some(50),
        };

        assert_eq!(
            query.pairs(),
            vec![
                ("status", "acquiring".to_string()),
                ("created_after", "2025-03-01T00:00:00+00:00".to_string()),
                ("page_size", "50".to_string()),
            ]
        );
        assert!(ListTaskingOrdersQuery::default().pairs().is_empty());
    }
}
