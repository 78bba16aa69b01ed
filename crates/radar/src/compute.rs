//! Compute orders
//!
//! Post-processing jobs run over acquired imagery (geocoding, change
//! detection and the like). The product and its parameters are opaque here.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use skyport_common::{
    wait_for_success, CancellationToken, ClientResult, ExpectedStatus, OperationStatus,
    TrackedOperation, WaitOptions,
};

use crate::client::RadarClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComputeStatus {
    Queued,
    Running,
    Succeeded,
    Failed,
    Cancelled,
}

impl OperationStatus for ComputeStatus {
    fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Cancelled)
    }

    fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded)
    }

    fn label(&self) -> &str {
        match self {
            Self::Queued => "queued",
            Self::Running => "running",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }
}

/// Body of `POST /compute/orders`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComputeOrderRequest {
    pub product: String,
    /// Tasking orders whose acquisitions are processed
    pub tasking_order_ids: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ComputeOrder {
    pub id: String,
    pub status: ComputeStatus,
    #[serde(default)]
    pub product: Option<String>,
    /// Download locations once the order succeeded
    #[serde(default)]
    pub outputs: Vec<String>,
    #[serde(default)]
    pub errors: Vec<String>,
}

impl TrackedOperation for ComputeOrder {
    type Status = ComputeStatus;

    fn id(&self) -> &str {
        &self.id
    }

    fn status(&self) -> &ComputeStatus {
        &self.status
    }

    fn diagnostics(&self) -> Vec<String> {
        self.errors.clone()
    }
}

impl RadarClient {
    /// Submit a compute order (`201 Created`)
    ///
    /// # Errors
    /// Any [`skyport_common::ClientError`] from the request executor.
    pub async fn submit_compute_order(
        &self,
        cancel: &CancellationToken,
        request: &ComputeOrderRequest,
    ) -> ClientResult<ComputeOrder> {
        let url = self.executor.resource_url(&["compute", "orders"])?;
        self.executor.post(cancel, url, request, ExpectedStatus::CREATED).await
    }

    /// # Errors
    /// Any [`skyport_common::ClientError`] from the request executor.
    pub async fn get_compute_order(
        &self,
        cancel: &CancellationToken,
        order_id: &str,
    ) -> ClientResult<ComputeOrder> {
        let url = self.executor.resource_url(&["compute", "orders", order_id])?;
        self.executor.get(cancel, url).await
    }

    /// Wait for a compute order to succeed
    ///
    /// Defaults to [`WaitOptions::long_running`].
    ///
    /// # Errors
    /// Fetch errors, timeout, cancellation, or
    /// [`skyport_common::ClientError::OperationFailed`] if the order failed or
    /// was cancelled.
    pub async fn wait_for_compute_order(
        &self,
        cancel: &CancellationToken,
        order_id: &str,
        options: Option<WaitOptions>,
    ) -> ClientResult<ComputeOrder> {
        let options = options.unwrap_or_else(WaitOptions::long_running);
        wait_for_success(cancel, order_id, options, || self.get_compute_order(cancel, order_id))
            .await
    }
}
