//! Imaging-window (feasibility) searches
//!
//! A search computes when the constellation could image an area. Searches
//! settle within minutes, so waits default to [`WaitOptions::fast`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use skyport_common::{
    wait_for_success, CancellationToken, ClientResult, ExpectedStatus, OperationStatus,
    TrackedOperation, WaitOptions,
};

use crate::client::RadarClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStatus {
    Queued,
    Processing,
    Completed,
    Failed,
}

impl OperationStatus for SearchStatus {
    fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    fn is_success(&self) -> bool {
        matches!(self, Self::Completed)
    }

    fn label(&self) -> &str {
        match self {
            Self::Queued => "queued",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

/// Body of `POST /feasibility/searches`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImagingWindowSearchRequest {
    /// GeoJSON geometry of the area of interest
    pub geometry: Value,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    pub product_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_off_nadir_deg: Option<f64>,
}

/// One opportunity to image the requested area
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ImagingWindow {
    pub id: String,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    #[serde(default)]
    pub off_nadir_deg: Option<f64>,
    #[serde(default)]
    pub satellite: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ImagingWindowSearch {
    pub id: String,
    pub status: SearchStatus,
    #[serde(default)]
    pub windows: Vec<ImagingWindow>,
    #[serde(default)]
    pub errors: Vec<String>,
}

impl TrackedOperation for ImagingWindowSearch {
    type Status = SearchStatus;

    fn id(&self) -> &str {
        &self.id
    }

    fn status(&self) -> &SearchStatus {
        &self.status
    }

    fn diagnostics(&self) -> Vec<String> {
        self.errors.clone()
    }
}

impl RadarClient {
    /// Start an imaging-window search (`202 Accepted`)
    ///
    /// # Errors
    /// Any [`skyport_common::ClientError`] from the request executor.
    pub async fn search_imaging_windows(
        &self,
        cancel: &CancellationToken,
        request: &ImagingWindowSearchRequest,
    ) -> ClientResult<ImagingWindowSearch> {
        let url = self.executor.resource_url(&["feasibility", "searches"])?;
        self.executor.post(cancel, url, request, ExpectedStatus::ACCEPTED).await
    }

    /// Fetch a search and whatever windows it has found so far
    ///
    /// # Errors
    /// Any [`skyport_common::ClientError`] from the request executor.
    pub async fn get_imaging_window_search(
        &self,
        cancel: &CancellationToken,
        search_id: &str,
    ) -> ClientResult<ImagingWindowSearch> {
        let url = self.executor.resource_url(&["feasibility", "searches", search_id])?;
        self.executor.get(cancel, url).await
    }

    /// Wait for a search to complete and return its windows
    ///
    /// # Errors
    /// Fetch errors, timeout, cancellation, or
    /// [`skyport_common::ClientError::OperationFailed`] if the search failed.
    pub async fn wait_for_imaging_windows(
        &self,
        cancel: &CancellationToken,
        search_id: &str,
        options: Option<WaitOptions>,
    ) -> ClientResult<Vec<ImagingWindow>> {
        let options = options.unwrap_or_else(WaitOptions::fast);
        let search = wait_for_success(cancel, search_id, options, || {
            self.get_imaging_window_search(cancel, search_id)
        })
        .await?;
        Ok(search.windows)
    }
}
