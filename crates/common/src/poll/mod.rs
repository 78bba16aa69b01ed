//! Long-running-operation poller
//!
//! Vendor operations (orders, searches, compute jobs) are accepted
//! asynchronously and then move through states until a terminal one. The
//! poller fetches immediately, then re-fetches every interval until the
//! resource is terminal, the deadline passes, the fetch fails or the caller
//! cancels.
//!
//! Terminal is not the same as successful: [`wait_until_terminal`] returns a
//! failed order just like a delivered one. Use [`wait_for_success`] to turn a
//! non-successful terminal state into [`ClientError::OperationFailed`].

use std::fmt;
use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{ClientError, ClientResult};

/// Poll interval and overall deadline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    pub interval: Duration,
    pub timeout: Duration,
}

impl WaitOptions {
    pub const fn new(interval: Duration, timeout: Duration) -> Self {
        Self { interval, timeout }
    }

    /// Searches and other operations that settle within minutes (5s / 5min)
    pub const fn fast() -> Self {
        Self::new(Duration::from_secs(5), Duration::from_secs(5 * 60))
    }

    /// Orders that may take up to a day (30s / 24h)
    pub const fn long_running() -> Self {
        Self::new(Duration::from_secs(30), Duration::from_secs(24 * 60 * 60))
    }

    #[must_use]
    pub const fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self::fast()
    }
}

/// Poller states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Polling,
    Terminal,
    TimedOut,
    Cancelled,
    FetchFailed,
}

impl PollState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Polling => "polling",
            Self::Terminal => "terminal",
            Self::TimedOut => "timed_out",
            Self::Cancelled => "cancelled",
            Self::FetchFailed => "fetch_failed",
        }
    }
}

impl fmt::Display for PollState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of a vendor operation
pub trait OperationStatus {
    fn is_terminal(&self) -> bool;

    /// Terminal and successful
    fn is_success(&self) -> bool;

    /// Wire name, used in logs and errors
    fn label(&self) -> &str;
}

/// A resource that can be waited on
pub trait TrackedOperation {
    type Status: OperationStatus;

    fn id(&self) -> &str;

    fn status(&self) -> &Self::Status;

    /// Vendor-supplied hints explaining a failed state
    fn diagnostics(&self) -> Vec<String> {
        Vec::new()
    }
}

/// Fetch until `is_terminal` holds
///
/// The first fetch happens immediately and always runs to completion.
/// Between fetches the poller sleeps for `options.interval`, clamped to the
/// deadline; later fetches are abandoned once the deadline passes, so the
/// wait never outlasts `options.timeout` by more than the first fetch.
///
/// # Errors
/// - The first error returned by `fetch`, unchanged
/// - [`ClientError::Timeout`] once the deadline has passed without a
///   terminal state
/// - [`ClientError::Cancelled`] as soon as `cancel` fires, even mid-sleep
pub async fn wait_until_terminal<T, F, Fut, P>(
    cancel: &CancellationToken,
    resource_id: &str,
    options: WaitOptions,
    mut fetch: F,
    is_terminal: P,
) -> ClientResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ClientResult<T>>,
    P: Fn(&T) -> bool,
{
    let started = Instant::now();
    let deadline = started.checked_add(options.timeout);
    let mut attempt: u32 = 0;

    loop {
        attempt += 1;
        if cancel.is_cancelled() {
            return Err(cancelled(resource_id, attempt));
        }
        debug!(resource_id, attempt, state = %PollState::Polling, "polling operation");

        // Only the first fetch may outlive the deadline.
        let fetched = match deadline.filter(|_| attempt > 1) {
            Some(deadline) => tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(cancelled(resource_id, attempt)),
                result = tokio::time::timeout_at(deadline, fetch()) => match result {
                    Ok(result) => result,
                    Err(_) => return Err(timed_out(resource_id, attempt, options)),
                },
            },
            None => tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(cancelled(resource_id, attempt)),
                result = fetch() => result,
            },
        };

        let resource = match fetched {
            Ok(resource) => resource,
            Err(err) => {
                warn!(
                    resource_id,
                    attempt,
                    state = %PollState::FetchFailed,
                    error = %err,
                    "poll fetch failed"
                );
                return Err(err);
            }
        };

        if is_terminal(&resource) {
            info!(
                resource_id,
                attempt,
                elapsed_ms = started.elapsed().as_millis() as u64,
                state = %PollState::Terminal,
                "operation reached a terminal state"
            );
            return Ok(resource);
        }

        let remaining = match deadline {
            Some(deadline) => match deadline.checked_duration_since(Instant::now()) {
                Some(remaining) if !remaining.is_zero() => remaining,
                _ => return Err(timed_out(resource_id, attempt, options)),
            },
            None => options.interval,
        };

        tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(cancelled(resource_id, attempt)),
            () = tokio::time::sleep(options.interval.min(remaining)) => {}
        }

        if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            return Err(timed_out(resource_id, attempt, options));
        }
    }
}

fn timed_out(resource_id: &str, attempt: u32, options: WaitOptions) -> ClientError {
    warn!(
        resource_id,
        attempt,
        state = %PollState::TimedOut,
        timeout = ?options.timeout,
        "gave up waiting for operation"
    );
    ClientError::Timeout { resource_id: resource_id.to_string(), timeout: options.timeout }
}

fn cancelled(resource_id: &str, attempt: u32) -> ClientError {
    debug!(resource_id, attempt, state = %PollState::Cancelled, "stopped polling on cancellation");
    ClientError::Cancelled
}

/// Wait for a [`TrackedOperation`] to reach any terminal status
///
/// # Errors
/// Same as [`wait_until_terminal`].
pub async fn wait_for_terminal<T, F, Fut>(
    cancel: &CancellationToken,
    resource_id: &str,
    options: WaitOptions,
    fetch: F,
) -> ClientResult<T>
where
    T: TrackedOperation,
    F: FnMut() -> Fut,
    Fut: Future<Output = ClientResult<T>>,
{
    wait_until_terminal(cancel, resource_id, options, fetch, |op: &T| op.status().is_terminal())
        .await
}

/// Wait for a [`TrackedOperation`] and require a successful terminal status
///
/// # Errors
/// Everything [`wait_until_terminal`] returns, plus
/// [`ClientError::OperationFailed`] carrying the operation's diagnostics when
/// it ends in a non-successful terminal status.
pub async fn wait_for_success<T, F, Fut>(
    cancel: &CancellationToken,
    resource_id: &str,
    options: WaitOptions,
    fetch: F,
) -> ClientResult<T>
where
    T: TrackedOperation,
    F: FnMut() -> Fut,
    Fut: Future<Output = ClientResult<T>>,
{
    let operation = wait_for_terminal(cancel, resource_id, options, fetch).await?;
    ensure_success(operation)
}

/// Turn a non-successful terminal operation into an error
///
/// # Errors
/// Returns [`ClientError::OperationFailed`] unless the status is a success.
pub fn ensure_success<T: TrackedOperation>(operation: T) -> ClientResult<T> {
    if operation.status().is_success() {
        return Ok(operation);
    }

    Err(ClientError::OperationFailed {
        resource_id: operation.id().to_string(),
        status: operation.status().label().to_string(),
        hints: operation.diagnostics(),
    })
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum JobStatus {
        Running,
        Done,
        Broken,
    }

    impl OperationStatus for JobStatus {
        fn is_terminal(&self) -> bool {
            !matches!(self, Self::Running)
        }

        fn is_success(&self) -> bool {
            matches!(self, Self::Done)
        }

        fn label(&self) -> &str {
            match self {
                Self::Running => "running",
                Self::Done => "done",
                Self::Broken => "broken",
            }
        }
    }

    #[derive(Debug, Clone)]
    struct Job {
        id: String,
        status: JobStatus,
    }

    impl TrackedOperation for Job {
        type Status = JobStatus;

        fn id(&self) -> &str {
            &self.id
        }

        fn status(&self) -> &JobStatus {
            &self.status
        }

        fn diagnostics(&self) -> Vec<String> {
            vec!["disk full".to_string()]
        }
    }

    fn job(status: JobStatus) -> Job {
        Job { id: "job-1".to_string(), status }
    }

    fn fast_options() -> WaitOptions {
        WaitOptions::new(Duration::from_millis(10), Duration::from_secs(5))
    }

    #[test]
    fn test_presets() {
        assert_eq!(WaitOptions::fast().interval, Duration::from_secs(5));
        assert_eq!(WaitOptions::fast().timeout, Duration::from_secs(300));
        assert_eq!(WaitOptions::long_running().interval, Duration::from_secs(30));
        assert_eq!(WaitOptions::long_running().timeout, Duration::from_secs(86_400));
    }

    #[tokio::test]
    async fn test_stops_on_terminal_status() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);

        let result = wait_for_terminal(&CancellationToken::new(), "job-1", fast_options(), || {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            async move { Ok(job(if n < 2 { JobStatus::Running } else { JobStatus::Broken })) }
        })
        .await
        .unwrap();

        assert_eq!(result.status, JobStatus::Broken);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_success_check_reports_failure_with_hints() {
        let err = wait_for_success(&CancellationToken::new(), "job-1", fast_options(), || async {
            Ok(job(JobStatus::Broken))
        })
        .await
        .unwrap_err();

        match err {
            ClientError::OperationFailed { resource_id, status, hints } => {
                assert_eq!(resource_id, "job-1");
                assert_eq!(status, "broken");
                assert_eq!(hints, vec!["disk full".to_string()]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fetch_error_is_returned_unchanged() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);

        let err = wait_for_terminal::<Job, _, _>(
            &CancellationToken::new(),
            "job-1",
            fast_options(),
            || {
                counter.fetch_add(1, Ordering::SeqCst);
                async { Err(ClientError::Config("boom".to_string())) }
            },
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ClientError::Config(msg) if msg == "boom"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_clamps_sleep() {
        let started = Instant::now();
        let options = WaitOptions::new(Duration::from_secs(60), Duration::from_secs(1));

        let err = wait_for_terminal(&CancellationToken::new(), "job-1", options, || async {
            Ok(job(JobStatus::Running))
        })
        .await
        .unwrap_err();

        assert!(matches!(err, ClientError::Timeout { ref resource_id, .. } if resource_id == "job-1"));
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_fetch_does_not_outlast_deadline() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let started = Instant::now();
        let options = WaitOptions::new(Duration::from_secs(10), Duration::from_millis(100));

        let err = wait_for_terminal(&CancellationToken::new(), "job-1", options, || {
            counter.fetch_add(1, Ordering::SeqCst);
            async {
                tokio::time::sleep(Duration::from_millis(80)).await;
                Ok(job(JobStatus::Running))
            }
        })
        .await
        .unwrap_err();

        assert!(matches!(err, ClientError::Timeout { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(started.elapsed() <= options.timeout);
    }

    #[tokio::test(start_paused = true)]
    async fn test_later_fetch_is_cut_off_at_deadline() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let started = Instant::now();
        let options = WaitOptions::new(Duration::from_millis(100), Duration::from_millis(250));

        let err = wait_for_terminal(&CancellationToken::new(), "job-1", options, || {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                if n > 0 {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                }
                Ok(job(JobStatus::Running))
            }
        })
        .await
        .unwrap_err();

        assert!(matches!(err, ClientError::Timeout { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(started.elapsed() <= options.timeout);
    }

    #[tokio::test]
    async fn test_pre_cancelled_does_not_fetch() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);

        let err = wait_for_terminal(&cancel, "job-1", fast_options(), || {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Ok(job(JobStatus::Done)) }
        })
        .await
        .unwrap_err();

        assert!(matches!(err, ClientError::Cancelled));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
