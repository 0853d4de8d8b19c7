//! Job lifecycle polling.
//!
//! After create or commit the service works asynchronously. The poller
//! sleeps for a fixed interval, asks for the job status and stops at the
//! first terminal label (`SUCCEEDED` or `FAILED`). There is no iteration
//! cap; the cancellation token is the only bound on the total wait.

use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use optimum_types::{Job, JobStatus, Settings};

use crate::client::OptimumClient;
use crate::error::ClientError;

/// Source of job status snapshots.
#[async_trait]
pub trait StatusSource: Send + Sync {
    async fn status(&self, job: &Job) -> Result<JobStatus, ClientError>;
}

#[async_trait]
impl StatusSource for OptimumClient {
    async fn status(&self, job: &Job) -> Result<JobStatus, ClientError> {
        OptimumClient::status(self, job).await
    }
}

/// Fixed-interval poller driving a job to its terminal status.
#[derive(Debug, Clone)]
pub struct JobPoller<S: StatusSource = OptimumClient> {
    source: S,
    interval: Duration,
}

impl<S: StatusSource> JobPoller<S> {
    /// Create a poller asking `source` once per `interval`.
    pub fn new(source: S, interval: Duration) -> Self {
        Self { source, interval }
    }

    /// Create a poller using the configured poll interval.
    pub fn from_settings(source: S, settings: &Settings) -> Self {
        Self::new(source, settings.poll_interval())
    }

    /// Poll until the job reaches a terminal status and return it.
    ///
    /// `FAILED` is returned as `Ok`; interpreting the label is up to the
    /// caller.
    pub async fn wait(
        &self,
        job: &Job,
        cancel: &CancellationToken,
    ) -> Result<JobStatus, ClientError> {
        self.wait_with(job, cancel, |_| {}).await
    }

    /// Like `wait`, reporting every observed status to `observe`.
    pub async fn wait_with<F>(
        &self,
        job: &Job,
        cancel: &CancellationToken,
        mut observe: F,
    ) -> Result<JobStatus, ClientError>
    where
        F: FnMut(&JobStatus) + Send,
    {
        let mut polls: u64 = 0;

        loop {
            if cancel.is_cancelled() {
                return Err(self.cancelled(job, polls));
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(self.cancelled(job, polls)),
                _ = tokio::time::sleep(self.interval) => {}
            }

            if cancel.is_cancelled() {
                return Err(self.cancelled(job, polls));
            }

            let status = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(self.cancelled(job, polls)),
                r = self.source.status(job) => r?,
            };
            polls += 1;

            debug!(job = %job, polls, status = %status.status, "Polled job status");
            observe(&status);

            if status.is_terminal() {
                if status.is_succeeded() {
                    info!(job = %job, polls, "Job succeeded");
                } else {
                    warn!(job = %job, polls, reason = %status.reason, "Job failed");
                }
                return Ok(status);
            }
        }
    }

    fn cancelled(&self, job: &Job, polls: u64) -> ClientError {
        info!(job = %job, polls, "Job polling cancelled");
        ClientError::Cancelled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// Replays a fixed sequence of labels and counts calls.
    #[derive(Clone, Default)]
    struct Scripted {
        labels: Arc<Mutex<VecDeque<&'static str>>>,
        calls: Arc<AtomicUsize>,
    }

    impl Scripted {
        fn new(labels: &[&'static str]) -> Self {
            Self {
                labels: Arc::new(Mutex::new(labels.iter().copied().collect())),
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl StatusSource for Scripted {
        async fn status(&self, _job: &Job) -> Result<JobStatus, ClientError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let label = self.labels.lock().unwrap().pop_front().unwrap_or("PENDING");
            Ok(JobStatus {
                status: label.to_string(),
                ..Default::default()
            })
        }
    }

    fn job() -> Job {
        Job::new("/jobs/1")
    }

    #[tokio::test(start_paused = true)]
    async fn test_polls_until_succeeded() {
        let source = Scripted::new(&["PENDING", "PENDING", "SUCCEEDED"]);
        let poller = JobPoller::new(source.clone(), Duration::from_secs(20));

        let status = poller.wait(&job(), &CancellationToken::new()).await.unwrap();
        assert_eq!(status.status, "SUCCEEDED");
        assert_eq!(source.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stops_at_failed() {
        let source = Scripted::new(&["PENDING", "FAILED", "SUCCEEDED"]);
        let poller = JobPoller::new(source.clone(), Duration::from_secs(20));

        let status = poller.wait(&job(), &CancellationToken::new()).await.unwrap();
        assert_eq!(status.status, "FAILED");
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_and_empty_labels_keep_polling() {
        let source = Scripted::new(&["", "BUILDING", "succeeded", "SUCCEEDED"]);
        let poller = JobPoller::new(source.clone(), Duration::from_secs(1));

        let mut seen = Vec::new();
        let status = poller
            .wait_with(&job(), &CancellationToken::new(), |s| {
                seen.push(s.status.clone())
            })
            .await
            .unwrap();
        assert!(status.is_succeeded());
        assert_eq!(seen, vec!["", "BUILDING", "succeeded", "SUCCEEDED"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sleeps_before_each_poll() {
        let source = Scripted::new(&["PENDING", "SUCCEEDED"]);
        let poller = JobPoller::new(source.clone(), Duration::from_secs(20));

        let start = tokio::time::Instant::now();
        poller.wait(&job(), &CancellationToken::new()).await.unwrap();
        assert!(start.elapsed() >= Duration::from_secs(40));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_sleep_skips_pending_request() {
        let source = Scripted::new(&["PENDING", "PENDING", "SUCCEEDED"]);
        let poller = JobPoller::new(source.clone(), Duration::from_secs(20));
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(30)).await;
            trigger.cancel();
        });

        let result = poller.wait(&job(), &cancel).await;
        assert!(matches!(result, Err(ClientError::Cancelled)));
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_already_cancelled_makes_no_request() {
        let source = Scripted::new(&["SUCCEEDED"]);
        let poller = JobPoller::new(source.clone(), Duration::from_secs(20));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = poller.wait(&job(), &cancel).await;
        assert!(matches!(result, Err(ClientError::Cancelled)));
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_status_error_is_surfaced() {
        struct Broken;

        #[async_trait]
        impl StatusSource for Broken {
            async fn status(&self, _job: &Job) -> Result<JobStatus, ClientError> {
                Err(ClientError::Transport {
                    status: reqwest::StatusCode::NOT_FOUND,
                    body: "no such job".to_string(),
                })
            }
        }

        let poller = JobPoller::new(Broken, Duration::from_secs(1));
        let err = poller
            .wait(&job(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(reqwest::StatusCode::NOT_FOUND));
    }
}
