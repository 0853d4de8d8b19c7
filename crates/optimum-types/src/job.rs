//! Asynchronous server-side jobs.
//!
//! Create and commit return a receipt holding the version that becomes
//! active on success and an opaque job handle to poll.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Status label of a job that completed successfully.
pub const STATUS_SUCCEEDED: &str = "SUCCEEDED";

/// Status label of a job that failed.
pub const STATUS_FAILED: &str = "FAILED";

/// Opaque handle of a job, a URL or absolute path on the service host.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Job(String);

impl Job {
    /// Wrap a handle returned by the service.
    pub fn new(handle: impl Into<String>) -> Self {
        Self(handle.into())
    }

    /// The raw handle.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Receipt of an accepted create or commit request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Receipt {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,
    pub job: Job,
}

/// Snapshot of a job as reported by the service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobStatus {
    #[serde(default)]
    pub status: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub reason: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub created: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub started: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub stopped: String,
}

impl JobStatus {
    /// True once the label is exactly `SUCCEEDED` or `FAILED`.
    ///
    /// Every other label, including an empty one, is in progress.
    pub fn is_terminal(&self) -> bool {
        self.status == STATUS_SUCCEEDED || self.status == STATUS_FAILED
    }

    /// True only for `SUCCEEDED`.
    pub fn is_succeeded(&self) -> bool {
        self.status == STATUS_SUCCEEDED
    }
}
