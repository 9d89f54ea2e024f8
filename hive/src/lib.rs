//! Client side of the job-orchestration ("hive") service.
//!
//! The gateway never runs jobs itself. It creates them on a hive queue and
//! reads their results back. Everything behind the queue endpoint, including
//! a job's lifecycle, belongs to the hive service.

pub mod client;
pub mod error;
#[cfg(feature = "testutils")]
pub mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub use client::HiveClient;
pub use error::HiveError;
#[cfg(feature = "testutils")]
pub use memory::MemoryHive;

pub type JobId = u64;

/// A job as reported by the queue.
///
/// Only `id` is guaranteed. Everything else (`status`, `input`, `output`, ...)
/// is filled in by the hive service as the job progresses.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Job {
    pub fn new(id: JobId) -> Self {
        Job {
            id,
            fields: Map::new(),
        }
    }

    pub fn status(&self) -> Option<&str> {
        self.fields.get("status").and_then(Value::as_str)
    }

    pub fn input(&self) -> Option<&Value> {
        self.fields.get("input")
    }

    pub fn output(&self) -> Option<&Value> {
        self.fields.get("output")
    }
}

#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Creates a new job for `analysis`. Every call creates a distinct job.
    async fn create_job(&self, analysis: &str, input: &Map<String, Value>)
    -> Result<JobId, HiveError>;

    /// Fetches the result of a single job. `progress` asks for per-step
    /// progress on top of the summary.
    async fn job_result(&self, job_id: JobId, progress: bool) -> Result<Job, HiveError>;

    /// Lists every job recorded for `analysis`, in the order the queue returns them.
    async fn all_results(&self, analysis: &str) -> Result<Vec<Job>, HiveError>;
}
