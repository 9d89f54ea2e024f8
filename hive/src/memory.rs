use crate::{HiveError, Job, JobId, JobQueue};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Mutex;

#[derive(Clone, Debug)]
pub struct CreatedJob {
    pub id: JobId,
    pub analysis: String,
    pub input: Map<String, Value>,
}

/// In-process queue that records every job it is asked to create.
#[derive(Debug, Default)]
pub struct MemoryHive {
    jobs: Mutex<Vec<CreatedJob>>,
}

impl MemoryHive {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the jobs created so far, in creation order.
    pub fn created(&self) -> Vec<CreatedJob> {
        self.jobs.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn to_job(created: &CreatedJob) -> Job {
        let mut job = Job::new(created.id);
        job.fields
            .insert("status".into(), Value::String("Submitted".into()));
        job.fields
            .insert("input".into(), Value::Object(created.input.clone()));
        job
    }
}

#[async_trait]
impl JobQueue for MemoryHive {
    async fn create_job(
        &self,
        analysis: &str,
        input: &Map<String, Value>,
    ) -> Result<JobId, HiveError> {
        let mut jobs = self.jobs.lock().unwrap_or_else(|e| e.into_inner());
        let id = jobs.len() as JobId + 1;
        jobs.push(CreatedJob {
            id,
            analysis: analysis.to_string(),
            input: input.clone(),
        });
        Ok(id)
    }

    async fn job_result(&self, job_id: JobId, _progress: bool) -> Result<Job, HiveError> {
        self.created()
            .iter()
            .find(|created| created.id == job_id)
            .map(Self::to_job)
            .ok_or(HiveError::JobNotFound(job_id))
    }

    async fn all_results(&self, analysis: &str) -> Result<Vec<Job>, HiveError> {
        Ok(self
            .created()
            .iter()
            .filter(|created| created.analysis == analysis)
            .map(Self::to_job)
            .collect())
    }
}
