use crate::config::Settings;
use crate::dispatcher::Queues;
use crate::errors::Result;
use crate::pipeline::Pipeline;
use hive::{Job, JobId};
use std::sync::Arc;

/// Read-only view of the jobs on each pipeline's queue.
#[derive(Clone)]
pub struct ResultPresenter {
    settings: Arc<Settings>,
    queues: Queues,
}

impl ResultPresenter {
    pub fn new(settings: Arc<Settings>, queues: Queues) -> Self {
        ResultPresenter { settings, queues }
    }

    /// Summary of a single job, without step-by-step progress.
    pub async fn job(&self, pipeline: Pipeline, job_id: JobId) -> Result<Job> {
        Ok(self.queues.get(pipeline)?.job_result(job_id, false).await?)
    }

    /// Every job under the pipeline's analysis, in the queue's order.
    pub async fn jobs(&self, pipeline: Pipeline) -> Result<Vec<Job>> {
        let analysis = &self.settings.pipeline(pipeline).analysis;
        Ok(self.queues.get(pipeline)?.all_results(analysis).await?)
    }
}
