use crate::config::Settings;
use crate::environments::EnvironmentRegistry;
use crate::errors::{GatewayError, Result};
use crate::metrics_defs::{SUBMISSION_BLOCKED, SUBMISSION_ENQUEUED};
use crate::pipeline::Pipeline;
use crate::status::{BlockReason, GateDecision, StatusGate};
use crate::submission::Submission;
use hive::{HiveClient, JobId, JobQueue};
use serde_json::{Map, Value};
use std::sync::Arc;

/// One queue per pipeline. A pipeline without a configured URI has no queue,
/// and only fails once something is submitted to or read from it.
#[derive(Clone, Default)]
pub struct Queues {
    update_ensembl: Option<Arc<dyn JobQueue>>,
    process_mapping: Option<Arc<dyn JobQueue>>,
}

impl Queues {
    pub fn new(
        update_ensembl: Option<Arc<dyn JobQueue>>,
        process_mapping: Option<Arc<dyn JobQueue>>,
    ) -> Self {
        Queues {
            update_ensembl,
            process_mapping,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        let connect = |pipeline: Pipeline| {
            settings
                .pipeline(pipeline)
                .queue_uri
                .as_ref()
                .map(|uri| Arc::new(HiveClient::new(uri)) as Arc<dyn JobQueue>)
        };

        Queues {
            update_ensembl: connect(Pipeline::UpdateEnsembl),
            process_mapping: connect(Pipeline::ProcessMapping),
        }
    }

    pub fn get(&self, pipeline: Pipeline) -> Result<&dyn JobQueue> {
        let queue = match pipeline {
            Pipeline::UpdateEnsembl => &self.update_ensembl,
            Pipeline::ProcessMapping => &self.process_mapping,
        };

        queue
            .as_deref()
            .ok_or(GatewayError::UndefinedQueue(pipeline.queue_uri_variable()))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum SubmitOutcome {
    Enqueued(JobId),
    Blocked(BlockReason),
}

/// Runs a submission through the status gate and onto its pipeline's queue.
#[derive(Clone)]
pub struct Dispatcher {
    settings: Arc<Settings>,
    gate: StatusGate,
    queues: Queues,
}

impl Dispatcher {
    pub fn new(settings: Arc<Settings>, gate: StatusGate, queues: Queues) -> Self {
        Dispatcher {
            settings,
            gate,
            queues,
        }
    }

    /// Reads the environment registry from disk.
    pub async fn registry(&self) -> Result<EnvironmentRegistry> {
        Ok(EnvironmentRegistry::load(&self.settings.api_uris_file).await?)
    }

    /// Resolves the submission's environment, checks that its GIFTs service is
    /// idle and creates a job.
    ///
    /// An unregistered environment fails before the status service or the
    /// queue is contacted.
    pub async fn submit(
        &self,
        registry: &EnvironmentRegistry,
        pipeline: Pipeline,
        submission: Submission,
    ) -> Result<SubmitOutcome> {
        tracing::debug!(%pipeline, environment = submission.environment(), "Received submission");
        let rest_server = registry.resolve(submission.environment())?.to_string();

        if let GateDecision::Blocked(reason) = self.gate.check(&rest_server).await {
            metrics::counter!(SUBMISSION_BLOCKED.name).increment(1);
            return Ok(SubmitOutcome::Blocked(reason));
        }

        let job_id = self
            .dispatch(pipeline, submission.into_input(&rest_server))
            .await?;

        Ok(SubmitOutcome::Enqueued(job_id))
    }

    /// Creates one job per call. Identical inputs create separate jobs.
    pub async fn dispatch(
        &self,
        pipeline: Pipeline,
        input: Map<String, Value>,
    ) -> Result<JobId> {
        let queue = self.queues.get(pipeline)?;
        let analysis = &self.settings.pipeline(pipeline).analysis;

        let job_id = queue.create_job(analysis, &input).await?;

        metrics::counter!(SUBMISSION_ENQUEUED.name, "pipeline" => pipeline.as_str()).increment(1);
        tracing::info!(%pipeline, %analysis, job_id, "Submitted job");

        Ok(job_id)
    }
}
