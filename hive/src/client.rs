use crate::{HiveError, Job, JobId, JobQueue};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use url::Url;

#[derive(Serialize)]
struct CreateJobRequest<'a> {
    analysis: &'a str,
    input: &'a Map<String, Value>,
}

#[derive(Deserialize)]
struct CreateJobResponse {
    job_id: JobId,
}

/// Talks to a hive queue over its JSON API.
#[derive(Clone, Debug)]
pub struct HiveClient {
    client: reqwest::Client,
    jobs_url: String,
}

impl HiveClient {
    pub fn new(base_url: &Url) -> Self {
        let jobs_url = format!("{}/jobs", base_url.as_str().trim_end_matches('/'));

        HiveClient {
            client: reqwest::Client::new(),
            jobs_url,
        }
    }

    fn job_url(&self, job_id: JobId) -> Result<Url, HiveError> {
        Url::parse(&format!("{}/{job_id}", self.jobs_url))
            .map_err(|e| HiveError::InvalidUrl(e.to_string()))
    }

    fn jobs_url(&self) -> Result<Url, HiveError> {
        Url::parse(&self.jobs_url).map_err(|e| HiveError::InvalidUrl(e.to_string()))
    }
}

#[async_trait]
impl JobQueue for HiveClient {
    async fn create_job(
        &self,
        analysis: &str,
        input: &Map<String, Value>,
    ) -> Result<JobId, HiveError> {
        let response = self
            .client
            .post(self.jobs_url()?)
            .json(&CreateJobRequest { analysis, input })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(HiveError::UnexpectedStatus(response.status()));
        }

        let job_id = response.json::<CreateJobResponse>().await?.job_id;
        tracing::debug!(analysis, job_id, "Created hive job");

        Ok(job_id)
    }

    async fn job_result(&self, job_id: JobId, progress: bool) -> Result<Job, HiveError> {
        let mut url = self.job_url(job_id)?;
        url.query_pairs_mut()
            .append_pair("progress", if progress { "true" } else { "false" });

        let response = self.client.get(url).send().await?;

        match response.status() {
            StatusCode::OK => Ok(response.json::<Job>().await?),
            StatusCode::NOT_FOUND => Err(HiveError::JobNotFound(job_id)),
            status => Err(HiveError::UnexpectedStatus(status)),
        }
    }

    async fn all_results(&self, analysis: &str) -> Result<Vec<Job>, HiveError> {
        let mut url = self.jobs_url()?;
        url.query_pairs_mut().append_pair("analysis", analysis);

        let response = self.client.get(url).send().await?;

        match response.status() {
            StatusCode::OK => Ok(response.json::<Vec<Job>>().await?),
            status => Err(HiveError::UnexpectedStatus(status)),
        }
    }
}
