use crate::JobId;
use reqwest::StatusCode;

#[derive(thiserror::Error, Debug)]
pub enum HiveError {
    #[error("hive request failed: {0}")]
    ReqwestError(#[from] reqwest::Error),
    #[error("invalid hive URL: {0}")]
    InvalidUrl(String),
    #[error("job {0} not found")]
    JobNotFound(JobId),
    #[error("hive responded with unexpected status {0}")]
    UnexpectedStatus(StatusCode),
}
