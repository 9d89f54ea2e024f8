use crate::environments::RegistryError;
use crate::submission::SubmissionError;
use axum::http::StatusCode;
use hive::HiveError;
use thiserror::Error;

/// Result type alias for gateway operations
pub type Result<T, E = GatewayError> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("Undefined environment variable: {0}")]
    UndefinedQueue(&'static str),

    #[error("Unrecognised submission type")]
    UnrecognisedSubmission,

    #[error("Invalid submission: {0}")]
    InvalidSubmission(#[from] SubmissionError),

    #[error("Invalid request body: {0}")]
    RequestBody(String),

    #[error(transparent)]
    Hive(#[from] HiveError),

    #[error("Failed to render page: {0}")]
    Render(#[from] tinytemplate::error::Error),
}

impl GatewayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::UnrecognisedSubmission
            | GatewayError::InvalidSubmission(_)
            | GatewayError::RequestBody(_) => StatusCode::BAD_REQUEST,
            GatewayError::Hive(HiveError::JobNotFound(_)) => StatusCode::NOT_FOUND,
            GatewayError::Registry(_)
            | GatewayError::UndefinedQueue(_)
            | GatewayError::Hive(_)
            | GatewayError::Render(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
