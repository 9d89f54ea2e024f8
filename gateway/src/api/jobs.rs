use crate::api::AppState;
use crate::api::pages;
use crate::api::utils::{ApiError, is_json};
use crate::pipeline::Pipeline;
use axum::{
    Json,
    http::HeaderMap,
    response::{IntoResponse, Response},
};
use hive::{Job, JobId};

/// GET `/{pipeline}`
pub async fn list(
    state: AppState,
    headers: HeaderMap,
    pipeline: Pipeline,
) -> Result<Response, ApiError> {
    let json = is_json(&headers);
    let jobs = state
        .results
        .jobs(pipeline)
        .await
        .map_err(|e| error(e, json, &state))?;

    respond(&state, pipeline, jobs, json)
}

/// GET `/{pipeline}/{job_id}`
pub async fn show(
    state: AppState,
    headers: HeaderMap,
    pipeline: Pipeline,
    job_id: JobId,
) -> Result<Response, ApiError> {
    let json = is_json(&headers);
    let job = state
        .results
        .job(pipeline, job_id)
        .await
        .map_err(|e| error(e, json, &state))?;

    if json {
        return Ok(Json(job).into_response());
    }
    respond(&state, pipeline, vec![job], false)
}

fn respond(
    state: &AppState,
    pipeline: Pipeline,
    jobs: Vec<Job>,
    json: bool,
) -> Result<Response, ApiError> {
    if json {
        return Ok(Json(jobs).into_response());
    }

    pages::jobs_page(&state.settings, pipeline, &jobs)
        .map(IntoResponse::into_response)
        .map_err(|e| ApiError::html(e, &state.settings))
}

fn error(e: crate::errors::GatewayError, json: bool, state: &AppState) -> ApiError {
    if json {
        ApiError::json(e)
    } else {
        ApiError::html(e, &state.settings)
    }
}
