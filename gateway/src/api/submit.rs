use crate::api::AppState;
use crate::api::pages;
use crate::api::utils::{ApiError, is_json};
use crate::dispatcher::SubmitOutcome;
use crate::errors::GatewayError;
use crate::pipeline::Pipeline;
use crate::submission::{FieldErrors, Submission, SubmissionForm};
use axum::{
    Form, Json,
    extract::{FromRequest, Request, State},
    response::{IntoResponse, Redirect, Response},
};
use serde_json::{Value, json};

/// GET `/` and GET `/submit`: an empty submission form.
pub async fn show_form(State(state): State<AppState>) -> Result<Response, ApiError> {
    render_form(&state, &SubmissionForm::default(), &FieldErrors::default(), None)
}

/// POST `/submit`: the pressed button picks the pipeline.
pub async fn submit_form(
    State(state): State<AppState>,
    Form(form): Form<SubmissionForm>,
) -> Result<Response, ApiError> {
    let pipeline = form
        .pipeline()
        .ok_or_else(|| ApiError::html(GatewayError::UnrecognisedSubmission, &state.settings))?;

    submit_form_to(&state, form, pipeline).await
}

/// POST `/update_ensembl` and `/process_mapping`. JSON bodies are forwarded
/// as they are, anything else is handled like the HTML form.
pub async fn submit_to(
    state: AppState,
    request: Request,
    pipeline: Pipeline,
) -> Result<Response, ApiError> {
    if !is_json(request.headers()) {
        let Form(form) = Form::<SubmissionForm>::from_request(request, &state)
            .await
            .map_err(|e| {
                ApiError::html(GatewayError::RequestBody(e.body_text()), &state.settings)
            })?;
        return submit_form_to(&state, form, pipeline).await;
    }

    let Json(body) = Json::<Value>::from_request(request, &state)
        .await
        .map_err(|e| ApiError::json(GatewayError::RequestBody(e.body_text())))?;
    let submission = Submission::from_json(body).map_err(ApiError::json)?;

    let registry = state.dispatcher.registry().await.map_err(ApiError::json)?;
    let outcome = state
        .dispatcher
        .submit(&registry, pipeline, submission)
        .await
        .map_err(ApiError::json)?;

    let body = match outcome {
        SubmitOutcome::Enqueued(job_id) => json!({ "job_id": job_id }),
        SubmitOutcome::Blocked(reason) => json!(format!("Submission aborted: {reason}")),
    };
    Ok(Json(body).into_response())
}

async fn submit_form_to(
    state: &AppState,
    form: SubmissionForm,
    pipeline: Pipeline,
) -> Result<Response, ApiError> {
    let registry = state
        .dispatcher
        .registry()
        .await
        .map_err(|e| ApiError::html(e, &state.settings))?;

    let payload = match form.validate(&registry) {
        Ok(payload) => payload,
        Err(errors) => return render_form(state, &form, &errors, None),
    };

    let outcome = state
        .dispatcher
        .submit(&registry, pipeline, payload.into())
        .await
        .map_err(|e| ApiError::html(e, &state.settings))?;

    match outcome {
        SubmitOutcome::Enqueued(job_id) => Ok(Redirect::to(&format!(
            "{}/{pipeline}/{job_id}",
            state.settings.script_name
        ))
        .into_response()),
        SubmitOutcome::Blocked(reason) => {
            render_form(state, &form, &FieldErrors::default(), Some(reason.to_string()))
        }
    }
}

fn render_form(
    state: &AppState,
    form: &SubmissionForm,
    errors: &FieldErrors,
    status: Option<String>,
) -> Result<Response, ApiError> {
    pages::submit_page(&state.settings, form, errors, status)
        .map(IntoResponse::into_response)
        .map_err(|e| ApiError::html(e, &state.settings))
}
