use crate::config::Settings;
use crate::pipeline::Pipeline;
use crate::submission::{FieldErrors, SubmissionForm};
use axum::response::Html;
use hive::Job;
use serde::Serialize;
use serde_json::Value;
use tinytemplate::TinyTemplate;

static HEADER: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/templates/header.html"));
static FOOTER: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/templates/footer.html"));
static SUBMIT: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/templates/submit.html"));
static LIST: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/templates/list.html"));
static ERROR: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/templates/error.html"));

#[derive(Serialize)]
struct SubmitContext<'a> {
    script_name: &'a str,
    app_version: &'a str,
    form: &'a SubmissionForm,
    errors: &'a FieldErrors,
    status: Option<String>,
}

#[derive(Serialize)]
struct ListContext<'a> {
    script_name: &'a str,
    app_version: &'a str,
    submission_type: &'static str,
    pipeline: &'static str,
    jobs: Vec<JobView>,
}

#[derive(Serialize)]
struct ErrorContext<'a> {
    script_name: &'a str,
    app_version: &'a str,
    message: &'a str,
}

#[derive(Serialize)]
struct JobView {
    id: u64,
    status: String,
    input: String,
    output: String,
}

impl From<&Job> for JobView {
    fn from(job: &Job) -> Self {
        JobView {
            id: job.id,
            status: job.status().unwrap_or("Unknown").to_string(),
            input: pretty(job.input()),
            output: pretty(job.output()),
        }
    }
}

fn pretty(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(value) => serde_json::to_string_pretty(value).unwrap_or_default(),
    }
}

/// Mirrors the badge colours of the job list UI.
fn status_badge(value: &Value, output: &mut String) -> tinytemplate::error::Result<()> {
    let status = value.as_str().unwrap_or_default();
    let class = match status {
        "Complete" => "success",
        "Failed" => "danger",
        _ => "primary",
    };

    output.push_str("<span class=\"badge badge-");
    output.push_str(class);
    output.push_str("\">");
    tinytemplate::escape(status, output);
    output.push_str("</span>");
    Ok(())
}

fn templates() -> tinytemplate::error::Result<TinyTemplate<'static>> {
    let mut tt = TinyTemplate::new();
    tt.add_template("header", HEADER)?;
    tt.add_template("footer", FOOTER)?;
    tt.add_template("submit", SUBMIT)?;
    tt.add_template("list", LIST)?;
    tt.add_template("error", ERROR)?;
    tt.add_formatter("status_badge", status_badge);
    Ok(tt)
}

pub fn submit_page(
    settings: &Settings,
    form: &SubmissionForm,
    errors: &FieldErrors,
    status: Option<String>,
) -> tinytemplate::error::Result<Html<String>> {
    let context = SubmitContext {
        script_name: &settings.script_name,
        app_version: &settings.app_version,
        form,
        errors,
        status,
    };

    Ok(Html(templates()?.render("submit", &context)?))
}

pub fn jobs_page(
    settings: &Settings,
    pipeline: Pipeline,
    jobs: &[Job],
) -> tinytemplate::error::Result<Html<String>> {
    let context = ListContext {
        script_name: &settings.script_name,
        app_version: &settings.app_version,
        submission_type: pipeline.title(),
        pipeline: pipeline.as_str(),
        jobs: jobs.iter().map(JobView::from).collect(),
    };

    Ok(Html(templates()?.render("list", &context)?))
}

pub fn error_page(settings: &Settings, message: &str) -> tinytemplate::error::Result<Html<String>> {
    let context = ErrorContext {
        script_name: &settings.script_name,
        app_version: &settings.app_version,
        message,
    };

    Ok(Html(templates()?.render("error", &context)?))
}
