use crate::environments::EnvironmentRegistry;
use crate::pipeline::Pipeline;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::LazyLock;

pub const DEFAULT_ENVIRONMENT: &str = "staging";
pub const REST_SERVER_FIELD: &str = "rest_server";

const REQUIRED: &str = "This field is required.";
const INVALID_EMAIL: &str = "Invalid email address.";
const UNKNOWN_ENVIRONMENT: &str = "Unrecognised environment.";

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s.]+(\.[^@\s.]+)+$").expect("email pattern compiles")
});

/// Raw fields of the HTML submission form.
///
/// `update_ensembl` and `process_mapping` are the two submit buttons, only the
/// one that was pressed is present in the posted form.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubmissionForm {
    pub ensembl_release: String,
    pub environment: String,
    pub email: String,
    pub auth_token: String,
    pub tag: String,
    #[serde(skip_serializing)]
    pub update_ensembl: Option<String>,
    #[serde(skip_serializing)]
    pub process_mapping: Option<String>,
}

impl Default for SubmissionForm {
    fn default() -> Self {
        SubmissionForm {
            ensembl_release: String::new(),
            environment: DEFAULT_ENVIRONMENT.into(),
            email: String::new(),
            auth_token: String::new(),
            tag: String::new(),
            update_ensembl: None,
            process_mapping: None,
        }
    }
}

/// Validation messages per form field, empty when the field is valid.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct FieldErrors {
    pub ensembl_release: Vec<&'static str>,
    pub environment: Vec<&'static str>,
    pub email: Vec<&'static str>,
    pub auth_token: Vec<&'static str>,
    pub tag: Vec<&'static str>,
}

impl FieldErrors {
    pub fn is_empty(&self) -> bool {
        self.ensembl_release.is_empty()
            && self.environment.is_empty()
            && self.email.is_empty()
            && self.auth_token.is_empty()
            && self.tag.is_empty()
    }
}

/// A validated form submission.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SubmissionPayload {
    pub ensembl_release: String,
    pub environment: String,
    pub email: String,
    pub auth_token: String,
    pub tag: Option<String>,
}

impl SubmissionForm {
    /// The pipeline selected by the pressed submit button.
    pub fn pipeline(&self) -> Option<Pipeline> {
        if self.update_ensembl.is_some() {
            Some(Pipeline::UpdateEnsembl)
        } else if self.process_mapping.is_some() {
            Some(Pipeline::ProcessMapping)
        } else {
            None
        }
    }

    pub fn validate(
        &self,
        registry: &EnvironmentRegistry,
    ) -> Result<SubmissionPayload, FieldErrors> {
        let mut errors = FieldErrors::default();

        let ensembl_release = self.ensembl_release.trim();
        if ensembl_release.is_empty() {
            errors.ensembl_release.push(REQUIRED);
        }

        let environment = self.environment.trim();
        if environment.is_empty() {
            errors.environment.push(REQUIRED);
        } else if !registry.contains(environment) {
            errors.environment.push(UNKNOWN_ENVIRONMENT);
        }

        let email = self.email.trim();
        if email.is_empty() {
            errors.email.push(REQUIRED);
        } else if !EMAIL.is_match(email) {
            errors.email.push(INVALID_EMAIL);
        }

        if self.auth_token.trim().is_empty() {
            errors.auth_token.push(REQUIRED);
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        let tag = self.tag.trim();
        Ok(SubmissionPayload {
            ensembl_release: ensembl_release.to_string(),
            environment: environment.to_string(),
            email: email.to_string(),
            auth_token: self.auth_token.clone(),
            tag: (!tag.is_empty()).then(|| tag.to_string()),
        })
    }
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum SubmissionError {
    #[error("submission must be a JSON object")]
    NotAnObject,
    #[error("submission is missing the environment field")]
    MissingEnvironment,
}

/// Input bound for the queue. `rest_server` is only ever attached by
/// [`Submission::into_input`], after the environment has been resolved.
#[derive(Clone, Debug, PartialEq)]
pub struct Submission {
    environment: String,
    input: Map<String, Value>,
}

impl Submission {
    /// Accepts a JSON body as-is. Only `environment` is checked, the other
    /// fields are forwarded untouched.
    pub fn from_json(value: Value) -> Result<Self, SubmissionError> {
        let Value::Object(mut input) = value else {
            return Err(SubmissionError::NotAnObject);
        };

        input.remove(REST_SERVER_FIELD);

        let environment = input
            .get("environment")
            .and_then(Value::as_str)
            .ok_or(SubmissionError::MissingEnvironment)?
            .to_string();

        Ok(Submission { environment, input })
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn into_input(mut self, rest_server: &str) -> Map<String, Value> {
        self.input.insert(
            REST_SERVER_FIELD.into(),
            Value::String(rest_server.to_string()),
        );
        self.input
    }
}

impl From<SubmissionPayload> for Submission {
    fn from(payload: SubmissionPayload) -> Self {
        let mut input = Map::new();
        input.insert(
            "ensembl_release".into(),
            Value::String(payload.ensembl_release),
        );
        input.insert(
            "environment".into(),
            Value::String(payload.environment.clone()),
        );
        input.insert("email".into(), Value::String(payload.email));
        input.insert("tag".into(), payload.tag.map_or(Value::Null, Value::String));
        input.insert("auth_token".into(), Value::String(payload.auth_token));

        Submission {
            environment: payload.environment,
            input,
        }
    }
}
