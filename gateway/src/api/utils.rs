use crate::api::pages;
use crate::config::Settings;
use crate::errors::GatewayError;
use axum::{
    Json,
    http::{HeaderMap, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use std::sync::Arc;

/// True when the request body is declared as JSON (`application/json` or an
/// `application/*+json` type). Responses follow the same format.
pub fn is_json(headers: &HeaderMap) -> bool {
    let Some(content_type) = headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok()) else {
        return false;
    };

    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    mime == "application/json" || (mime.starts_with("application/") && mime.ends_with("+json"))
}

/// A failed request, rendered as a JSON string or as an HTML page depending
/// on what the client sent.
#[derive(Debug)]
pub struct ApiError {
    error: GatewayError,
    format: Format,
}

#[derive(Debug)]
enum Format {
    Json,
    Html(Arc<Settings>),
}

impl ApiError {
    pub fn json(error: impl Into<GatewayError>) -> Self {
        ApiError {
            error: error.into(),
            format: Format::Json,
        }
    }

    pub fn html(error: impl Into<GatewayError>, settings: &Arc<Settings>) -> Self {
        ApiError {
            error: error.into(),
            format: Format::Html(settings.clone()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.error.status_code();
        let message = self.error.to_string();

        if status.is_server_error() {
            tracing::error!(error = %message, "Request failed");
        } else {
            tracing::warn!(error = %message, "Request rejected");
        }

        match self.format {
            Format::Json => (status, Json(message)).into_response(),
            Format::Html(settings) => match pages::error_page(&settings, &message) {
                Ok(page) => (status, page).into_response(),
                Err(e) => {
                    tracing::error!(error = %e, "Failed to render error page");
                    (status, message).into_response()
                }
            },
        }
    }
}
