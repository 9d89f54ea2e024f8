mod jobs;
mod pages;
mod submit;
pub mod utils;

use crate::config::Settings;
use crate::dispatcher::{Dispatcher, Queues};
use crate::pipeline::Pipeline;
use crate::results::ResultPresenter;
use crate::status::StatusGate;
use axum::{
    Json, Router,
    extract::{Path, Request, State},
    http::{HeaderMap, header::CONTENT_TYPE},
    response::IntoResponse,
    routing::get,
};
use hive::JobId;
use serde_json::json;
use std::io;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::CorsLayer;

static OPENAPI: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/data/openapi.yaml"));

#[derive(Clone)]
pub struct AppState {
    settings: Arc<Settings>,
    dispatcher: Dispatcher,
    results: ResultPresenter,
}

impl AppState {
    pub fn new(settings: Settings, queues: Queues) -> Self {
        let settings = Arc::new(settings);
        AppState {
            dispatcher: Dispatcher::new(settings.clone(), StatusGate::new(), queues.clone()),
            results: ResultPresenter::new(settings.clone(), queues),
            settings,
        }
    }
}

pub fn router(state: AppState) -> Router {
    let mut routes = Router::new()
        .route("/", get(submit::show_form))
        .route("/submit", get(submit::show_form).post(submit::submit_form))
        .route("/ping", get(ping))
        .route("/api", get(openapi));

    for pipeline in Pipeline::ALL {
        routes = routes
            .route(
                &format!("/{pipeline}"),
                get(
                    move |State(state): State<AppState>, headers: HeaderMap| {
                        jobs::list(state, headers, pipeline)
                    },
                )
                .post(move |State(state): State<AppState>, request: Request| {
                    submit::submit_to(state, request, pipeline)
                }),
            )
            .route(
                &format!("/{pipeline}/{{job_id}}"),
                get(
                    move |State(state): State<AppState>,
                          Path(job_id): Path<JobId>,
                          headers: HeaderMap| {
                        jobs::show(state, headers, pipeline, job_id)
                    },
                ),
            );
    }

    let app = match state.settings.script_name.as_str() {
        "" => routes,
        prefix => Router::new().nest(prefix, routes),
    };

    app.layer(CorsLayer::permissive()).with_state(state)
}

pub async fn serve(state: AppState) -> io::Result<()> {
    let addr = format!(
        "{}:{}",
        state.settings.listener.host, state.settings.listener.port
    );
    let app = router(state);

    let listener = TcpListener::bind(addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "GIFTs gateway listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn ping() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn openapi() -> impl IntoResponse {
    ([(CONTENT_TYPE, "application/yaml")], OPENAPI)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => tracing::info!("Received SIGINT, shutting down"),
            Err(e) => {
                tracing::error!(error = %e, "Failed to install Ctrl+C handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                tracing::info!("Received SIGTERM, shutting down");
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutils::{spawn_status_server, test_settings};
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header::LOCATION};
    use hive::{JobQueue, MemoryHive};
    use serde_json::Value;
    use std::io::Write;
    use tempfile::NamedTempFile;
    use tower::ServiceExt;

    const IDLE: &str = r#"{"mapping_in_progress": false, "release_loading": false}"#;
    const BUSY: &str = r#"{"mapping_in_progress": true}"#;

    struct TestApp {
        app: Router,
        queue: Arc<MemoryHive>,
        rest_server: String,
        _registry: NamedTempFile,
    }

    async fn test_app(status: &'static str, script_name: &str) -> TestApp {
        let rest_server = spawn_status_server(status).await;

        let mut registry = NamedTempFile::new().unwrap();
        write!(registry, r#"{{"staging": "{rest_server}"}}"#).unwrap();

        let mut settings = test_settings();
        settings.api_uris_file = registry.path().to_path_buf();
        settings.script_name = script_name.into();

        let queue = Arc::new(MemoryHive::new());
        let queues = Queues::new(
            Some(queue.clone() as Arc<dyn JobQueue>),
            Some(queue.clone() as Arc<dyn JobQueue>),
        );

        TestApp {
            app: router(AppState::new(settings, queues)),
            queue,
            rest_server,
            _registry: registry,
        }
    }

    fn json_request(method: &str, uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn form_request(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn body_text(response: axum::response::Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_ping() {
        let mut settings = test_settings();
        settings.api_uris_file = "/nonexistent/gifts_api_uris.json".into();
        let app = router(AppState::new(settings, Queues::default()));

        let response = app.oneshot(get("/ping")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({"status": "ok"}));
    }

    #[tokio::test]
    async fn test_openapi_document() {
        let app = test_app(IDLE, "").await;
        let response = app.app.oneshot(get("/api")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_TYPE], "application/yaml");
        assert!(body_text(response).await.contains("openapi:"));
    }

    #[tokio::test]
    async fn test_json_submission_enqueues_job() {
        let app = test_app(IDLE, "").await;
        let response = app
            .app
            .oneshot(json_request(
                "POST",
                "/update_ensembl",
                r#"{"environment": "staging", "ensembl_release": "110", "rest_server": "ignored"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({"job_id": 1}));

        let created = app.queue.created();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].analysis, "update_ensembl_submit");
        assert_eq!(created[0].input["ensembl_release"], "110");
        assert_eq!(created[0].input["rest_server"], json!(app.rest_server));
    }

    #[tokio::test]
    async fn test_json_submission_blocked_by_status() {
        let app = test_app(BUSY, "").await;
        let response = app
            .app
            .oneshot(json_request(
                "POST",
                "/process_mapping",
                r#"{"environment": "staging"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!("Submission aborted: Mapping in progress")
        );
        assert!(app.queue.created().is_empty());
    }

    #[tokio::test]
    async fn test_json_submission_unknown_environment() {
        let app = test_app(IDLE, "").await;
        let response = app
            .app
            .oneshot(json_request(
                "POST",
                "/update_ensembl",
                r#"{"environment": "production"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(response).await,
            json!("Unrecognised Environment: production")
        );
        assert!(app.queue.created().is_empty());
    }

    #[tokio::test]
    async fn test_json_submission_malformed_body() {
        let app = test_app(IDLE, "").await;

        let response = app
            .app
            .clone()
            .oneshot(json_request("POST", "/update_ensembl", "{not json"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_json(response).await.is_string());

        let response = app
            .app
            .oneshot(json_request("POST", "/update_ensembl", "[1, 2]"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_json_submission_without_queue() {
        let rest_server = spawn_status_server(IDLE).await;
        let mut registry = NamedTempFile::new().unwrap();
        write!(registry, r#"{{"staging": "{rest_server}"}}"#).unwrap();
        let mut settings = test_settings();
        settings.api_uris_file = registry.path().to_path_buf();

        let app = router(AppState::new(settings, Queues::default()));
        let response = app
            .oneshot(json_request(
                "POST",
                "/process_mapping",
                r#"{"environment": "staging"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(response).await,
            json!("Undefined environment variable: HIVE_PROCESS_MAPPING_URI")
        );
    }

    #[tokio::test]
    async fn test_form_submission_redirects_to_job() {
        let app = test_app(IDLE, "").await;
        let response = app
            .app
            .oneshot(form_request(
                "/submit",
                "ensembl_release=110&environment=staging&email=curator%40ebi.ac.uk\
                 &auth_token=secret&tag=&process_mapping=Submit",
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[LOCATION], "/process_mapping/1");

        let created = app.queue.created();
        assert_eq!(created[0].analysis, "process_mapping_submit");
        assert_eq!(created[0].input["email"], "curator@ebi.ac.uk");
        assert_eq!(created[0].input["tag"], Value::Null);
    }

    #[tokio::test]
    async fn test_form_submission_keeps_auth_token() {
        let app = test_app(IDLE, "").await;
        let response = app
            .app
            .oneshot(form_request(
                "/submit",
                "ensembl_release=110&environment=staging&email=a%40b.org\
                 &auth_token=%20tok%0A&update_ensembl=x",
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(app.queue.created()[0].input["auth_token"], " tok\n");
    }

    #[tokio::test]
    async fn test_form_submission_with_errors_rerenders() {
        let app = test_app(IDLE, "").await;
        let response = app
            .app
            .oneshot(form_request(
                "/submit",
                "ensembl_release=&environment=nowhere&email=nope&auth_token=x&update_ensembl=Submit",
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let page = body_text(response).await;
        assert!(page.contains("This field is required."));
        assert!(page.contains("Unrecognised environment."));
        assert!(page.contains("Invalid email address."));
        assert!(app.queue.created().is_empty());
    }

    #[tokio::test]
    async fn test_form_submission_blocked_shows_status() {
        let app = test_app(BUSY, "").await;
        let response = app
            .app
            .oneshot(form_request(
                "/update_ensembl",
                "ensembl_release=110&environment=staging&email=a%40b.org&auth_token=secret",
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(
            body_text(response)
                .await
                .contains("Submission aborted: Mapping in progress")
        );
    }

    #[tokio::test]
    async fn test_form_submission_without_button() {
        let app = test_app(IDLE, "").await;
        let response = app
            .app
            .oneshot(form_request(
                "/submit",
                "ensembl_release=110&environment=staging&email=a%40b.org&auth_token=secret",
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(
            body_text(response)
                .await
                .contains("Unrecognised submission type")
        );
    }

    #[tokio::test]
    async fn test_index_shows_form() {
        let app = test_app(IDLE, "").await;
        let response = app.app.oneshot(get("/")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let page = body_text(response).await;
        assert!(page.contains("name=\"update_ensembl\""));
        assert!(page.contains("name=\"process_mapping\""));
    }

    #[tokio::test]
    async fn test_list_jobs() {
        let app = test_app(IDLE, "").await;

        let response = app
            .app
            .clone()
            .oneshot(json_request("GET", "/update_ensembl", ""))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!([]));

        app.app
            .clone()
            .oneshot(json_request(
                "POST",
                "/update_ensembl",
                r#"{"environment": "staging"}"#,
            ))
            .await
            .unwrap();

        let response = app.app.oneshot(get("/update_ensembl")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let page = body_text(response).await;
        assert!(page.contains("Update Ensembl jobs"));
        assert!(page.contains("href=\"/update_ensembl/1\""));
    }

    #[tokio::test]
    async fn test_show_job() {
        let app = test_app(IDLE, "").await;
        app.app
            .clone()
            .oneshot(json_request(
                "POST",
                "/process_mapping",
                r#"{"environment": "staging", "ensembl_release": "110"}"#,
            ))
            .await
            .unwrap();

        let response = app
            .app
            .clone()
            .oneshot(json_request("GET", "/process_mapping/1", ""))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let job = body_json(response).await;
        assert_eq!(job["id"], 1);
        assert_eq!(job["input"]["ensembl_release"], "110");

        let response = app
            .app
            .oneshot(json_request("GET", "/process_mapping/42", ""))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_routes_nest_under_script_name() {
        let app = test_app(IDLE, "/gifts").await;

        let response = app.app.clone().oneshot(get("/gifts/ping")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app.app.clone().oneshot(get("/gifts")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let page = body_text(response).await;

        let links: Vec<&str> = page
            .split("href=\"")
            .skip(1)
            .filter_map(|rest| rest.split('"').next())
            .filter(|href| href.starts_with('/'))
            .collect();
        assert!(links.contains(&"/gifts/submit"));
        assert!(links.contains(&"/gifts/update_ensembl"));
        assert!(links.contains(&"/gifts/process_mapping"));
        for href in links {
            let response = app.app.clone().oneshot(get(href)).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK, "{href}");
        }

        let response = app.app.oneshot(get("/ping")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
