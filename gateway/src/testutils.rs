use crate::config::{Listener, PipelineSettings, Settings};
use axum::{Router, routing::get};
use std::net::SocketAddr;
use tokio::net::TcpListener;

pub fn test_settings() -> Settings {
    Settings {
        listener: Listener::default(),
        update_ensembl: PipelineSettings {
            analysis: "update_ensembl_submit".into(),
            queue_uri: None,
        },
        process_mapping: PipelineSettings {
            analysis: "process_mapping_submit".into(),
            queue_uri: None,
        },
        api_uris_file: "gifts_api_uris.json".into(),
        script_name: String::new(),
        app_version: "0.1.0".into(),
    }
}

/// Serves `body` from `/service/status` and returns the server's base URI.
pub async fn spawn_status_server(body: &'static str) -> String {
    let app = Router::new().route("/service/status", get(move || async move { body }));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{addr}")
}

/// An address nothing is listening on.
pub fn unused_address() -> SocketAddr {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap()
}
