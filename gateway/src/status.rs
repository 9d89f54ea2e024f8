use crate::metrics_defs::STATUS_GATE_DURATION;
use indexmap::IndexMap;
use serde_json::Value;
use std::fmt;
use std::time::Instant;

/// Why a submission was refused.
#[derive(Clone, Debug, PartialEq)]
pub enum BlockReason {
    /// The GIFTs service could not be reached.
    Unreachable(String),
    /// The GIFTs service answered with something that is not a status map.
    Malformed(String),
    /// A pipeline step is running, holds the humanized state name.
    Busy(String),
}

impl fmt::Display for BlockReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockReason::Unreachable(e) => {
                write!(f, "Unable to retrieve status from GIFTs service {e}")
            }
            BlockReason::Malformed(e) => write!(f, "Error loading GIFTs service information {e}"),
            BlockReason::Busy(state) => f.write_str(state),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum GateDecision {
    Clear,
    Blocked(BlockReason),
}

/// Asks a GIFTs service whether any of its pipelines is busy.
///
/// Each check is a single uncached GET. Nothing stops two requests from both
/// seeing an idle service and both submitting: the service only flips its
/// flag once the first job starts.
#[derive(Clone, Debug, Default)]
pub struct StatusGate {
    client: reqwest::Client,
}

impl StatusGate {
    pub fn new() -> Self {
        StatusGate {
            client: reqwest::Client::new(),
        }
    }

    pub async fn check(&self, rest_server: &str) -> GateDecision {
        let started = Instant::now();
        let decision = self.fetch(rest_server).await;
        metrics::histogram!(STATUS_GATE_DURATION.name).record(started.elapsed().as_secs_f64());

        if let GateDecision::Blocked(reason) = &decision {
            tracing::info!(rest_server, reason = %reason, "Status gate blocked submission");
        }
        decision
    }

    async fn fetch(&self, rest_server: &str) -> GateDecision {
        let status_uri = format!("{}/service/status", rest_server.trim_end_matches('/'));

        // The body is parsed whatever the response code is.
        let body = match self.client.get(&status_uri).send().await {
            Ok(response) => response.text().await,
            Err(e) => Err(e),
        };
        let body = match body {
            Ok(body) => body,
            Err(e) => return GateDecision::Blocked(BlockReason::Unreachable(e.to_string())),
        };

        match serde_json::from_str::<IndexMap<String, Value>>(&body) {
            Ok(status) => match first_running(&status) {
                Some(state) => GateDecision::Blocked(BlockReason::Busy(state)),
                None => GateDecision::Clear,
            },
            Err(e) => GateDecision::Blocked(BlockReason::Malformed(e.to_string())),
        }
    }
}

/// The first running state in the order the service listed them.
pub fn first_running(status: &IndexMap<String, Value>) -> Option<String> {
    status
        .iter()
        .find(|(_, running)| is_running(running))
        .map(|(state, _)| humanize_state(state))
}

/// `false`, `null`, zero and empty strings, arrays or objects are idle.
fn is_running(flag: &Value) -> bool {
    match flag {
        Value::Null => false,
        Value::Bool(running) => *running,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
    }
}

/// `mapping_in_progress` -> `Mapping in progress`
pub fn humanize_state(state: &str) -> String {
    let spaced = state.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}
