use crate::pipeline::Pipeline;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use url::Url;

pub const DEFAULT_ANALYSIS: &str = "submit";
pub const DEFAULT_API_URIS_FILE: &str = "gifts_api_uris.json";
pub const VERSION_FILE: &str = "VERSION";

pub const API_URIS_FILE_VAR: &str = "GIFTS_APIS_URIS_FILE";
pub const SCRIPT_NAME_VAR: &str = "SCRIPT_NAME";
pub const HOST_VAR: &str = "GIFTS_HOST";
pub const PORT_VAR: &str = "GIFTS_PORT";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid URL in {variable}: {source}")]
    InvalidUrl {
        variable: &'static str,
        source: url::ParseError,
    },

    #[error("invalid port {0:?} in GIFTS_PORT")]
    InvalidPort(String),

    #[error("Port cannot be 0")]
    ZeroPort,
}

/// Network listener configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Listener {
    pub host: String,
    pub port: u16,
}

impl Default for Listener {
    fn default() -> Self {
        Listener {
            host: "0.0.0.0".into(),
            port: 5000,
        }
    }
}

/// Gateway settings as they appear in the YAML config file. Every key is
/// optional, environment variables take precedence over all of them.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct FileConfig {
    #[serde(default)]
    pub listener: Option<Listener>,
    pub hive_update_ensembl_analysis: Option<String>,
    pub hive_process_mapping_analysis: Option<String>,
    pub hive_update_ensembl_uri: Option<String>,
    pub hive_process_mapping_uri: Option<String>,
    pub gifts_api_uris_file: Option<PathBuf>,
    pub script_name: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PipelineSettings {
    /// Name of the hive analysis that jobs for this pipeline are created under.
    pub analysis: String,
    /// Queue endpoint. `None` only becomes an error once the pipeline is used.
    pub queue_uri: Option<Url>,
}

/// Fully resolved settings, built once at start-up and shared read-only
/// with every request.
#[derive(Clone, Debug, PartialEq)]
pub struct Settings {
    pub listener: Listener,
    pub update_ensembl: PipelineSettings,
    pub process_mapping: PipelineSettings,
    /// JSON file mapping environment names to GIFTs API base URIs.
    pub api_uris_file: PathBuf,
    /// URL prefix the app is mounted under, either empty or `/prefix`.
    pub script_name: String,
    pub app_version: String,
}

impl Settings {
    /// Layers `env` over `file` over the built-in defaults.
    ///
    /// Empty environment variables count as unset.
    pub fn resolve<E>(file: FileConfig, env: E) -> Result<Self, ConfigError>
    where
        E: Fn(&str) -> Option<String>,
    {
        let env = |name: &str| env(name).filter(|value| !value.is_empty());

        let mut listener = file.listener.unwrap_or_default();
        if let Some(host) = env(HOST_VAR) {
            listener.host = host;
        }
        if let Some(port) = env(PORT_VAR) {
            listener.port = port.parse().map_err(|_| ConfigError::InvalidPort(port))?;
        }
        if listener.port == 0 {
            return Err(ConfigError::ZeroPort);
        }

        let update_ensembl = PipelineSettings {
            analysis: env(Pipeline::UpdateEnsembl.analysis_variable())
                .or(file.hive_update_ensembl_analysis)
                .unwrap_or_else(|| DEFAULT_ANALYSIS.into()),
            queue_uri: parse_queue_uri(
                Pipeline::UpdateEnsembl.queue_uri_variable(),
                env(Pipeline::UpdateEnsembl.queue_uri_variable())
                    .or(file.hive_update_ensembl_uri),
            )?,
        };

        let process_mapping = PipelineSettings {
            analysis: env(Pipeline::ProcessMapping.analysis_variable())
                .or(file.hive_process_mapping_analysis)
                .unwrap_or_else(|| DEFAULT_ANALYSIS.into()),
            queue_uri: parse_queue_uri(
                Pipeline::ProcessMapping.queue_uri_variable(),
                env(Pipeline::ProcessMapping.queue_uri_variable())
                    .or(file.hive_process_mapping_uri),
            )?,
        };

        let api_uris_file = env(API_URIS_FILE_VAR)
            .map(PathBuf::from)
            .or(file.gifts_api_uris_file)
            .unwrap_or_else(|| DEFAULT_API_URIS_FILE.into());

        let script_name = env(SCRIPT_NAME_VAR)
            .or(file.script_name)
            .map(|name| normalize_script_name(&name))
            .unwrap_or_default();

        Ok(Settings {
            listener,
            update_ensembl,
            process_mapping,
            api_uris_file,
            script_name,
            app_version: version_from_file(Path::new(VERSION_FILE)),
        })
    }

    /// Reports the running binary's package version instead of the
    /// `VERSION` file. A blank version keeps the file's value.
    pub fn with_app_version(mut self, version: &str) -> Self {
        let version = version.trim();
        if !version.is_empty() {
            self.app_version = version.to_string();
        }
        self
    }

    pub fn pipeline(&self, pipeline: Pipeline) -> &PipelineSettings {
        match pipeline {
            Pipeline::UpdateEnsembl => &self.update_ensembl,
            Pipeline::ProcessMapping => &self.process_mapping,
        }
    }
}

fn parse_queue_uri(
    variable: &'static str,
    value: Option<String>,
) -> Result<Option<Url>, ConfigError> {
    value
        .filter(|uri| !uri.trim().is_empty())
        .map(|uri| {
            Url::parse(uri.trim()).map_err(|source| ConfigError::InvalidUrl { variable, source })
        })
        .transpose()
}

fn normalize_script_name(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
}

fn version_from_file(path: &Path) -> String {
    std::fs::read_to_string(path)
        .ok()
        .map(|version| version.trim().to_string())
        .filter(|version| !version.is_empty())
        .unwrap_or_else(|| "unknown".into())
}
