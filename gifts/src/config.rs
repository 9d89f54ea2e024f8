use gateway::config::{FileConfig, Settings};
use serde::Deserialize;
use std::fs::File;
use std::path::Path;

pub const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct MetricsConfig {
    pub statsd_host: String,
    pub statsd_port: u16,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct LoggingConfig {
    pub level: Option<String>,
    pub sentry_dsn: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct Config {
    pub metrics: Option<MetricsConfig>,
    pub logging: Option<LoggingConfig>,
    #[serde(flatten)]
    pub gateway: FileConfig,
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let file = File::open(path)?;
        let data = serde_yaml::from_reader(file)?;

        Ok(data)
    }

    /// Reads `path` when one is given, otherwise every key is left unset.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Config::default()),
        }
    }

    pub fn log_level(&self) -> &str {
        self.logging
            .as_ref()
            .and_then(|logging| logging.level.as_deref())
            .unwrap_or(DEFAULT_LOG_LEVEL)
    }

    pub fn sentry_dsn(&self) -> Option<&str> {
        self.logging
            .as_ref()
            .and_then(|logging| logging.sentry_dsn.as_deref())
            .filter(|dsn| !dsn.is_empty())
    }

    /// Layers the process environment over the file's gateway keys. The app
    /// version is this binary's.
    pub fn settings<E>(&self, env: E) -> Result<Settings, ConfigError>
    where
        E: Fn(&str) -> Option<String>,
    {
        Ok(Settings::resolve(self.gateway.clone(), env)?
            .with_app_version(env!("CARGO_PKG_VERSION")))
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("could not load config from file: {0}")]
    LoadError(#[from] std::io::Error),
    #[error("could not parse config: {0}")]
    ParseError(#[from] serde_yaml::Error),
    #[error("invalid settings: {0}")]
    Settings(#[from] gateway::config::ConfigError),
}
