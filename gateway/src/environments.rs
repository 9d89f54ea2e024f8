use indexmap::IndexMap;
use std::path::{Path, PathBuf};

#[derive(thiserror::Error, Debug)]
pub enum RegistryError {
    #[error("could not read environment registry {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse environment registry: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Unrecognised Environment: {0}")]
    UnknownEnvironment(String),
}

/// Maps deployment environment names to the base URI of their GIFTs API.
#[derive(Clone, Debug, PartialEq)]
pub struct EnvironmentRegistry {
    uris: IndexMap<String, String>,
}

impl EnvironmentRegistry {
    /// Reads the registry from disk. Nothing is cached, so edits to the file
    /// apply to the next submission.
    pub async fn load(path: &Path) -> Result<Self, RegistryError> {
        let data = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| RegistryError::Read {
                path: path.to_path_buf(),
                source,
            })?;

        Self::from_json(&data)
    }

    pub fn from_json(data: &str) -> Result<Self, RegistryError> {
        Ok(EnvironmentRegistry {
            uris: serde_json::from_str(data)?,
        })
    }

    pub fn resolve(&self, environment: &str) -> Result<&str, RegistryError> {
        self.uris
            .get(environment)
            .map(String::as_str)
            .ok_or_else(|| RegistryError::UnknownEnvironment(environment.to_string()))
    }

    pub fn contains(&self, environment: &str) -> bool {
        self.uris.contains_key(environment)
    }
}
