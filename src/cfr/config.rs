//! Configuration options for the regret-matching engine.
//!
//! This module provides configuration structs that control where the engine
//! keeps its progress document and how the random source is seeded.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::cfr::error::EngineError;

/// Default location of the local progress document.
pub const DEFAULT_PROGRESS_PATH: &str = "progress/ai_progress.json";

/// Default environment variable holding the remote store credential.
pub const DEFAULT_TOKEN_ENV: &str = "AI_PROGRESS_TOKEN";

/// Default base URL of the remote contents API.
pub const DEFAULT_API_BASE: &str = "https://api.github.com";

/// Configuration for the regret-matching engine.
///
/// # Example
/// ```
/// use ofc_regret::cfr::EngineConfig;
///
/// let config = EngineConfig::default().with_seed(7);
/// assert_eq!(config.seed, Some(7));
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Random seed for reproducibility.
    ///
    /// If set, action sampling uses a `StdRng` seeded with this value.
    /// If `None`, the generator is seeded from entropy.
    #[serde(default)]
    pub seed: Option<u64>,

    /// Local progress document written by `persist` and read by `restore`.
    #[serde(default = "default_progress_path")]
    pub progress_path: PathBuf,

    /// Remote content store, if progress should also be pushed remotely.
    #[serde(default)]
    pub remote: Option<RemoteConfig>,
}

fn default_progress_path() -> PathBuf {
    PathBuf::from(DEFAULT_PROGRESS_PATH)
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            seed: None,
            progress_path: default_progress_path(),
            remote: None,
        }
    }
}

impl EngineConfig {
    /// Create a new EngineConfig with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a configuration from a JSON file.
    ///
    /// Missing fields take their default values.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Builder method: set random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Builder method: set the local progress document path.
    pub fn with_progress_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.progress_path = path.into();
        self
    }

    /// Builder method: attach a remote content store.
    pub fn with_remote(mut self, remote: RemoteConfig) -> Self {
        self.remote = Some(remote);
        self
    }

    /// Validate the configuration and return any errors.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.progress_path.as_os_str().is_empty() {
            return Err(ConfigError::EmptyPath("progress_path"));
        }
        if let Some(remote) = &self.remote {
            remote.validate()?;
        }
        Ok(())
    }
}

/// Location and credentials of a remote, version-controlled content store.
///
/// The store speaks the GitHub contents API: the document lives at
/// `{api_base}/repos/{repo}/contents/{path}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Repository in `owner/name` form.
    pub repo: String,

    /// Path of the document inside the repository.
    #[serde(default = "default_remote_path")]
    pub path: String,

    /// Commit message used for every upsert.
    #[serde(default = "default_commit_message")]
    pub commit_message: String,

    /// Base URL of the API.
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Name of the environment variable holding the access token.
    #[serde(default = "default_token_env")]
    pub token_env: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_remote_path() -> String {
    DEFAULT_PROGRESS_PATH.to_string()
}

fn default_commit_message() -> String {
    "Update AI progress".to_string()
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_token_env() -> String {
    DEFAULT_TOKEN_ENV.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl RemoteConfig {
    /// Create a remote configuration for `repo` with default settings.
    pub fn new(repo: impl Into<String>) -> Self {
        Self {
            repo: repo.into(),
            path: default_remote_path(),
            commit_message: default_commit_message(),
            api_base: default_api_base(),
            token_env: default_token_env(),
            timeout_secs: default_timeout_secs(),
        }
    }

    /// Builder method: set the document path inside the repository.
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Builder method: set the commit message.
    pub fn with_commit_message(mut self, message: impl Into<String>) -> Self {
        self.commit_message = message.into();
        self
    }

    /// Builder method: point at a different API host.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Builder method: read the token from another environment variable.
    pub fn with_token_env(mut self, name: impl Into<String>) -> Self {
        self.token_env = name.into();
        self
    }

    /// Builder method: set the request timeout.
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Full URL of the document.
    pub fn contents_url(&self) -> String {
        format!(
            "{}/repos/{}/contents/{}",
            self.api_base.trim_end_matches('/'),
            self.repo,
            self.path.trim_start_matches('/')
        )
    }

    /// Read the access token from the environment.
    ///
    /// An unset or blank variable is a configuration error.
    pub fn token(&self) -> Result<String, EngineError> {
        match std::env::var(&self.token_env) {
            Ok(token) if !token.trim().is_empty() => Ok(token),
            _ => Err(EngineError::Configuration(format!(
                "{} is not set",
                self.token_env
            ))),
        }
    }

    /// Validate the remote configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut parts = self.repo.split('/');
        let owner = parts.next().unwrap_or_default();
        let name = parts.next().unwrap_or_default();
        if owner.is_empty() || name.is_empty() || parts.next().is_some() {
            return Err(ConfigError::InvalidRepo(self.repo.clone()));
        }
        if self.path.trim_matches('/').is_empty() {
            return Err(ConfigError::EmptyPath("remote.path"));
        }
        if !self.api_base.starts_with("http://") && !self.api_base.starts_with("https://") {
            return Err(ConfigError::InvalidApiBase(self.api_base.clone()));
        }
        if self.token_env.is_empty() {
            return Err(ConfigError::EmptyPath("remote.token_env"));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout(self.timeout_secs));
        }
        Ok(())
    }
}

/// Errors that can occur when loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required path or name is empty.
    #[error("{0} must not be empty")]
    EmptyPath(&'static str),
    /// Repository is not in `owner/name` form.
    #[error("repository {0:?} is not in owner/name form")]
    InvalidRepo(String),
    /// API base is not an http(s) URL.
    #[error("api base {0:?} is not an http(s) URL")]
    InvalidApiBase(String),
    /// Timeout must be at least one second.
    #[error("timeout of {0}s is out of range")]
    InvalidTimeout(u64),
    /// The configuration file could not be read.
    #[error("cannot read {}: {source}", .path.display())]
    Read {
        /// Path of the configuration file.
        path: PathBuf,
        /// The OS error.
        #[source]
        source: std::io::Error,
    },
    /// The configuration file is not valid JSON for this schema.
    #[error("cannot parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.progress_path, PathBuf::from(DEFAULT_PROGRESS_PATH));
        assert!(config.seed.is_none());
    }

    #[test]
    fn test_remote_validation() {
        assert!(RemoteConfig::new("owner/repo").validate().is_ok());
        assert!(matches!(
            RemoteConfig::new("owner").validate(),
            Err(ConfigError::InvalidRepo(_))
        ));
        assert!(matches!(
            RemoteConfig::new("a/b/c").validate(),
            Err(ConfigError::InvalidRepo(_))
        ));
        assert!(matches!(
            RemoteConfig::new("owner/repo").with_timeout_secs(0).validate(),
            Err(ConfigError::InvalidTimeout(0))
        ));
        assert!(matches!(
            RemoteConfig::new("owner/repo").with_api_base("ftp://x").validate(),
            Err(ConfigError::InvalidApiBase(_))
        ));
    }

    #[test]
    fn test_contents_url() {
        let remote = RemoteConfig::new("owner/repo")
            .with_api_base("http://localhost:8080/")
            .with_path("/progress/ai.json");
        assert_eq!(
            remote.contents_url(),
            "http://localhost:8080/repos/owner/repo/contents/progress/ai.json"
        );
    }

    #[test]
    fn test_missing_token_is_configuration_error() {
        let remote = RemoteConfig::new("owner/repo")
            .with_token_env("OFC_REGRET_TEST_TOKEN_THAT_IS_NEVER_SET");
        assert!(matches!(remote.token(), Err(EngineError::Configuration(_))));
    }

    #[test]
    fn test_parse_partial_json() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"seed": 3, "remote": {"repo": "me/progress"}}"#).unwrap();
        assert_eq!(config.seed, Some(3));
        let remote = config.remote.unwrap();
        assert_eq!(remote.token_env, DEFAULT_TOKEN_ENV);
        assert_eq!(remote.timeout_secs, 30);
    }
}
