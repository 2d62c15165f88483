use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use pomgraph_util::errors::PomgraphError;

/// Name of the per-directory configuration file.
pub const CONFIG_FILE_NAME: &str = "pomgraph.toml";

/// Scan configuration loaded from `pomgraph.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Environment variable that names the OAuth2 credential file.
    #[serde(default = "default_credentials_env", rename = "credentials-env")]
    pub credentials_env: String,

    #[serde(
        default = "default_max_concurrent_fetches",
        rename = "max-concurrent-fetches"
    )]
    pub max_concurrent_fetches: usize,

    #[serde(
        default = "default_request_timeout_secs",
        rename = "request-timeout-secs"
    )]
    pub request_timeout_secs: u64,

    #[serde(default, rename = "version-priority")]
    pub version_priority: VersionPriority,

    /// Append Maven Central when no configured repository points at it.
    #[serde(default = "default_true", rename = "include-maven-central")]
    pub include_maven_central: bool,

    #[serde(default)]
    pub repositories: BTreeMap<String, RepositoryEntry>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            credentials_env: default_credentials_env(),
            max_concurrent_fetches: default_max_concurrent_fetches(),
            request_timeout_secs: default_request_timeout_secs(),
            version_priority: VersionPriority::default(),
            include_maven_central: true,
            repositories: BTreeMap::new(),
        }
    }
}

fn default_credentials_env() -> String {
    "GOOGLE_APPLICATION_CREDENTIALS".to_string()
}

fn default_max_concurrent_fetches() -> usize {
    8
}

fn default_request_timeout_secs() -> u64 {
    60
}

fn default_true() -> bool {
    true
}

/// A repository declared in `[repositories]`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum RepositoryEntry {
    Url(String),
    Detailed {
        url: String,
        #[serde(default)]
        headers: BTreeMap<String, String>,
    },
}

impl RepositoryEntry {
    pub fn url(&self) -> &str {
        match self {
            RepositoryEntry::Url(url) => url,
            RepositoryEntry::Detailed { url, .. } => url,
        }
    }
}

/// Which field of a Gradle version constraint wins when several are set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VersionPriority {
    /// `strictly`, then `requires`, then `prefers`.
    #[default]
    StrictFirst,
    /// `strictly`, then `prefers`, then `requires`.
    PreferFirst,
}

impl ScanConfig {
    /// Load `pomgraph.toml` from `dir`, or return defaults if it doesn't exist.
    pub fn load(dir: &Path) -> miette::Result<Self> {
        let path = Self::default_path(dir);
        if path.is_file() {
            Self::from_path(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load a configuration file that must exist.
    pub fn from_path(path: &Path) -> miette::Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| PomgraphError::Config {
            message: format!("Failed to read {}: {e}", path.display()),
        })?;
        Self::parse_toml(&content)
    }

    pub fn parse_toml(content: &str) -> miette::Result<Self> {
        toml::from_str(content).map_err(|e| {
            PomgraphError::Config {
                message: format!("Failed to parse config: {e}"),
            }
            .into()
        })
    }

    pub fn default_path(dir: &Path) -> PathBuf {
        dir.join(CONFIG_FILE_NAME)
    }
}
