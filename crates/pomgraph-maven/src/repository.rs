//! Remote repository configuration and URL classification.

use pomgraph_core::config::RepositoryEntry;
use pomgraph_util::errors::PomgraphError;

/// Maven Central base URL.
pub const MAVEN_CENTRAL_URL: &str = "https://repo.maven.apache.org/maven2";

/// Scheme prefix of Google Cloud Storage bucket repositories.
pub const BUCKET_SCHEME: &str = "gcs://";

/// Host that serves bucket contents over HTTPS.
pub const STORAGE_HOST: &str = "storage.googleapis.com";

/// Host fragment shared by all Artifact Registry endpoints.
const ARTIFACT_REGISTRY_HOST: &str = ".pkg.dev";

/// A single HTTP header sent with every request to a repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpHeader {
    pub name: String,
    pub value: String,
}

impl HttpHeader {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A remote repository and the headers attached to its requests.
///
/// Headers are filled in once, at registration time, by
/// [`crate::negotiate::RepositoryNegotiator::register_repositories`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteRepositoryConfig {
    pub url: String,
    pub http_headers: Vec<HttpHeader>,
}

impl RemoteRepositoryConfig {
    pub fn new(url: impl Into<String>) -> Self {
        let url = url.into();
        // Never trim a bare scheme such as `gcs://` down to `gcs:`.
        let trimmed = url.trim_end_matches('/');
        let url = if trimmed.ends_with(':') {
            url
        } else {
            trimmed.to_string()
        };
        Self {
            url,
            http_headers: Vec::new(),
        }
    }

    /// Build a repository from a `pomgraph.toml` entry.
    pub fn from_entry(entry: &RepositoryEntry) -> Self {
        let mut repo = Self::new(entry.url());
        if let RepositoryEntry::Detailed { headers, .. } = entry {
            repo.http_headers = headers
                .iter()
                .map(|(name, value)| HttpHeader::new(name, value))
                .collect();
        }
        repo
    }

    pub fn maven_central() -> Self {
        Self::new(MAVEN_CENTRAL_URL)
    }

    /// Full URL of a repository-relative path.
    pub fn file_url(&self, path: &str) -> String {
        format!("{}/{}", self.url, path.trim_start_matches('/'))
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.http_headers
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value.as_str())
    }
}

/// Whether `url` uses the `gcs://` bucket scheme.
pub fn is_bucket_url(url: &str) -> bool {
    url.starts_with(BUCKET_SCHEME)
}

/// Whether `url` points at an Artifact Registry repository.
pub fn is_authenticated_registry_url(url: &str) -> bool {
    url.contains(ARTIFACT_REGISTRY_HOST)
}

/// Whether `url` is hosted on Google-managed storage: a bucket URL, an
/// Artifact Registry URL, or a bucket already rewritten to HTTPS.
pub fn is_managed_storage_url(url: &str) -> bool {
    is_authenticated_registry_url(url) || is_bucket_url(url) || url.contains(STORAGE_HOST)
}

/// Rewrite `gcs://bucket/path` to `https://storage.googleapis.com/bucket/path`.
///
/// URLs that don't use the bucket scheme are returned unchanged.
pub fn convert_bucket_to_https(url: &str) -> Result<String, PomgraphError> {
    let Some(rest) = url.strip_prefix(BUCKET_SCHEME) else {
        return Ok(url.to_string());
    };
    if rest.is_empty() {
        return Err(PomgraphError::InvalidUrl {
            url: url.to_string(),
        });
    }
    Ok(format!("https://{STORAGE_HOST}/{rest}"))
}
