//! Descriptor downloads from remote repositories.
//!
//! Every fetch goes through [`fetch_from_repos`], which consults and feeds
//! the session's [`UnresolvableEndpoints`] so that a dead repository or a
//! missing path is only ever requested once.

use std::future::Future;
use std::time::Duration;

use reqwest::{Client, StatusCode};
use tracing::{debug, warn};

use pomgraph_util::errors::PomgraphError;

use crate::repository::RemoteRepositoryConfig;
use crate::unresolvable::UnresolvableEndpoints;

const MAX_RETRIES: u32 = 3;
const RETRY_DELAY: Duration = Duration::from_millis(500);

/// Result of a single request against one repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Found(Vec<u8>),
    /// The repository answered but does not have the path.
    NotFound,
    /// The repository itself could not be used (connection, TLS, auth).
    Unreachable(String),
}

/// Transport used to fetch repository files.
pub trait Fetch: Send + Sync {
    fn fetch(
        &self,
        repo: &RemoteRepositoryConfig,
        url: &str,
    ) -> impl Future<Output = FetchOutcome> + Send;
}

/// Build a shared reqwest client for descriptor downloads.
pub fn build_client(timeout: Duration) -> Result<Client, PomgraphError> {
    Client::builder()
        .timeout(timeout)
        .user_agent(concat!("pomgraph/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| PomgraphError::Network {
            message: format!("Failed to create HTTP client: {e}"),
        })
}

/// HTTP transport with retries on server errors and timeouts.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl Fetch for HttpFetcher {
    async fn fetch(&self, repo: &RemoteRepositoryConfig, url: &str) -> FetchOutcome {
        let mut last_err = String::new();

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                tokio::time::sleep(RETRY_DELAY * attempt).await;
            }

            let mut req = self.client.get(url);
            for header in &repo.http_headers {
                req = req.header(header.name.as_str(), header.value.as_str());
            }

            match req.send().await {
                Ok(resp) => {
                    let status = resp.status();
                    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
                        return FetchOutcome::Unreachable(format!("HTTP {status} from {url}"));
                    }
                    if status.is_server_error() {
                        last_err = format!("HTTP {status} from {url}");
                        continue;
                    }
                    if !status.is_success() {
                        return FetchOutcome::NotFound;
                    }
                    return match resp.bytes().await {
                        Ok(bytes) => FetchOutcome::Found(bytes.to_vec()),
                        Err(e) => {
                            FetchOutcome::Unreachable(format!("Failed to read {url}: {e}"))
                        }
                    };
                }
                Err(e) if e.is_timeout() || e.is_connect() => {
                    last_err = e.to_string();
                    continue;
                }
                Err(e) => return FetchOutcome::Unreachable(format!("Request to {url} failed: {e}")),
            }
        }

        FetchOutcome::Unreachable(format!(
            "Failed after {MAX_RETRIES} retries for {url}: {last_err}"
        ))
    }
}

/// A file fetched from a specific repository.
#[derive(Debug, Clone)]
pub struct Fetched {
    pub repo_url: String,
    pub bytes: Vec<u8>,
}

/// Try each repository in order and return the first hit.
///
/// Repositories remembered as dead and paths remembered as missing are
/// skipped without a request. Misses are recorded for the rest of the
/// session.
pub async fn fetch_from_repos<F: Fetch>(
    fetcher: &F,
    memory: &UnresolvableEndpoints,
    repos: &[RemoteRepositoryConfig],
    path: &str,
) -> Option<Fetched> {
    for repo in repos {
        if memory.should_skip(&repo.url, path) {
            debug!(repo = %repo.url, path, "skipping known unresolvable endpoint");
            continue;
        }

        let url = repo.file_url(path);
        match fetcher.fetch(repo, &url).await {
            FetchOutcome::Found(bytes) => {
                debug!(url = %url, size = bytes.len(), "fetched");
                return Some(Fetched {
                    repo_url: repo.url.clone(),
                    bytes,
                });
            }
            FetchOutcome::NotFound => {
                memory.add_unresolvable_repo_path(&repo.url, path);
            }
            FetchOutcome::Unreachable(reason) => {
                warn!(repo = %repo.url, %reason, "repository unreachable; skipping it for this run");
                memory.add_unresolvable_repo(&repo.url);
            }
        }
    }
    None
}
