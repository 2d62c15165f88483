//! Operation: resolve the dependency graph of a POM.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use tracing::debug;

use pomgraph_core::config::ScanConfig;
use pomgraph_core::package::Package;
use pomgraph_maven::auth::GoogleTokenProvider;
use pomgraph_maven::download::{self, HttpFetcher};
use pomgraph_maven::negotiate::RepositoryNegotiator;
use pomgraph_maven::repository::{RemoteRepositoryConfig, MAVEN_CENTRAL_URL};
use pomgraph_resolver::resolver::{ResolutionSession, Resolver};
use pomgraph_util::errors::PomgraphError;
use pomgraph_util::progress;

/// Repositories from the configuration, ordered by name, followed by
/// Maven Central unless disabled or already listed.
pub fn configured_repositories(config: &ScanConfig) -> Vec<RemoteRepositoryConfig> {
    let mut repos: Vec<RemoteRepositoryConfig> = config
        .repositories
        .values()
        .map(RemoteRepositoryConfig::from_entry)
        .collect();
    if config.include_maven_central && !repos.iter().any(|r| r.url == MAVEN_CENTRAL_URL) {
        repos.push(RemoteRepositoryConfig::maven_central());
    }
    repos
}

pub fn build_client(config: &ScanConfig) -> miette::Result<Client> {
    Ok(download::build_client(Duration::from_secs(
        config.request_timeout_secs,
    ))?)
}

/// Rewrite bucket URLs and attach credentials to managed repositories.
pub async fn negotiated_repositories(
    config: &ScanConfig,
    client: &Client,
) -> Vec<RemoteRepositoryConfig> {
    let negotiator = RepositoryNegotiator::new(
        config.credentials_env.clone(),
        GoogleTokenProvider::new(client.clone()),
    );
    negotiator
        .register_repositories(configured_repositories(config))
        .await
}

/// Resolve every transitive dependency of the POM at `pom_path`.
pub async fn resolve(pom_path: &Path, config: &ScanConfig) -> miette::Result<Vec<Package>> {
    let content = tokio::fs::read(pom_path)
        .await
        .map_err(|e| PomgraphError::Descriptor {
            message: format!("Failed to read {}: {e}", pom_path.display()),
        })?;

    let client = build_client(config)?;
    let repos = negotiated_repositories(config, &client).await;
    debug!(repositories = repos.len(), "Repositories registered");

    progress::status("Resolving", &pom_path.display().to_string());
    let session = Arc::new(ResolutionSession::new(config.version_priority));
    let resolver = Resolver::new(HttpFetcher::new(client), repos, session)
        .with_max_concurrent_fetches(config.max_concurrent_fetches);
    let packages = resolver.resolve(&content).await?;

    let unresolved = packages
        .iter()
        .filter(|p| resolver.session().cache.get_by_name(&p.name).is_none())
        .count();
    if unresolved > 1 {
        // The root is never fetched, so it is always counted here.
        progress::status_warn(
            "Incomplete",
            &format!("{} descriptors could not be fetched", unresolved - 1),
        );
    }
    progress::status("Resolved", &format!("{} packages", packages.len()));
    Ok(packages)
}
