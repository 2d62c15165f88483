//! Repository registration: bucket URL rewriting and bearer-token injection.
//!
//! Authentication is resolved once per repository list, not per request.
//! The token is cached on the negotiator and shared by every caller:
//!
//! - readers take the read lock and reuse a token that is still valid;
//! - a caller that finds no valid token takes the write lock, checks again,
//!   and only then performs the exchange, so concurrent callers trigger at
//!   most one exchange.

use std::path::PathBuf;

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use pomgraph_util::errors::PomgraphError;

use crate::auth::{AccessToken, GoogleTokenProvider, TokenProvider};
use crate::repository::{
    convert_bucket_to_https, is_bucket_url, is_managed_storage_url, HttpHeader,
    RemoteRepositoryConfig,
};

/// Name of the header carrying the bearer token.
pub const AUTHORIZATION_HEADER: &str = "Authorization";

/// Turns configured repositories into fetchable, authenticated endpoints.
pub struct RepositoryNegotiator<P = GoogleTokenProvider> {
    credentials_env: String,
    provider: P,
    token: RwLock<Option<AccessToken>>,
}

impl<P: TokenProvider> RepositoryNegotiator<P> {
    /// `credentials_env` names the environment variable holding the path
    /// of the credential file.
    pub fn new(credentials_env: impl Into<String>, provider: P) -> Self {
        Self {
            credentials_env: credentials_env.into(),
            provider,
            token: RwLock::new(None),
        }
    }

    fn credentials_path(&self) -> Option<PathBuf> {
        std::env::var_os(&self.credentials_env)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
    }

    /// Authorization header for managed-storage repositories.
    ///
    /// Returns `Ok(None)` when no credential file is configured. Read,
    /// parse and exchange failures are errors; callers are expected to
    /// carry on without authentication.
    pub async fn authorization_header(&self) -> Result<Option<HttpHeader>, PomgraphError> {
        {
            let token = self.token.read().await;
            if let Some(valid) = token.as_ref().filter(|t| t.is_valid()) {
                return Ok(Some(bearer_header(valid)));
            }
        }

        let Some(cred_path) = self.credentials_path() else {
            return Ok(None);
        };

        let mut token = self.token.write().await;
        if let Some(valid) = token.as_ref().filter(|t| t.is_valid()) {
            return Ok(Some(bearer_header(valid)));
        }

        debug!(credentials_file = %cred_path.display(), "Generating access token");
        let data = tokio::fs::read(&cred_path)
            .await
            .map_err(|e| PomgraphError::Auth {
                message: format!(
                    "failed to read credentials file {}: {e}",
                    cred_path.display()
                ),
            })?;

        let fresh = self.provider.exchange(&data).await?;
        let header = bearer_header(&fresh);
        *token = Some(fresh);
        info!("Access token generated");

        Ok(Some(header))
    }

    /// Normalise and authenticate a repository list.
    ///
    /// Bucket URLs become HTTPS first; managed-storage repositories then get
    /// an `Authorization` header. A repository whose header can't be
    /// obtained is kept, unauthenticated.
    pub async fn register_repositories(
        &self,
        repos: Vec<RemoteRepositoryConfig>,
    ) -> Vec<RemoteRepositoryConfig> {
        let mut registered = Vec::with_capacity(repos.len());

        for mut repo in repos {
            if is_bucket_url(&repo.url) {
                match convert_bucket_to_https(&repo.url) {
                    Ok(url) => repo.url = url,
                    Err(e) => {
                        debug!(url = %repo.url, error = %e, "Failed to convert bucket URL");
                        registered.push(repo);
                        continue;
                    }
                }
            }

            if is_managed_storage_url(&repo.url) {
                match self.authorization_header().await {
                    Ok(Some(header)) => {
                        repo.http_headers.push(header);
                        debug!(repo = %repo.url, "Added authentication to repository");
                    }
                    Ok(None) => {}
                    Err(e) => {
                        warn!(repo = %repo.url, error = %e, "Continuing without authentication");
                    }
                }
            }

            registered.push(repo);
        }

        registered
    }
}

fn bearer_header(token: &AccessToken) -> HttpHeader {
    HttpHeader::new(AUTHORIZATION_HEADER, token.bearer())
}
