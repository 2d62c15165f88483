//! Operation: show the negotiated repository list.

use std::io::{self, Write};

use pomgraph_core::config::ScanConfig;
use pomgraph_maven::repository::RemoteRepositoryConfig;
use pomgraph_util::errors::PomgraphError;

use crate::ops_resolve;

const MASK: &str = "********";

/// Print every repository after bucket rewriting and authentication.
pub async fn repos(config: &ScanConfig) -> miette::Result<()> {
    let client = ops_resolve::build_client(config)?;
    let repos = ops_resolve::negotiated_repositories(config, &client).await;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_repositories(&mut out, &repos).map_err(PomgraphError::Io)?;
    Ok(())
}

/// One line per repository, then one indented line per header. Header
/// values are never shown.
pub fn write_repositories<W: Write>(
    out: &mut W,
    repos: &[RemoteRepositoryConfig],
) -> io::Result<()> {
    if repos.is_empty() {
        return writeln!(out, "No repositories configured.");
    }
    writeln!(out, "Repositories ({}):", repos.len())?;
    for repo in repos {
        writeln!(out, "  {}", repo.url)?;
        for header in &repo.http_headers {
            writeln!(out, "      {}: {MASK}", header.name)?;
        }
    }
    Ok(())
}
