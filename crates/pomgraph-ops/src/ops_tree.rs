//! Operation: display the dependency tree, list or statistics.

use std::io::{self, Write};
use std::path::PathBuf;

use pomgraph_core::config::ScanConfig;
use pomgraph_core::package::{packages_from_json, Package, Relationship};
use pomgraph_resolver::print::{self, PrintOptions};
use pomgraph_util::errors::PomgraphError;

use crate::ops_resolve;

/// Where the package list comes from.
#[derive(Debug, Clone)]
pub enum TreeSource {
    /// Resolve a POM against the configured repositories.
    Pom(PathBuf),
    /// Read an already-resolved JSON package list.
    Packages(PathBuf),
}

/// Options for `pomgraph tree`.
#[derive(Debug, Clone, Default)]
pub struct TreeOptions {
    pub print: PrintOptions,
    /// Append dependency statistics after the tree or list.
    pub stats: bool,
}

/// Render the dependency graph of `source` to stdout.
pub async fn tree(source: &TreeSource, config: &ScanConfig, opts: &TreeOptions) -> miette::Result<()> {
    let (packages, target) = match source {
        TreeSource::Pom(path) => {
            let packages = ops_resolve::resolve(path, config).await?;
            let target = root_label(&packages).unwrap_or_else(|| path.display().to_string());
            (packages, target)
        }
        TreeSource::Packages(path) => {
            let json = tokio::fs::read_to_string(path)
                .await
                .map_err(|e| PomgraphError::Generic {
                    message: format!("Failed to read {}: {e}", path.display()),
                })?;
            (packages_from_json(&json)?, path.display().to_string())
        }
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_report(&mut out, &packages, &target, opts)
}

fn root_label(packages: &[Package]) -> Option<String> {
    packages
        .iter()
        .find(|p| p.relationship == Relationship::Root)
        .map(|p| format!("{}@{}", p.name, p.version))
}

/// Write the selected rendering, then statistics if requested.
pub fn write_report<W: Write>(
    out: &mut W,
    packages: &[Package],
    target: &str,
    opts: &TreeOptions,
) -> miette::Result<()> {
    print::render(out, packages, target, &opts.print).map_err(PomgraphError::Io)?;
    if opts.stats && !packages.is_empty() {
        writeln!(out).map_err(PomgraphError::Io)?;
        print::render_stats(out, packages, target).map_err(PomgraphError::Io)?;
    }
    Ok(())
}
