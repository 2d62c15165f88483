//! Command dispatch and handler modules.

mod module_version;
mod repos;
mod tree;

use miette::Result;

use pomgraph_core::config::ScanConfig;
use pomgraph_util::errors::PomgraphError;

use crate::cli::{Cli, Command};

/// `--config` if given, else `pomgraph.toml` in the working directory.
fn load_config(cli: &Cli) -> Result<ScanConfig> {
    match &cli.config {
        Some(path) => ScanConfig::from_path(path),
        None => {
            let cwd = std::env::current_dir().map_err(PomgraphError::Io)?;
            ScanConfig::load(&cwd)
        }
    }
}

/// Route a parsed CLI invocation to the appropriate command handler.
pub async fn dispatch(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;
    match cli.command {
        Command::Tree {
            pom,
            packages,
            format,
            all,
            depth,
            relationships,
            stats,
        } => {
            let opts = tree::Args {
                pom,
                packages,
                format,
                all,
                depth,
                relationships,
                stats,
            };
            tree::exec(opts, &config).await
        }
        Command::Repos => repos::exec(&config).await,
        Command::ModuleVersion { file, coordinate } => {
            module_version::exec(&file, &coordinate, &config)
        }
    }
}
