//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use pomgraph_resolver::print::Format;

#[derive(Parser, Debug)]
#[command(
    name = "pomgraph",
    version,
    about = "Resolve and display transitive Maven dependency graphs",
    long_about = "pomgraph walks a POM's parents, imported BOMs and Gradle module metadata \
                  to resolve its full transitive dependency graph, then renders it as a tree, \
                  a list or summary statistics."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file (defaults to ./pomgraph.toml when present)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Display the dependency graph
    Tree {
        /// POM to resolve
        #[arg(value_name = "POM", conflicts_with = "packages")]
        pom: Option<PathBuf>,
        /// Render a resolved JSON package list instead of resolving a POM
        #[arg(long, value_name = "JSON")]
        packages: Option<PathBuf>,
        /// Output format: tree or list
        #[arg(short, long, default_value = "tree")]
        format: Format,
        /// Start from every unreferenced package, not just top-level ones
        #[arg(long)]
        all: bool,
        /// Maximum depth (0 = unlimited)
        #[arg(long, default_value_t = 0)]
        depth: usize,
        /// Show each package's relationship to the root
        #[arg(long)]
        relationships: bool,
        /// Append dependency statistics
        #[arg(long)]
        stats: bool,
    },

    /// List repositories after URL rewriting and authentication
    Repos,

    /// Print the version a Gradle module file selects for a dependency
    ModuleVersion {
        /// Path to the .module file
        file: PathBuf,
        /// Dependency as group:name
        coordinate: String,
    },
}

pub fn parse() -> Cli {
    Cli::parse()
}
