//! Handler for `pomgraph tree`.

use std::path::PathBuf;

use miette::Result;

use pomgraph_core::config::ScanConfig;
use pomgraph_ops::ops_tree::{self, TreeOptions, TreeSource};
use pomgraph_resolver::print::{Format, PrintOptions};
use pomgraph_util::errors::PomgraphError;

const DEFAULT_POM: &str = "pom.xml";

pub struct Args {
    pub pom: Option<PathBuf>,
    pub packages: Option<PathBuf>,
    pub format: Format,
    pub all: bool,
    pub depth: usize,
    pub relationships: bool,
    pub stats: bool,
}

pub async fn exec(args: Args, config: &ScanConfig) -> Result<()> {
    let source = match (args.packages, args.pom) {
        (Some(json), _) => TreeSource::Packages(json),
        (None, Some(pom)) => TreeSource::Pom(pom),
        (None, None) => {
            let pom = PathBuf::from(DEFAULT_POM);
            if !pom.is_file() {
                return Err(PomgraphError::Generic {
                    message: format!("No {DEFAULT_POM} found in current directory"),
                }
                .into());
            }
            TreeSource::Pom(pom)
        }
    };

    let opts = TreeOptions {
        print: PrintOptions {
            show_all: args.all,
            max_depth: args.depth,
            show_relationships: args.relationships,
            format: args.format,
        },
        stats: args.stats,
    };

    ops_tree::tree(&source, config, &opts).await
}
