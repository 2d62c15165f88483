//! Handler for `pomgraph module-version`.

use std::path::Path;

use miette::Result;

use pomgraph_core::config::ScanConfig;
use pomgraph_ops::ops_module;
use pomgraph_util::errors::PomgraphError;

pub fn exec(file: &Path, coordinate: &str, config: &ScanConfig) -> Result<()> {
    match ops_module::module_version(file, coordinate, config.version_priority)? {
        Some(version) => {
            println!("{version}");
            Ok(())
        }
        None => Err(PomgraphError::Generic {
            message: format!("{coordinate} is not constrained by {}", file.display()),
        }
        .into()),
    }
}
