//! Handler for `pomgraph repos`.

use miette::Result;

use pomgraph_core::config::ScanConfig;
use pomgraph_ops::ops_repos;

pub async fn exec(config: &ScanConfig) -> Result<()> {
    ops_repos::repos(config).await
}
