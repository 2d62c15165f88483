//! Operation: look up a dependency's version in a Gradle module file.

use std::path::Path;

use pomgraph_core::config::VersionPriority;
use pomgraph_maven::module::parse_module_metadata;
use pomgraph_util::errors::PomgraphError;

/// Version that `module_file` selects for `coordinate` (`group:name`).
///
/// `Ok(None)` when the document does not mention the dependency.
pub fn module_version(
    module_file: &Path,
    coordinate: &str,
    priority: VersionPriority,
) -> miette::Result<Option<String>> {
    let (group, name) = coordinate
        .split_once(':')
        .filter(|(g, n)| !g.is_empty() && !n.is_empty() && !n.contains(':'))
        .ok_or_else(|| PomgraphError::Generic {
            message: format!("expected `group:name`, got `{coordinate}`"),
        })?;

    let content = std::fs::read(module_file).map_err(|e| PomgraphError::Metadata {
        message: format!("Failed to read {}: {e}", module_file.display()),
    })?;
    let metadata = parse_module_metadata(&content)?;

    Ok(metadata
        .preferred_version(group, name, priority)
        .map(str::to_string))
}
