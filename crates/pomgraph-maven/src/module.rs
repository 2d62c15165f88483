//! Gradle Module Metadata (`.module` files) and version-constraint selection.
//!
//! Gradle publishes a JSON side-file next to the POM that carries precise
//! per-variant constraints. POMs published this way contain the comment
//! `<!-- do_not_remove: published-with-gradle-metadata -->`.
//!
//! Format reference:
//! <https://github.com/gradle/gradle/blob/master/platforms/documentation/docs/src/docs/design/gradle-module-metadata-latest-specification.md>

use std::collections::BTreeMap;

use serde::Deserialize;

use pomgraph_core::config::VersionPriority;
use pomgraph_util::errors::PomgraphError;

/// Marker Gradle writes into POMs that have a `.module` sibling.
pub const GRADLE_METADATA_MARKER: &str = "published-with-gradle-metadata";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleMetadata {
    #[serde(default)]
    pub format_version: String,
    #[serde(default)]
    pub component: ModuleComponent,
    #[serde(default)]
    pub variants: Vec<ModuleVariant>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModuleComponent {
    #[serde(default)]
    pub group: String,
    #[serde(default)]
    pub module: String,
    #[serde(default)]
    pub version: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleVariant {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, AttributeValue>,
    #[serde(default)]
    pub dependencies: Vec<ModuleDependency>,
    #[serde(default)]
    pub dependency_constraints: Vec<ModuleDependency>,
}

/// Variant attribute values are strings, numbers or booleans.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Bool(bool),
    Number(serde_json::Number),
    String(String),
}

/// An entry of `dependencies` or `dependencyConstraints`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModuleDependency {
    #[serde(default)]
    pub group: String,
    #[serde(default)]
    pub module: String,
    #[serde(default)]
    pub version: VersionSpec,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VersionSpec {
    #[serde(default)]
    pub strictly: Option<String>,
    #[serde(default)]
    pub requires: Option<String>,
    #[serde(default)]
    pub prefers: Option<String>,
    #[serde(default)]
    pub rejects: Vec<String>,
}

impl VersionSpec {
    /// The version this constraint selects, or `None` if every field is
    /// absent or empty.
    pub fn select(&self, priority: VersionPriority) -> Option<&str> {
        let order = match priority {
            VersionPriority::StrictFirst => [&self.strictly, &self.requires, &self.prefers],
            VersionPriority::PreferFirst => [&self.strictly, &self.prefers, &self.requires],
        };
        order
            .into_iter()
            .flatten()
            .map(String::as_str)
            .find(|v| !v.is_empty())
    }
}

impl ModuleDependency {
    fn matches(&self, group: &str, module: &str) -> bool {
        self.group == group && self.module == module
    }
}

/// Decode a `.module` document.
pub fn parse_module_metadata(content: &[u8]) -> Result<ModuleMetadata, PomgraphError> {
    serde_json::from_slice(content).map_err(|e| PomgraphError::Metadata {
        message: e.to_string(),
    })
}

impl ModuleMetadata {
    /// Version chosen for `group:module` by the first entry that names it.
    ///
    /// Variants are scanned in document order. Within a variant the
    /// `dependencyConstraints` (platform and BOM overrides) are checked
    /// before `dependencies`. Entries whose version fields are all empty
    /// are skipped.
    pub fn preferred_version(
        &self,
        group: &str,
        module: &str,
        priority: VersionPriority,
    ) -> Option<&str> {
        self.variants
            .iter()
            .flat_map(|variant| {
                variant
                    .dependency_constraints
                    .iter()
                    .chain(variant.dependencies.iter())
            })
            .filter(|dep| dep.matches(group, module))
            .find_map(|dep| dep.version.select(priority))
    }
}

/// Whether a POM advertises a Gradle module metadata sibling.
pub fn has_metadata_marker(descriptor: &[u8]) -> bool {
    let marker = GRADLE_METADATA_MARKER.as_bytes();
    descriptor.windows(marker.len()).any(|w| w == marker)
}
