use std::fmt;

/// Maven coordinates of a single artifact version.
///
/// Immutable once constructed. The cache identity is `group:name:version`;
/// the name projection `group:name` ignores the version and is what
/// relocation lookups match on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Artifact {
    group: String,
    name: String,
    version: String,
}

impl Artifact {
    pub fn new(
        group: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            name: name.into(),
            version: version.into(),
        }
    }

    /// Parse `"group:name:version"` into coordinates.
    pub fn parse(s: &str) -> Option<Self> {
        let mut parts = s.split(':');
        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(g), Some(n), Some(v), None) if !g.is_empty() && !n.is_empty() => {
                Some(Self::new(g, n, v))
            }
            _ => None,
        }
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn artifact_name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// `group:name` identifier (without version).
    pub fn name(&self) -> String {
        format!("{}:{}", self.group, self.name)
    }

    /// Exact identity key, `group:name:version`.
    pub fn key(&self) -> String {
        format!("{}:{}:{}", self.group, self.name, self.version)
    }

    /// Same group and name with a different version.
    pub fn with_version(&self, version: impl Into<String>) -> Self {
        Self::new(self.group.clone(), self.name.clone(), version)
    }

    /// Standard Maven layout directory for this coordinate.
    ///
    /// `org.jetbrains.kotlinx:kotlinx-coroutines-core:1.8.0` becomes
    /// `org/jetbrains/kotlinx/kotlinx-coroutines-core/1.8.0`
    pub fn layout_dir(&self) -> String {
        format!(
            "{}/{}/{}",
            self.group.replace('.', "/"),
            self.name,
            self.version
        )
    }

    /// Repository-relative path of the POM descriptor.
    pub fn pom_path(&self) -> String {
        format!("{}/{}-{}.pom", self.layout_dir(), self.name, self.version)
    }

    /// Repository-relative path of the Gradle module metadata side-file.
    pub fn module_path(&self) -> String {
        format!("{}/{}-{}.module", self.layout_dir(), self.name, self.version)
    }
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group, self.name, self.version)
    }
}
