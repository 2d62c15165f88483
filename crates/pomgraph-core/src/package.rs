//! Flat package model consumed by the graph renderers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Position of a package relative to the scan root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Relationship {
    Root,
    Workspace,
    Direct,
    Indirect,
    #[default]
    Unknown,
}

impl Relationship {
    /// Fixed display order used by list and statistics output.
    pub const DISPLAY_ORDER: [Relationship; 5] = [
        Relationship::Root,
        Relationship::Workspace,
        Relationship::Direct,
        Relationship::Indirect,
        Relationship::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Relationship::Root => "root",
            Relationship::Workspace => "workspace",
            Relationship::Direct => "direct",
            Relationship::Indirect => "indirect",
            Relationship::Unknown => "unknown",
        }
    }

    /// Capitalised name for section headings.
    pub fn title(&self) -> &'static str {
        match self {
            Relationship::Root => "Root",
            Relationship::Workspace => "Workspace",
            Relationship::Direct => "Direct",
            Relationship::Indirect => "Indirect",
            Relationship::Unknown => "Unknown",
        }
    }

    /// Whether packages with this relationship are tree roots when not
    /// showing the whole graph.
    pub fn is_top_level(&self) -> bool {
        matches!(
            self,
            Relationship::Root | Relationship::Direct | Relationship::Workspace
        )
    }
}

impl fmt::Display for Relationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolved package in a dependency graph.
///
/// `depends_on` holds package IDs. They may point at IDs missing from the
/// package list, and they may form cycles.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub relationship: Relationship,
    #[serde(default, alias = "dependsOn")]
    pub depends_on: Vec<String>,
    #[serde(default)]
    pub dev: bool,
}

impl Package {
    /// Build a package whose ID is `name@version`.
    pub fn new(name: &str, version: &str, relationship: Relationship) -> Self {
        Self {
            id: format!("{name}@{version}"),
            name: name.to_string(),
            version: version.to_string(),
            relationship,
            depends_on: Vec::new(),
            dev: false,
        }
    }

    pub fn depends_on<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.depends_on = ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn dev(mut self, dev: bool) -> Self {
        self.dev = dev;
        self
    }
}

/// Parse a JSON array of packages.
pub fn packages_from_json(json: &str) -> miette::Result<Vec<Package>> {
    serde_json::from_str(json).map_err(|e| {
        pomgraph_util::errors::PomgraphError::Generic {
            message: format!("Failed to parse package list: {e}"),
        }
        .into()
    })
}
