//! Resolution cache keyed by exact artifact identity.
//!
//! One cache lives for one resolution session and is never persisted.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use pomgraph_core::artifact::Artifact;
use pomgraph_maven::pom::Pom;
use tokio::sync::OnceCell;

/// A dependency declared by an analysed artifact, with its version settled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDependency {
    pub artifact: Artifact,
    pub scope: String,
    /// `group:artifact` or bare `group` keys excluded below this edge.
    pub exclusions: Vec<String>,
}

/// Everything learned about one artifact. Read-only once cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisResult {
    /// Final coordinates, after following relocations.
    pub artifact: Artifact,
    pub dependencies: Vec<ResolvedDependency>,
    /// Repository the descriptor was fetched from.
    pub repository: Option<String>,
    pub packaging: Option<String>,
}

impl AnalysisResult {
    pub fn new(artifact: Artifact) -> Self {
        Self {
            artifact,
            dependencies: Vec::new(),
            repository: None,
            packaging: None,
        }
    }
}

/// Map from `group:name:version` to its analysis.
///
/// Not synchronized; see [`SharedResolutionCache`] for concurrent use.
#[derive(Debug, Default)]
pub struct ResolutionCache {
    entries: HashMap<String, Arc<AnalysisResult>>,
}

impl ResolutionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the entry for `artifact`.
    pub fn put(&mut self, artifact: &Artifact, result: Arc<AnalysisResult>) {
        self.entries.insert(artifact.key(), result);
    }

    pub fn get(&self, artifact: &Artifact) -> Option<&Arc<AnalysisResult>> {
        self.entries.get(&artifact.key())
    }

    /// Any cached result whose artifact is `group:name`, whatever its
    /// version. Used to short-circuit relocations.
    pub fn get_by_name(&self, name: &str) -> Option<&Arc<AnalysisResult>> {
        self.entries.values().find(|r| r.artifact.name() == name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Mutex-guarded [`ResolutionCache`] shared by concurrent analysis tasks.
#[derive(Debug, Default)]
pub struct SharedResolutionCache {
    inner: Mutex<ResolutionCache>,
}

impl SharedResolutionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, artifact: &Artifact, result: Arc<AnalysisResult>) {
        self.inner.lock().put(artifact, result);
    }

    pub fn get(&self, artifact: &Artifact) -> Option<Arc<AnalysisResult>> {
        self.inner.lock().get(artifact).cloned()
    }

    pub fn get_by_name(&self, name: &str) -> Option<Arc<AnalysisResult>> {
        self.inner.lock().get_by_name(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

/// Parsed parent and BOM descriptors, fetched at most once per session.
///
/// Each coordinate gets one slot; tasks asking for the same descriptor
/// concurrently wait on the first fetch. `None` records a descriptor that
/// could not be fetched or parsed.
#[derive(Debug, Default)]
pub struct DescriptorCache {
    slots: Mutex<HashMap<String, Arc<OnceCell<Option<Arc<Pom>>>>>>,
}

impl DescriptorCache {
    pub fn slot(&self, artifact: &Artifact) -> Arc<OnceCell<Option<Arc<Pom>>>> {
        self.slots.lock().entry(artifact.key()).or_default().clone()
    }

    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.lock().is_empty()
    }
}
