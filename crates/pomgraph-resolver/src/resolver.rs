//! Transitive resolution.
//!
//! Each artifact is analysed once per session: its POM is fetched,
//! relocations are followed, the parent chain and imported BOMs are merged,
//! and Gradle module metadata overrides managed versions when the POM
//! advertises it. The walk from the root is breadth-first with Maven's
//! nearest-wins rule, analysing one level at a time concurrently.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use futures_util::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use pomgraph_core::artifact::Artifact;
use pomgraph_core::config::VersionPriority;
use pomgraph_core::package::{Package, Relationship};
use pomgraph_maven::download::{fetch_from_repos, Fetch};
use pomgraph_maven::module::{has_metadata_marker, parse_module_metadata, ModuleMetadata};
use pomgraph_maven::pom::{parse_pom, Pom, PomDependency, PomExclusion};
use pomgraph_maven::repository::RemoteRepositoryConfig;
use pomgraph_maven::unresolvable::UnresolvableEndpoints;
use pomgraph_util::errors::PomgraphError;

use crate::cache::{AnalysisResult, DescriptorCache, ResolvedDependency, SharedResolutionCache};

const DEFAULT_MAX_CONCURRENT_FETCHES: usize = 8;
const MAX_PARENT_DEPTH: usize = 16;
const MAX_RELOCATIONS: usize = 8;

/// Scopes that never reach a consumer's runtime classpath.
const NON_TRANSITIVE_SCOPES: &[&str] = &["test", "provided", "system", "import"];

/// Per-run state: resolution cache, parent/BOM descriptors, endpoint
/// memory and version policy.
#[derive(Debug, Default)]
pub struct ResolutionSession {
    pub cache: SharedResolutionCache,
    pub descriptors: DescriptorCache,
    pub endpoints: UnresolvableEndpoints,
    pub version_priority: VersionPriority,
}

impl ResolutionSession {
    pub fn new(version_priority: VersionPriority) -> Self {
        Self {
            version_priority,
            ..Self::default()
        }
    }
}

struct FetchedPom {
    pom: Pom,
    raw: Vec<u8>,
    repository: String,
}

/// Entry in the BFS queue.
struct QueueEntry {
    artifact: Artifact,
    depth: usize,
    /// Index of the dependent in the output package list.
    parent: usize,
    exclusions: HashSet<String>,
    dev: bool,
}

pub struct Resolver<F> {
    fetcher: F,
    repos: Vec<RemoteRepositoryConfig>,
    session: Arc<ResolutionSession>,
    max_concurrent_fetches: usize,
}

impl<F: Fetch> Resolver<F> {
    /// `repos` should already have gone through repository negotiation.
    pub fn new(
        fetcher: F,
        repos: Vec<RemoteRepositoryConfig>,
        session: Arc<ResolutionSession>,
    ) -> Self {
        Self {
            fetcher,
            repos,
            session,
            max_concurrent_fetches: DEFAULT_MAX_CONCURRENT_FETCHES,
        }
    }

    pub fn with_max_concurrent_fetches(mut self, n: usize) -> Self {
        self.max_concurrent_fetches = n.max(1);
        self
    }

    pub fn session(&self) -> &ResolutionSession {
        &self.session
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    async fn fetch_pom(&self, artifact: &Artifact) -> miette::Result<Option<FetchedPom>> {
        let fetched = fetch_from_repos(
            &self.fetcher,
            &self.session.endpoints,
            &self.repos,
            &artifact.pom_path(),
        )
        .await;
        let Some(fetched) = fetched else {
            return Ok(None);
        };
        let pom = parse_pom(&fetched.bytes).map_err(|e| PomgraphError::Descriptor {
            message: format!("{artifact}: {e}"),
        })?;
        Ok(Some(FetchedPom {
            pom,
            raw: fetched.bytes,
            repository: fetched.repo_url,
        }))
    }

    /// Parsed parent or BOM descriptor, shared across the session.
    async fn descriptor(&self, artifact: &Artifact) -> Option<Arc<Pom>> {
        let slot = self.session.descriptors.slot(artifact);
        slot.get_or_init(|| async {
            match self.fetch_pom(artifact).await {
                Ok(Some(fetched)) => Some(Arc::new(fetched.pom)),
                Ok(None) => {
                    debug!(artifact = %artifact, "descriptor not found");
                    None
                }
                Err(e) => {
                    warn!(artifact = %artifact, error = %e, "skipping unreadable descriptor");
                    None
                }
            }
        })
        .await
        .clone()
    }

    /// Analyse one artifact, or return the session's cached analysis.
    ///
    /// `Ok(None)` means no repository has the descriptor.
    pub async fn analyze(&self, artifact: &Artifact) -> miette::Result<Option<Arc<AnalysisResult>>> {
        let cache = &self.session.cache;
        if let Some(hit) = cache.get(artifact) {
            return Ok(Some(hit));
        }

        let mut current = artifact.clone();
        let mut relocations = 0;
        let fetched = loop {
            let Some(fetched) = self.fetch_pom(&current).await? else {
                debug!(artifact = %current, "descriptor not found in any repository");
                return Ok(None);
            };
            let Some(target) = fetched.pom.relocation_target(&current) else {
                break fetched;
            };
            if relocations == MAX_RELOCATIONS {
                warn!(artifact = %artifact, "too many relocations; using {current}");
                break fetched;
            }
            relocations += 1;
            debug!(from = %current, to = %target, "following relocation");

            if let Some(hit) = cache
                .get(&target)
                .or_else(|| cache.get_by_name(&target.name()))
            {
                cache.put(artifact, hit.clone());
                return Ok(Some(hit));
            }
            current = target;
        };

        let pom = self.effective_pom(fetched.pom).await;
        let module = if has_metadata_marker(&fetched.raw) {
            self.module_metadata(&current).await
        } else {
            None
        };

        let mut result = AnalysisResult::new(current.clone());
        result.dependencies = declared_dependencies(
            &pom,
            module.as_ref(),
            self.session.version_priority,
            false,
        );
        result.repository = Some(fetched.repository);
        result.packaging = pom.packaging.clone();

        let result = Arc::new(result);
        cache.put(&current, result.clone());
        if current != *artifact {
            cache.put(artifact, result.clone());
        }
        Ok(Some(result))
    }

    /// Merge the parent chain, expand properties and import BOMs.
    async fn effective_pom(&self, pom: Pom) -> Pom {
        let mut pom = self.with_parents(pom).await;
        self.import_boms(&mut pom).await;
        pom
    }

    async fn with_parents(&self, mut pom: Pom) -> Pom {
        let mut seen = HashSet::new();
        let mut next = pom.parent.as_ref().map(|p| p.artifact());

        while let Some(parent) = next.take() {
            if seen.len() >= MAX_PARENT_DEPTH || !seen.insert(parent.key()) {
                warn!(parent = %parent, "parent chain loops or is too deep; stopping");
                break;
            }
            if let Some(parent_pom) = self.descriptor(&parent).await {
                next = parent_pom.parent.as_ref().map(|p| p.artifact());
                pom.apply_parent(&parent_pom);
            }
        }

        pom.resolve_properties();
        pom
    }

    async fn import_boms(&self, pom: &mut Pom) {
        let mut queue: VecDeque<Artifact> = bom_artifacts(pom).into();
        let mut seen = HashSet::new();

        while let Some(bom) = queue.pop_front() {
            if !seen.insert(bom.key()) {
                continue;
            }
            let Some(descriptor) = self.descriptor(&bom).await else {
                continue;
            };

            let bom_pom = self.with_parents(Pom::clone(&descriptor)).await;
            queue.extend(bom_artifacts(&bom_pom));
            let managed: Vec<PomDependency> = bom_pom
                .dependency_management
                .into_iter()
                .filter(|d| d.scope.as_deref() != Some("import"))
                .collect();
            pom.merge_managed(&managed);
        }
    }

    async fn module_metadata(&self, artifact: &Artifact) -> Option<ModuleMetadata> {
        let fetched = fetch_from_repos(
            &self.fetcher,
            &self.session.endpoints,
            &self.repos,
            &artifact.module_path(),
        )
        .await?;
        match parse_module_metadata(&fetched.bytes) {
            Ok(metadata) => Some(metadata),
            Err(e) => {
                warn!(artifact = %artifact, error = %e, "ignoring unreadable module metadata");
                None
            }
        }
    }

    /// Resolve the full graph below a root POM.
    ///
    /// The root is reported as [`Relationship::Root`], its declared
    /// dependencies as `Direct` and everything else as `Indirect`.
    /// Test-scoped direct dependencies and their subtrees are `dev`.
    pub async fn resolve(&self, root_pom: &[u8]) -> miette::Result<Vec<Package>> {
        let pom = self.effective_pom(parse_pom(root_pom)?).await;
        let root = pom
            .artifact()
            .map(|a| a.with_version(pom.interpolate(a.version())))
            .ok_or_else(|| PomgraphError::Resolution {
                message: "root POM must declare groupId, artifactId and version".to_string(),
            })?;

        let direct = declared_dependencies(&pom, None, self.session.version_priority, true);
        info!(root = %root, direct = direct.len(), "Resolving dependencies");

        let root_pkg = Package::new(&root.name(), root.version(), Relationship::Root);
        let mut resolved: HashMap<String, String> = HashMap::new();
        resolved.insert(root.name(), root_pkg.id.clone());
        let mut packages = vec![root_pkg];

        let mut queue: VecDeque<QueueEntry> = direct
            .into_iter()
            .map(|dep| QueueEntry {
                dev: dep.scope == "test",
                artifact: dep.artifact,
                depth: 1,
                parent: 0,
                exclusions: dep.exclusions.into_iter().collect(),
            })
            .collect();

        while !queue.is_empty() {
            // The queue only ever holds one depth level at this point.
            let level: Vec<QueueEntry> = queue.drain(..).collect();

            let mut seen = HashSet::new();
            let pending: Vec<Artifact> = level
                .iter()
                .filter(|e| !resolved.contains_key(&e.artifact.name()))
                .map(|e| e.artifact.clone())
                .filter(|a| seen.insert(a.clone()))
                .collect();

            let analyses: HashMap<Artifact, Option<Arc<AnalysisResult>>> = stream::iter(pending)
                .map(|artifact| async move {
                    let analysis = match self.analyze(&artifact).await {
                        Ok(analysis) => analysis,
                        Err(e) => {
                            warn!(artifact = %artifact, error = %e, "analysis failed; treating as leaf");
                            None
                        }
                    };
                    (artifact, analysis)
                })
                .buffer_unordered(self.max_concurrent_fetches)
                .collect()
                .await;

            for entry in level {
                let name = entry.artifact.name();
                if let Some(existing) = resolved.get(&name) {
                    link(&mut packages[entry.parent], existing);
                    continue;
                }

                let analysis = analyses.get(&entry.artifact).cloned().flatten();
                let coords = analysis
                    .as_ref()
                    .map(|a| a.artifact.clone())
                    .unwrap_or_else(|| entry.artifact.clone());

                // A relocation may land on a name that is already resolved.
                if let Some(existing) = resolved.get(&coords.name()).cloned() {
                    link(&mut packages[entry.parent], &existing);
                    resolved.insert(name, existing);
                    continue;
                }

                let relationship = if entry.depth == 1 {
                    Relationship::Direct
                } else {
                    Relationship::Indirect
                };
                let pkg =
                    Package::new(&coords.name(), coords.version(), relationship).dev(entry.dev);
                let id = pkg.id.clone();
                let index = packages.len();
                packages.push(pkg);
                link(&mut packages[entry.parent], &id);
                resolved.insert(coords.name(), id.clone());
                resolved.insert(name, id);

                let Some(analysis) = analysis else {
                    continue;
                };
                for dep in &analysis.dependencies {
                    if is_excluded(&entry.exclusions, &dep.artifact) {
                        debug!(dependency = %dep.artifact, "excluded");
                        continue;
                    }
                    let mut exclusions = entry.exclusions.clone();
                    exclusions.extend(dep.exclusions.iter().cloned());
                    queue.push_back(QueueEntry {
                        artifact: dep.artifact.clone(),
                        depth: entry.depth + 1,
                        parent: index,
                        exclusions,
                        dev: entry.dev,
                    });
                }
            }
        }

        info!(packages = packages.len(), "Resolution finished");
        Ok(packages)
    }
}

fn link(pkg: &mut Package, id: &str) {
    if pkg.id != id && !pkg.depends_on.iter().any(|d| d == id) {
        pkg.depends_on.push(id.to_string());
    }
}

fn bom_artifacts(pom: &Pom) -> Vec<Artifact> {
    pom.bom_imports()
        .filter_map(|d| {
            let version = d.version.as_deref().filter(|v| !v.contains("${"))?;
            Some(Artifact::new(&d.group_id, &d.artifact_id, version))
        })
        .collect()
}

fn exclusion_key(exclusion: &PomExclusion) -> String {
    match exclusion.artifact_id.as_deref() {
        Some(artifact) if artifact != "*" => format!("{}:{artifact}", exclusion.group_id),
        _ => exclusion.group_id.clone(),
    }
}

fn is_excluded(exclusions: &HashSet<String>, artifact: &Artifact) -> bool {
    exclusions.contains("*")
        || exclusions.contains(artifact.group())
        || exclusions.contains(&artifact.name())
}

/// Dependencies a POM contributes, with versions settled.
///
/// Version-less dependencies take their version from module metadata
/// first, then from dependency management. Optional dependencies and
/// non-transitive scopes are dropped; `include_test` keeps test scope for
/// the root project.
fn declared_dependencies(
    pom: &Pom,
    module: Option<&ModuleMetadata>,
    priority: VersionPriority,
    include_test: bool,
) -> Vec<ResolvedDependency> {
    pom.dependencies
        .iter()
        .filter(|dep| !dep.optional)
        .filter_map(|dep| {
            let managed = pom.managed(&dep.group_id, &dep.artifact_id);
            let scope = dep
                .scope
                .as_deref()
                .or(managed.and_then(|m| m.scope.as_deref()))
                .unwrap_or("compile");
            if NON_TRANSITIVE_SCOPES.contains(&scope) && !(include_test && scope == "test") {
                return None;
            }

            let version = dep
                .version
                .clone()
                .or_else(|| {
                    module
                        .and_then(|m| m.preferred_version(&dep.group_id, &dep.artifact_id, priority))
                        .map(str::to_string)
                })
                .or_else(|| managed.and_then(|m| m.version.clone()))
                .filter(|v| !v.is_empty() && !v.contains("${"));
            let Some(version) = version else {
                debug!(dependency = %dep.name(), "no usable version; skipping");
                return None;
            };

            Some(ResolvedDependency {
                artifact: Artifact::new(&dep.group_id, &dep.artifact_id, version),
                scope: scope.to_string(),
                exclusions: dep.exclusions.iter().map(exclusion_key).collect(),
            })
        })
        .collect()
}
