//! POM descriptor parsing: coordinates, parent reference, properties,
//! dependencies, dependency management and relocation.

use std::collections::BTreeMap;

use quick_xml::events::Event;
use quick_xml::Reader;

use pomgraph_core::artifact::Artifact;
use pomgraph_util::errors::PomgraphError;

/// Upper bound on nested `${...}` expansions.
const MAX_INTERPOLATION_PASSES: usize = 16;

/// A parsed POM file.
#[derive(Debug, Clone, Default)]
pub struct Pom {
    pub group_id: Option<String>,
    pub artifact_id: Option<String>,
    pub version: Option<String>,
    pub packaging: Option<String>,
    pub parent: Option<ParentRef>,
    pub properties: BTreeMap<String, String>,
    pub dependencies: Vec<PomDependency>,
    pub dependency_management: Vec<PomDependency>,
    pub relocation: Option<Relocation>,
}

#[derive(Debug, Clone, Default)]
pub struct ParentRef {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
}

impl ParentRef {
    pub fn artifact(&self) -> Artifact {
        Artifact::new(&self.group_id, &self.artifact_id, &self.version)
    }
}

#[derive(Debug, Clone, Default)]
pub struct PomDependency {
    pub group_id: String,
    pub artifact_id: String,
    pub version: Option<String>,
    pub scope: Option<String>,
    pub type_: Option<String>,
    pub optional: bool,
    pub exclusions: Vec<PomExclusion>,
}

impl PomDependency {
    /// `group:artifact` identifier.
    pub fn name(&self) -> String {
        format!("{}:{}", self.group_id, self.artifact_id)
    }
}

#[derive(Debug, Clone, Default)]
pub struct PomExclusion {
    pub group_id: String,
    pub artifact_id: Option<String>,
}

/// `<distributionManagement><relocation>`: every field is optional and
/// defaults to the relocated artifact's own value.
#[derive(Debug, Clone, Default)]
pub struct Relocation {
    pub group_id: Option<String>,
    pub artifact_id: Option<String>,
    pub version: Option<String>,
}

impl Pom {
    pub fn effective_group_id(&self) -> Option<&str> {
        self.group_id
            .as_deref()
            .or(self.parent.as_ref().map(|p| p.group_id.as_str()))
    }

    pub fn effective_version(&self) -> Option<&str> {
        self.version
            .as_deref()
            .or(self.parent.as_ref().map(|p| p.version.as_str()))
    }

    /// Coordinates this POM declares for itself.
    pub fn artifact(&self) -> Option<Artifact> {
        Some(Artifact::new(
            self.effective_group_id()?,
            self.artifact_id.as_deref()?,
            self.effective_version()?,
        ))
    }

    /// New coordinates if this POM relocates `current` elsewhere.
    pub fn relocation_target(&self, current: &Artifact) -> Option<Artifact> {
        let reloc = self.relocation.as_ref()?;
        let target = Artifact::new(
            reloc.group_id.as_deref().unwrap_or(current.group()),
            reloc
                .artifact_id
                .as_deref()
                .unwrap_or(current.artifact_name()),
            reloc.version.as_deref().unwrap_or(current.version()),
        );
        (target != *current).then_some(target)
    }

    fn property(&self, key: &str) -> Option<String> {
        let value = match key {
            "project.groupId" | "pom.groupId" | "groupId" => self.effective_group_id(),
            "project.artifactId" | "pom.artifactId" | "artifactId" => self.artifact_id.as_deref(),
            "project.version" | "pom.version" | "version" => self.effective_version(),
            "project.parent.groupId" => self.parent.as_ref().map(|p| p.group_id.as_str()),
            "project.parent.version" => self.parent.as_ref().map(|p| p.version.as_str()),
            _ => self.properties.get(key).map(String::as_str),
        };
        value.map(str::to_string)
    }

    /// Expand `${...}` references. Unknown properties are left in place.
    pub fn interpolate(&self, input: &str) -> String {
        let mut current = input.to_string();
        for _ in 0..MAX_INTERPOLATION_PASSES {
            let mut out = String::with_capacity(current.len());
            let mut rest = current.as_str();
            let mut changed = false;
            while let Some(start) = rest.find("${") {
                let Some(len) = rest[start..].find('}') else {
                    break;
                };
                out.push_str(&rest[..start]);
                let key = &rest[start + 2..start + len];
                match self.property(key) {
                    Some(value) => {
                        out.push_str(&value);
                        changed = true;
                    }
                    None => out.push_str(&rest[start..start + len + 1]),
                }
                rest = &rest[start + len + 1..];
            }
            out.push_str(rest);
            current = out;
            if !changed {
                break;
            }
        }
        current
    }

    /// Expand property references in every dependency coordinate.
    pub fn resolve_properties(&mut self) {
        let snapshot = self.clone();
        let deps = self
            .dependencies
            .iter_mut()
            .chain(self.dependency_management.iter_mut());
        for dep in deps {
            dep.group_id = snapshot.interpolate(&dep.group_id);
            dep.artifact_id = snapshot.interpolate(&dep.artifact_id);
            dep.version = dep.version.as_deref().map(|v| snapshot.interpolate(v));
        }
    }

    /// Inherit properties, coordinates and dependency management from a
    /// parent POM. Entries declared here win over inherited ones.
    pub fn apply_parent(&mut self, parent: &Pom) {
        for (key, value) in &parent.properties {
            self.properties
                .entry(key.clone())
                .or_insert_with(|| value.clone());
        }
        if self.group_id.is_none() {
            self.group_id = parent.effective_group_id().map(str::to_string);
        }
        if self.version.is_none() {
            self.version = parent.effective_version().map(str::to_string);
        }
        self.merge_managed(&parent.dependency_management);
        for dep in &parent.dependencies {
            if !self.dependencies.iter().any(|d| d.name() == dep.name()) {
                self.dependencies.push(dep.clone());
            }
        }
    }

    /// Add managed entries not already managed here.
    pub fn merge_managed(&mut self, managed: &[PomDependency]) {
        for dm in managed {
            let known = self
                .dependency_management
                .iter()
                .any(|d| d.group_id == dm.group_id && d.artifact_id == dm.artifact_id);
            if !known {
                self.dependency_management.push(dm.clone());
            }
        }
    }

    pub fn managed(&self, group_id: &str, artifact_id: &str) -> Option<&PomDependency> {
        self.dependency_management
            .iter()
            .find(|d| d.group_id == group_id && d.artifact_id == artifact_id)
    }

    /// `<scope>import</scope>` entries of dependency management.
    pub fn bom_imports(&self) -> impl Iterator<Item = &PomDependency> {
        self.dependency_management
            .iter()
            .filter(|d| d.scope.as_deref() == Some("import"))
    }
}

/// Parse raw POM bytes.
pub fn parse_pom(content: &[u8]) -> Result<Pom, PomgraphError> {
    let xml = String::from_utf8_lossy(content);
    let mut reader = Reader::from_str(&xml);
    reader.config_mut().trim_text(true);

    let mut pom = Pom::default();
    let mut path: Vec<String> = Vec::new();
    let mut text = String::new();
    let mut dep: Option<PomDependency> = None;
    let mut exclusion: Option<PomExclusion> = None;

    loop {
        let event = reader.read_event().map_err(|e| PomgraphError::Descriptor {
            message: format!("Failed to parse POM XML: {e}"),
        })?;
        match event {
            Event::Start(e) => {
                let tag = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
                match (path.last().map(String::as_str), tag.as_str()) {
                    (Some("dependencies"), "dependency") => dep = Some(PomDependency::default()),
                    (Some("exclusions"), "exclusion") => exclusion = Some(PomExclusion::default()),
                    _ => {}
                }
                path.push(tag);
                text.clear();
            }
            Event::Text(e) => {
                text = e
                    .unescape()
                    .map_err(|err| PomgraphError::Descriptor {
                        message: format!("Bad text in POM: {err}"),
                    })?
                    .to_string();
            }
            Event::End(_) => {
                let value = std::mem::take(&mut text);
                let segs: Vec<&str> = path.iter().map(String::as_str).collect();
                match segs.as_slice() {
                    ["project", "dependencies", "dependency"] => {
                        pom.dependencies.extend(dep.take());
                    }
                    ["project", "dependencyManagement", "dependencies", "dependency"] => {
                        pom.dependency_management.extend(dep.take());
                    }
                    // Plugin dependencies and other nested lists.
                    [.., "dependencies", "dependency"] => dep = None,
                    [.., "exclusions", "exclusion"] => {
                        if let (Some(d), Some(x)) = (dep.as_mut(), exclusion.take()) {
                            d.exclusions.push(x);
                        }
                    }
                    [.., "exclusion", field] => {
                        if let Some(x) = exclusion.as_mut() {
                            match *field {
                                "groupId" => x.group_id = value,
                                "artifactId" => x.artifact_id = Some(value),
                                _ => {}
                            }
                        }
                    }
                    [.., "dependency", field] => {
                        if let Some(d) = dep.as_mut() {
                            set_dependency_field(d, field, value);
                        }
                    }
                    ["project", "parent", field] => {
                        let parent = pom.parent.get_or_insert_with(ParentRef::default);
                        match *field {
                            "groupId" => parent.group_id = value,
                            "artifactId" => parent.artifact_id = value,
                            "version" => parent.version = value,
                            _ => {}
                        }
                    }
                    ["project", "properties", key] => {
                        pom.properties.insert(key.to_string(), value);
                    }
                    ["project", "distributionManagement", "relocation", field] => {
                        let reloc = pom.relocation.get_or_insert_with(Relocation::default);
                        match *field {
                            "groupId" => reloc.group_id = Some(value),
                            "artifactId" => reloc.artifact_id = Some(value),
                            "version" => reloc.version = Some(value),
                            _ => {}
                        }
                    }
                    ["project", "distributionManagement", "relocation"] => {
                        pom.relocation.get_or_insert_with(Relocation::default);
                    }
                    ["project", field] => match *field {
                        "groupId" => pom.group_id = Some(value),
                        "artifactId" => pom.artifact_id = Some(value),
                        "version" => pom.version = Some(value),
                        "packaging" => pom.packaging = Some(value),
                        _ => {}
                    },
                    _ => {}
                }
                path.pop();
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if path.is_empty() && pom.artifact_id.is_none() && pom.parent.is_none() {
        return Err(PomgraphError::Descriptor {
            message: "POM has no <artifactId>".to_string(),
        });
    }

    Ok(pom)
}

fn set_dependency_field(dep: &mut PomDependency, field: &str, value: String) {
    match field {
        "groupId" => dep.group_id = value,
        "artifactId" => dep.artifact_id = value,
        "version" => dep.version = Some(value),
        "scope" => dep.scope = Some(value),
        "type" => dep.type_ = Some(value),
        "optional" => dep.optional = value.trim() == "true",
        _ => {}
    }
}
