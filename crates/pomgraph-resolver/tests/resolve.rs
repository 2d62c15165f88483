use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use pomgraph_core::artifact::Artifact;
use pomgraph_core::config::VersionPriority;
use pomgraph_core::package::{Package, Relationship};
use pomgraph_maven::download::{Fetch, FetchOutcome};
use pomgraph_maven::repository::RemoteRepositoryConfig;
use pomgraph_resolver::cache::AnalysisResult;
use pomgraph_resolver::resolver::{ResolutionSession, Resolver};

const REPO: &str = "https://repo.example.com/maven2";

/// In-memory repository keyed by repository-relative path.
#[derive(Default)]
struct MemoryRepo {
    files: HashMap<String, Vec<u8>>,
    requests: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl MemoryRepo {
    fn with(mut self, path: String, body: impl Into<Vec<u8>>) -> Self {
        self.files.insert(path, body.into());
        self
    }

    fn pom(self, coords: &str, body: String) -> Self {
        let artifact = Artifact::parse(coords).unwrap();
        self.with(artifact.pom_path(), body)
    }

    fn requests_for(&self, suffix: &str) -> usize {
        self.requests
            .lock()
            .iter()
            .filter(|u| u.ends_with(suffix))
            .count()
    }
}

impl Fetch for MemoryRepo {
    async fn fetch(&self, _repo: &RemoteRepositoryConfig, url: &str) -> FetchOutcome {
        self.requests.lock().push(url.to_string());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::task::yield_now().await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let path = url.strip_prefix(REPO).unwrap_or(url).trim_start_matches('/');
        match self.files.get(path) {
            Some(body) => FetchOutcome::Found(body.clone()),
            None => FetchOutcome::NotFound,
        }
    }
}

fn project(coords: &str, extra: &str, deps: &[&str]) -> String {
    let a = Artifact::parse(coords).unwrap();
    let deps: String = deps.iter().map(|d| dependency_xml(d)).collect();
    format!(
        "<project>
  <groupId>{}</groupId>
  <artifactId>{}</artifactId>
  <version>{}</version>
  {extra}
  <dependencies>{deps}</dependencies>
</project>",
        a.group(),
        a.artifact_name(),
        a.version()
    )
}

/// `group:artifact[:version][@scope]`
fn dependency_xml(notation: &str) -> String {
    let (coords, scope) = notation.split_once('@').unwrap_or((notation, ""));
    let parts: Vec<&str> = coords.split(':').collect();
    let version = parts
        .get(2)
        .map(|v| format!("<version>{v}</version>"))
        .unwrap_or_default();
    let scope = if scope.is_empty() {
        String::new()
    } else {
        format!("<scope>{scope}</scope>")
    };
    format!(
        "<dependency><groupId>{}</groupId><artifactId>{}</artifactId>{version}{scope}</dependency>",
        parts[0], parts[1]
    )
}

fn resolver(repo: MemoryRepo) -> Resolver<MemoryRepo> {
    Resolver::new(
        repo,
        vec![RemoteRepositoryConfig::new(REPO)],
        Arc::new(ResolutionSession::default()),
    )
}

fn find<'a>(packages: &'a [Package], id: &str) -> &'a Package {
    packages
        .iter()
        .find(|p| p.id == id)
        .unwrap_or_else(|| panic!("{id} not resolved; got {packages:?}"))
}

#[tokio::test]
async fn nearest_version_wins() {
    let repo = MemoryRepo::default()
        .pom("g:a:1", project("g:a:1", "", &["g:c:1"]))
        .pom("g:b:1", project("g:b:1", "", &["g:c:2"]))
        .pom("g:c:1", project("g:c:1", "", &[]))
        .pom("g:c:2", project("g:c:2", "", &[]));
    let root = project("app:app:1.0", "", &["g:a:1", "g:b:1"]);

    let packages = resolver(repo).resolve(root.as_bytes()).await.unwrap();

    assert_eq!(packages.len(), 4);
    let app = find(&packages, "app:app@1.0");
    assert_eq!(app.relationship, Relationship::Root);
    assert_eq!(app.depends_on, vec!["g:a@1", "g:b@1"]);
    assert_eq!(find(&packages, "g:a@1").relationship, Relationship::Direct);
    assert_eq!(find(&packages, "g:b@1").depends_on, vec!["g:c@1"]);
    assert_eq!(find(&packages, "g:c@1").relationship, Relationship::Indirect);
    assert!(!packages.iter().any(|p| p.id == "g:c@2"));
}

#[tokio::test]
async fn test_scope_is_dev_at_root_only() {
    let repo = MemoryRepo::default()
        .pom("junit:junit:4.13.2", project("junit:junit:4.13.2", "", &["org.hamcrest:hamcrest-core:1.3"]))
        .pom("org.hamcrest:hamcrest-core:1.3", project("org.hamcrest:hamcrest-core:1.3", "", &[]))
        .pom("g:lib:1", project("g:lib:1", "", &["g:lib-test-helper:1@test"]));
    let root = project("app:app:1.0", "", &["junit:junit:4.13.2@test", "g:lib:1"]);

    let packages = resolver(repo).resolve(root.as_bytes()).await.unwrap();

    assert!(find(&packages, "junit:junit@4.13.2").dev);
    assert!(find(&packages, "org.hamcrest:hamcrest-core@1.3").dev);
    assert!(!find(&packages, "g:lib@1").dev);
    assert!(!packages.iter().any(|p| p.name == "g:lib-test-helper"));
}

#[tokio::test]
async fn exclusions_prune_subtrees() {
    let repo = MemoryRepo::default()
        .pom("g:a:1", project("g:a:1", "", &["org.slf4j:slf4j-api:2.0", "g:b:1"]))
        .pom("g:b:1", project("g:b:1", "", &[]))
        .pom("org.slf4j:slf4j-api:2.0", project("org.slf4j:slf4j-api:2.0", "", &[]));
    let root = "<project><groupId>app</groupId><artifactId>app</artifactId><version>1</version>
  <dependencies><dependency>
    <groupId>g</groupId><artifactId>a</artifactId><version>1</version>
    <exclusions><exclusion><groupId>org.slf4j</groupId><artifactId>*</artifactId></exclusion></exclusions>
  </dependency></dependencies></project>";

    let packages = resolver(repo).resolve(root.as_bytes()).await.unwrap();

    assert_eq!(find(&packages, "g:a@1").depends_on, vec!["g:b@1"]);
    assert!(!packages.iter().any(|p| p.name == "org.slf4j:slf4j-api"));
}

#[tokio::test]
async fn relocation_is_followed() {
    let relocated = "<project><groupId>mysql</groupId><artifactId>mysql-connector-java</artifactId>
  <version>8.0.33</version>
  <distributionManagement><relocation><groupId>com.mysql</groupId>
  <artifactId>mysql-connector-j</artifactId></relocation></distributionManagement></project>";
    let repo = MemoryRepo::default()
        .pom("mysql:mysql-connector-java:8.0.33", relocated.to_string())
        .pom(
            "com.mysql:mysql-connector-j:8.0.33",
            project("com.mysql:mysql-connector-j:8.0.33", "", &["com.google.protobuf:protobuf-java:3.21.9"]),
        );
    let root = project("app:app:1", "", &["mysql:mysql-connector-java:8.0.33"]);

    let resolver = resolver(repo);
    let packages = resolver.resolve(root.as_bytes()).await.unwrap();

    let connector = find(&packages, "com.mysql:mysql-connector-j@8.0.33");
    assert_eq!(connector.relationship, Relationship::Direct);
    assert_eq!(connector.depends_on, vec!["com.google.protobuf:protobuf-java@3.21.9"]);
    // Missing descriptors still show up, as leaves.
    assert!(find(&packages, "com.google.protobuf:protobuf-java@3.21.9")
        .depends_on
        .is_empty());

    let cached = resolver
        .session()
        .cache
        .get(&Artifact::new("mysql", "mysql-connector-java", "8.0.33"))
        .unwrap();
    assert_eq!(cached.artifact.name(), "com.mysql:mysql-connector-j");
}

#[tokio::test]
async fn relocation_reuses_result_cached_under_new_name() {
    let relocated = "<project><groupId>old</groupId><artifactId>lib</artifactId><version>1</version>
  <distributionManagement><relocation><groupId>new</groupId></relocation></distributionManagement></project>";
    let repo = MemoryRepo::default().pom("old:lib:1", relocated.to_string());
    let resolver = resolver(repo);

    let known = Artifact::new("new", "lib", "2");
    resolver
        .session()
        .cache
        .put(&known, Arc::new(AnalysisResult::new(known.clone())));

    let result = resolver
        .analyze(&Artifact::new("old", "lib", "1"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(result.artifact, known);
}

#[tokio::test]
async fn parent_and_bom_manage_versions() {
    let parent = "<project><groupId>org.example</groupId><artifactId>parent</artifactId><version>3</version>
  <properties><guava.version>33.0.0-jre</guava.version></properties>
  <dependencyManagement><dependencies>
    <dependency><groupId>com.google.guava</groupId><artifactId>guava</artifactId><version>${guava.version}</version></dependency>
  </dependencies></dependencyManagement></project>";
    let bom = "<project><groupId>com.fasterxml.jackson</groupId><artifactId>jackson-bom</artifactId><version>2.17.0</version>
  <dependencyManagement><dependencies>
    <dependency><groupId>com.fasterxml.jackson.core</groupId><artifactId>jackson-databind</artifactId><version>2.17.0</version></dependency>
  </dependencies></dependencyManagement></project>";
    let repo = MemoryRepo::default()
        .pom("org.example:parent:3", parent.to_string())
        .pom("com.fasterxml.jackson:jackson-bom:2.17.0", bom.to_string());
    let root = "<project>
  <parent><groupId>org.example</groupId><artifactId>parent</artifactId><version>3</version></parent>
  <artifactId>app</artifactId>
  <dependencyManagement><dependencies>
    <dependency><groupId>com.fasterxml.jackson</groupId><artifactId>jackson-bom</artifactId>
      <version>2.17.0</version><type>pom</type><scope>import</scope></dependency>
  </dependencies></dependencyManagement>
  <dependencies>
    <dependency><groupId>com.google.guava</groupId><artifactId>guava</artifactId></dependency>
    <dependency><groupId>com.fasterxml.jackson.core</groupId><artifactId>jackson-databind</artifactId></dependency>
  </dependencies></project>";

    let packages = resolver(repo).resolve(root.as_bytes()).await.unwrap();

    let app = find(&packages, "org.example:app@3");
    assert_eq!(
        app.depends_on,
        vec![
            "com.google.guava:guava@33.0.0-jre",
            "com.fasterxml.jackson.core:jackson-databind@2.17.0"
        ]
    );
}

#[tokio::test]
async fn shared_parent_and_bom_are_fetched_once() {
    let parent = "<project><groupId>org.example</groupId><artifactId>parent</artifactId><version>3</version>
  <dependencyManagement><dependencies>
    <dependency><groupId>org.example</groupId><artifactId>shared</artifactId><version>1.5</version></dependency>
  </dependencies></dependencyManagement></project>";
    let bom = "<project><groupId>org.example</groupId><artifactId>bom</artifactId><version>3</version>
  <dependencyManagement><dependencies>
    <dependency><groupId>org.example</groupId><artifactId>managed</artifactId><version>2.0</version></dependency>
  </dependencies></dependencyManagement></project>";
    let child_extra = "<parent><groupId>org.example</groupId><artifactId>parent</artifactId><version>3</version></parent>
  <dependencyManagement><dependencies>
    <dependency><groupId>org.example</groupId><artifactId>bom</artifactId><version>3</version>
      <type>pom</type><scope>import</scope></dependency>
  </dependencies></dependencyManagement>";

    let mut repo = MemoryRepo::default()
        .pom("org.example:parent:3", parent.to_string())
        .pom("org.example:bom:3", bom.to_string());
    for child in ["a", "b", "c"] {
        let coords = format!("org.example:{child}:3");
        let body = project(&coords, child_extra, &["org.example:shared", "org.example:managed"]);
        repo = repo.pom(&coords, body);
    }
    let root = project(
        "org.example:app:1",
        "",
        &["org.example:a:3", "org.example:b:3", "org.example:c:3"],
    );

    let resolver = resolver(repo);
    let packages = resolver.resolve(root.as_bytes()).await.unwrap();

    for child in ["a", "b", "c"] {
        let pkg = find(&packages, &format!("org.example:{child}@3"));
        assert_eq!(
            pkg.depends_on,
            vec!["org.example:shared@1.5", "org.example:managed@2.0"]
        );
    }
    assert_eq!(resolver.fetcher().requests_for("parent-3.pom"), 1);
    assert_eq!(resolver.fetcher().requests_for("bom-3.pom"), 1);
    assert_eq!(resolver.session().descriptors.len(), 2);
}

const MODULE: &str = r#"{
  "formatVersion": "1.1",
  "component": { "group": "io.grpc", "module": "grpc-bom", "version": "1.0" },
  "variants": [
    {
      "name": "apiElements",
      "dependencyConstraints": [
        { "group": "io.grpc", "module": "grpc-api", "version": { "strictly": "1.62.2", "requires": "1.60.0", "prefers": "1.61.0" } }
      ]
    }
  ]
}"#;

fn platform_pom(marker: bool) -> String {
    let marker = if marker {
        "<!-- do_not_remove: published-with-gradle-metadata -->"
    } else {
        ""
    };
    format!(
        "<project>{marker}<groupId>io.grpc</groupId><artifactId>grpc-core</artifactId><version>1.0</version>
  <dependencyManagement><dependencies>
    <dependency><groupId>io.grpc</groupId><artifactId>grpc-api</artifactId><version>1.50.0</version></dependency>
  </dependencies></dependencyManagement>
  <dependencies><dependency><groupId>io.grpc</groupId><artifactId>grpc-api</artifactId></dependency></dependencies>
</project>"
    )
}

#[tokio::test]
async fn module_metadata_overrides_managed_version() {
    let core = Artifact::new("io.grpc", "grpc-core", "1.0");
    let repo = MemoryRepo::default()
        .with(core.pom_path(), platform_pom(true))
        .with(core.module_path(), MODULE);
    let resolver = resolver(repo);

    let result = resolver.analyze(&core).await.unwrap().unwrap();
    assert_eq!(result.dependencies[0].artifact.version(), "1.62.2");
}

#[tokio::test]
async fn prefer_first_policy_is_configurable() {
    let core = Artifact::new("io.grpc", "grpc-core", "1.0");
    let module = MODULE.replace("\"strictly\": \"1.62.2\", ", "");
    let repo = MemoryRepo::default()
        .with(core.pom_path(), platform_pom(true))
        .with(core.module_path(), module);
    let resolver = Resolver::new(
        repo,
        vec![RemoteRepositoryConfig::new(REPO)],
        Arc::new(ResolutionSession::new(VersionPriority::PreferFirst)),
    );

    let result = resolver.analyze(&core).await.unwrap().unwrap();
    assert_eq!(result.dependencies[0].artifact.version(), "1.61.0");
}

#[tokio::test]
async fn module_metadata_is_not_fetched_without_marker() {
    let core = Artifact::new("io.grpc", "grpc-core", "1.0");
    let repo = MemoryRepo::default()
        .with(core.pom_path(), platform_pom(false))
        .with(core.module_path(), MODULE);
    let resolver = resolver(repo);

    let result = resolver.analyze(&core).await.unwrap().unwrap();
    assert_eq!(result.dependencies[0].artifact.version(), "1.50.0");
    assert_eq!(resolver.fetcher().requests_for(&core.module_path()), 0);
}

#[tokio::test]
async fn analysis_is_cached_and_misses_remembered() {
    let repo = MemoryRepo::default().pom("g:a:1", project("g:a:1", "", &[]));
    let resolver = resolver(repo);
    let a = Artifact::new("g", "a", "1");
    let missing = Artifact::new("g", "missing", "1");

    for _ in 0..3 {
        assert!(resolver.analyze(&a).await.unwrap().is_some());
        assert!(resolver.analyze(&missing).await.unwrap().is_none());
    }

    let session = resolver.session();
    assert_eq!(session.cache.len(), 1);
    assert!(session
        .endpoints
        .is_unresolvable_repo_path(REPO, &missing.pom_path()));
    assert_eq!(resolver.fetcher().requests_for(&a.pom_path()), 1);
    assert_eq!(resolver.fetcher().requests_for(&missing.pom_path()), 1);
}

#[tokio::test]
async fn level_fetches_are_bounded() {
    let deps: Vec<String> = (0..12).map(|i| format!("g:lib{i}:1")).collect();
    let dep_refs: Vec<&str> = deps.iter().map(String::as_str).collect();
    let mut repo = MemoryRepo::default();
    for coords in &deps {
        repo = repo.pom(coords, project(coords, "", &[]));
    }
    let root = project("app:app:1", "", &dep_refs);

    let resolver = resolver(repo).with_max_concurrent_fetches(3);
    let packages = resolver.resolve(root.as_bytes()).await.unwrap();

    assert_eq!(packages.len(), 13);
    assert!(resolver.fetcher().peak.load(Ordering::SeqCst) <= 3);
}
