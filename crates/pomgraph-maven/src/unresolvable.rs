//! Memory of repositories and repository paths that failed during this run.
//!
//! Entries are only ever added. A repository that failed once is assumed
//! to stay unreachable until the session ends.

use std::collections::HashSet;

use parking_lot::Mutex;

/// Host fragments of public repositories that have been shut down.
pub const OBSOLETE_REPO_HOSTS: &[&str] = &[
    "jcenter.bintray.com",
    "dl.bintray.com",
    "repository.codehaus.org",
    "download.java.net/maven/1",
];

/// Whether `url` points at a decommissioned repository host.
pub fn is_obsolete_repo(url: &str) -> bool {
    OBSOLETE_REPO_HOSTS.iter().any(|host| url.contains(host))
}

/// Session-scoped record of dead repositories and missing repository paths.
#[derive(Debug, Default)]
pub struct UnresolvableEndpoints {
    repos: Mutex<HashSet<String>>,
    repo_paths: Mutex<HashSet<(String, String)>>,
}

impl UnresolvableEndpoints {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_unresolvable_repo(&self, repo: &str) -> bool {
        self.repos.lock().contains(repo)
    }

    /// Remember a repository that failed for reasons unrelated to the
    /// requested artifact (DNS, TLS, auth rejection).
    pub fn add_unresolvable_repo(&self, repo: &str) {
        self.repos.lock().insert(repo.to_string());
    }

    pub fn is_unresolvable_repo_path(&self, repo: &str, path: &str) -> bool {
        self.repo_paths
            .lock()
            .contains(&(repo.to_string(), path.to_string()))
    }

    /// Remember that `path` is missing from `repo`. Other paths in the same
    /// repository are still tried.
    pub fn add_unresolvable_repo_path(&self, repo: &str, path: &str) {
        self.repo_paths
            .lock()
            .insert((repo.to_string(), path.to_string()));
    }

    /// Whether a fetch of `path` from `repo` should be skipped.
    pub fn should_skip(&self, repo: &str, path: &str) -> bool {
        is_obsolete_repo(repo)
            || self.is_unresolvable_repo(repo)
            || self.is_unresolvable_repo_path(repo, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn obsolete_hosts_match_by_substring() {
        assert!(is_obsolete_repo("https://jcenter.bintray.com"));
        assert!(is_obsolete_repo("https://dl.bintray.com/kotlin/kotlinx"));
        assert!(!is_obsolete_repo("https://repo.maven.apache.org/maven2"));
    }

    #[test]
    fn repo_memory_is_sticky() {
        let mem = UnresolvableEndpoints::new();
        assert!(!mem.is_unresolvable_repo("https://dead.example.com"));
        mem.add_unresolvable_repo("https://dead.example.com");
        mem.add_unresolvable_repo("https://dead.example.com");
        assert!(mem.is_unresolvable_repo("https://dead.example.com"));
        assert!(!mem.is_unresolvable_repo("https://alive.example.com"));
    }

    #[test]
    fn path_memory_does_not_block_other_paths() {
        let mem = UnresolvableEndpoints::new();
        let repo = "https://repo.example.com";
        mem.add_unresolvable_repo_path(repo, "a/b/1.0/b-1.0.pom");
        assert!(mem.is_unresolvable_repo_path(repo, "a/b/1.0/b-1.0.pom"));
        assert!(!mem.is_unresolvable_repo_path(repo, "a/c/1.0/c-1.0.pom"));
        assert!(!mem.is_unresolvable_repo(repo));
        assert!(mem.should_skip(repo, "a/b/1.0/b-1.0.pom"));
        assert!(!mem.should_skip(repo, "a/c/1.0/c-1.0.pom"));
    }

    #[test]
    fn obsolete_repo_is_always_skipped() {
        let mem = UnresolvableEndpoints::new();
        assert!(mem.should_skip("https://jcenter.bintray.com", "any/path"));
    }
}
