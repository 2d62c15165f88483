use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

#[allow(deprecated)]
fn pomgraph_cmd() -> Command {
    Command::cargo_bin("pomgraph").unwrap()
}

#[test]
fn test_repos_rewrites_buckets_and_masks_headers() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join("pomgraph.toml"),
        r#"
[repositories]
internal = "gcs://repo.example.com/releases"
nexus = { url = "https://nexus.example.com/maven/", headers = { "X-Token" = "abc123" } }
"#,
    )
    .unwrap();

    pomgraph_cmd()
        .current_dir(tmp.path())
        .env_remove("GOOGLE_APPLICATION_CREDENTIALS")
        .args(["repos"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Repositories (3):"))
        .stdout(predicate::str::contains(
            "https://storage.googleapis.com/repo.example.com/releases",
        ))
        .stdout(predicate::str::contains("X-Token: ********"))
        .stdout(predicate::str::contains("abc123").not())
        .stdout(predicate::str::contains("https://repo.maven.apache.org/maven2"));
}

#[test]
fn test_repos_with_unreadable_credentials_still_lists_repos() {
    let tmp = TempDir::new().unwrap();
    let config = tmp.path().join("scan.toml");
    fs::write(
        &config,
        r#"
credentials-env = "POMGRAPH_TEST_CREDENTIALS"
include-maven-central = false

[repositories]
registry = "https://us-central1-maven.pkg.dev/my-project/my-repo"
"#,
    )
    .unwrap();

    pomgraph_cmd()
        .current_dir(tmp.path())
        .env("POMGRAPH_TEST_CREDENTIALS", tmp.path().join("missing.json"))
        .args(["repos", "--config"])
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Repositories (1):\n  https://us-central1-maven.pkg.dev/my-project/my-repo\n",
        ))
        .stdout(predicate::str::contains("Authorization").not());
}

#[test]
fn test_repos_missing_config_file_fails() {
    let tmp = TempDir::new().unwrap();

    pomgraph_cmd()
        .current_dir(tmp.path())
        .args(["repos", "--config", "nope.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read"));
}
