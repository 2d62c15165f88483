use pomgraph_util::errors::PomgraphError;

#[test]
fn test_io_error_display() {
    let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
    let err = PomgraphError::from(io_err);
    assert!(err.to_string().contains("I/O error"), "got: {err}");
}

#[test]
fn test_invalid_url_display() {
    let err = PomgraphError::InvalidUrl {
        url: "gcs://".to_string(),
    };
    assert_eq!(err.to_string(), "invalid repository URL: gcs://");
}

#[test]
fn test_metadata_error_display() {
    let err = PomgraphError::Metadata {
        message: "expected value".to_string(),
    };
    assert_eq!(
        err.to_string(),
        "Failed to decode Gradle module metadata: expected value"
    );
}

#[test]
fn test_auth_error_display() {
    let err = PomgraphError::Auth {
        message: "no such file".to_string(),
    };
    assert_eq!(err.to_string(), "Authentication error: no such file");
}

#[test]
fn test_resolution_error_display() {
    let err = PomgraphError::Resolution {
        message: "cycle".to_string(),
    };
    assert_eq!(err.to_string(), "Dependency resolution failed: cycle");
}

#[test]
fn test_generic_error_display() {
    let err = PomgraphError::Generic {
        message: "something broke".to_string(),
    };
    assert_eq!(err.to_string(), "something broke");
}

#[test]
fn test_error_converts_into_miette_report() {
    let report: miette::Report = PomgraphError::Network {
        message: "timeout".to_string(),
    }
    .into();
    assert!(report.downcast_ref::<PomgraphError>().is_some());
}
