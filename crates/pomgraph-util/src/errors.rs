use miette::Diagnostic;
use thiserror::Error;

/// Unified error type for all pomgraph operations.
#[derive(Debug, Error, Diagnostic)]
pub enum PomgraphError {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A repository URL could not be normalised.
    #[error("invalid repository URL: {url}")]
    #[diagnostic(help("Bucket URLs must look like gcs://<bucket>/<path>"))]
    InvalidUrl { url: String },

    /// A Gradle module metadata document could not be decoded.
    #[error("Failed to decode Gradle module metadata: {message}")]
    Metadata { message: String },

    /// A POM descriptor could not be parsed.
    #[error("Descriptor error: {message}")]
    Descriptor { message: String },

    /// Credential loading or token exchange failed.
    #[error("Authentication error: {message}")]
    Auth { message: String },

    /// Network request failed.
    #[error("Network error: {message}")]
    Network { message: String },

    /// Invalid or malformed configuration file.
    #[error("Configuration error: {message}")]
    #[diagnostic(help("Check pomgraph.toml for syntax errors"))]
    Config { message: String },

    /// Dependency resolution failed.
    #[error("Dependency resolution failed: {message}")]
    Resolution { message: String },

    /// Catch-all for miscellaneous errors.
    #[error("{message}")]
    Generic { message: String },
}

/// Convenience alias for `miette::Result<T>`.
pub type PomgraphResult<T> = miette::Result<T>;
