//! Error types for builds and watch sessions.

use std::path::PathBuf;

/// Failure to build a single document.
///
/// Counted in the build report; never aborts the rest of the batch.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} is outside the source directory", .0.display())]
    OutsideSource(PathBuf),
}

/// Failure to read the template directory.
#[derive(Debug, thiserror::Error)]
pub enum TemplateLoadError {
    #[error("failed to read template {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failure that ends a watch session.
#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    #[error("file watcher error: {0}")]
    Notify(#[from] notify::Error),

    #[error("invalid ignore pattern {pattern:?}: {source}")]
    IgnorePattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("watch session task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
