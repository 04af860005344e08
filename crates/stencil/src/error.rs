//! CLI error types.

use stencil_build::WatchError;
use stencil_config::ConfigError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Watch(#[from] WatchError),

    #[error("{failed} of {total} documents failed to build")]
    BuildFailed { failed: usize, total: usize },
}
