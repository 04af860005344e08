//! `stencil build` command implementation.

use clap::Args;
use stencil_build::{SessionConfig, WatchSession};

use super::{ProjectArgs, print_paths};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the build command.
#[derive(Args)]
pub(crate) struct BuildArgs {
    #[command(flatten)]
    project: ProjectArgs,
}

impl BuildArgs {
    /// Execute the build command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails or any document fails to build.
    pub(crate) async fn execute(self, verbose: bool) -> Result<(), CliError> {
        let output = Output::new();
        let config = self.project.load(None)?;
        print_paths(&output, &config);

        let session = SessionConfig::from_config(&config, verbose).with_run_once(true);
        let summary = WatchSession::start(session)?.wait().await?;

        if summary.failed > 0 {
            return Err(CliError::BuildFailed {
                failed: summary.failed,
                total: summary.succeeded + summary.failed,
            });
        }

        output.success(&format!("Built {} documents", summary.succeeded));
        Ok(())
    }
}
