//! `stencil watch` command implementation.

use clap::Args;
use stencil_build::{SessionConfig, WatchSession};

use super::{ProjectArgs, print_paths};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the watch command.
#[derive(Args)]
pub(crate) struct WatchArgs {
    #[command(flatten)]
    project: ProjectArgs,

    /// Quiet period in milliseconds before rebuilding (overrides config).
    #[arg(long)]
    debounce_ms: Option<u64>,
}

impl WatchArgs {
    /// Execute the watch command.
    ///
    /// Builds everything once, then rebuilds on change until Ctrl-C.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails or the watcher can't start.
    pub(crate) async fn execute(self, verbose: bool) -> Result<(), CliError> {
        let output = Output::new();
        let config = self.project.load(self.debounce_ms)?;
        print_paths(&output, &config);

        let session_config = SessionConfig::from_config(&config, verbose);

        // Initial full build so the output is current before watching
        let initial = WatchSession::start(session_config.clone().with_run_once(true))?
            .wait()
            .await?;
        if initial.failed > 0 {
            output.warning(&format!(
                "{} of {} documents failed to build",
                initial.failed,
                initial.succeeded + initial.failed
            ));
        } else {
            output.success(&format!("Built {} documents", initial.succeeded));
        }

        let handle = WatchSession::start(session_config)?;
        let stop = handle.cancellation_token();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                stop.cancel();
            }
        });
        output.info(&format!(
            "Watching for changes (debounce {}ms), press Ctrl-C to stop",
            config.watch.debounce_ms
        ));

        let summary = handle.wait().await?;
        output.info(&format!(
            "Stopped after {} rebuilds ({} document failures)",
            summary.rebuilds, summary.failed
        ));
        Ok(())
    }
}
