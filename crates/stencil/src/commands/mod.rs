//! CLI command implementations.

pub(crate) mod build;
pub(crate) mod init;
pub(crate) mod watch;

use std::future::Future;
use std::path::PathBuf;

use clap::Args;
use stencil_config::{CliSettings, Config};

use crate::error::CliError;
use crate::output::Output;

pub(crate) use build::BuildArgs;
pub(crate) use init::InitArgs;
pub(crate) use watch::WatchArgs;

/// Project flags shared by `build` and `watch`.
#[derive(Args)]
pub(crate) struct ProjectArgs {
    /// Path to configuration file (default: auto-discover stencil.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Markdown source directory (overrides config).
    #[arg(short, long)]
    source_dir: Option<PathBuf>,

    /// HTML output directory (overrides config).
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Template directory (overrides config).
    #[arg(short, long)]
    template_dir: Option<PathBuf>,

    /// Pass raw HTML in documents through unescaped (overrides config).
    #[arg(long)]
    allow_raw_html: bool,
}

impl ProjectArgs {
    /// Load configuration with these flags applied on top.
    pub(crate) fn load(self, debounce_ms: Option<u64>) -> Result<Config, CliError> {
        let cli_settings = CliSettings {
            source_dir: self.source_dir,
            output_dir: self.output_dir,
            template_dir: self.template_dir,
            allow_raw_html: self.allow_raw_html.then_some(true),
            debounce_ms,
        };
        Ok(Config::load(self.config.as_deref(), Some(&cli_settings))?)
    }
}

/// Print the resolved directories.
pub(crate) fn print_paths(output: &Output, config: &Config) {
    let build = &config.build_resolved;
    if let Some(path) = &config.config_path {
        output.detail(&format!("Config: {}", path.display()));
    }
    output.info(&format!("Source directory: {}", build.source_dir.display()));
    output.info(&format!("Output directory: {}", build.output_dir.display()));
    output.info(&format!("Template directory: {}", build.template_dir.display()));
}

/// Run an async command on a fresh runtime.
pub(crate) fn block_on<F>(future: F) -> Result<(), CliError>
where
    F: Future<Output = Result<(), CliError>>,
{
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(future)
}
