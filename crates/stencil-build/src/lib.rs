//! Site builds for Stencil.
//!
//! Discovers markdown documents, renders them with templates loaded from
//! disk and writes HTML into a mirrored output tree. [`WatchSession`] keeps
//! the output current while sources and templates change:
//!
//! ```no_run
//! # async fn run(config: stencil_config::Config) -> Result<(), stencil_build::WatchError> {
//! use stencil_build::{SessionConfig, WatchSession};
//!
//! let handle = WatchSession::start(SessionConfig::from_config(&config, false))?;
//! let stop = handle.cancellation_token();
//! // Hand `stop` to whatever decides the session is over
//! # stop.cancel();
//! let summary = handle.wait().await?;
//! assert_eq!(summary.failed, 0);
//! # Ok(())
//! # }
//! ```

mod builder;
mod discover;
mod error;
mod templates;
mod watch;

pub use builder::{BuildReport, BuildSettings, SiteBuilder};
pub use discover::{DocumentScanner, has_document_extension, output_path};
pub use error::{DocumentError, TemplateLoadError, WatchError};
pub use templates::{is_template_file, load_templates, template_key};
pub use watch::{
    Coordinator, Phase, RebuildPermit, SessionConfig, SessionSummary, WatchHandle, WatchSession,
};
