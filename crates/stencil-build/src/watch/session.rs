//! Async driver for watch sessions.
//!
//! One task owns the [`Coordinator`], the template registry and the
//! in-flight build. It multiplexes watcher events, the debounce timer, build
//! completion and cancellation with `tokio::select!`, so session state needs
//! no locks.

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use stencil_config::Config;
use stencil_renderer::{Highlighter, SyntectHighlighter, TemplateRegistry};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::{CancellationToken, DropGuard};

use super::coordinator::{Coordinator, RebuildPermit};
use super::filter::ChangeFilter;
use crate::builder::{BuildReport, BuildSettings, SiteBuilder};
use crate::error::WatchError;
use crate::templates::load_templates;

/// Buffered watcher events before the notify thread blocks.
const EVENT_CHANNEL_CAPACITY: usize = 256;

type BuildFuture = Pin<Box<dyn Future<Output = BuildReport> + Send>>;

/// Settings for a watch session.
#[derive(Clone, Debug)]
pub struct SessionConfig {
    pub build: BuildSettings,
    /// Quiet period after the last change before rebuilding.
    pub debounce: Duration,
    /// Glob patterns, relative to the source directory, that never trigger
    /// a rebuild.
    pub ignore: Vec<String>,
    /// Build once immediately, then stop without watching.
    pub run_once: bool,
}

impl SessionConfig {
    #[must_use]
    pub fn from_config(config: &Config, verbose: bool) -> Self {
        Self {
            build: BuildSettings::from_config(config, verbose),
            debounce: Duration::from_millis(config.watch.debounce_ms),
            ignore: config.watch.ignore.clone(),
            run_once: false,
        }
    }

    #[must_use]
    pub fn with_run_once(mut self, run_once: bool) -> Self {
        self.run_once = run_once;
        self
    }
}

/// Totals across all rebuilds of a session.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionSummary {
    pub rebuilds: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Report of the most recent rebuild.
    pub last_report: Option<BuildReport>,
}

impl SessionSummary {
    fn record(&mut self, report: BuildReport) {
        self.rebuilds += 1;
        self.succeeded += report.succeeded;
        self.failed += report.failed;
        self.last_report = Some(report);
    }
}

/// Handle to a running session.
///
/// Dropping the handle stops the session.
pub struct WatchHandle {
    task: JoinHandle<SessionSummary>,
    cancel: CancellationToken,
    guard: DropGuard,
}

impl WatchHandle {
    /// Request a stop. Safe to call any number of times.
    ///
    /// An in-flight rebuild finishes before the session ends.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// Token that stops the session when cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Wait for the session to end.
    pub async fn wait(self) -> Result<SessionSummary, WatchError> {
        let Self { task, guard, .. } = self;
        let summary = task.await?;
        drop(guard);
        Ok(summary)
    }
}

/// A watch session.
pub struct WatchSession {
    coordinator: Coordinator,
    builder: SiteBuilder,
    events: mpsc::Receiver<PathBuf>,
    cancel: CancellationToken,
    run_once: bool,
    watcher: Option<RecommendedWatcher>,
}

impl WatchSession {
    /// Start a session with the default highlighter.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(config: SessionConfig) -> Result<WatchHandle, WatchError> {
        Self::start_with_highlighter(config, Arc::new(SyntectHighlighter))
    }

    /// Start a session that highlights code with `highlighter`.
    pub fn start_with_highlighter(
        config: SessionConfig,
        highlighter: Arc<dyn Highlighter>,
    ) -> Result<WatchHandle, WatchError> {
        let filter = ChangeFilter::new(&config.build, &config.ignore)?;
        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

        // Run-once sessions drop the sender so the event stream ends at once
        let watcher = if config.run_once {
            None
        } else {
            Some(spawn_watcher(&filter, event_tx)?)
        };

        let session = Self {
            coordinator: Coordinator::new(config.debounce, filter.template_dir().to_path_buf()),
            builder: SiteBuilder::new(config.build, highlighter),
            events: event_rx,
            cancel: CancellationToken::new(),
            run_once: config.run_once,
            watcher,
        };
        Ok(session.spawn())
    }

    fn spawn(self) -> WatchHandle {
        let cancel = self.cancel.clone();
        let guard = cancel.clone().drop_guard();
        let task = tokio::spawn(self.run());
        WatchHandle {
            task,
            cancel,
            guard,
        }
    }

    async fn run(mut self) -> SessionSummary {
        let mut registry = Arc::new(self.initial_registry());
        let mut summary = SessionSummary::default();
        let mut in_flight: Option<BuildFuture> = None;

        if self.run_once {
            if let Some(permit) = self.coordinator.rebuild_now() {
                in_flight = Some(self.start_build(&permit, &mut registry));
            }
        } else {
            tracing::info!(
                source = %self.builder.settings().source_dir.display(),
                "Watching for changes"
            );
        }

        loop {
            let deadline = self.coordinator.deadline();
            tokio::select! {
                () = self.cancel.cancelled(), if !self.coordinator.is_stopped() => {
                    if self.coordinator.stop() {
                        tracing::info!(building = in_flight.is_some(), "Stopping watch session");
                    }
                    if in_flight.is_none() {
                        break;
                    }
                }
                Some(path) = self.events.recv() => {
                    tracing::debug!(path = %path.display(), "Change recorded");
                    self.coordinator.record(path, Instant::now());
                }
                () = sleep_until(deadline) => {
                    if let Some(permit) = self.coordinator.on_deadline(Instant::now()) {
                        in_flight = Some(self.start_build(&permit, &mut registry));
                    }
                }
                report = poll_build(&mut in_flight) => {
                    in_flight = None;
                    self.coordinator.finish();
                    summary.record(report);
                    if self.run_once {
                        self.coordinator.stop();
                    }
                    if self.coordinator.is_stopped() {
                        break;
                    }
                }
            }
        }

        if self.watcher.take().is_some() {
            tracing::debug!("File watcher released");
        }
        summary
    }

    fn initial_registry(&self) -> TemplateRegistry {
        let template_dir = &self.builder.settings().template_dir;
        load_templates(template_dir).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to load templates, using defaults");
            TemplateRegistry::new()
        })
    }

    fn start_build(
        &self,
        permit: &RebuildPermit,
        registry: &mut Arc<TemplateRegistry>,
    ) -> BuildFuture {
        if permit.reload_templates() {
            match load_templates(&self.builder.settings().template_dir) {
                Ok(reloaded) => *registry = Arc::new(reloaded),
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to reload templates, keeping previous set");
                }
            }
        }

        tracing::info!(
            changed = permit.changed().len(),
            reload_templates = permit.reload_templates(),
            "Rebuilding"
        );
        Box::pin(self.builder.clone().build(Arc::clone(registry)))
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

async fn poll_build(in_flight: &mut Option<BuildFuture>) -> BuildReport {
    match in_flight {
        Some(build) => build.await,
        None => std::future::pending().await,
    }
}

/// Watch the source (and template) directory, forwarding qualifying paths.
fn spawn_watcher(
    filter: &ChangeFilter,
    event_tx: mpsc::Sender<PathBuf>,
) -> Result<RecommendedWatcher, WatchError> {
    let callback_filter = filter.clone();
    let mut watcher =
        notify::recommended_watcher(move |res: Result<notify::Event, notify::Error>| {
            let event = match res {
                Ok(event) => event,
                Err(e) => {
                    tracing::warn!(error = %e, "File watcher error");
                    return;
                }
            };
            if !matches!(
                event.kind,
                notify::EventKind::Create(_)
                    | notify::EventKind::Modify(_)
                    | notify::EventKind::Remove(_)
            ) {
                return;
            }
            for path in event.paths {
                if callback_filter.qualifies(&path) && event_tx.blocking_send(path).is_err() {
                    // Session ended
                    return;
                }
            }
        })?;

    watcher.watch(filter.source_dir(), RecursiveMode::Recursive)?;

    if filter.template_dir_outside_source() {
        if filter.template_dir().is_dir() {
            watcher.watch(filter.template_dir(), RecursiveMode::NonRecursive)?;
        } else {
            tracing::warn!(
                dir = %filter.template_dir().display(),
                "Template directory not found, template changes won't be picked up"
            );
        }
    }

    Ok(watcher)
}

#[cfg(test)]
impl WatchSession {
    /// Session fed from `events` instead of a filesystem watcher.
    fn with_events(config: SessionConfig, events: mpsc::Receiver<PathBuf>) -> WatchHandle {
        let template_dir = config.build.template_dir.clone();
        let session = Self {
            coordinator: Coordinator::new(config.debounce, template_dir),
            builder: SiteBuilder::new(config.build, Arc::new(SyntectHighlighter)),
            events,
            cancel: CancellationToken::new(),
            run_once: config.run_once,
            watcher: None,
        };
        session.spawn()
    }
}
