//! Debounce and single-flight state machine for watch sessions.
//!
//! The coordinator owns no timers and performs no I/O. The session feeds it
//! change notifications and clock readings and acts on the [`RebuildPermit`]s
//! it hands out. A permit is only issued from a non-rebuilding phase, so at
//! most one rebuild is ever in flight.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::time::Instant;

/// Session lifecycle phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Nothing pending, nothing running.
    Idle,
    /// Changes recorded; a rebuild is requested once `deadline` passes.
    DebouncePending { deadline: Instant },
    /// A rebuild is running. A debounce may elapse meanwhile, but its
    /// request is dropped.
    Rebuilding { deadline: Option<Instant> },
    /// Terminal.
    Stopped,
}

/// Permission to run exactly one rebuild.
///
/// Holds the snapshot of pending paths taken when the rebuild started.
#[must_use = "a permit moves the coordinator into the rebuilding phase"]
#[derive(Debug, PartialEq, Eq)]
pub struct RebuildPermit {
    changed: Vec<PathBuf>,
    reload_templates: bool,
}

impl RebuildPermit {
    /// Paths that changed since the previous rebuild, sorted.
    pub fn changed(&self) -> &[PathBuf] {
        &self.changed
    }

    /// Whether a template file changed and the registry must be reloaded.
    pub fn reload_templates(&self) -> bool {
        self.reload_templates
    }
}

/// Tracks pending changes and the debounce deadline.
#[derive(Debug)]
pub struct Coordinator {
    phase: Phase,
    pending: BTreeSet<PathBuf>,
    debounce: Duration,
    template_dir: PathBuf,
}

impl Coordinator {
    pub fn new(debounce: Duration, template_dir: PathBuf) -> Self {
        Self {
            phase: Phase::Idle,
            pending: BTreeSet::new(),
            debounce,
            template_dir,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_stopped(&self) -> bool {
        self.phase == Phase::Stopped
    }

    /// Paths recorded since the last rebuild started.
    pub fn pending(&self) -> impl Iterator<Item = &Path> {
        self.pending.iter().map(PathBuf::as_path)
    }

    /// When the session should next call [`Coordinator::on_deadline`].
    pub fn deadline(&self) -> Option<Instant> {
        match self.phase {
            Phase::DebouncePending { deadline } => Some(deadline),
            Phase::Rebuilding { deadline } => deadline,
            Phase::Idle | Phase::Stopped => None,
        }
    }

    /// Record a qualifying change and push the deadline out.
    ///
    /// Ignored once stopped.
    pub fn record(&mut self, path: PathBuf, now: Instant) {
        let deadline = now + self.debounce;
        self.phase = match self.phase {
            Phase::Stopped => return,
            Phase::Idle | Phase::DebouncePending { .. } => Phase::DebouncePending { deadline },
            Phase::Rebuilding { .. } => Phase::Rebuilding {
                deadline: Some(deadline),
            },
        };
        self.pending.insert(path);
    }

    /// Handle the debounce timer firing at `now`.
    ///
    /// Returns a permit when a rebuild should start. While a rebuild is
    /// running the request is dropped and pending paths are kept for the next
    /// change to pick up.
    pub fn on_deadline(&mut self, now: Instant) -> Option<RebuildPermit> {
        match self.phase {
            Phase::DebouncePending { deadline } if deadline <= now => Some(self.begin()),
            Phase::Rebuilding {
                deadline: Some(deadline),
            } if deadline <= now => {
                tracing::debug!(
                    pending = self.pending.len(),
                    "Rebuild already running, dropping request"
                );
                self.phase = Phase::Rebuilding { deadline: None };
                None
            }
            _ => None,
        }
    }

    /// Start a rebuild right away, bypassing the debounce.
    ///
    /// Returns `None` while a rebuild is running or after stop.
    pub fn rebuild_now(&mut self) -> Option<RebuildPermit> {
        match self.phase {
            Phase::Idle | Phase::DebouncePending { .. } => Some(self.begin()),
            Phase::Rebuilding { .. } | Phase::Stopped => None,
        }
    }

    /// Mark the running rebuild as complete.
    ///
    /// A debounce that was recorded during the rebuild and has not yet
    /// elapsed stays pending.
    pub fn finish(&mut self) {
        if let Phase::Rebuilding { deadline } = self.phase {
            self.phase = match deadline {
                Some(deadline) => Phase::DebouncePending { deadline },
                None => Phase::Idle,
            };
        }
    }

    /// Stop the session. Returns `true` only on the first call.
    pub fn stop(&mut self) -> bool {
        if self.is_stopped() {
            return false;
        }
        self.phase = Phase::Stopped;
        true
    }

    fn begin(&mut self) -> RebuildPermit {
        let changed: Vec<PathBuf> = std::mem::take(&mut self.pending).into_iter().collect();
        let reload_templates = changed.iter().any(|p| p.starts_with(&self.template_dir));
        self.phase = Phase::Rebuilding { deadline: None };
        RebuildPermit {
            changed,
            reload_templates,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const DEBOUNCE: Duration = Duration::from_millis(100);

    fn coordinator() -> Coordinator {
        Coordinator::new(DEBOUNCE, PathBuf::from("/site/templates"))
    }

    fn doc(name: &str) -> PathBuf {
        PathBuf::from("/site/docs").join(name)
    }

    #[test]
    fn test_burst_yields_one_rebuild() {
        let mut c = coordinator();
        let t0 = Instant::now();

        for i in 0..10u32 {
            c.record(doc("a.md"), t0 + Duration::from_millis(u64::from(i) * 10));
        }
        c.record(doc("b.md"), t0 + Duration::from_millis(95));

        // Deadline is measured from the last event
        assert_eq!(c.deadline(), Some(t0 + Duration::from_millis(195)));
        assert_eq!(c.on_deadline(t0 + Duration::from_millis(150)), None);

        let permit = c.on_deadline(t0 + Duration::from_millis(195)).unwrap();
        assert_eq!(permit.changed(), [doc("a.md"), doc("b.md")]);
        assert!(!permit.reload_templates());
        assert_eq!(c.phase(), Phase::Rebuilding { deadline: None });
        assert_eq!(c.on_deadline(t0 + Duration::from_secs(10)), None);
    }

    #[test]
    fn test_events_during_rebuild_do_not_start_another() {
        let mut c = coordinator();
        let t0 = Instant::now();

        c.record(doc("a.md"), t0);
        let _permit = c.on_deadline(t0 + DEBOUNCE).unwrap();

        let t1 = t0 + Duration::from_millis(150);
        c.record(doc("b.md"), t1);
        c.record(doc("c.md"), t1);
        assert_eq!(c.deadline(), Some(t1 + DEBOUNCE));

        // Deadline elapses mid-rebuild: dropped, pending kept
        assert_eq!(c.on_deadline(t1 + DEBOUNCE), None);
        assert_eq!(c.phase(), Phase::Rebuilding { deadline: None });
        assert_eq!(c.rebuild_now(), None);
        assert_eq!(c.pending().count(), 2);

        c.finish();
        assert_eq!(c.phase(), Phase::Idle);

        // The next change picks up the retained paths
        let t2 = t1 + Duration::from_millis(500);
        c.record(doc("d.md"), t2);
        let permit = c.on_deadline(t2 + DEBOUNCE).unwrap();
        assert_eq!(permit.changed(), [doc("b.md"), doc("c.md"), doc("d.md")]);
    }

    #[test]
    fn test_debounce_recorded_during_rebuild_survives_finish() {
        let mut c = coordinator();
        let t0 = Instant::now();

        c.record(doc("a.md"), t0);
        let _permit = c.on_deadline(t0 + DEBOUNCE).unwrap();

        let t1 = t0 + Duration::from_millis(120);
        c.record(doc("b.md"), t1);
        c.finish();

        assert_eq!(
            c.phase(),
            Phase::DebouncePending {
                deadline: t1 + DEBOUNCE
            }
        );
        let permit = c.on_deadline(t1 + DEBOUNCE).unwrap();
        assert_eq!(permit.changed(), [doc("b.md")]);
    }

    #[test]
    fn test_template_change_requests_reload() {
        let mut c = coordinator();
        let t0 = Instant::now();

        c.record(doc("a.md"), t0);
        c.record(PathBuf::from("/site/templates/h1.template.html"), t0);
        let permit = c.on_deadline(t0 + DEBOUNCE).unwrap();
        assert!(permit.reload_templates());
    }

    #[test]
    fn test_rebuild_now_from_idle() {
        let mut c = coordinator();
        let permit = c.rebuild_now().unwrap();
        assert!(permit.changed().is_empty());
        assert_eq!(c.phase(), Phase::Rebuilding { deadline: None });
        c.finish();
        assert_eq!(c.phase(), Phase::Idle);
    }

    #[test]
    fn test_stop_is_terminal_and_idempotent() {
        let mut c = coordinator();
        let t0 = Instant::now();

        c.record(doc("a.md"), t0);
        assert!(c.stop());
        assert!(!c.stop());
        assert_eq!(c.deadline(), None);

        c.record(doc("b.md"), t0);
        assert_eq!(c.on_deadline(t0 + DEBOUNCE), None);
        assert_eq!(c.rebuild_now(), None);
        c.finish();
        assert!(c.is_stopped());
    }

    #[test]
    fn test_stop_during_rebuild() {
        let mut c = coordinator();
        let _permit = c.rebuild_now().unwrap();
        assert!(c.stop());
        c.finish();
        assert_eq!(c.phase(), Phase::Stopped);
    }
}
