//! Debounced, single-flight rebuilds driven by filesystem changes.

mod coordinator;
mod filter;
mod session;

pub use coordinator::{Coordinator, Phase, RebuildPermit};
pub use session::{SessionConfig, SessionSummary, WatchHandle, WatchSession};
