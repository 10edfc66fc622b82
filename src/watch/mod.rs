//! Watch-list files: reconciliation, change watching and periodic sweeps.

mod list;
mod pipeline;
mod reconciler;
mod scheduler;
mod watcher;

pub use list::{parse_watch_list, read_watch_list};
pub use pipeline::{process, run_cycle, CycleOutcome};
pub use reconciler::{MonitoredFile, ReconcileReport};
pub use scheduler::{Scheduler, DEFAULT_INTERVAL_MINUTES, MAX_INTERVAL_MINUTES};
pub use watcher::{FileWatcher, DEBOUNCE, REWATCH_DELAY};
