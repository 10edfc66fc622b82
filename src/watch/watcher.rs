//! Filesystem watcher driving reconciliation of a watch-list file.
//!
//! Wraps `notify::recommended_watcher` with a tokio channel. A burst of
//! events is collapsed into one reconciliation by a debounce window.
//! Editors that save by remove-and-recreate invalidate the watch, so after
//! a removal the path is watched again.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use notify::event::{EventKind, ModifyKind};
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use super::reconciler::MonitoredFile;
use crate::error::Result;

/// Window collapsing a burst of events into one reconciliation.
pub const DEBOUNCE: Duration = Duration::from_secs(1);

/// Wait after a removal before reading the file again.
pub const REWATCH_DELAY: Duration = Duration::from_millis(500);

/// Watches one watch-list file.
pub struct FileWatcher {
    path: PathBuf,
    watcher: RecommendedWatcher,
    rx: mpsc::UnboundedReceiver<notify::Result<Event>>,
    debounce: Duration,
    rewatch_delay: Duration,
}

impl FileWatcher {
    /// Start watching `path`.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let (tx, rx) = mpsc::unbounded_channel();

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            // The receiver is gone only when the watcher task ended.
            let _ = tx.send(res);
        })?;
        watcher.watch(&path, RecursiveMode::NonRecursive)?;

        Ok(Self {
            path,
            watcher,
            rx,
            debounce: DEBOUNCE,
            rewatch_delay: REWATCH_DELAY,
        })
    }

    /// Override the debounce window and the delay after a removal.
    pub fn with_timing(mut self, debounce: Duration, rewatch_delay: Duration) -> Self {
        self.debounce = debounce;
        self.rewatch_delay = rewatch_delay;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Wait for the next burst of events.
    ///
    /// Returns whether the burst contained a removal, or `None` once the
    /// event channel is closed.
    pub async fn next_change(&mut self) -> Option<bool> {
        let mut removed = loop {
            match self.rx.recv().await? {
                Ok(event) if is_access(&event) => continue,
                Ok(event) => break is_removal(&event),
                Err(e) => warn!("Watch error on {}: {}", self.path.display(), e),
            }
        };

        let deadline = Instant::now() + self.debounce;
        loop {
            tokio::select! {
                _ = tokio::time::sleep_until(deadline) => break,
                event = self.rx.recv() => match event {
                    Some(Ok(event)) => removed |= is_removal(&event),
                    Some(Err(e)) => warn!("Watch error on {}: {}", self.path.display(), e),
                    None => break,
                },
            }
        }

        Some(removed)
    }

    /// Watch the path again after it was removed and recreated.
    pub fn rewatch(&mut self) -> Result<()> {
        // The old watch may already be gone with the removed inode.
        let _ = self.watcher.unwatch(&self.path);
        self.watcher.watch(&self.path, RecursiveMode::NonRecursive)?;
        Ok(())
    }

    /// Reconcile `monitor` after every burst of changes, until the event
    /// channel closes.
    pub async fn run(mut self, monitor: Arc<MonitoredFile>) {
        info!("Watching {} for changes", self.path.display());

        while let Some(removed) = self.next_change().await {
            if removed {
                debug!("{} was removed, waiting before re-reading", self.path.display());
                sleep(self.rewatch_delay).await;
            }

            let report = monitor.reconcile().await;
            debug!(
                "Reconciled {}: {} added, {} removed",
                self.path.display(),
                report.added.len(),
                report.removed.len()
            );

            if removed {
                match self.rewatch() {
                    Ok(()) => debug!("Watching {} again", self.path.display()),
                    Err(e) => warn!("Unable to watch {} again: {}", self.path.display(), e),
                }
            }
        }

        warn!("Stopped watching {}", self.path.display());
    }

    /// Run the watcher as a background task.
    pub fn spawn(self, monitor: Arc<MonitoredFile>) -> JoinHandle<()> {
        tokio::spawn(self.run(monitor))
    }
}

/// Reading the file ourselves must not trigger another reconciliation.
fn is_access(event: &Event) -> bool {
    matches!(event.kind, EventKind::Access(_))
}

/// Removal and rename events may leave the watch pointing at a dead inode.
fn is_removal(event: &Event) -> bool {
    matches!(
        event.kind,
        EventKind::Remove(_) | EventKind::Modify(ModifyKind::Name(_))
    )
}
