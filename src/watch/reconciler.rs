//! Keeps the tracked subscriptions of a watch-list file in line with its
//! contents.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, warn};

use super::list::read_watch_list;
use super::pipeline::{self, CycleOutcome};
use crate::context::Context;
use crate::error::Result;
use crate::feed::Subscription;

/// URLs added and removed by one reconciliation.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReconcileReport {
    pub added: Vec<String>,
    pub removed: Vec<String>,
}

impl ReconcileReport {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// A watch-list file and the subscriptions it currently lists.
///
/// The reconciler is the only writer of the subscription map. Sweeps take
/// a snapshot under the read guard and never iterate the live map.
#[derive(Debug)]
pub struct MonitoredFile {
    path: PathBuf,
    ctx: Arc<Context>,
    subscriptions: RwLock<HashMap<String, Subscription>>,
    reconciling: Mutex<()>,
}

impl MonitoredFile {
    pub fn new(path: impl Into<PathBuf>, ctx: Arc<Context>) -> Self {
        Self {
            path: path.into(),
            ctx,
            subscriptions: RwLock::new(HashMap::new()),
            reconciling: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Tracked URLs, sorted.
    pub async fn urls(&self) -> Vec<String> {
        let mut urls: Vec<String> = self.subscriptions.read().await.keys().cloned().collect();
        urls.sort();
        urls
    }

    /// Tracked subscription for `url`.
    pub async fn subscription(&self, url: &str) -> Option<Subscription> {
        self.subscriptions.read().await.get(url).cloned()
    }

    /// First reconciliation at startup. An unreadable file is an error.
    pub async fn initialize(&self) -> Result<ReconcileReport> {
        let urls = read_watch_list(&self.path)?;
        Ok(self.apply(urls).await)
    }

    /// Re-read the file and apply additions and removals.
    ///
    /// An unreadable file counts as an empty watch list.
    pub async fn reconcile(&self) -> ReconcileReport {
        let urls = match read_watch_list(&self.path) {
            Ok(urls) => urls,
            Err(e) => {
                warn!("Unable to read watch list {}: {}", self.path.display(), e);
                Vec::new()
            }
        };
        self.apply(urls).await
    }

    async fn apply(&self, urls: Vec<String>) -> ReconcileReport {
        let _serial = self.reconciling.lock().await;

        let report = {
            let mut subscriptions = self.subscriptions.write().await;
            let now = Utc::now();

            let removed: Vec<String> = subscriptions
                .keys()
                .filter(|url| !urls.contains(url))
                .cloned()
                .collect();
            for url in &removed {
                subscriptions.remove(url);
            }

            let mut added = Vec::new();
            for url in urls {
                if !subscriptions.contains_key(&url) {
                    subscriptions.insert(url.clone(), Subscription::new(url.clone(), now));
                    added.push(url);
                }
            }

            ReconcileReport { added, removed }
        };

        if report.is_empty() {
            debug!("Watch list {} unchanged", self.path.display());
            return report;
        }

        for url in &report.added {
            info!("New url discovered in {}: {}", self.path.display(), url);
            pipeline::process(&self.ctx, url).await;
        }

        if !report.removed.is_empty() {
            self.retire(&report.removed).await;
        }

        report
    }

    /// Delete the cache files of removed URLs and send one notice for all.
    async fn retire(&self, removed: &[String]) {
        for url in removed {
            let _guard = self.ctx.locks.acquire(url).await;
            match self.ctx.cache.delete(url) {
                Ok(true) => info!("Removed URL {} and its cache file", url),
                Ok(false) => info!("Removed URL {} (no cache file)", url),
                Err(e) => error!("Failed to delete cache file for {}: {}", url, e),
            }
        }
        self.ctx.locks.prune();

        let message = removed
            .iter()
            .map(|url| format!("Removed URL: {}", url))
            .collect::<Vec<_>>()
            .join("\n");
        self.ctx.dispatcher.notify_all(&message).await;
    }

    /// Run a cycle for every tracked URL, one after another.
    pub async fn sweep(&self) -> Vec<(String, CycleOutcome)> {
        let snapshot = self.urls().await;
        debug!(
            "Sweeping {} feed(s) from {}",
            snapshot.len(),
            self.path.display()
        );

        let mut outcomes = Vec::with_capacity(snapshot.len());
        for url in snapshot {
            let _guard = self.ctx.locks.acquire(&url).await;
            // Removed while waiting for the lock.
            if !self.subscriptions.read().await.contains_key(&url) {
                continue;
            }
            let outcome = pipeline::run_cycle(&self.ctx, &url).await;
            outcomes.push((url, outcome));
        }

        outcomes
    }
}
