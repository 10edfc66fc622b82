//! Runtime context shared by every monitored file.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::cache::CacheStore;
use crate::diff::DiffEngine;
use crate::fetch::Downloader;
use crate::notify::Dispatcher;

/// Everything a processing cycle needs, built once at startup.
#[derive(Debug)]
pub struct Context {
    pub cache: CacheStore,
    pub downloader: Downloader,
    pub diff: DiffEngine,
    pub dispatcher: Dispatcher,
    pub locks: CycleLocks,
}

impl Context {
    pub fn new(
        cache: CacheStore,
        downloader: Downloader,
        diff: DiffEngine,
        dispatcher: Dispatcher,
    ) -> Self {
        Self {
            cache,
            downloader,
            diff,
            dispatcher,
            locks: CycleLocks::default(),
        }
    }
}

/// One async lock per feed URL.
///
/// Holding a URL's guard is required to fetch, promote or delete its cache
/// file, so at most one cycle per URL runs at a time across the process.
#[derive(Debug, Default)]
pub struct CycleLocks {
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl CycleLocks {
    /// Wait for exclusive use of `url`.
    pub async fn acquire(&self, url: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            locks.entry(url.to_string()).or_default().clone()
        };
        lock.lock_owned().await
    }

    /// Drop locks nobody holds or waits for.
    pub fn prune(&self) {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
    }

    /// Number of URLs with a live lock.
    pub fn len(&self) -> usize {
        self.locks.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
