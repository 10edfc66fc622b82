//! Application module.
//!
//! Wires the configuration into a shared [`Context`] and starts, for every
//! watch-list file, its initial reconciliation, file watcher and scheduler.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::cache::CacheStore;
use crate::config::Config;
use crate::context::Context;
use crate::diff::DiffEngine;
use crate::error::{FeedwatchError, Result};
use crate::fetch::Downloader;
use crate::notify::Dispatcher;
use crate::template::MessageTemplates;
use crate::watch::{FileWatcher, MonitoredFile, Scheduler};

/// The running feed watcher.
pub struct Application {
    config: Config,
    ctx: Arc<Context>,
    monitors: Vec<Arc<MonitoredFile>>,
    tasks: Vec<JoinHandle<()>>,
}

impl Application {
    /// Build the shared context from a validated configuration.
    pub fn new(config: Config) -> Result<Self> {
        let ctx = Arc::new(build_context(&config)?);
        Ok(Self {
            config,
            ctx,
            monitors: Vec::new(),
            tasks: Vec::new(),
        })
    }

    pub fn context(&self) -> &Arc<Context> {
        &self.ctx
    }

    pub fn monitors(&self) -> &[Arc<MonitoredFile>] {
        &self.monitors
    }

    /// Reconcile every watch-list file once, then start its watcher and
    /// scheduler in the background.
    ///
    /// A file that cannot be read or watched at startup is an error.
    pub async fn start(&mut self) -> Result<()> {
        for path in self.config.files() {
            let monitor = Arc::new(MonitoredFile::new(path.clone(), self.ctx.clone()));

            let report = monitor.initialize().await.map_err(|e| {
                FeedwatchError::Config(format!("cannot read watch list {}: {}", path.display(), e))
            })?;
            info!(
                "Monitoring {} feed(s) from {}",
                report.added.len(),
                path.display()
            );

            let watcher = FileWatcher::new(path.clone())?;
            self.tasks.push(watcher.spawn(monitor.clone()));

            let scheduler = Scheduler::with_period(monitor.clone(), self.config.interval());
            self.tasks.push(scheduler.spawn());

            self.monitors.push(monitor);
        }

        Ok(())
    }

    /// Start, then run until interrupted.
    pub async fn run(mut self) -> Result<()> {
        self.start().await?;

        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Interrupted, shutting down"),
            Err(e) => warn!("Unable to listen for interrupt: {}", e),
        }

        for task in &self.tasks {
            task.abort();
        }
        Ok(())
    }
}

/// Build the runtime context shared by every monitored file.
pub fn build_context(config: &Config) -> Result<Context> {
    let notifiers = config.notifiers()?;
    let downloader = Downloader::new()?;
    let templates = MessageTemplates::load(&config.template_files());
    let dispatcher = Dispatcher::new(downloader.client().clone(), notifiers, templates);

    let working_dir = config.working_dir();
    let assets_dir: Option<PathBuf> = config.assets_dir();
    info!("Working directory: {}", working_dir.display());
    if let Some(dir) = &assets_dir {
        info!("Transforms folder: {}", dir.display());
    }
    for notifier in dispatcher.notifiers() {
        info!("Notifier configured: {}", notifier);
    }

    Ok(Context::new(
        CacheStore::new(working_dir),
        downloader,
        DiffEngine::new(assets_dir),
        dispatcher,
    ))
}
