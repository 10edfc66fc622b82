//! Fixed-interval sweeps over a monitored file.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Duration, Instant, MissedTickBehavior};
use tracing::{debug, info};

use super::pipeline::CycleOutcome;
use super::reconciler::MonitoredFile;

/// Default sweep interval in minutes.
pub const DEFAULT_INTERVAL_MINUTES: u64 = 30;

/// Longest sweep interval in minutes, one year.
pub const MAX_INTERVAL_MINUTES: u64 = 365 * 24 * 60;

const MAX_PERIOD: Duration = Duration::from_secs(MAX_INTERVAL_MINUTES * 60);

/// Periodically runs a cycle for every URL of a monitored file.
pub struct Scheduler {
    monitor: Arc<MonitoredFile>,
    period: Duration,
}

impl Scheduler {
    pub fn new(monitor: Arc<MonitoredFile>) -> Self {
        Self::with_period(monitor, Duration::from_secs(DEFAULT_INTERVAL_MINUTES * 60))
    }

    /// The period is clamped to between one millisecond and
    /// [`MAX_INTERVAL_MINUTES`].
    pub fn with_period(monitor: Arc<MonitoredFile>, period: Duration) -> Self {
        Self {
            monitor,
            period: period.clamp(Duration::from_millis(1), MAX_PERIOD),
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Run forever. The first sweep happens one period after start, since
    /// the initial reconciliation already processed every URL.
    pub async fn run(&self) {
        info!(
            "Scheduler started for {} (interval: {} seconds)",
            self.monitor.path().display(),
            self.period.as_secs()
        );

        let mut timer = interval_at(Instant::now() + self.period, self.period);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            timer.tick().await;
            self.tick().await;
        }
    }

    /// One sweep.
    pub async fn tick(&self) {
        let outcomes = self.monitor.sweep().await;

        let new_items: usize = outcomes
            .iter()
            .map(|(_, outcome)| match outcome {
                CycleOutcome::NewItems(n) => *n,
                _ => 0,
            })
            .sum();
        let abandoned = outcomes
            .iter()
            .filter(|(_, outcome)| *outcome == CycleOutcome::Abandoned)
            .count();

        debug!(
            "Sweep of {} done: {} feed(s), {} new item(s), {} abandoned",
            self.monitor.path().display(),
            outcomes.len(),
            new_items,
            abandoned
        );
    }

    /// Run the scheduler as a background task.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move { self.run().await })
    }
}
