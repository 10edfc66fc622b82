//! One fetch, diff and notify cycle for a feed URL.

use tracing::{error, info};

use crate::context::Context;
use crate::fetch::FetchOutcome;

/// How a cycle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// First fetch; the base file was created.
    Created,
    /// The candidate carried this many new items, all pushed.
    NewItems(usize),
    /// Nothing new.
    NoChange,
    /// Fetch or diff failed; the base file is untouched.
    Abandoned,
}

/// Run a cycle for `url`, waiting for any cycle already running on it.
pub async fn process(ctx: &Context, url: &str) -> CycleOutcome {
    let _guard = ctx.locks.acquire(url).await;
    run_cycle(ctx, url).await
}

/// Run a cycle for `url`. The caller must hold the URL's cycle lock.
///
/// Failures are logged and never propagated.
pub async fn run_cycle(ctx: &Context, url: &str) -> CycleOutcome {
    let base = ctx.cache.path_for(url);

    let candidate = match ctx.downloader.fetch_with_retry(url, &base).await {
        FetchOutcome::Created => {
            info!("Base file created for {}: {}", url, base.display());
            ctx.dispatcher
                .notify_all(&format!(
                    "New url {} monitored. Base file {}",
                    url,
                    base.display()
                ))
                .await;
            return CycleOutcome::Created;
        }
        FetchOutcome::Candidate(candidate) => candidate,
        FetchOutcome::RateLimited(delay) => {
            error!("Giving up on {}: still rate limited ({:?})", url, delay);
            return CycleOutcome::Abandoned;
        }
        FetchOutcome::Failed(reason) => {
            error!("Error downloading {}: {}", url, reason);
            return CycleOutcome::Abandoned;
        }
    };

    let diff = ctx.diff.clone();
    let feed_url = url.to_string();
    let result = tokio::task::spawn_blocking(move || {
        // The candidate is removed when dropped at the end of this closure.
        diff.diff_and_promote(&feed_url, &base, candidate.path())
    })
    .await;

    let items = match result {
        Ok(Ok(items)) => items,
        Ok(Err(e)) => {
            error!("Error comparing {}: {}", url, e);
            return CycleOutcome::Abandoned;
        }
        Err(e) => {
            error!("Diff task for {} failed: {}", url, e);
            return CycleOutcome::Abandoned;
        }
    };

    if items.is_empty() {
        return CycleOutcome::NoChange;
    }

    info!("Pushing {} new items found in feed {}", items.len(), url);
    for item in &items {
        ctx.dispatcher.notify_item_all(url, item).await;
    }

    CycleOutcome::NewItems(items.len())
}
