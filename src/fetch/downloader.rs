//! Rate-limit aware feed downloader.

use std::io::Write;
use std::path::Path;
use std::time::Duration;

use reqwest::{Client, StatusCode};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use super::retry::retry_after;
use crate::cache::{host_of, write_atomic};
use crate::error::{FeedwatchError, Result};

/// Connect timeout in seconds.
const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Total timeout in seconds.
const TOTAL_TIMEOUT_SECS: u64 = 60;

/// Maximum number of redirects to follow.
const MAX_REDIRECTS: usize = 5;

/// Some feed hosts reject unknown agents, so pose as a browser.
pub const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:73.0) Gecko/20100101 Firefox/73.0";

/// Total attempts made for a rate-limited URL.
pub const MAX_ATTEMPTS: u32 = 3;

/// Result of a single fetch.
#[derive(Debug)]
pub enum FetchOutcome {
    /// No base existed; the body was written as the new base.
    Created,
    /// A base exists; the body was written to a temporary candidate file,
    /// removed when dropped.
    Candidate(NamedTempFile),
    /// The server answered 429 and asked to wait this long.
    RateLimited(Duration),
    /// The fetch failed; the cycle for this URL is abandoned.
    Failed(String),
}

/// Downloads feeds into the cache or into candidate files.
#[derive(Debug, Clone)]
pub struct Downloader {
    client: Client,
    max_attempts: u32,
}

impl Downloader {
    /// Create a downloader with the default HTTP client.
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(TOTAL_TIMEOUT_SECS))
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| FeedwatchError::Fetch(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self::with_client(client))
    }

    /// Create a downloader around an existing client.
    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            max_attempts: MAX_ATTEMPTS,
        }
    }

    /// The HTTP client, shared with the notifiers.
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Fetch `url` once.
    ///
    /// If `base` does not exist yet the body becomes the base. Otherwise it
    /// is written to a temporary candidate and `base` is left untouched.
    pub async fn fetch(&self, url: &str, base: &Path) -> FetchOutcome {
        match url::Url::parse(url) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {}
            Ok(parsed) => {
                return FetchOutcome::Failed(format!("unsupported scheme: {}", parsed.scheme()))
            }
            Err(e) => return FetchOutcome::Failed(format!("invalid URL: {}", e)),
        }

        let response = match self.client.get(url).send().await {
            Ok(r) => r,
            Err(e) => return FetchOutcome::Failed(format!("failed to fetch feed: {}", e)),
        };

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return FetchOutcome::RateLimited(retry_after(response.headers()));
        }
        if status != StatusCode::OK {
            return FetchOutcome::Failed(format!("HTTP error: {}", status));
        }

        let body = match response.bytes().await {
            Ok(b) => b,
            Err(e) => return FetchOutcome::Failed(format!("failed to read response: {}", e)),
        };

        if base.exists() {
            match write_candidate(url, &body) {
                Ok(candidate) => FetchOutcome::Candidate(candidate),
                Err(e) => FetchOutcome::Failed(format!("failed to write candidate: {}", e)),
            }
        } else {
            match write_atomic(base, &body) {
                Ok(()) => FetchOutcome::Created,
                Err(e) => FetchOutcome::Failed(format!("failed to write base file: {}", e)),
            }
        }
    }

    /// Fetch `url`, sleeping and retrying while the server rate limits us.
    ///
    /// Never returns [`FetchOutcome::RateLimited`]: exhausting the attempts
    /// turns into [`FetchOutcome::Failed`].
    pub async fn fetch_with_retry(&self, url: &str, base: &Path) -> FetchOutcome {
        let mut attempt = 1;
        loop {
            match self.fetch(url, base).await {
                FetchOutcome::RateLimited(delay) if attempt < self.max_attempts => {
                    info!(
                        "Rate limited for {} - retrying after {:?} (attempt {}/{})",
                        url, delay, attempt, self.max_attempts
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                FetchOutcome::RateLimited(_) => {
                    warn!("Rate limited for {} after {} attempts", url, attempt);
                    return FetchOutcome::Failed(format!(
                        "rate limited after {} attempts",
                        attempt
                    ));
                }
                outcome => {
                    debug!("Fetched {} in {} attempt(s)", url, attempt);
                    return outcome;
                }
            }
        }
    }
}

/// Write a body to a fresh temporary file named after the URL's host.
fn write_candidate(url: &str, body: &[u8]) -> Result<NamedTempFile> {
    let prefix = format!("{}-", host_of(url).unwrap_or_else(|| "feed".to_string()));
    let mut file = tempfile::Builder::new().prefix(&prefix).tempfile()?;
    file.write_all(body)?;
    file.flush()?;
    Ok(file)
}
