//! Feed fetching with bounded retry under rate limiting.

mod downloader;
mod retry;

pub use downloader::{Downloader, FetchOutcome, MAX_ATTEMPTS, USER_AGENT};
pub use retry::{parse_duration, retry_after, MAX_RETRY_DELAY, RATELIMIT_RETRY_AFTER};
