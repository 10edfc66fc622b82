//! feedwatch - feed subscription watcher
//!
//! Watches feed URLs listed in plain-text files, detects new entries and
//! pushes them to Pushover or Telegram.

pub mod app;
pub mod cache;
pub mod cli;
pub mod config;
pub mod context;
pub mod diff;
pub mod error;
pub mod feed;
pub mod fetch;
pub mod logging;
pub mod notify;
pub mod template;
pub mod watch;

pub use app::Application;
pub use cache::CacheStore;
pub use config::Config;
pub use context::Context;
pub use error::{FeedwatchError, Result};
pub use feed::{FeedItem, Subscription};
pub use notify::{Dispatcher, Notifier};
