//! Feed documents and subscriptions.

pub mod parser;
pub mod types;

pub use parser::{parse_feed, parse_feed_file};
pub use types::{FeedItem, Subscription, MAX_DESCRIPTION_LENGTH};
