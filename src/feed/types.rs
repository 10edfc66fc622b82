//! Feed and subscription types.

use std::path::PathBuf;

use chrono::{DateTime, Utc};

use crate::cache::CacheStore;

/// Maximum length for an item description.
pub const MAX_DESCRIPTION_LENGTH: usize = 10000;

/// A normalized feed entry.
///
/// `guid` is the durable identity of the entry: two items with the same
/// guid are the same entry, whatever their other fields say.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedItem {
    /// Entry title.
    pub title: String,
    /// First link of the entry, empty if the entry has none.
    pub link: String,
    /// Plain-text description.
    pub description: String,
    /// Unique identifier within the feed.
    pub guid: String,
}

impl FeedItem {
    /// Create an item with the given guid and title.
    pub fn new(guid: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            link: String::new(),
            description: String::new(),
            guid: guid.into(),
        }
    }

    /// Set the link.
    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = link.into();
        self
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// A feed URL tracked by a watch list.
///
/// The cache path is never stored: it is always derived from the URL
/// through a [`CacheStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    /// Raw URL exactly as it appears in the watch-list file.
    pub url: String,
    /// When this URL was first seen in the watch-list file.
    pub discovered_at: DateTime<Utc>,
}

impl Subscription {
    /// Create a subscription discovered at the given time.
    pub fn new(url: impl Into<String>, discovered_at: DateTime<Utc>) -> Self {
        Self {
            url: url.into(),
            discovered_at,
        }
    }

    /// Resolve the cache file holding the last accepted document for this URL.
    pub fn cache_path(&self, store: &CacheStore) -> PathBuf {
        store.path_for(&self.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feed_item_builder() {
        let item = FeedItem::new("42", "Answer")
            .with_link("http://example.com/42")
            .with_description("Life, the universe and everything");

        assert_eq!(item.guid, "42");
        assert_eq!(item.title, "Answer");
        assert_eq!(item.link, "http://example.com/42");
        assert_eq!(item.description, "Life, the universe and everything");
    }

    #[test]
    fn test_subscription_cache_path_is_derived() {
        let store = CacheStore::new("/tmp/feedwatch");
        let a = Subscription::new("http://example.com/feed.xml", Utc::now());
        let b = Subscription::new("http://example.com/feed.xml", Utc::now());

        assert_eq!(a.cache_path(&store), b.cache_path(&store));
        assert_eq!(
            a.cache_path(&store),
            store.path_for("http://example.com/feed.xml")
        );
    }
}
