//! Identity-based delta: items whose guid the base does not have.

use std::collections::HashSet;
use std::path::Path;

use super::{DeltaProvider, DiffError};
use crate::feed::{parse_feed_file, FeedItem};

/// Compares documents by item guid, without any external tool.
#[derive(Debug, Default, Clone, Copy)]
pub struct GuidDelta;

impl GuidDelta {
    /// Create the provider.
    pub fn new() -> Self {
        Self
    }

    /// Items of `candidate` whose guid is absent from `base`.
    ///
    /// Candidate order is kept; repeated guids in the candidate count once.
    pub fn compare(base: &[FeedItem], candidate: Vec<FeedItem>) -> Vec<FeedItem> {
        let mut seen: HashSet<String> = base.iter().map(|item| item.guid.clone()).collect();

        candidate
            .into_iter()
            .filter(|item| seen.insert(item.guid.clone()))
            .collect()
    }
}

impl DeltaProvider for GuidDelta {
    fn name(&self) -> &str {
        "guid"
    }

    fn delta(&self, base: &Path, candidate: &Path) -> Result<Vec<FeedItem>, DiffError> {
        let new_items = parse_feed_file(candidate)
            .map_err(|e| DiffError::Parse(format!("candidate {}: {}", candidate.display(), e)))?;
        let old_items = parse_feed_file(base)
            .map_err(|e| DiffError::Parse(format!("base {}: {}", base.display(), e)))?;

        Ok(Self::compare(&old_items, new_items))
    }
}
