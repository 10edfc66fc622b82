//! Change detection between a cached base document and a fresh candidate.
//!
//! Two strategies compute the items unique to the candidate:
//!
//! - [`XsltDelta`]: an external stylesheet per host, when one is installed.
//! - [`GuidDelta`]: an in-process comparison of item guids.
//!
//! The guid strategy is always the fallback, whether the host has no
//! stylesheet or its stylesheet failed.

mod guid;
mod xslt;

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};

pub use guid::GuidDelta;
pub use xslt::{XsltDelta, DEFAULT_XSLTPROC};

use crate::cache::{host_of, write_atomic};
use crate::feed::FeedItem;

/// Diff failures.
#[derive(Error, Debug)]
pub enum DiffError {
    /// The transform ran but did not produce a usable delta.
    #[error("transform failed: {0}")]
    Transform(String),

    /// A document could not be parsed as a feed.
    #[error("parse failed: {0}")]
    Parse(String),

    /// Reading or promoting a document failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Computes the items present in a candidate document but not in its base.
pub trait DeltaProvider {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// New items of `candidate` relative to `base`.
    fn delta(&self, base: &Path, candidate: &Path) -> Result<Vec<FeedItem>, DiffError>;
}

/// Chooses a strategy per feed and promotes candidates that carry news.
#[derive(Debug, Clone)]
pub struct DiffEngine {
    assets_dir: Option<PathBuf>,
    xsltproc: PathBuf,
}

impl DiffEngine {
    /// Create an engine looking for `<host>.xslt` in `assets_dir`.
    pub fn new(assets_dir: Option<PathBuf>) -> Self {
        Self {
            assets_dir,
            xsltproc: PathBuf::from(DEFAULT_XSLTPROC),
        }
    }

    /// Use another XSLT processor binary.
    pub fn with_xsltproc(mut self, program: impl Into<PathBuf>) -> Self {
        self.xsltproc = program.into();
        self
    }

    /// Stylesheet installed for the URL's host, if any.
    pub fn transform_for(&self, url: &str) -> Option<PathBuf> {
        let host = host_of(url)?;
        let path = self.assets_dir.as_ref()?.join(format!("{}.xslt", host));
        path.is_file().then_some(path)
    }

    /// New items of `candidate` relative to `base`.
    ///
    /// Fails only when the guid fallback cannot parse the documents.
    pub fn new_items(
        &self,
        url: &str,
        base: &Path,
        candidate: &Path,
    ) -> Result<Vec<FeedItem>, DiffError> {
        match self.transform_for(url) {
            Some(stylesheet) => {
                let provider = XsltDelta::new(&self.xsltproc, stylesheet);
                match provider.delta(base, candidate) {
                    Ok(items) => return Ok(items),
                    Err(e) => warn!(
                        "Transform {} failed for {}, falling back to guid comparison: {}",
                        provider.stylesheet().display(),
                        url,
                        e
                    ),
                }
            }
            None => debug!("No transform for {}, using guid comparison", url),
        }

        GuidDelta::new().delta(base, candidate)
    }

    /// Diff `candidate` against `base` and, when there are new items,
    /// replace `base` with the candidate's content.
    ///
    /// `base` is never modified when no new item is found or on error.
    pub fn diff_and_promote(
        &self,
        url: &str,
        base: &Path,
        candidate: &Path,
    ) -> crate::Result<Vec<FeedItem>> {
        let items = self.new_items(url, base, candidate)?;

        if items.is_empty() {
            info!("No new items found in feed {}", url);
            return Ok(items);
        }

        let content = fs::read(candidate)?;
        write_atomic(base, &content)?;
        info!("Feed {} has {} new items", url, items.len());

        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const URL: &str = "http://example.com/feed.xml";

    fn rss(guids: &[&str]) -> String {
        let items: String = guids
            .iter()
            .map(|g| format!("<item><title>Item {g}</title><guid>{g}</guid></item>"))
            .collect();
        format!(
            r#"<?xml version="1.0"?><rss version="2.0"><channel><title>t</title>{items}</channel></rss>"#
        )
    }

    fn setup(base: &[&str], candidate: &[&str]) -> (TempDir, PathBuf, PathBuf) {
        let temp_dir = TempDir::new().unwrap();
        let base_path = temp_dir.path().join("example.com").join("base");
        let candidate_path = temp_dir.path().join("candidate");
        fs::create_dir_all(base_path.parent().unwrap()).unwrap();
        fs::write(&base_path, rss(base)).unwrap();
        fs::write(&candidate_path, rss(candidate)).unwrap();
        (temp_dir, base_path, candidate_path)
    }

    #[test]
    fn test_transform_for_missing_assets() {
        let engine = DiffEngine::new(None);
        assert_eq!(engine.transform_for(URL), None);

        let temp_dir = TempDir::new().unwrap();
        let engine = DiffEngine::new(Some(temp_dir.path().to_path_buf()));
        assert_eq!(engine.transform_for(URL), None);
    }

    #[test]
    fn test_transform_for_host() {
        let temp_dir = TempDir::new().unwrap();
        let stylesheet = temp_dir.path().join("example.com.xslt");
        fs::write(&stylesheet, "<xsl:stylesheet/>").unwrap();

        let engine = DiffEngine::new(Some(temp_dir.path().to_path_buf()));
        assert_eq!(engine.transform_for(URL), Some(stylesheet));
        assert_eq!(engine.transform_for("http://other.org/rss"), None);
        assert_eq!(engine.transform_for("no host"), None);
    }

    #[test]
    fn test_diff_and_promote_new_items() {
        let (_temp_dir, base, candidate) = setup(&["A", "B"], &["A", "B", "C"]);
        let engine = DiffEngine::new(None);

        let items = engine.diff_and_promote(URL, &base, &candidate).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].guid, "C");
        assert_eq!(fs::read(&base).unwrap(), fs::read(&candidate).unwrap());
    }

    #[test]
    fn test_diff_and_promote_idempotent() {
        let (_temp_dir, base, candidate) = setup(&["A", "B"], &["A", "B"]);
        let before = fs::read(&base).unwrap();
        let engine = DiffEngine::new(None);

        let items = engine.diff_and_promote(URL, &base, &candidate).unwrap();
        assert!(items.is_empty());
        assert_eq!(fs::read(&base).unwrap(), before);
    }

    #[test]
    fn test_diff_and_promote_parse_failure_leaves_base() {
        let (_temp_dir, base, candidate) = setup(&["A"], &[]);
        fs::write(&candidate, "not a feed").unwrap();
        let before = fs::read(&base).unwrap();

        let result = DiffEngine::new(None).diff_and_promote(URL, &base, &candidate);
        assert!(matches!(
            result,
            Err(crate::FeedwatchError::Diff(DiffError::Parse(_)))
        ));
        assert_eq!(fs::read(&base).unwrap(), before);
    }

    #[test]
    fn test_broken_transform_falls_back_to_guid() {
        let (temp_dir, base, candidate) = setup(&["A"], &["A", "B"]);
        let assets = temp_dir.path().join("assets");
        fs::create_dir_all(&assets).unwrap();
        fs::write(assets.join("example.com.xslt"), "<xsl:stylesheet/>").unwrap();

        let engine = DiffEngine::new(Some(assets))
            .with_xsltproc(temp_dir.path().join("no-such-xsltproc"));

        let items = engine.new_items(URL, &base, &candidate).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].guid, "B");
    }

    #[cfg(unix)]
    #[test]
    fn test_transform_output_is_used() {
        use std::os::unix::fs::PermissionsExt;

        let (temp_dir, base, candidate) = setup(&["A"], &["A", "B"]);
        let assets = temp_dir.path().join("assets");
        fs::create_dir_all(&assets).unwrap();
        fs::write(assets.join("example.com.xslt"), "<xsl:stylesheet/>").unwrap();

        // Stand-in processor echoing a delta with a single entry.
        let delta = temp_dir.path().join("delta.xml");
        fs::write(&delta, rss(&["X"])).unwrap();
        let program = temp_dir.path().join("fake-xsltproc");
        fs::write(&program, format!("#!/bin/sh\ncat '{}'\n", delta.display())).unwrap();
        fs::set_permissions(&program, fs::Permissions::from_mode(0o755)).unwrap();

        let engine = DiffEngine::new(Some(assets)).with_xsltproc(program);

        let items = engine.new_items(URL, &base, &candidate).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].guid, "X");
    }
}
