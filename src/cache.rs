//! Content-addressed cache of the last accepted feed documents.
//!
//! Each feed URL maps to exactly one file:
//! ```text
//! {working_dir}/
//! ├── example.com/
//! │   └── 5d41402abc4b2a76b9719d911017c592
//! └── news.example.org/
//!     └── 7d793037a0760186574b0282f2f435e7
//! ```
//! The file name is the hex MD5 digest of the raw URL string, so the same
//! URL always resolves to the same path, across restarts.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use md5::{Digest, Md5};
use tempfile::NamedTempFile;

use crate::Result;

/// Maps feed URLs to cache files under a working directory.
///
/// Path resolution is pure: directories are created lazily by writers.
#[derive(Debug, Clone)]
pub struct CacheStore {
    /// Root directory of the cache.
    working_dir: PathBuf,
}

impl CacheStore {
    /// Create a store rooted at `working_dir`.
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
        }
    }

    /// Root directory of the cache.
    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// Resolve the cache file for a URL.
    ///
    /// The host directory is omitted when the URL has no host.
    pub fn path_for(&self, url: &str) -> PathBuf {
        let file_name = Self::digest(url);
        match host_of(url) {
            Some(host) => self.working_dir.join(host).join(file_name),
            None => self.working_dir.join(file_name),
        }
    }

    /// Check if a cache file exists for the URL.
    pub fn exists(&self, url: &str) -> bool {
        self.path_for(url).exists()
    }

    /// Delete the cache file for a URL.
    ///
    /// Returns `true` if the file was deleted, `false` if it didn't exist.
    pub fn delete(&self, url: &str) -> Result<bool> {
        match fs::remove_file(self.path_for(url)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Hex MD5 digest of the raw URL string.
    fn digest(url: &str) -> String {
        hex::encode(Md5::digest(url.as_bytes()))
    }
}

/// Host name of a URL, if it parses and has one.
pub fn host_of(url: &str) -> Option<String> {
    url::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .filter(|h| !h.is_empty())
}

/// Replace `path` with `content` so readers never see a partial file.
///
/// The content is written to a temporary file in the same directory and
/// renamed over the destination. Parent directories are created as needed.
pub fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)?;

    let mut tmp = NamedTempFile::new_in(parent)?;
    tmp.write_all(content)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
