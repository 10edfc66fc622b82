//! Structural delta computed by an external XSLT processor.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, warn};

use super::{DeltaProvider, DiffError};
use crate::feed::{parse_feed, FeedItem};

/// Default XSLT processor binary.
pub const DEFAULT_XSLTPROC: &str = "xsltproc";

/// Runs a per-host stylesheet that emits only the entries unique to the
/// candidate. The base path is passed as the `originalfile` parameter.
#[derive(Debug, Clone)]
pub struct XsltDelta {
    program: PathBuf,
    stylesheet: PathBuf,
}

impl XsltDelta {
    /// Create a provider running `program` with `stylesheet`.
    pub fn new(program: impl Into<PathBuf>, stylesheet: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            stylesheet: stylesheet.into(),
        }
    }

    /// The stylesheet applied by this provider.
    pub fn stylesheet(&self) -> &Path {
        &self.stylesheet
    }
}

impl DeltaProvider for XsltDelta {
    fn name(&self) -> &str {
        "xslt"
    }

    fn delta(&self, base: &Path, candidate: &Path) -> Result<Vec<FeedItem>, DiffError> {
        let original = stylesheet_param(base);
        debug!(
            "Applying {} to {} with base {}",
            self.stylesheet.display(),
            candidate.display(),
            original
        );

        let output = Command::new(&self.program)
            .arg("--stringparam")
            .arg("originalfile")
            .arg(&original)
            .arg(&self.stylesheet)
            .arg(candidate)
            .output()
            .map_err(|e| {
                DiffError::Transform(format!("failed to run {}: {}", self.program.display(), e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if !stderr.trim().is_empty() {
                warn!("{} stderr: {}", self.program.display(), stderr.trim());
            }
            return Err(DiffError::Transform(format!(
                "{} exited with {}",
                self.program.display(),
                output.status
            )));
        }

        parse_feed(&output.stdout)
            .map_err(|e| DiffError::Transform(format!("unparsable transform output: {}", e)))
    }
}

/// xsltproc on Windows only understands forward slashes in parameters.
fn stylesheet_param(path: &Path) -> String {
    let param = path.to_string_lossy();
    if cfg!(windows) {
        param.replace('\\', "/")
    } else {
        param.into_owned()
    }
}
