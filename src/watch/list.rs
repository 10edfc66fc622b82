//! Watch-list file parsing.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::error::Result;

/// Read the feed URLs of a watch-list file.
///
/// One URL per line. Surrounding spaces, tabs and line terminators are
/// trimmed, blank lines skipped. Order of first appearance is kept and
/// repeated URLs are dropped.
pub fn read_watch_list(path: &Path) -> Result<Vec<String>> {
    let content = fs::read_to_string(path)?;
    Ok(parse_watch_list(&content))
}

/// Parse watch-list content.
pub fn parse_watch_list(content: &str) -> Vec<String> {
    let mut seen = HashSet::new();

    content
        .lines()
        .map(|line| line.trim_matches(|c: char| matches!(c, ' ' | '\t' | '\r' | '\n')))
        .filter(|line| !line.is_empty())
        .filter(|line| seen.insert(*line))
        .map(str::to_string)
        .collect()
}
