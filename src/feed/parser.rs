//! Feed document parsing.
//!
//! Turns raw RSS/Atom/JSON Feed bytes into a list of [`FeedItem`]s.

use std::fs;
use std::path::Path;

use feed_rs::model::Entry;
use feed_rs::parser::{Builder, Parser};
use md5::{Digest, Md5};

use crate::error::{FeedwatchError, Result};
use crate::feed::types::{FeedItem, MAX_DESCRIPTION_LENGTH};

/// Entries without an id of their own keep an empty id here and get a
/// content-derived guid in [`to_item`].
fn parser() -> Parser {
    Builder::new().id_generator(|_, _, _| String::new()).build()
}

/// Parse feed bytes into normalized items, in document order.
pub fn parse_feed(bytes: &[u8]) -> Result<Vec<FeedItem>> {
    let feed = parser()
        .parse(bytes)
        .map_err(|e| FeedwatchError::Feed(format!("failed to parse feed: {}", e)))?;

    Ok(feed.entries.into_iter().map(to_item).collect())
}

/// Read and parse a feed document from disk.
pub fn parse_feed_file(path: &Path) -> Result<Vec<FeedItem>> {
    let bytes = fs::read(path)?;
    parse_feed(&bytes)
}

fn to_item(entry: Entry) -> FeedItem {
    let link = entry
        .links
        .first()
        .map(|l| l.href.clone())
        .unwrap_or_default();
    let title = entry.title.map(|t| t.content);
    let description = entry
        .summary
        .map(|t| t.content)
        .or_else(|| entry.content.and_then(|c| c.body))
        .map(|html| plain_text(&html))
        .unwrap_or_default();

    let guid = if entry.id.is_empty() {
        derived_guid(&link, title.as_deref().unwrap_or_default(), &description)
    } else {
        entry.id
    };

    FeedItem {
        title: title.unwrap_or_else(|| "Untitled".to_string()),
        link,
        description,
        guid,
    }
}

/// Stable guid for an entry that has none: the link and title when there is
/// a link, the title and description otherwise.
fn derived_guid(link: &str, title: &str, description: &str) -> String {
    let mut hasher = Md5::new();
    if link.is_empty() {
        hasher.update(title.as_bytes());
        hasher.update([0u8]);
        hasher.update(description.as_bytes());
    } else {
        hasher.update(link.as_bytes());
        hasher.update([0u8]);
        hasher.update(title.as_bytes());
    }
    hex::encode(hasher.finalize())
}

/// Markup-free, whitespace-collapsed text, cut to [`MAX_DESCRIPTION_LENGTH`]
/// characters.
fn plain_text(html: &str) -> String {
    let text = decode_entities(&remove_tags(html));
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");

    match text.char_indices().nth(MAX_DESCRIPTION_LENGTH) {
        Some((end, _)) => text[..end].to_string(),
        None => text,
    }
}

fn remove_tags(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut rest = html;
    while let Some(open) = rest.find('<') {
        out.push_str(&rest[..open]);
        match rest[open..].find('>') {
            Some(close) => rest = &rest[open + close + 1..],
            None => return out,
        }
        out.push(' ');
    }
    out.push_str(rest);
    out
}

/// Longest entity name looked for after an `&`.
const MAX_ENTITY_LEN: usize = 10;

fn decode_entities(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];

        let decoded = rest
            .char_indices()
            .take(MAX_ENTITY_LEN + 2)
            .find(|&(_, c)| c == ';')
            .and_then(|(semi, _)| entity(&rest[1..semi]).map(|c| (c, semi)));
        match decoded {
            Some((c, semi)) => {
                out.push(c);
                rest = &rest[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn entity(name: &str) -> Option<char> {
    let code = match name {
        "amp" => return Some('&'),
        "lt" => return Some('<'),
        "gt" => return Some('>'),
        "quot" => return Some('"'),
        "apos" => return Some('\''),
        "nbsp" => return Some(' '),
        _ => name.strip_prefix('#')?,
    };
    let value = match code.strip_prefix(['x', 'X']) {
        Some(hex) => u32::from_str_radix(hex, 16).ok()?,
        None => code.parse().ok()?,
    };
    char::from_u32(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_feed_rss() {
        let rss = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Test Feed</title>
    <link>https://example.com</link>
    <description>A test feed</description>
    <item>
      <title>First Article</title>
      <link>https://example.com/1</link>
      <guid>guid-1</guid>
      <description>&lt;p&gt;Description&lt;/p&gt;</description>
    </item>
    <item>
      <title>Second Article</title>
      <link>https://example.com/2</link>
      <guid>guid-2</guid>
    </item>
  </channel>
</rss>"#;

        let items = parse_feed(rss.as_bytes()).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "First Article");
        assert_eq!(items[0].guid, "guid-1");
        assert_eq!(items[0].link, "https://example.com/1");
        assert_eq!(items[0].description, "Description");
        assert_eq!(items[1].guid, "guid-2");
        assert_eq!(items[1].description, "");
    }

    #[test]
    fn test_parse_feed_atom() {
        let atom = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Atom Feed</title>
  <link href="https://example.com"/>
  <entry>
    <id>urn:uuid:1</id>
    <title>Atom Entry</title>
    <link href="https://example.com/entry"/>
    <summary>Entry summary</summary>
    <updated>2025-01-01T00:00:00Z</updated>
  </entry>
</feed>"#;

        let items = parse_feed(atom.as_bytes()).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "Atom Entry");
        assert_eq!(items[0].guid, "urn:uuid:1");
        assert_eq!(items[0].link, "https://example.com/entry");
        assert_eq!(items[0].description, "Entry summary");
    }

    #[test]
    fn test_parse_feed_minimal() {
        let rss = r#"<?xml version="1.0"?>
<rss version="2.0">
  <channel>
    <item>
      <guid>1</guid>
    </item>
  </channel>
</rss>"#;

        let items = parse_feed(rss.as_bytes()).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "Untitled");
        assert_eq!(items[0].guid, "1");
        assert_eq!(items[0].link, "");
    }

    #[test]
    fn test_parse_feed_empty_channel() {
        let rss = r#"<?xml version="1.0"?>
<rss version="2.0"><channel><title>t</title></channel></rss>"#;
        assert!(parse_feed(rss.as_bytes()).unwrap().is_empty());
    }

    #[test]
    fn test_parse_feed_invalid() {
        let result = parse_feed(b"This is not XML");
        assert!(matches!(result, Err(FeedwatchError::Feed(_))));
    }

    #[test]
    fn test_parse_feed_file_missing() {
        let temp_dir = TempDir::new().unwrap();
        let result = parse_feed_file(&temp_dir.path().join("missing.xml"));
        assert!(matches!(result, Err(FeedwatchError::Io(_))));
    }

    #[test]
    fn test_missing_guid_is_stable() {
        let rss = r#"<?xml version="1.0"?>
<rss version="2.0">
  <channel>
    <title>t</title>
    <item><title>No guid no link</title><description>d</description></item>
    <item><title>No guid</title><link>https://example.com/a</link></item>
  </channel>
</rss>"#;

        let first = parse_feed(rss.as_bytes()).unwrap();
        let second = parse_feed(rss.as_bytes()).unwrap();
        assert_eq!(first, second);
        assert!(!first[0].guid.is_empty());
        assert_ne!(first[0].guid, first[1].guid);
    }

    #[test]
    fn test_derived_guid_inputs() {
        // A link identifies the entry whatever its description says.
        assert_eq!(
            derived_guid("https://x/1", "T", "old"),
            derived_guid("https://x/1", "T", "new")
        );
        assert_ne!(derived_guid("", "T", "old"), derived_guid("", "T", "new"));
        assert_ne!(derived_guid("", "ab", "c"), derived_guid("", "a", "bc"));
    }

    #[test]
    fn test_plain_text() {
        assert_eq!(plain_text("<p>Hello</p>"), "Hello");
        assert_eq!(plain_text("<b>Bold</b> text"), "Bold text");
        assert_eq!(plain_text("line<br/>break"), "line break");
        assert_eq!(plain_text("&lt;tag&gt; &amp; more"), "<tag> & more");
        assert_eq!(plain_text("&#65;&#x42;"), "AB");
        assert_eq!(plain_text("&unknown; & alone"), "&unknown; & alone");
        assert_eq!(plain_text("<p>\n\tNewlines\n\tand\ttabs\n</p>"), "Newlines and tabs");
        assert_eq!(plain_text("cut <a href="), "cut");
    }

    #[test]
    fn test_plain_text_length() {
        let long = "é".repeat(MAX_DESCRIPTION_LENGTH + 100);
        assert_eq!(plain_text(&long).chars().count(), MAX_DESCRIPTION_LENGTH);
        assert_eq!(plain_text("short"), "short");
    }
}
