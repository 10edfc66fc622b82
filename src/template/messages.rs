//! Per-host message templates for item notifications.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::parser::Node;
use super::{ItemFields, Result, Template};
use crate::cache::host_of;
use crate::feed::FeedItem;

/// Source of the built-in template.
pub const DEFAULT_TEMPLATE_SOURCE: &str = "Message: [{{title}}]({{link}})";

/// Extension stripped from template file names.
const TEMPLATE_EXTENSION: &str = ".tmpl";

/// Message templates keyed by feed host name.
#[derive(Debug, Clone)]
pub struct MessageTemplates {
    default: Template,
    hosts: HashMap<String, Template>,
}

impl MessageTemplates {
    /// Create a set holding only the built-in template.
    pub fn new() -> Self {
        Self {
            default: builtin(),
            hosts: HashMap::new(),
        }
    }

    /// Load template files on top of the built-in template.
    ///
    /// A file named `news.example.com.tmpl` serves items from the host
    /// `news.example.com`. Unreadable or invalid files are skipped.
    pub fn load(files: &[PathBuf]) -> Self {
        let mut templates = Self::new();

        for path in files {
            let Some(host) = template_name(path) else {
                warn!("Skipping template with no file name: {}", path.display());
                continue;
            };

            let content = match fs::read_to_string(path) {
                Ok(content) => content,
                Err(e) => {
                    warn!("Failed to read template {}: {}", path.display(), e);
                    continue;
                }
            };

            match templates.register(&host, &content) {
                Ok(()) => debug!("Loaded template for {} from {}", host, path.display()),
                Err(e) => warn!("Skipping template {}: {}", path.display(), e),
            }
        }

        templates
    }

    /// Register a template for a host name.
    pub fn register(&mut self, host: &str, content: &str) -> Result<()> {
        let template = Template::parse(content)?;
        self.hosts.insert(host.to_string(), template);
        Ok(())
    }

    pub fn has_host(&self, host: &str) -> bool {
        self.hosts.contains_key(host)
    }

    /// Render an item fetched from `source_url` into notification text.
    ///
    /// Never fails: a broken host template falls back to the built-in one,
    /// with a note describing the error in front of it.
    pub fn render_item(&self, source_url: &str, item: &FeedItem) -> String {
        let host = host_of(source_url).unwrap_or_default();
        let fields = ItemFields::new(item, source_url, &host);

        let Some(template) = self.hosts.get(&host) else {
            return self.render_default(&fields);
        };

        match template.render(&fields) {
            Ok(text) => text,
            Err(e) => {
                warn!("Failed to render template for {}: {}", host, e);
                format!(
                    "There was an error rendering message content - {}. Message is rendered with default template below: \n{}",
                    e,
                    self.render_default(&fields)
                )
            }
        }
    }

    fn render_default(&self, fields: &ItemFields<'_>) -> String {
        self.default.render(fields).unwrap_or_else(|_| {
            let item = fields.item();
            format!("Message: [{}]({})", item.title, item.link)
        })
    }
}

impl Default for MessageTemplates {
    fn default() -> Self {
        Self::new()
    }
}

/// `Message: [{{title}}]({{link}})`, built without going through the parser.
fn builtin() -> Template {
    let text = |s: &str| Node::Text(s.to_string());
    let field = |s: &str| Node::Field(s.to_string());
    Template {
        nodes: vec![text("Message: ["), field("title"), text("]("), field("link"), text(")")],
    }
}

/// Host a template file serves: its file name without the `.tmpl` suffix.
fn template_name(path: &Path) -> Option<String> {
    let file_name = path.file_name()?.to_str()?;
    let name = file_name
        .strip_suffix(TEMPLATE_EXTENSION)
        .unwrap_or(file_name);
    (!name.is_empty()).then(|| name.to_string())
}
