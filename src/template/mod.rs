//! Message templates for item notifications.
//!
//! A template is plain text with tags naming item fields:
//!
//! - `{{title}}`, `{{link}}`, `{{description}}`, `{{guid}}`, `{{feed_url}}`, `{{host}}`
//! - `{{#if link}}...{{else}}...{{/if}}` and `{{#unless link}}...{{/unless}}`,
//!   where a field is set when it is not empty
//! - `\{{` for a literal `{{`
//!
//! ```
//! use feedwatch::template::{ItemFields, Template};
//! use feedwatch::FeedItem;
//!
//! let template = Template::parse("{{title}}{{#if link}} <{{link}}>{{/if}}").unwrap();
//! let item = FeedItem::new("1", "Hello").with_link("https://example.com/1");
//! let fields = ItemFields::new(&item, "https://example.com/feed", "example.com");
//!
//! assert_eq!(template.render(&fields).unwrap(), "Hello <https://example.com/1>");
//! ```

mod messages;
mod parser;
mod renderer;

use thiserror::Error;

pub use messages::{MessageTemplates, DEFAULT_TEMPLATE_SOURCE};
pub use renderer::ItemFields;

use parser::Node;

/// Template errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TemplateError {
    /// The template text is malformed.
    #[error("Parse error: {0}")]
    Parse(String),

    /// The template names something an item does not have.
    #[error("Render error: {0}")]
    Render(String),
}

pub type Result<T> = std::result::Result<T, TemplateError>;

/// A parsed message template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    nodes: Vec<Node>,
}

impl Template {
    pub fn parse(source: &str) -> Result<Self> {
        Ok(Self {
            nodes: parser::parse(source)?,
        })
    }

    /// Render against one item. Fails on a field name no item carries.
    pub fn render(&self, fields: &ItemFields<'_>) -> Result<String> {
        let mut out = String::new();
        renderer::render_into(&self.nodes, fields, &mut out)?;
        Ok(out)
    }
}
