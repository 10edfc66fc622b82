//! Node tree to text, for one feed item.

use super::parser::Node;
use super::{Result, TemplateError};
use crate::feed::FeedItem;

/// The fields a template can name, borrowed from one item and its feed.
#[derive(Debug, Clone, Copy)]
pub struct ItemFields<'a> {
    item: &'a FeedItem,
    feed_url: &'a str,
    host: &'a str,
}

impl<'a> ItemFields<'a> {
    pub fn new(item: &'a FeedItem, feed_url: &'a str, host: &'a str) -> Self {
        Self {
            item,
            feed_url,
            host,
        }
    }

    pub fn item(&self) -> &'a FeedItem {
        self.item
    }

    /// Value of a field by template name.
    pub fn get(&self, name: &str) -> Option<&'a str> {
        let value = match name {
            "title" => self.item.title.as_str(),
            "link" => self.item.link.as_str(),
            "description" => self.item.description.as_str(),
            "guid" => self.item.guid.as_str(),
            "feed_url" => self.feed_url,
            "host" => self.host,
            _ => return None,
        };
        Some(value)
    }

    fn require(&self, name: &str) -> Result<&'a str> {
        self.get(name)
            .ok_or_else(|| TemplateError::Render(format!("unknown field '{}'", name)))
    }
}

pub(crate) fn render_into(
    nodes: &[Node],
    fields: &ItemFields<'_>,
    out: &mut String,
) -> Result<()> {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Field(name) => out.push_str(fields.require(name)?),
            Node::Section {
                field,
                inverted,
                body,
                alternative,
            } => {
                let set = !fields.require(field)?.is_empty();
                let branch = if set != *inverted { body } else { alternative };
                render_into(branch, fields, out)?;
            }
        }
    }
    Ok(())
}
