//! Template text to node tree.

use std::vec::IntoIter;

use super::{Result, TemplateError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Node {
    Text(String),
    Field(String),
    /// `{{#if}}` renders `body` when the field is set, `{{#unless}}` when
    /// it is empty. `alternative` is the `{{else}}` branch.
    Section {
        field: String,
        inverted: bool,
        body: Vec<Node>,
        alternative: Vec<Node>,
    },
}

#[derive(Debug)]
enum Token<'a> {
    Text(String),
    Tag(&'a str),
}

pub(crate) fn parse(source: &str) -> Result<Vec<Node>> {
    let mut tokens = tokenize(source)?.into_iter();
    match parse_block(&mut tokens)? {
        (nodes, None) => Ok(nodes),
        (_, Some(tag)) => Err(TemplateError::Parse(format!("unexpected tag '{}'", tag))),
    }
}

/// Split into text runs and trimmed tag contents.
fn tokenize(source: &str) -> Result<Vec<Token<'_>>> {
    let mut tokens = Vec::new();
    let mut text = String::new();
    let mut rest = source;

    while let Some(open) = rest.find("{{") {
        let (before, after) = (&rest[..open], &rest[open + 2..]);

        if let Some(literal) = before.strip_suffix('\\') {
            text.push_str(literal);
            text.push_str("{{");
            rest = after;
            continue;
        }
        text.push_str(before);

        let close = after.find("}}").ok_or_else(|| {
            let offset = source.len() - rest.len() + open;
            TemplateError::Parse(format!("tag opened at byte {} is never closed", offset))
        })?;
        if !text.is_empty() {
            tokens.push(Token::Text(std::mem::take(&mut text)));
        }
        tokens.push(Token::Tag(after[..close].trim()));
        rest = &after[close + 2..];
    }

    text.push_str(rest);
    if !text.is_empty() {
        tokens.push(Token::Text(text));
    }
    Ok(tokens)
}

/// Collect nodes up to an `else` or closing tag, which is handed back.
fn parse_block<'a>(tokens: &mut IntoIter<Token<'a>>) -> Result<(Vec<Node>, Option<&'a str>)> {
    let mut nodes = Vec::new();

    while let Some(token) = tokens.next() {
        let tag = match token {
            Token::Text(text) => {
                nodes.push(Node::Text(text));
                continue;
            }
            Token::Tag(tag) => tag,
        };

        if tag == "else" || tag.starts_with('/') {
            return Ok((nodes, Some(tag)));
        }

        match tag.strip_prefix('#') {
            Some(open) => nodes.push(parse_section(open, tokens)?),
            None if tag.is_empty() => {
                return Err(TemplateError::Parse("empty tag".to_string()));
            }
            None => nodes.push(Node::Field(tag.to_string())),
        }
    }

    Ok((nodes, None))
}

fn parse_section(open: &str, tokens: &mut IntoIter<Token<'_>>) -> Result<Node> {
    let (helper, field) = match open.split_once(char::is_whitespace) {
        Some((helper, field)) => (helper, field.trim()),
        None => (open, ""),
    };
    let inverted = match helper {
        "if" => false,
        "unless" => true,
        other => {
            return Err(TemplateError::Parse(format!("unknown block '{}'", other)));
        }
    };
    if field.is_empty() {
        return Err(TemplateError::Parse(format!("'{}' needs a field name", helper)));
    }

    let (body, mut end) = parse_block(tokens)?;
    let mut alternative = Vec::new();
    if end == Some("else") {
        (alternative, end) = parse_block(tokens)?;
    }

    if end.and_then(|tag| tag.strip_prefix('/')) != Some(helper) {
        return Err(TemplateError::Parse(format!(
            "'{} {}' is not closed by '/{}'",
            helper, field, helper
        )));
    }

    Ok(Node::Section {
        field: field.to_string(),
        inverted,
        body,
        alternative,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Node {
        Node::Text(s.to_string())
    }

    fn field(s: &str) -> Node {
        Node::Field(s.to_string())
    }

    #[test]
    fn test_text_and_fields() {
        let nodes = parse("Message: [{{ title }}]({{link}})").unwrap();
        assert_eq!(
            nodes,
            vec![text("Message: ["), field("title"), text("]("), field("link"), text(")")]
        );
    }

    #[test]
    fn test_escaped_braces() {
        assert_eq!(parse(r"\{{title}}").unwrap(), vec![text("{{title}}")]);
    }

    #[test]
    fn test_if_else() {
        let nodes = parse("{{#if link}}L{{else}}none{{/if}}").unwrap();
        assert_eq!(
            nodes,
            vec![Node::Section {
                field: "link".to_string(),
                inverted: false,
                body: vec![text("L")],
                alternative: vec![text("none")],
            }]
        );
    }

    #[test]
    fn test_nested_unless() {
        let nodes = parse("{{#if title}}{{#unless link}}-{{/unless}}{{/if}}").unwrap();
        let Node::Section { body, .. } = &nodes[0] else {
            panic!("expected a section");
        };
        assert!(matches!(&body[0], Node::Section { inverted: true, .. }));
    }

    #[test]
    fn test_malformed() {
        for source in [
            "{{title",
            "{{}}",
            "{{#if title}}open",
            "{{#if title}}x{{/unless}}",
            "{{#if}}x{{/if}}",
            "{{#each items}}x{{/each}}",
            "{{/if}}",
            "{{else}}",
            "{{#if a}}x{{else}}y{{else}}z{{/if}}",
        ] {
            assert!(
                matches!(parse(source), Err(TemplateError::Parse(_))),
                "{:?} should not parse",
                source
            );
        }
    }
}
