//! Pushover transport.

use std::fmt;

use reqwest::Client;

use super::post_form;
use crate::error::Result;
use crate::feed::FeedItem;

/// Pushover messages API.
pub const PUSHOVER_ENDPOINT: &str = "https://api.pushover.net/1/messages.json";

/// Title of plain notices.
const MESSAGE_TITLE: &str = "feedwatch - message";

/// Pushover application token and user key.
#[derive(Clone, PartialEq, Eq)]
pub struct Pushover {
    token: String,
    user: String,
    endpoint: String,
}

impl Pushover {
    pub fn new(token: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            user: user.into(),
            endpoint: PUSHOVER_ENDPOINT.to_string(),
        }
    }

    /// Post to another messages URL.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub(super) async fn send_message(&self, client: &Client, message: &str) -> Result<()> {
        let form = [
            ("token", self.token.as_str()),
            ("user", self.user.as_str()),
            ("title", MESSAGE_TITLE),
            ("message", message),
        ];
        post_form(client, &self.endpoint, &form).await
    }

    pub(super) async fn send_item(
        &self,
        client: &Client,
        text: &str,
        item: &FeedItem,
    ) -> Result<()> {
        let form = [
            ("token", self.token.as_str()),
            ("user", self.user.as_str()),
            ("title", item.title.as_str()),
            ("url", item.link.as_str()),
            ("url_title", item.title.as_str()),
            ("message", text),
        ];
        post_form(client, &self.endpoint, &form).await
    }
}

impl fmt::Display for Pushover {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[PUSHOVER: {}]", self.user)
    }
}

// The token never shows up in logs.
impl fmt::Debug for Pushover {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pushover")
            .field("user", &self.user)
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_hides_token() {
        let p = Pushover::new("secret-token", "user-key");
        assert_eq!(p.to_string(), "[PUSHOVER: user-key]");
        assert!(!format!("{:?}", p).contains("secret-token"));
    }

    #[test]
    fn test_with_endpoint() {
        let p = Pushover::new("t", "u").with_endpoint("http://127.0.0.1:1/push");
        assert_eq!(p.endpoint, "http://127.0.0.1:1/push");
        assert_eq!(Pushover::new("t", "u").endpoint, PUSHOVER_ENDPOINT);
    }
}
