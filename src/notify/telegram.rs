//! Telegram bot transport.

use std::fmt;

use reqwest::Client;

use super::post_form;
use crate::error::Result;

/// Telegram Bot API root.
pub const TELEGRAM_API: &str = "https://api.telegram.org";

/// Telegram bot id and target chat.
#[derive(Clone, PartialEq, Eq)]
pub struct Telegram {
    bot_id: String,
    chat_id: String,
    api: String,
}

impl Telegram {
    pub fn new(bot_id: impl Into<String>, chat_id: impl Into<String>) -> Self {
        Self {
            bot_id: bot_id.into(),
            chat_id: chat_id.into(),
            api: TELEGRAM_API.to_string(),
        }
    }

    /// Use another Bot API root, e.g. a local test server.
    pub fn with_endpoint(mut self, api: impl Into<String>) -> Self {
        self.api = api.into();
        self
    }

    pub fn chat_id(&self) -> &str {
        &self.chat_id
    }

    /// The bot id with its secret half hidden, `123:***`.
    fn masked_bot_id(&self) -> String {
        match self.bot_id.split_once(':') {
            Some((bot, _)) => format!("{}:***", bot),
            None => "***".to_string(),
        }
    }

    fn send_url(&self) -> String {
        format!("{}/bot{}/sendMessage", self.api.trim_end_matches('/'), self.bot_id)
    }

    /// Items and plain notices are both sent as markdown text.
    pub(super) async fn send_text(&self, client: &Client, text: &str) -> Result<()> {
        let form = [
            ("chat_id", self.chat_id.as_str()),
            ("text", text),
            ("parse_mode", "markdown"),
        ];
        post_form(client, &self.send_url(), &form).await
    }
}

impl fmt::Display for Telegram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[TELEGRAM:{}]", self.masked_bot_id())
    }
}

// The bot token never shows up in logs.
impl fmt::Debug for Telegram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Telegram")
            .field("bot_id", &self.masked_bot_id())
            .field("chat_id", &self.chat_id)
            .field("api", &self.api)
            .finish()
    }
}
