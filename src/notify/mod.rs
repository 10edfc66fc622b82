//! Notification channels.
//!
//! A [`Notifier`] is built from a `type:credentials` spec string:
//!
//! - `pushover:<appToken>:<userKey>`
//! - `telegram:<botId>#<chatId>`
//!
//! The [`Dispatcher`] fans notices out to every configured channel.
//! Delivery failures are logged and never propagated.

mod pushover;
mod telegram;

use std::fmt;
use std::str::FromStr;

use reqwest::Client;
use tracing::{debug, error, warn};

pub use pushover::{Pushover, PUSHOVER_ENDPOINT};
pub use telegram::{Telegram, TELEGRAM_API};

use crate::error::{FeedwatchError, Result};
use crate::feed::FeedItem;
use crate::template::MessageTemplates;

/// A configured notification channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notifier {
    Pushover(Pushover),
    Telegram(Telegram),
}

impl Notifier {
    /// Parse a `type:credentials` spec.
    pub fn parse(spec: &str) -> Result<Self> {
        let invalid = |reason: &str| FeedwatchError::Notifier(format!("{} in '{}'", reason, spec));

        let (kind, value) = spec
            .trim()
            .split_once(':')
            .ok_or_else(|| invalid("expected <type>:<value>"))?;

        let (first, second, expected) = match kind {
            "pushover" => {
                let (token, user) = value
                    .split_once(':')
                    .ok_or_else(|| invalid("expected pushover:<appToken>:<userKey>"))?;
                (token, user, "expected pushover:<appToken>:<userKey>")
            }
            "telegram" => {
                let (bot, chat) = value
                    .split_once('#')
                    .ok_or_else(|| invalid("expected telegram:<botId>#<chatId>"))?;
                (bot, chat, "expected telegram:<botId>#<chatId>")
            }
            other => return Err(invalid(&format!("unknown notifier type '{}'", other))),
        };

        if first.is_empty() || second.is_empty() {
            return Err(invalid(expected));
        }

        Ok(match kind {
            "pushover" => Notifier::Pushover(Pushover::new(first, second)),
            _ => Notifier::Telegram(Telegram::new(first, second)),
        })
    }

    /// Send to another endpoint, e.g. a local test server.
    pub fn with_endpoint(self, endpoint: impl Into<String>) -> Self {
        match self {
            Notifier::Pushover(p) => Notifier::Pushover(p.with_endpoint(endpoint)),
            Notifier::Telegram(t) => Notifier::Telegram(t.with_endpoint(endpoint)),
        }
    }

    /// Send a plain notice.
    pub async fn notify(&self, client: &Client, message: &str) -> Result<()> {
        match self {
            Notifier::Pushover(p) => p.send_message(client, message).await,
            Notifier::Telegram(t) => t.send_text(client, message).await,
        }
    }

    /// Send an item already rendered to `text`.
    pub async fn notify_item(&self, client: &Client, text: &str, item: &FeedItem) -> Result<()> {
        match self {
            Notifier::Pushover(p) => p.send_item(client, text, item).await,
            Notifier::Telegram(t) => t.send_text(client, text).await,
        }
    }
}

impl FromStr for Notifier {
    type Err = FeedwatchError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Notifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notifier::Pushover(p) => fmt::Display::fmt(p, f),
            Notifier::Telegram(t) => fmt::Display::fmt(t, f),
        }
    }
}

/// POST a form and treat any non-2xx answer as a failure.
async fn post_form(client: &Client, url: &str, form: &[(&str, &str)]) -> Result<()> {
    let response = client
        .post(url)
        .form(form)
        .send()
        .await
        .map_err(|e| {
            // The request URL can carry a bot token.
            FeedwatchError::Notifier(format!("failed to send notification: {}", e.without_url()))
        })?;

    let status = response.status();
    let body = response.text().await.unwrap_or_default();

    if !status.is_success() {
        warn!("Notification rejected with {}: {}", status, body);
        return Err(FeedwatchError::Notifier(format!("HTTP error: {}", status)));
    }

    debug!("Notification accepted: {}", body);
    Ok(())
}

/// Sends notices and rendered items to every configured notifier.
#[derive(Debug)]
pub struct Dispatcher {
    client: Client,
    notifiers: Vec<Notifier>,
    templates: MessageTemplates,
}

impl Dispatcher {
    pub fn new(client: Client, notifiers: Vec<Notifier>, templates: MessageTemplates) -> Self {
        Self {
            client,
            notifiers,
            templates,
        }
    }

    pub fn notifiers(&self) -> &[Notifier] {
        &self.notifiers
    }

    /// Send `message` to every notifier.
    pub async fn notify_all(&self, message: &str) {
        for notifier in &self.notifiers {
            if let Err(e) = notifier.notify(&self.client, message).await {
                error!("{} failed to deliver notice: {}", notifier, e);
            }
        }
    }

    /// Render `item` for its feed and send it to every notifier.
    pub async fn notify_item_all(&self, source_url: &str, item: &FeedItem) {
        let text = self.templates.render_item(source_url, item);

        for notifier in &self.notifiers {
            match notifier.notify_item(&self.client, &text, item).await {
                Ok(()) => debug!("{} pushed item {}", notifier, item.guid),
                Err(e) => error!("{} failed to deliver item {}: {}", notifier, item.guid, e),
            }
        }
    }
}
