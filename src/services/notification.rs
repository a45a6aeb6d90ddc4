//! Outbound notifications to clients, administrators and the promo channel.

use std::time::Duration;

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, ParseMode, Recipient};

/// Pause between consecutive admin sends to stay under Telegram's flood limits.
const ADMIN_FANOUT_DELAY: Duration = Duration::from_millis(100);

#[derive(Debug, thiserror::Error)]
/// Why a message did not reach every recipient.
pub enum DeliveryError {
    #[error("telegram request failed: {0}")]
    Telegram(#[from] teloxide::RequestError),

    #[error("no promotion channel configured")]
    NoChannel,

    #[error("delivered to {delivered} of {total} administrators")]
    Partial { delivered: usize, total: usize },
}

/// Inline button attached to a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageAction {
    pub label: String,
    pub callback_data: String,
}

impl MessageAction {
    pub fn new(label: impl Into<String>, callback_data: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            callback_data: callback_data.into(),
        }
    }
}

/// MarkdownV2 text ready for sending, with optional inline actions on one row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMessage {
    pub text: String,
    pub actions: Vec<MessageAction>,
}

impl RenderedMessage {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            actions: Vec::new(),
        }
    }

    pub fn with_actions(mut self, actions: Vec<MessageAction>) -> Self {
        self.actions = actions;
        self
    }

    fn keyboard(&self) -> Option<InlineKeyboardMarkup> {
        if self.actions.is_empty() {
            return None;
        }
        let row = self
            .actions
            .iter()
            .map(|a| InlineKeyboardButton::callback(a.label.clone(), a.callback_data.clone()))
            .collect::<Vec<_>>();
        Some(InlineKeyboardMarkup::new(vec![row]))
    }
}

/// Delivery seam between the booking core and the chat platform. Callers treat
/// failures as best-effort: they are logged, never rolled back into state.
#[async_trait]
pub trait NotificationGateway: Send + Sync {
    async fn send_to_user(&self, user_id: i64, message: &RenderedMessage) -> Result<(), DeliveryError>;
    async fn send_to_admins(&self, message: &RenderedMessage) -> Result<(), DeliveryError>;
    async fn send_to_channel(&self, message: &RenderedMessage) -> Result<(), DeliveryError>;
}

/// Parses a channel reference: `@name` or a numeric chat id.
pub fn parse_channel(value: &str) -> Option<Recipient> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if value.starts_with('@') {
        return Some(Recipient::ChannelUsername(value.to_string()));
    }
    value.parse::<i64>().ok().map(|id| Recipient::Id(ChatId(id)))
}

/// Gateway sending through the bot API.
pub struct TelegramGateway {
    bot: Bot,
    admin_ids: Vec<i64>,
    channel: Option<Recipient>,
}

impl TelegramGateway {
    pub fn new(bot: Bot, admin_ids: Vec<i64>, channel: Option<Recipient>) -> Self {
        Self {
            bot,
            admin_ids,
            channel,
        }
    }

    async fn deliver(&self, to: Recipient, message: &RenderedMessage) -> Result<(), DeliveryError> {
        let request = self
            .bot
            .send_message(to, message.text.clone())
            .parse_mode(ParseMode::MarkdownV2);
        match message.keyboard() {
            Some(keyboard) => request.reply_markup(keyboard).await?,
            None => request.await?,
        };
        Ok(())
    }
}

#[async_trait]
impl NotificationGateway for TelegramGateway {
    async fn send_to_user(&self, user_id: i64, message: &RenderedMessage) -> Result<(), DeliveryError> {
        self.deliver(Recipient::Id(ChatId(user_id)), message).await
    }

    async fn send_to_admins(&self, message: &RenderedMessage) -> Result<(), DeliveryError> {
        let total = self.admin_ids.len();
        let mut delivered = 0;
        for (i, admin_id) in self.admin_ids.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(ADMIN_FANOUT_DELAY).await;
            }
            match self.deliver(Recipient::Id(ChatId(*admin_id)), message).await {
                Ok(()) => delivered += 1,
                Err(e) => tracing::warn!("Failed to notify admin {}: {}", admin_id, e),
            }
        }
        if delivered < total {
            return Err(DeliveryError::Partial { delivered, total });
        }
        Ok(())
    }

    async fn send_to_channel(&self, message: &RenderedMessage) -> Result<(), DeliveryError> {
        let channel = self.channel.clone().ok_or(DeliveryError::NoChannel)?;
        self.deliver(channel, message).await
    }
}
