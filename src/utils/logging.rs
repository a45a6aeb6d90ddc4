//! Structured log lines for chat interactions. Every line starts with a fixed
//! tag (`CMD_START`, `CMD_SUCCESS`, `CMD_ERROR`, `VALIDATION_ERROR`,
//! `ACCESS_DENIED`, `SYSTEM`) so logs can be grepped per event type.

use std::fmt;

use teloxide::types::{CallbackQuery, Message, User};
use tracing::{error, info, warn};

/// The Telegram user behind an update and the chat it arrived in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub name: String,
    pub user_id: i64,
    pub chat_id: i64,
}

impl Actor {
    fn from_user(user: Option<&User>, chat_id: i64) -> Self {
        Self {
            name: user
                .and_then(|u| u.username.clone())
                .unwrap_or_else(|| "unknown".to_string()),
            user_id: user.map_or(0, |u| u.id.0 as i64),
            chat_id,
        }
    }

    pub fn from_message(msg: &Message) -> Self {
        Self::from_user(msg.from(), msg.chat.id.0)
    }

    pub fn from_callback(q: &CallbackQuery) -> Self {
        let chat_id = q.message.as_ref().map_or(q.from.id.0 as i64, |m| m.chat.id.0);
        Self::from_user(Some(&q.from), chat_id)
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({}) in chat {}", self.name, self.user_id, self.chat_id)
    }
}

pub fn log_command_start(command: &str, actor: &Actor, details: Option<&str>) {
    match details {
        Some(d) => info!("CMD_START: {} by {} - {}", command, actor, d),
        None => info!("CMD_START: {} by {}", command, actor),
    }
}

pub fn log_command_success(command: &str, actor: &Actor, details: Option<&str>) {
    match details {
        Some(d) => info!("CMD_SUCCESS: {} by {} - {}", command, actor, d),
        None => info!("CMD_SUCCESS: {} by {}", command, actor),
    }
}

pub fn log_command_error(command: &str, actor: &Actor, error: &str) {
    error!("CMD_ERROR: {} by {} - {}", command, actor, error);
}

pub fn log_validation_error(command: &str, value: &str, error: &str, actor: &Actor) {
    warn!(
        "VALIDATION_ERROR: {} - input '{}' invalid: {} - user {}",
        command, value, error, actor
    );
}

pub fn log_access_denied(action: &str, actor: &Actor) {
    warn!("ACCESS_DENIED: {} by {}", action, actor);
}

pub fn log_system_event(event: &str, details: Option<&str>) {
    match details {
        Some(d) => info!("SYSTEM: {} - {}", event, d),
        None => info!("SYSTEM: {}", event),
    }
}
