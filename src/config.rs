use anyhow::{anyhow, Result};
use chrono_tz::Tz;
use std::env;
use teloxide::types::Recipient;

use crate::services::notification::parse_channel;
use crate::services::slots::TimeSlotGrid;

pub const DEFAULT_DATABASE_URL: &str = "sqlite:./data/salon.db";

#[derive(Debug, Clone)]
pub struct Config {
    pub telegram_bot_token: String,
    pub database_url: String,
    pub http_port: u16,
    pub admin_user_ids: Vec<i64>,
    pub timezone: Tz,
    /// Channel for discount announcements, `@name` or a numeric chat id.
    pub channel: Option<Recipient>,
    pub time_slots: TimeSlotGrid,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let token = env::var("TELEGRAM_BOT_TOKEN")
            .map_err(|_| anyhow!("TELEGRAM_BOT_TOKEN must be set"))?;

        if token.trim().is_empty() {
            return Err(anyhow!("TELEGRAM_BOT_TOKEN must be set"));
        }

        let database_url = database_url_from_env();

        let http_port = match non_empty_var("HTTP_PORT") {
            Some(port) => port
                .parse()
                .map_err(|_| anyhow!("Invalid HTTP_PORT"))?,
            None => 3000,
        };

        let admin_user_ids = match non_empty_var("ADMIN_USER_IDS") {
            Some(ids) => parse_admin_ids(&ids)?,
            None => Vec::new(),
        };

        let timezone = match non_empty_var("TIMEZONE") {
            Some(name) => name
                .parse::<Tz>()
                .map_err(|_| anyhow!("Invalid TIMEZONE '{}', expected an IANA name like Europe/Moscow", name))?,
            None => Tz::UTC,
        };

        let channel = match non_empty_var("CHANNEL_ID") {
            Some(value) => Some(
                parse_channel(&value)
                    .ok_or_else(|| anyhow!("Invalid CHANNEL_ID '{}', expected @name or a numeric id", value))?,
            ),
            None => None,
        };

        let time_slots = match non_empty_var("TIME_SLOTS") {
            Some(value) => TimeSlotGrid::parse(&value)
                .map_err(|e| anyhow!("Invalid TIME_SLOTS: {}", e))?,
            None => TimeSlotGrid::default(),
        };

        Ok(Config {
            telegram_bot_token: token,
            database_url,
            http_port,
            admin_user_ids,
            timezone,
            channel,
            time_slots,
        })
    }

    pub fn is_admin(&self, user_id: i64) -> bool {
        self.admin_user_ids.contains(&user_id)
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// `DATABASE_URL`, or the default SQLite file when unset.
pub fn database_url_from_env() -> String {
    non_empty_var("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string())
}

/// Comma separated Telegram user ids; blanks are skipped.
pub fn parse_admin_ids(value: &str) -> Result<Vec<i64>> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<i64>()
                .map_err(|_| anyhow!("Invalid admin user id '{}' in ADMIN_USER_IDS", s))
        })
        .collect()
}
