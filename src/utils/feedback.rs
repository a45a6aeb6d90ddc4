use teloxide::prelude::*;
use teloxide::types::{MessageId, ParseMode};

use crate::error::BookingError;
use crate::utils::markdown::escape_markdown;

/// Feedback types for different command outcomes
#[derive(Debug, Clone, Copy)]
pub enum FeedbackType {
    Success,
    Warning,
    Error,
    Info,
    Processing,
}

impl FeedbackType {
    fn emoji(&self) -> &'static str {
        match self {
            FeedbackType::Success => "✅",
            FeedbackType::Warning => "⚠️",
            FeedbackType::Error => "❌",
            FeedbackType::Info => "ℹ️",
            FeedbackType::Processing => "⏳",
        }
    }
}

/// Formats plain text as an escaped MarkdownV2 feedback line.
pub fn format_feedback(feedback_type: FeedbackType, message: &str) -> String {
    format!("{} {}", feedback_type.emoji(), escape_markdown(message))
}

/// Short status replies sent to the chat a command came from.
pub struct CommandFeedback {
    bot: Bot,
    chat_id: ChatId,
}

impl CommandFeedback {
    pub fn new(bot: Bot, chat_id: ChatId) -> Self {
        Self { bot, chat_id }
    }

    pub async fn send(&self, feedback_type: FeedbackType, message: &str) -> ResponseResult<Message> {
        self.bot
            .send_message(self.chat_id, format_feedback(feedback_type, message))
            .parse_mode(ParseMode::MarkdownV2)
            .await
    }

    /// Send a processing message that can be updated later
    pub async fn send_processing(&self, message: &str) -> ResponseResult<Message> {
        self.send(FeedbackType::Processing, message).await
    }

    /// Replace an earlier message with already formatted MarkdownV2 text
    pub async fn update_message(&self, message_id: MessageId, text: String) -> ResponseResult<Message> {
        self.bot
            .edit_message_text(self.chat_id, message_id, text)
            .parse_mode(ParseMode::MarkdownV2)
            .await
    }

    pub async fn info(&self, message: &str) -> ResponseResult<Message> {
        self.send(FeedbackType::Info, message).await
    }

    /// Reports a failed booking operation with its user-facing text.
    pub async fn booking_error(&self, err: &BookingError) -> ResponseResult<Message> {
        let feedback_type = match err {
            BookingError::SlotUnavailable | BookingError::AlreadyProcessed => FeedbackType::Warning,
            _ => FeedbackType::Error,
        };
        self.send(feedback_type, &err.user_message()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feedback_type_emojis() {
        assert_eq!(FeedbackType::Success.emoji(), "✅");
        assert_eq!(FeedbackType::Warning.emoji(), "⚠️");
        assert_eq!(FeedbackType::Error.emoji(), "❌");
        assert_eq!(FeedbackType::Info.emoji(), "ℹ️");
        assert_eq!(FeedbackType::Processing.emoji(), "⏳");
    }

    #[test]
    fn test_format_feedback_escapes_text() {
        assert_eq!(
            format_feedback(FeedbackType::Success, "Booking #3 cancelled."),
            "✅ Booking \\#3 cancelled\\."
        );
    }
}
