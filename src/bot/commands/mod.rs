pub mod admin;
pub mod booking;
pub mod stats;

use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardMarkup, ParseMode};
use teloxide::utils::command::BotCommands;

/// A MarkdownV2 message with an optional inline keyboard, sent fresh or
/// edited into the message a button was pressed on.
#[derive(Debug, Clone)]
pub struct Screen {
    pub text: String,
    pub keyboard: Option<InlineKeyboardMarkup>,
}

impl Screen {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            keyboard: None,
        }
    }

    pub fn with_keyboard(mut self, keyboard: InlineKeyboardMarkup) -> Self {
        self.keyboard = Some(keyboard);
        self
    }

    pub async fn send(self, bot: &Bot, chat_id: ChatId) -> ResponseResult<Message> {
        let request = bot
            .send_message(chat_id, self.text)
            .parse_mode(ParseMode::MarkdownV2);
        match self.keyboard {
            Some(keyboard) => request.reply_markup(keyboard).await,
            None => request.await,
        }
    }

    pub async fn edit(self, bot: &Bot, message: &Message) -> ResponseResult<Message> {
        let request = bot
            .edit_message_text(message.chat.id, message.id, self.text)
            .parse_mode(ParseMode::MarkdownV2);
        match self.keyboard {
            Some(keyboard) => request.reply_markup(keyboard).await,
            None => request.await,
        }
    }
}

#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Salon booking bot commands:")]
pub enum Command {
    #[command(description = "Show the main menu")]
    Start,
    #[command(description = "Display this help message")]
    Help,
    #[command(description = "Book an appointment")]
    Book,
    #[command(description = "Show your bookings")]
    MyBookings,
    #[command(description = "Cancel one of your bookings")]
    Cancel,
    #[command(description = "Admin: open the admin panel")]
    Admin,
    #[command(description = "Admin: recent bookings, or /bookings FROM [TO] (YYYY-MM-DD)")]
    Bookings(String),
    #[command(description = "Admin: salon statistics")]
    Stats,
    #[command(description = "Admin: /addservice name | minutes | price | description")]
    AddService(String),
    #[command(description = "Admin: /editservice ID name|description|price|duration VALUE")]
    EditService(String),
    #[command(description = "Admin: /toggleservice ID")]
    ToggleService(String),
    #[command(description = "Admin: /deleteservice ID")]
    DeleteService(String),
    #[command(description = "Admin: list discounts")]
    Discounts,
    #[command(description = "Admin: /adddiscount service ID | name | percent | from | to")]
    AddDiscount(String),
    #[command(description = "Admin: /togglediscount ID")]
    ToggleDiscount(String),
    #[command(description = "Admin: /deletediscount ID")]
    DeleteDiscount(String),
    #[command(description = "Admin: /complete BOOKING_ID")]
    Complete(String),
}

impl Command {
    pub fn requires_admin(&self) -> bool {
        !matches!(
            self,
            Command::Start | Command::Help | Command::Book | Command::MyBookings | Command::Cancel
        )
    }

    /// Free-form arguments of commands that take them.
    pub fn args(&self) -> Option<&str> {
        match self {
            Command::Bookings(args)
            | Command::AddService(args)
            | Command::EditService(args)
            | Command::ToggleService(args)
            | Command::DeleteService(args)
            | Command::AddDiscount(args)
            | Command::ToggleDiscount(args)
            | Command::DeleteDiscount(args)
            | Command::Complete(args) => Some(args.as_str()),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Command::Start => "/start",
            Command::Help => "/help",
            Command::Book => "/book",
            Command::MyBookings => "/mybookings",
            Command::Cancel => "/cancel",
            Command::Admin => "/admin",
            Command::Bookings(_) => "/bookings",
            Command::Stats => "/stats",
            Command::AddService(_) => "/addservice",
            Command::EditService(_) => "/editservice",
            Command::ToggleService(_) => "/toggleservice",
            Command::DeleteService(_) => "/deleteservice",
            Command::Discounts => "/discounts",
            Command::AddDiscount(_) => "/adddiscount",
            Command::ToggleDiscount(_) => "/togglediscount",
            Command::DeleteDiscount(_) => "/deletediscount",
            Command::Complete(_) => "/complete",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands_with_arguments() {
        let cmd = Command::parse("/addservice Hot stones | 75 | 4200 | Warm", "salonbot").unwrap();
        assert_eq!(cmd, Command::AddService("Hot stones | 75 | 4200 | Warm".to_string()));
        assert_eq!(cmd.args(), Some("Hot stones | 75 | 4200 | Warm"));
        assert!(cmd.requires_admin());

        let cmd = Command::parse("/bookings", "salonbot").unwrap();
        assert_eq!(cmd, Command::Bookings(String::new()));
    }

    #[test]
    fn test_client_commands_are_open() {
        for text in ["/start", "/help", "/book", "/mybookings", "/cancel"] {
            let cmd = Command::parse(text, "salonbot").unwrap();
            assert!(!cmd.requires_admin(), "{text}");
            assert_eq!(cmd.name(), text);
            assert_eq!(cmd.args(), None);
        }
    }
}
