use teloxide::prelude::*;

use crate::bot::handlers::HandlerResult;
use crate::utils::feedback::CommandFeedback;

/// Reply hint for free text; `None` means stay silent.
pub fn hint_for(text: &str) -> Option<String> {
    let lower = text.to_lowercase();
    if text.starts_with('/') {
        let command = text.split_whitespace().next().unwrap_or(text);
        Some(format!(
            "Unknown command: {command}\n\nUse /help to see all available commands."
        ))
    } else if ["book", "appointment", "massage", "depilation"]
        .iter()
        .any(|word| lower.contains(word))
    {
        Some("Want to book an appointment? Use /book and pick a service, date and time.".to_string())
    } else if lower.contains("help") {
        Some("Use /help to see all available commands!".to_string())
    } else {
        None
    }
}

pub async fn handle_general_message(bot: Bot, msg: Message) -> HandlerResult {
    let Some(text) = msg.text() else {
        return Ok(());
    };
    if let Some(hint) = hint_for(text) {
        CommandFeedback::new(bot, msg.chat.id).info(&hint).await?;
    }
    Ok(())
}
