use teloxide::prelude::*;

use crate::bot::handlers::AppContext;
use crate::services::stats::{collect, SalonStats};
use crate::utils::feedback::CommandFeedback;
use crate::utils::markdown::bold;

fn percent(part: i64, total: i64) -> String {
    if total == 0 {
        return "0\\.0%".to_string();
    }
    format!("{:.1}%", part as f64 / total as f64 * 100.0).replace('.', "\\.")
}

pub fn render_stats(stats: &SalonStats) -> String {
    let mut text = format!("📊 {}\n\n", bold("Salon statistics"));

    text.push_str(&format!(
        "👥 Clients: {}\n💆 Active services: {}\n\n",
        stats.total_users, stats.active_services
    ));

    text.push_str(&format!(
        "📅 {}\n\
        • Total: {}\n\
        • Active: {} \\({}\\)\n\
        • Completed: {} \\({}\\)\n\
        • Cancelled: {} \\({}\\)",
        bold("Bookings"),
        stats.total_bookings,
        stats.active_bookings,
        percent(stats.active_bookings, stats.total_bookings),
        stats.completed_bookings,
        percent(stats.completed_bookings, stats.total_bookings),
        stats.cancelled_bookings,
        percent(stats.cancelled_bookings, stats.total_bookings),
    ));
    text
}

pub async fn handle_stats(bot: Bot, chat_id: ChatId, ctx: &AppContext) -> ResponseResult<()> {
    let feedback = CommandFeedback::new(bot, chat_id);
    let processing = feedback.send_processing("Collecting statistics...").await?;

    match collect(&ctx.db.pool).await {
        Ok(stats) => {
            feedback.update_message(processing.id, render_stats(&stats)).await?;
        }
        Err(e) => {
            tracing::error!("Failed to collect stats: {}", e);
            feedback.booking_error(&e).await?;
        }
    }
    Ok(())
}
