//! MarkdownV2 renderings of booking events, reminders and promotions.

use chrono_tz::Tz;

use crate::bot::callback_data::CallbackAction;
use crate::database::models::booking::{BookingDetails, BookingStatus};
use crate::database::models::discount::Discount;
use crate::database::models::service::Service;
use crate::services::discount::apply_percentage;
use crate::services::notification::{MessageAction, RenderedMessage};
use crate::utils::datetime::{format_date, format_datetime, format_duration, format_price};
use crate::utils::markdown::{bold, escape_markdown};

pub fn status_label(status: BookingStatus) -> &'static str {
    match status {
        BookingStatus::Pending => "⏳ Awaiting confirmation",
        BookingStatus::Confirmed => "✅ Confirmed",
        BookingStatus::Cancelled => "❌ Cancelled",
        BookingStatus::Completed => "🏁 Completed",
    }
}

/// Service, date and time block shared by most booking messages.
pub fn booking_block(booking: &BookingDetails) -> String {
    format!(
        "💆 Service: {}\n📅 Date: {}\n🕐 Time: {}\n⏱ Duration: {}\n💰 Price: {}",
        bold(&booking.service_name),
        escape_markdown(&format_date(booking.date)),
        bold(&booking.time),
        escape_markdown(&format_duration(booking.service_duration)),
        escape_markdown(&format_price(booking.service_price)),
    )
}

/// One-line entry for booking lists.
pub fn booking_line(booking: &BookingDetails) -> String {
    format!(
        "\\#{} {} {} {} {}",
        booking.id,
        escape_markdown(&booking.date.format("%d.%m").to_string()),
        escape_markdown(&booking.time),
        escape_markdown(&booking.service_name),
        escape_markdown(status_label(booking.status)),
    )
}

pub fn booking_created_user(booking: &BookingDetails) -> RenderedMessage {
    RenderedMessage::new(format!(
        "📝 {}\n\n{}\n\nStatus: {}\n\nWe will let you know once an administrator confirms it\\.",
        bold("Booking received!"),
        booking_block(booking),
        escape_markdown(status_label(booking.status)),
    ))
}

pub fn booking_created_admin(booking: &BookingDetails) -> RenderedMessage {
    RenderedMessage::new(format!(
        "🆕 {} \\#{}\n\n👤 Client: {}\n{}",
        bold("New booking"),
        booking.id,
        escape_markdown(&booking.client_name()),
        booking_block(booking),
    ))
    .with_actions(vec![
        MessageAction::new("✅ Approve", CallbackAction::Approve(booking.id).to_string()),
        MessageAction::new("❌ Reject", CallbackAction::Reject(booking.id).to_string()),
    ])
}

pub fn booking_approved_user(booking: &BookingDetails) -> RenderedMessage {
    RenderedMessage::new(format!(
        "✅ {}\n\n{}\n\nSee you soon\\!",
        bold("Your booking is confirmed"),
        booking_block(booking),
    ))
}

pub fn booking_rejected_user(booking: &BookingDetails) -> RenderedMessage {
    RenderedMessage::new(format!(
        "❌ {}\n\n{}\n\nPlease choose another time with /book\\.",
        bold("Your booking was declined"),
        booking_block(booking),
    ))
}

pub fn booking_cancelled_user(booking: &BookingDetails) -> RenderedMessage {
    RenderedMessage::new(format!(
        "🚫 {}\n\n{}",
        bold("Booking cancelled"),
        booking_block(booking),
    ))
}

pub fn booking_cancelled_admin(booking: &BookingDetails, by_admin: bool) -> RenderedMessage {
    let who = if by_admin { "an administrator" } else { "the client" };
    RenderedMessage::new(format!(
        "🚫 {} \\#{} by {}\n\n👤 Client: {}\n{}",
        bold("Booking cancelled"),
        booking.id,
        escape_markdown(who),
        escape_markdown(&booking.client_name()),
        booking_block(booking),
    ))
}

pub fn booking_completed_user(booking: &BookingDetails) -> RenderedMessage {
    RenderedMessage::new(format!(
        "🏁 {}\n\n{}\n\nThank you for visiting us\\!",
        bold("Visit completed"),
        booking_block(booking),
    ))
}

pub fn day_before_reminder(booking: &BookingDetails) -> RenderedMessage {
    RenderedMessage::new(format!(
        "🔔 {}\n\nYou have an appointment tomorrow\\.\n\n{}",
        bold("Reminder"),
        booking_block(booking),
    ))
}

pub fn hour_before_reminder(booking: &BookingDetails) -> RenderedMessage {
    RenderedMessage::new(format!(
        "⏰ {}\n\nYour appointment starts in about an hour\\.\n\n{}",
        bold("Reminder"),
        booking_block(booking),
    ))
}

pub fn hour_before_admin(booking: &BookingDetails) -> RenderedMessage {
    RenderedMessage::new(format!(
        "⏰ {} at {}\n\n👤 Client: {}\n💆 Service: {}",
        bold("Upcoming appointment"),
        bold(&booking.time),
        escape_markdown(&booking.client_name()),
        escape_markdown(&booking.service_name),
    ))
}

/// Morning summary of the day's bookings for administrators.
pub fn admin_digest(date: chrono::NaiveDate, bookings: &[BookingDetails]) -> RenderedMessage {
    let mut text = format!(
        "📋 {}\n{}\n\n",
        bold("Today's bookings"),
        escape_markdown(&format_date(date)),
    );
    for booking in bookings {
        text.push_str(&format!(
            "🕐 {} {}\n   👤 {} {}\n",
            bold(&booking.time),
            escape_markdown(&booking.service_name),
            escape_markdown(&booking.client_name()),
            escape_markdown(status_label(booking.status)),
        ));
    }
    text.push_str(&format!("\nTotal: {}", bold(&bookings.len().to_string())));
    RenderedMessage::new(text)
}

pub fn discount_promotion(discount: &Discount, service: &Service, tz: Tz) -> RenderedMessage {
    let discounted = apply_percentage(service.price, discount.percentage);
    RenderedMessage::new(format!(
        "🎉 {}\n\nGet {}% off {}\n💰 {} instead of {}\n📅 {} to {}\n\nBook now with /book\\!",
        bold(&discount.name),
        discount.percentage,
        bold(&service.name),
        bold(&format_price(discounted)),
        escape_markdown(&format_price(service.price)),
        escape_markdown(&format_datetime(&discount.start_at, tz)),
        escape_markdown(&format_datetime(&discount.end_at, tz)),
    ))
    .with_actions(vec![MessageAction::new("📝 Book", CallbackAction::Book.to_string())])
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn details(status: BookingStatus) -> BookingDetails {
        BookingDetails {
            id: 7,
            user_id: 42,
            service_id: 1,
            date: NaiveDate::from_ymd_opt(2024, 6, 7).unwrap(),
            time: "10:00".to_string(),
            status,
            day_before_reminder_sent: false,
            hour_before_reminder_sent: false,
            admin_digest_sent: false,
            service_name: "Classic massage".to_string(),
            service_duration: 60,
            service_price: 300000,
            username: Some("anna_k".to_string()),
            first_name: "Anna".to_string(),
            last_name: String::new(),
        }
    }

    #[test]
    fn test_admin_notice_carries_approve_and_reject() {
        let msg = booking_created_admin(&details(BookingStatus::Pending));
        let payloads: Vec<_> = msg.actions.iter().map(|a| a.callback_data.as_str()).collect();
        assert_eq!(payloads, vec!["approve:7", "reject:7"]);
        assert!(msg.text.contains("Anna \\(@anna\\_k\\)"));
        assert!(msg.text.contains("*Classic massage*"));
    }

    #[test]
    fn test_booking_block_escapes_dates_and_prices() {
        let block = booking_block(&details(BookingStatus::Confirmed));
        assert!(block.contains("07\\.06\\.2024"));
        assert!(block.contains("3000 ₽"));
        assert!(block.contains("*10:00*"));
    }

    #[test]
    fn test_digest_lists_every_booking() {
        let mut second = details(BookingStatus::Confirmed);
        second.time = "15:00".to_string();
        let msg = admin_digest(second.date, &[details(BookingStatus::Pending), second]);
        assert!(msg.text.contains("*10:00*"));
        assert!(msg.text.contains("*15:00*"));
        assert!(msg.actions.is_empty());
    }
}
