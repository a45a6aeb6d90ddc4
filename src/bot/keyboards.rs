//! Inline keyboards for the booking flow and the admin panel.

use chrono::{Days, NaiveDate, NaiveTime};
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use crate::bot::callback_data::CallbackAction;
use crate::database::models::booking::{BookingDetails, BookingStatus, TIME_FORMAT};
use crate::database::models::service::Service;
use crate::utils::datetime::{format_date_button, format_price};

/// Number of days, starting today, offered for booking.
pub const BOOKING_HORIZON_DAYS: u64 = 7;
const TIMES_PER_ROW: usize = 3;

fn button(label: impl Into<String>, action: CallbackAction) -> InlineKeyboardButton {
    InlineKeyboardButton::callback(label, action.to_string())
}

fn back_and_abort(back: CallbackAction) -> Vec<InlineKeyboardButton> {
    vec![
        button("⬅️ Back", back),
        button("❌ Cancel", CallbackAction::AbortBooking),
    ]
}

pub fn main_menu(is_admin: bool) -> InlineKeyboardMarkup {
    let mut rows = vec![
        vec![button("📝 Book an appointment", CallbackAction::Book)],
        vec![button("📅 My bookings", CallbackAction::MyBookings)],
    ];
    if is_admin {
        rows.push(vec![button("🔧 Admin panel", CallbackAction::AdminPanel)]);
    }
    rows.push(vec![button("❓ Help", CallbackAction::Help)]);
    InlineKeyboardMarkup::new(rows)
}

/// One button per service with its current (possibly discounted) price.
pub fn services(services: &[(Service, i64)]) -> InlineKeyboardMarkup {
    let mut rows: Vec<_> = services
        .iter()
        .map(|(service, price)| {
            let label = if *price < service.price {
                format!("{} 🎉 {}", service.name, format_price(*price))
            } else {
                format!("{} ({})", service.name, format_price(*price))
            };
            vec![button(label, CallbackAction::SelectService(service.id))]
        })
        .collect();
    rows.push(vec![button("❌ Cancel", CallbackAction::AbortBooking)]);
    InlineKeyboardMarkup::new(rows)
}

pub fn booking_dates(today: NaiveDate) -> InlineKeyboardMarkup {
    let mut rows: Vec<_> = (0..BOOKING_HORIZON_DAYS)
        .filter_map(|offset| today.checked_add_days(Days::new(offset)))
        .map(|date| vec![button(format_date_button(date), CallbackAction::SelectDate(date))])
        .collect();
    rows.push(back_and_abort(CallbackAction::BackToServices));
    InlineKeyboardMarkup::new(rows)
}

pub fn times(slots: &[NaiveTime]) -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<_>> = slots
        .chunks(TIMES_PER_ROW)
        .map(|chunk| {
            chunk
                .iter()
                .map(|t| {
                    let label = t.format(TIME_FORMAT).to_string();
                    button(label.clone(), CallbackAction::SelectTime(label))
                })
                .collect()
        })
        .collect();
    rows.push(back_and_abort(CallbackAction::BackToDates));
    InlineKeyboardMarkup::new(rows)
}

pub fn confirm() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![button("✅ Confirm", CallbackAction::ConfirmBooking)],
        back_and_abort(CallbackAction::BackToDates),
    ])
}

pub fn cancellable_bookings(bookings: &[BookingDetails]) -> InlineKeyboardMarkup {
    let rows = bookings
        .iter()
        .map(|b| {
            let label = format!("{} - {} {}", b.service_name, b.date.format("%d.%m"), b.time);
            vec![button(label, CallbackAction::CancelBooking(b.id))]
        })
        .collect::<Vec<_>>();
    InlineKeyboardMarkup::new(rows)
}

pub fn admin_panel() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![button("📋 Bookings", CallbackAction::AdminBookings)],
        vec![
            button("🛠 Services", CallbackAction::AdminServices),
            button("🎉 Discounts", CallbackAction::AdminDiscounts),
        ],
        vec![button("📊 Statistics", CallbackAction::AdminStats)],
    ])
}

/// Action buttons for the bookings an administrator can still act on.
pub fn admin_booking_actions(bookings: &[BookingDetails]) -> Option<InlineKeyboardMarkup> {
    let rows: Vec<Vec<_>> = bookings
        .iter()
        .filter_map(|b| match b.status {
            BookingStatus::Pending => Some(vec![
                button(format!("✅ #{}", b.id), CallbackAction::Approve(b.id)),
                button(format!("❌ #{}", b.id), CallbackAction::Reject(b.id)),
            ]),
            BookingStatus::Confirmed => Some(vec![
                button(format!("🏁 #{}", b.id), CallbackAction::Complete(b.id)),
                button(format!("🚫 #{}", b.id), CallbackAction::AdminCancel(b.id)),
            ]),
            BookingStatus::Cancelled | BookingStatus::Completed => None,
        })
        .collect();
    if rows.is_empty() {
        return None;
    }
    Some(InlineKeyboardMarkup::new(rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn callbacks(markup: &InlineKeyboardMarkup) -> Vec<Vec<String>> {
        markup
            .inline_keyboard
            .iter()
            .map(|row| {
                row.iter()
                    .map(|b| match &b.kind {
                        teloxide::types::InlineKeyboardButtonKind::CallbackData(data) => data.clone(),
                        other => format!("{other:?}"),
                    })
                    .collect()
            })
            .collect()
    }

    #[test]
    fn test_times_in_rows_of_three_with_navigation() {
        let slots: Vec<_> = (9..=13).filter_map(|h| NaiveTime::from_hms_opt(h, 0, 0)).collect();
        let rows = callbacks(&times(&slots));
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], vec!["time:09:00", "time:10:00", "time:11:00"]);
        assert_eq!(rows[1], vec!["time:12:00", "time:13:00"]);
        assert_eq!(rows[2], vec!["back:dates", "abort"]);
    }

    #[test]
    fn test_dates_cover_the_horizon() {
        let today = NaiveDate::from_ymd_opt(2030, 12, 28).unwrap();
        let rows = callbacks(&booking_dates(today));
        assert_eq!(rows.len(), BOOKING_HORIZON_DAYS as usize + 1);
        assert_eq!(rows[0], vec!["date:2030-12-28"]);
        assert_eq!(rows[6], vec!["date:2031-01-03"]);
    }

    #[test]
    fn test_admin_menu_only_for_admins() {
        let user = callbacks(&main_menu(false));
        let admin = callbacks(&main_menu(true));
        assert!(!user.iter().flatten().any(|d| d == "admin"));
        assert!(admin.iter().flatten().any(|d| d == "admin"));
    }
}
