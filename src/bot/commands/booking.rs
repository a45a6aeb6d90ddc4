//! Client-facing screens: menu, booking flow steps and own bookings.

use chrono::NaiveDate;
use teloxide::types::User as TelegramUser;
use teloxide::utils::command::BotCommands;

use crate::bot::commands::{Command, Screen};
use crate::bot::handlers::AppContext;
use crate::bot::keyboards;
use crate::database::models::service::Service;
use crate::database::models::user::User;
use crate::error::BookingError;
use crate::services::discount::effective_price;
use crate::services::messages::{booking_line, status_label};
use crate::utils::datetime::{format_date, format_duration, format_price};
use crate::utils::markdown::{bold, escape_markdown};

/// Creates or refreshes the stored profile of a Telegram user.
pub async fn register_user(ctx: &AppContext, user: &TelegramUser) -> Result<User, BookingError> {
    Ok(User::upsert(
        &ctx.db.pool,
        user.id.0 as i64,
        user.username.clone(),
        user.first_name.clone(),
        user.last_name.clone().unwrap_or_default(),
    )
    .await?)
}

pub fn welcome(first_name: &str, is_admin: bool) -> Screen {
    Screen::new(format!(
        "👋 Hello, {}\\!\n\nWelcome to the salon booking bot\\. Book a massage or depilation \
         appointment in a few taps\\.",
        escape_markdown(first_name),
    ))
    .with_keyboard(keyboards::main_menu(is_admin))
}

pub fn help(is_admin: bool) -> Screen {
    let descriptions = Command::descriptions().to_string();
    let lines: Vec<&str> = descriptions
        .lines()
        .filter(|line| is_admin || !line.contains("Admin:"))
        .collect();
    Screen::new(escape_markdown(&lines.join("\n")))
}

async fn services_with_prices(ctx: &AppContext) -> Result<Vec<(Service, i64)>, BookingError> {
    let services = ctx.catalog.get_active().await?;
    let discounts = ctx.discounts.list_all().await?;
    let now = ctx.clock.now().with_timezone(&chrono::Utc);
    Ok(services
        .into_iter()
        .map(|service| {
            let price = effective_price(&service, &discounts, now);
            (service, price)
        })
        .collect())
}

pub async fn services(ctx: &AppContext) -> Result<Screen, BookingError> {
    let services = services_with_prices(ctx).await?;
    if services.is_empty() {
        return Ok(Screen::new("😔 No services are available right now\\. Please check back later\\."));
    }
    Ok(Screen::new(format!("💆 {}", bold("Choose a service:")))
        .with_keyboard(keyboards::services(&services)))
}

pub async fn dates(ctx: &AppContext, service_id: i64) -> Result<Screen, BookingError> {
    let service = ctx.bookings.slots().bookable_service(service_id).await?;
    Ok(Screen::new(format!(
        "💆 {} \\({}\\)\n\n📅 {}",
        bold(&service.name),
        escape_markdown(&format_duration(service.duration)),
        bold("Choose a date:"),
    ))
    .with_keyboard(keyboards::booking_dates(ctx.clock.today())))
}

/// Free times on `date`, or `None` when the day is fully booked or over.
pub async fn times(
    ctx: &AppContext,
    service_id: i64,
    date: NaiveDate,
    notice: Option<&str>,
) -> Result<Option<Screen>, BookingError> {
    let slots = ctx
        .bookings
        .slots()
        .available_slots(date, service_id, ctx.clock.now())
        .await?;
    if slots.is_empty() {
        return Ok(None);
    }

    let mut text = String::new();
    if let Some(notice) = notice {
        text.push_str(&format!("⚠️ {}\n\n", escape_markdown(notice)));
    }
    text.push_str(&format!(
        "📅 {}\n\n🕐 {}",
        escape_markdown(&format_date(date)),
        bold("Choose a time:"),
    ));
    Ok(Some(Screen::new(text).with_keyboard(keyboards::times(&slots))))
}

pub async fn confirmation(
    ctx: &AppContext,
    service_id: i64,
    date: NaiveDate,
    time: &str,
) -> Result<Screen, BookingError> {
    let service = ctx.bookings.slots().bookable_service(service_id).await?;
    let price = ctx
        .discounts
        .effective_price(&service, ctx.clock.now().with_timezone(&chrono::Utc))
        .await?;

    let price_line = if price < service.price {
        format!(
            "{} ~{}~",
            bold(&format_price(price)),
            escape_markdown(&format_price(service.price))
        )
    } else {
        escape_markdown(&format_price(price))
    };

    Ok(Screen::new(format!(
        "📝 {}\n\n💆 Service: {}\n📅 Date: {}\n🕐 Time: {}\n⏱ Duration: {}\n💰 Price: {}",
        bold("Please confirm your booking"),
        bold(&service.name),
        escape_markdown(&format_date(date)),
        bold(time),
        escape_markdown(&format_duration(service.duration)),
        price_line,
    ))
    .with_keyboard(keyboards::confirm()))
}

pub async fn my_bookings(ctx: &AppContext, user_id: i64) -> Result<Screen, BookingError> {
    let bookings = ctx.bookings.user_bookings(user_id).await?;
    if bookings.is_empty() {
        return Ok(Screen::new("📅 You have no bookings yet\\. Use /book to make one\\."));
    }

    let mut text = format!("📅 {}\n\n", bold("Your bookings:"));
    for booking in &bookings {
        text.push_str(&format!(
            "{} at {}\n💆 {}\n{}\n\n",
            bold(&booking.date.format("%d.%m.%Y").to_string()),
            bold(&booking.time),
            escape_markdown(&booking.service_name),
            escape_markdown(status_label(booking.status)),
        ));
    }
    text.push_str("Use /cancel to cancel a booking\\.");
    Ok(Screen::new(text))
}

pub async fn cancel_menu(ctx: &AppContext, user_id: i64) -> Result<Screen, BookingError> {
    let bookings = ctx.bookings.user_active_bookings(user_id).await?;
    if bookings.is_empty() {
        return Ok(Screen::new("📅 You have no bookings to cancel\\."));
    }
    Ok(Screen::new(format!("🚫 {}", bold("Which booking do you want to cancel?")))
        .with_keyboard(keyboards::cancellable_bookings(&bookings)))
}

/// Result line shown after a client cancels a booking.
pub fn cancelled(booking: &crate::database::models::booking::BookingDetails) -> Screen {
    Screen::new(format!("🚫 {}\n\n{}", bold("Booking cancelled"), booking_line(booking)))
}

