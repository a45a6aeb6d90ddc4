//! Administrator screens and the catalog/discount management commands.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;

use crate::bot::commands::Screen;
use crate::bot::handlers::AppContext;
use crate::bot::keyboards;
use crate::database::models::booking::BookingStatus;
use crate::database::models::discount::{Discount, NewDiscount};
use crate::database::models::service::{NewService, Service};
use crate::error::BookingError;
use crate::services::catalog::ServiceEdit;
use crate::services::clock::local_datetime;
use crate::services::messages::booking_line;
use crate::utils::datetime::{format_datetime, format_duration, format_price, parse_date};
use crate::utils::markdown::{bold, code, escape_markdown};
use crate::utils::validation::{parse_duration, parse_id, parse_percentage, parse_price, split_fields};

/// Bookings shown by a bare `/bookings`.
pub const RECENT_BOOKINGS_LIMIT: i64 = 20;

fn invalid(e: anyhow::Error) -> BookingError {
    BookingError::InvalidInput(e.to_string())
}

pub fn panel() -> Screen {
    Screen::new(format!("🔧 {}", bold("Admin panel")))
        .with_keyboard(keyboards::admin_panel())
}

/// What `/bookings` was asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingQuery {
    Recent,
    Range(NaiveDate, NaiveDate),
}

impl BookingQuery {
    /// Empty arguments list recent bookings; `FROM` alone covers one day.
    pub fn parse(args: &str) -> Result<Self, BookingError> {
        let mut parts = args.split_whitespace();
        match (parts.next(), parts.next(), parts.next()) {
            (None, _, _) => Ok(BookingQuery::Recent),
            (Some(from), None, _) => {
                let from = parse_date(from).map_err(invalid)?;
                Ok(BookingQuery::Range(from, from))
            }
            (Some(from), Some(to), None) => Ok(BookingQuery::Range(
                parse_date(from).map_err(invalid)?,
                parse_date(to).map_err(invalid)?,
            )),
            _ => Err(BookingError::InvalidInput(
                "use /bookings [FROM [TO]]".to_string(),
            )),
        }
    }
}

pub async fn bookings(ctx: &AppContext, args: &str) -> Result<Screen, BookingError> {
    let (title, bookings) = match BookingQuery::parse(args)? {
        BookingQuery::Recent => (
            "Recent bookings".to_string(),
            ctx.bookings.recent(RECENT_BOOKINGS_LIMIT).await?,
        ),
        BookingQuery::Range(from, to) => (
            format!("Bookings {} to {}", from.format("%d.%m.%Y"), to.format("%d.%m.%Y")),
            ctx.bookings.find_by_date_range(from, to, &BookingStatus::ALL).await?,
        ),
    };

    if bookings.is_empty() {
        return Ok(Screen::new(format!("📋 {}\n\nNo bookings found\\.", bold(&title))));
    }

    let mut text = format!("📋 {}\n\n", bold(&title));
    for booking in &bookings {
        text.push_str(&format!(
            "{}\n👤 {}\n\n",
            booking_line(booking),
            escape_markdown(&booking.client_name()),
        ));
    }

    let screen = Screen::new(text);
    Ok(match keyboards::admin_booking_actions(&bookings) {
        Some(keyboard) => screen.with_keyboard(keyboard),
        None => screen,
    })
}

fn service_entry(service: &Service) -> String {
    let state = if service.is_active { "🟢" } else { "⚪️" };
    format!(
        "{} {} {}\n⏱ {} 💰 {}\n",
        state,
        code(&format!("#{}", service.id)),
        bold(&service.name),
        escape_markdown(&format_duration(service.duration)),
        escape_markdown(&format_price(service.price)),
    )
}

pub async fn services(ctx: &AppContext) -> Result<Screen, BookingError> {
    let services = ctx.catalog.list_all().await?;
    let mut text = format!("🛠 {}\n\n", bold("Services"));
    if services.is_empty() {
        text.push_str("No services yet\\.\n\n");
    }
    for service in &services {
        text.push_str(&service_entry(service));
        text.push('\n');
    }
    text.push_str(&escape_markdown(
        "/addservice name | minutes | price | description\n\
         /editservice ID field value\n\
         /toggleservice ID\n\
         /deleteservice ID",
    ));
    Ok(Screen::new(text))
}

/// `name | minutes | price | description`, price in major units.
pub fn parse_new_service(args: &str) -> Result<NewService, BookingError> {
    let fields = split_fields(args, 4).map_err(invalid)?;
    Ok(NewService {
        name: fields[0].clone(),
        duration: parse_duration(&fields[1]).map_err(invalid)?,
        price: parse_price(&fields[2]).map_err(invalid)?,
        description: fields[3].clone(),
    })
}

pub async fn add_service(ctx: &AppContext, args: &str) -> Result<Screen, BookingError> {
    let service = ctx.catalog.create(parse_new_service(args)?).await?;
    Ok(Screen::new(format!("✅ Service added\n\n{}", service_entry(&service))))
}

/// `ID field value`.
pub fn parse_service_edit(args: &str) -> Result<(i64, ServiceEdit), BookingError> {
    let mut parts = args.trim().splitn(3, char::is_whitespace);
    match (parts.next(), parts.next(), parts.next()) {
        (Some(id), Some(field), Some(value)) if !id.is_empty() => Ok((
            parse_id(id, "Service").map_err(invalid)?,
            ServiceEdit::parse(field, value)?,
        )),
        _ => Err(BookingError::InvalidInput(
            "use /editservice ID name|description|price|duration VALUE".to_string(),
        )),
    }
}

pub async fn edit_service(ctx: &AppContext, args: &str) -> Result<Screen, BookingError> {
    let (id, edit) = parse_service_edit(args)?;
    let service = ctx.catalog.edit(id, edit).await?;
    Ok(Screen::new(format!("✅ Service updated\n\n{}", service_entry(&service))))
}

pub async fn toggle_service(ctx: &AppContext, args: &str) -> Result<Screen, BookingError> {
    let id = parse_id(args, "Service").map_err(invalid)?;
    let service = ctx.catalog.toggle_active(id).await?;
    let state = if service.is_active { "enabled" } else { "disabled" };
    Ok(Screen::new(format!(
        "✅ {} is now {}",
        bold(&service.name),
        state
    )))
}

pub async fn delete_service(ctx: &AppContext, args: &str) -> Result<Screen, BookingError> {
    let id = parse_id(args, "Service").map_err(invalid)?;
    ctx.catalog.delete(id).await?;
    Ok(Screen::new(format!("🗑 Service {} deleted", code(&format!("#{id}")))))
}

fn discount_entry(discount: &Discount, tz: Tz, now: DateTime<Utc>) -> String {
    let state = if discount.applies_at(now) {
        "🟢"
    } else if discount.is_active {
        "🟡"
    } else {
        "⚪️"
    };
    format!(
        "{} {} {} \\-{}% on service {}\n📅 {} to {}\n",
        state,
        code(&format!("#{}", discount.id)),
        bold(&discount.name),
        discount.percentage,
        code(&format!("#{}", discount.service_id)),
        escape_markdown(&format_datetime(&discount.start_at, tz)),
        escape_markdown(&format_datetime(&discount.end_at, tz)),
    )
}

pub async fn discounts(ctx: &AppContext) -> Result<Screen, BookingError> {
    let discounts = ctx.discounts.list_all().await?;
    let tz = ctx.clock.timezone();
    let now = ctx.clock.now().with_timezone(&Utc);

    let mut text = format!("🎉 {}\n\n", bold("Discounts"));
    if discounts.is_empty() {
        text.push_str("No discounts yet\\.\n\n");
    }
    for discount in &discounts {
        text.push_str(&discount_entry(discount, tz, now));
        text.push('\n');
    }
    text.push_str(&escape_markdown(
        "/adddiscount service ID | name | percent | from | to\n\
         /togglediscount ID\n\
         /deletediscount ID",
    ));
    Ok(Screen::new(text))
}

/// Discount dates cover whole local days: `from` 00:00 through `to` 23:59:59.
pub fn discount_window(
    from: NaiveDate,
    to: NaiveDate,
    tz: Tz,
) -> Result<(DateTime<Utc>, DateTime<Utc>), BookingError> {
    let start = NaiveTime::from_hms_opt(0, 0, 0).and_then(|t| local_datetime(tz, from, t));
    let end = NaiveTime::from_hms_opt(23, 59, 59).and_then(|t| local_datetime(tz, to, t));
    match (start, end) {
        (Some(start), Some(end)) => Ok((start.with_timezone(&Utc), end.with_timezone(&Utc))),
        _ => Err(BookingError::InvalidInput(format!(
            "dates {from} to {to} do not exist in {tz}"
        ))),
    }
}

/// `service ID | name | percent | from | to`.
pub fn parse_new_discount(args: &str, tz: Tz) -> Result<NewDiscount, BookingError> {
    let fields = split_fields(args, 5).map_err(invalid)?;
    let service_id = parse_id(&fields[0], "Service").map_err(invalid)?;
    let percentage = parse_percentage(&fields[2]).map_err(invalid)?;
    let from = parse_date(&fields[3]).map_err(invalid)?;
    let to = parse_date(&fields[4]).map_err(invalid)?;
    let (start_at, end_at) = discount_window(from, to, tz)?;
    Ok(NewDiscount {
        service_id,
        name: fields[1].clone(),
        percentage,
        start_at,
        end_at,
    })
}

pub async fn add_discount(ctx: &AppContext, args: &str) -> Result<Screen, BookingError> {
    let tz = ctx.clock.timezone();
    let discount = ctx.discounts.create(parse_new_discount(args, tz)?).await?;
    Ok(Screen::new(format!(
        "✅ Discount added\n\n{}",
        discount_entry(&discount, tz, ctx.clock.now().with_timezone(&Utc))
    )))
}

pub async fn toggle_discount(ctx: &AppContext, args: &str) -> Result<Screen, BookingError> {
    let id = parse_id(args, "Discount").map_err(invalid)?;
    let discount = ctx.discounts.toggle(id).await?;
    let state = if discount.is_active { "enabled" } else { "disabled" };
    Ok(Screen::new(format!("✅ {} is now {}", bold(&discount.name), state)))
}

pub async fn delete_discount(ctx: &AppContext, args: &str) -> Result<Screen, BookingError> {
    let id = parse_id(args, "Discount").map_err(invalid)?;
    ctx.discounts.delete(id).await?;
    Ok(Screen::new(format!("🗑 Discount {} deleted", code(&format!("#{id}")))))
}

pub async fn complete(ctx: &AppContext, args: &str) -> Result<Screen, BookingError> {
    let id = parse_id(args, "Booking").map_err(invalid)?;
    let booking = ctx.bookings.complete(id).await?;
    Ok(Screen::new(format!(
        "🏁 Booking {} completed\n\n{}",
        code(&format!("#{}", booking.id)),
        booking_line(&booking)
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_booking_query() {
        assert_eq!(BookingQuery::parse("").unwrap(), BookingQuery::Recent);
        let day = NaiveDate::from_ymd_opt(2030, 3, 1).unwrap();
        let next = NaiveDate::from_ymd_opt(2030, 3, 7).unwrap();
        assert_eq!(
            BookingQuery::parse("2030-03-01").unwrap(),
            BookingQuery::Range(day, day)
        );
        assert_eq!(
            BookingQuery::parse("01.03.2030 2030-03-07").unwrap(),
            BookingQuery::Range(day, next)
        );
        assert!(BookingQuery::parse("yesterday").is_err());
        assert!(BookingQuery::parse("2030-03-01 2030-03-02 2030-03-03").is_err());
    }

    #[test]
    fn test_parse_new_service_uses_major_units() {
        let new = parse_new_service("Hot stones | 75 | 4200.50 | Warm basalt massage").unwrap();
        assert_eq!(new.name, "Hot stones");
        assert_eq!(new.duration, 75);
        assert_eq!(new.price, 420050);
        assert_eq!(new.description, "Warm basalt massage");

        assert!(parse_new_service("Hot stones | 75 | 4200").is_err());
        assert!(parse_new_service("Hot stones | forever | 4200 | x").is_err());
    }

    #[test]
    fn test_parse_service_edit() {
        let (id, edit) = parse_service_edit("3 price 2500").unwrap();
        assert_eq!(id, 3);
        assert_eq!(edit, ServiceEdit::Price(250000));

        let (_, edit) = parse_service_edit("#3 name Deep tissue massage").unwrap();
        assert_eq!(edit, ServiceEdit::Name("Deep tissue massage".to_string()));

        assert!(parse_service_edit("3 colour red").is_err());
        assert!(parse_service_edit("3").is_err());
    }

    #[test]
    fn test_discount_window_covers_whole_local_days() {
        let tz: Tz = "Europe/Moscow".parse().unwrap();
        let from = NaiveDate::from_ymd_opt(2030, 6, 1).unwrap();
        let to = NaiveDate::from_ymd_opt(2030, 6, 3).unwrap();
        let (start, end) = discount_window(from, to, tz).unwrap();
        assert_eq!(start.to_rfc3339(), "2030-05-31T21:00:00+00:00");
        assert_eq!(end.to_rfc3339(), "2030-06-03T20:59:59+00:00");
    }

    #[test]
    fn test_parse_new_discount() {
        let new = parse_new_discount("2 | Summer sale | 15% | 01.06.2030 | 2030-06-30", Tz::UTC).unwrap();
        assert_eq!(new.service_id, 2);
        assert_eq!(new.name, "Summer sale");
        assert_eq!(new.percentage, 15);
        assert!(new.start_at < new.end_at);

        assert!(parse_new_discount("2 | Too much | 100 | 2030-06-01 | 2030-06-30", Tz::UTC).is_err());
        assert!(parse_new_discount("0 | Bad id | 10 | 2030-06-01 | 2030-06-30", Tz::UTC).is_err());
    }
}
