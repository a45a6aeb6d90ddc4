use anyhow::{anyhow, Result};
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;

/// Storage and callback format of a calendar date.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Accepts `YYYY-MM-DD` or `DD.MM.YYYY`.
pub fn parse_date(input: &str) -> Result<NaiveDate> {
    let input = input.trim();
    NaiveDate::parse_from_str(input, DATE_FORMAT)
        .or_else(|_| NaiveDate::parse_from_str(input, "%d.%m.%Y"))
        .map_err(|_| anyhow!("'{}' is not a date, use YYYY-MM-DD", input))
}

/// `"Fri 07.06"` style label used on date buttons.
pub fn format_date_button(date: NaiveDate) -> String {
    date.format("%a %d.%m").to_string()
}

pub fn format_date(date: NaiveDate) -> String {
    date.format("%d.%m.%Y (%A)").to_string()
}

pub fn format_datetime(dt: &DateTime<Utc>, tz: Tz) -> String {
    dt.with_timezone(&tz).format("%d.%m.%Y %H:%M").to_string()
}

/// Minor currency units to a display amount, e.g. `300000` to `"3000 ₽"`.
pub fn format_price(minor: i64) -> String {
    let sign = if minor < 0 { "-" } else { "" };
    let minor = minor.abs();
    match minor % 100 {
        0 => format!("{sign}{} ₽", minor / 100),
        cents => format!("{sign}{}.{:02} ₽", minor / 100, cents),
    }
}

pub fn format_duration(minutes: i64) -> String {
    match (minutes / 60, minutes % 60) {
        (0, m) => format!("{m} min"),
        (h, 0) => format!("{h} h"),
        (h, m) => format!("{h} h {m} min"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 6, 7).unwrap();
        assert_eq!(parse_date("2024-06-07").unwrap(), expected);
        assert_eq!(parse_date(" 07.06.2024 ").unwrap(), expected);
        assert!(parse_date("2024-13-01").is_err());
        assert!(parse_date("tomorrow").is_err());
    }

    #[test]
    fn test_format_price() {
        assert_eq!(format_price(300000), "3000 ₽");
        assert_eq!(format_price(150050), "1500.50 ₽");
        assert_eq!(format_price(0), "0 ₽");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(45), "45 min");
        assert_eq!(format_duration(60), "1 h");
        assert_eq!(format_duration(90), "1 h 30 min");
    }

    #[test]
    fn test_format_date_button() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 7).unwrap();
        assert_eq!(format_date_button(date), "Fri 07.06");
    }
}
