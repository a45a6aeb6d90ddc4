//! Inline button payloads.
//!
//! Telegram limits callback data to 64 bytes, so every payload is a short
//! `tag[:argument]` string.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;

use crate::utils::datetime::DATE_FORMAT;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackAction {
    /// Main menu: start the booking flow.
    Book,
    /// Main menu: list own bookings.
    MyBookings,
    /// Main menu: show help.
    Help,
    /// Main menu: admin panel.
    AdminPanel,
    SelectService(i64),
    SelectDate(NaiveDate),
    /// Start time label, `HH:MM`.
    SelectTime(String),
    ConfirmBooking,
    /// Leave the booking flow.
    AbortBooking,
    BackToServices,
    BackToDates,
    CancelBooking(i64),
    Approve(i64),
    Reject(i64),
    Complete(i64),
    AdminCancel(i64),
    AdminBookings,
    AdminStats,
    AdminServices,
    AdminDiscounts,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognised callback data '{0}'")]
pub struct ParseCallbackError(pub String);

impl fmt::Display for CallbackAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallbackAction::Book => write!(f, "book"),
            CallbackAction::MyBookings => write!(f, "mybookings"),
            CallbackAction::Help => write!(f, "help"),
            CallbackAction::AdminPanel => write!(f, "admin"),
            CallbackAction::SelectService(id) => write!(f, "service:{id}"),
            CallbackAction::SelectDate(date) => write!(f, "date:{}", date.format(DATE_FORMAT)),
            CallbackAction::SelectTime(time) => write!(f, "time:{time}"),
            CallbackAction::ConfirmBooking => write!(f, "confirm"),
            CallbackAction::AbortBooking => write!(f, "abort"),
            CallbackAction::BackToServices => write!(f, "back:services"),
            CallbackAction::BackToDates => write!(f, "back:dates"),
            CallbackAction::CancelBooking(id) => write!(f, "cancel:{id}"),
            CallbackAction::Approve(id) => write!(f, "approve:{id}"),
            CallbackAction::Reject(id) => write!(f, "reject:{id}"),
            CallbackAction::Complete(id) => write!(f, "complete:{id}"),
            CallbackAction::AdminCancel(id) => write!(f, "admincancel:{id}"),
            CallbackAction::AdminBookings => write!(f, "admin:bookings"),
            CallbackAction::AdminStats => write!(f, "admin:stats"),
            CallbackAction::AdminServices => write!(f, "admin:services"),
            CallbackAction::AdminDiscounts => write!(f, "admin:discounts"),
        }
    }
}

impl FromStr for CallbackAction {
    type Err = ParseCallbackError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        let err = || ParseCallbackError(data.to_string());
        let id = |arg: &str| arg.parse::<i64>().map_err(|_| err());

        let action = match data.split_once(':') {
            None => match data {
                "book" => CallbackAction::Book,
                "mybookings" => CallbackAction::MyBookings,
                "help" => CallbackAction::Help,
                "admin" => CallbackAction::AdminPanel,
                "confirm" => CallbackAction::ConfirmBooking,
                "abort" => CallbackAction::AbortBooking,
                _ => return Err(err()),
            },
            Some((tag, arg)) => match tag {
                "service" => CallbackAction::SelectService(id(arg)?),
                "date" => CallbackAction::SelectDate(
                    NaiveDate::parse_from_str(arg, DATE_FORMAT).map_err(|_| err())?,
                ),
                "time" if !arg.is_empty() => CallbackAction::SelectTime(arg.to_string()),
                "back" => match arg {
                    "services" => CallbackAction::BackToServices,
                    "dates" => CallbackAction::BackToDates,
                    _ => return Err(err()),
                },
                "cancel" => CallbackAction::CancelBooking(id(arg)?),
                "approve" => CallbackAction::Approve(id(arg)?),
                "reject" => CallbackAction::Reject(id(arg)?),
                "complete" => CallbackAction::Complete(id(arg)?),
                "admincancel" => CallbackAction::AdminCancel(id(arg)?),
                "admin" => match arg {
                    "bookings" => CallbackAction::AdminBookings,
                    "stats" => CallbackAction::AdminStats,
                    "services" => CallbackAction::AdminServices,
                    "discounts" => CallbackAction::AdminDiscounts,
                    _ => return Err(err()),
                },
                _ => return Err(err()),
            },
        };
        Ok(action)
    }
}

impl CallbackAction {
    /// Actions restricted to configured administrators.
    pub fn requires_admin(&self) -> bool {
        matches!(
            self,
            CallbackAction::AdminPanel
                | CallbackAction::Approve(_)
                | CallbackAction::Reject(_)
                | CallbackAction::Complete(_)
                | CallbackAction::AdminCancel(_)
                | CallbackAction::AdminBookings
                | CallbackAction::AdminStats
                | CallbackAction::AdminServices
                | CallbackAction::AdminDiscounts
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_payload_keeps_colon() {
        let action: CallbackAction = "time:10:30".parse().unwrap();
        assert_eq!(action, CallbackAction::SelectTime("10:30".to_string()));
        assert_eq!(action.to_string(), "time:10:30");
    }

    #[test]
    fn test_date_payload() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 7).unwrap();
        assert_eq!(CallbackAction::SelectDate(date).to_string(), "date:2024-06-07");
        assert_eq!("date:2024-06-07".parse::<CallbackAction>().unwrap(), CallbackAction::SelectDate(date));
    }

    #[test]
    fn test_rejects_malformed_payloads() {
        for bad in ["", "service:", "service:abc", "date:07.06.2024", "time:", "back:home", "nope", "approve:1:2"] {
            assert!(bad.parse::<CallbackAction>().is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn test_admin_actions_flagged() {
        assert!(CallbackAction::Approve(1).requires_admin());
        assert!(CallbackAction::AdminStats.requires_admin());
        assert!(!CallbackAction::CancelBooking(1).requires_admin());
        assert!(!CallbackAction::Book.requires_admin());
    }
}
