use chrono::{DateTime, NaiveDate, NaiveTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::database::models::user::display_name;

/// Storage format of a booking's time of day.
pub const TIME_FORMAT: &str = "%H:%M";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Completed => "completed",
        }
    }

    /// Statuses that still expect the client to show up.
    pub const ACTIVE: [BookingStatus; 2] = [BookingStatus::Pending, BookingStatus::Confirmed];

    pub const ALL: [BookingStatus; 4] = [
        BookingStatus::Pending,
        BookingStatus::Confirmed,
        BookingStatus::Cancelled,
        BookingStatus::Completed,
    ];
}

/// One of the three independent reminder thresholds tracked per booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderKind {
    AdminDigest,
    DayBefore,
    HourBefore,
}

impl ReminderKind {
    fn column(&self) -> &'static str {
        match self {
            ReminderKind::AdminDigest => "admin_digest_sent",
            ReminderKind::DayBefore => "day_before_reminder_sent",
            ReminderKind::HourBefore => "hour_before_reminder_sent",
        }
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Booking {
    pub id: i64,
    pub user_id: i64,
    pub service_id: i64,
    pub date: NaiveDate,
    pub time: String, // HH:MM
    pub status: BookingStatus,
    pub day_before_reminder_sent: bool,
    pub hour_before_reminder_sent: bool,
    pub admin_digest_sent: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A booking joined with the current catalog values and the client profile.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct BookingDetails {
    pub id: i64,
    pub user_id: i64,
    pub service_id: i64,
    pub date: NaiveDate,
    pub time: String,
    pub status: BookingStatus,
    pub day_before_reminder_sent: bool,
    pub hour_before_reminder_sent: bool,
    pub admin_digest_sent: bool,
    pub service_name: String,
    pub service_duration: i64,
    pub service_price: i64,
    pub username: Option<String>,
    pub first_name: String,
    pub last_name: String,
}

/// Start time and length of a non-cancelled booking on some date.
#[derive(Debug, Clone, FromRow)]
pub struct BookedSlot {
    pub booking_id: i64,
    pub time: String,
    pub duration: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBooking {
    pub user_id: i64,
    pub service_id: i64,
    pub date: NaiveDate,
    pub time: NaiveTime,
}

const BOOKING_COLUMNS: &str = "id, user_id, service_id, date, time, status, \
    day_before_reminder_sent, hour_before_reminder_sent, admin_digest_sent, created_at, updated_at";

const DETAILS_SELECT: &str = r#"
    SELECT b.id, b.user_id, b.service_id, b.date, b.time, b.status,
           b.day_before_reminder_sent, b.hour_before_reminder_sent, b.admin_digest_sent,
           s.name AS service_name, s.duration AS service_duration, s.price AS service_price,
           u.username, u.first_name, u.last_name
    FROM bookings b
    JOIN services s ON s.id = b.service_id
    JOIN users u ON u.id = b.user_id
"#;

// Minutes since midnight of a stored "HH:MM" value.
const BOOKED_START_MINUTES: &str =
    "(CAST(substr(b.time, 1, 2) AS INTEGER) * 60 + CAST(substr(b.time, 4, 2) AS INTEGER))";

fn placeholders(n: usize) -> String {
    vec!["?"; n].join(",")
}

pub fn parse_time_of_day(value: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(value.trim(), TIME_FORMAT).ok()
}

impl Booking {
    pub async fn find_by_id(
        pool: &sqlx::SqlitePool,
        id: i64,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Booking>(&format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ?"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Occupied intervals on `date`: every booking that is not cancelled.
    pub async fn booked_slots_on(
        pool: &sqlx::SqlitePool,
        date: NaiveDate,
    ) -> Result<Vec<BookedSlot>, sqlx::Error> {
        sqlx::query_as::<_, BookedSlot>(
            r#"
            SELECT b.id AS booking_id, b.time AS time, s.duration AS duration
            FROM bookings b
            JOIN services s ON s.id = b.service_id
            WHERE b.date = ? AND b.status != 'cancelled'
            ORDER BY b.time
            "#,
        )
        .bind(date)
        .fetch_all(pool)
        .await
    }

    /// Inserts a pending booking unless a non-cancelled booking on the same date
    /// overlaps `[time, time + duration)`. The overlap test and the insert run as
    /// one statement, so concurrent writers sharing the database file cannot both
    /// succeed. Returns the new id, or `None` when the slot was taken.
    pub async fn insert_if_free(
        pool: &sqlx::SqlitePool,
        new: &NewBooking,
        duration_minutes: i64,
    ) -> Result<Option<i64>, sqlx::Error> {
        let now = Utc::now();
        let start = i64::from(new.time.hour() * 60 + new.time.minute());
        let end = start + duration_minutes;
        let time = new.time.format(TIME_FORMAT).to_string();

        let result = sqlx::query(&format!(
            r#"
            INSERT INTO bookings (user_id, service_id, date, time, status, created_at, updated_at)
            SELECT ?1, ?2, ?3, ?4, 'pending', ?5, ?5
            WHERE NOT EXISTS (
                SELECT 1 FROM bookings b
                JOIN services s ON s.id = b.service_id
                WHERE b.date = ?3
                  AND b.status != 'cancelled'
                  AND {BOOKED_START_MINUTES} < ?7
                  AND {BOOKED_START_MINUTES} + s.duration > ?6
            )
            "#
        ))
        .bind(new.user_id)
        .bind(new.service_id)
        .bind(new.date)
        .bind(&time)
        .bind(now)
        .bind(start)
        .bind(end)
        .execute(pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        Ok(Some(result.last_insert_rowid()))
    }

    /// Moves the booking to `to` only while its status is one of `from`.
    /// Returns whether a row changed.
    pub async fn transition(
        pool: &sqlx::SqlitePool,
        id: i64,
        from: &[BookingStatus],
        to: BookingStatus,
    ) -> Result<bool, sqlx::Error> {
        let query = format!(
            "UPDATE bookings SET status = ?, updated_at = ? WHERE id = ? AND status IN ({})",
            placeholders(from.len())
        );
        let mut q = sqlx::query(&query).bind(to).bind(Utc::now()).bind(id);
        for status in from {
            q = q.bind(*status);
        }
        Ok(q.execute(pool).await?.rows_affected() > 0)
    }

    /// Sets the reminder flag if it is still unset. Returns whether it flipped.
    pub async fn mark_reminder_sent(
        pool: &sqlx::SqlitePool,
        id: i64,
        kind: ReminderKind,
    ) -> Result<bool, sqlx::Error> {
        let column = kind.column();
        let result = sqlx::query(&format!(
            "UPDATE bookings SET {column} = TRUE, updated_at = ? WHERE id = ? AND {column} = FALSE"
        ))
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn count(pool: &sqlx::SqlitePool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM bookings")
            .fetch_one(pool)
            .await
    }

    pub async fn count_by_status(
        pool: &sqlx::SqlitePool,
        statuses: &[BookingStatus],
    ) -> Result<i64, sqlx::Error> {
        let query = format!(
            "SELECT COUNT(*) FROM bookings WHERE status IN ({})",
            placeholders(statuses.len())
        );
        let mut q = sqlx::query_scalar::<_, i64>(&query);
        for status in statuses {
            q = q.bind(*status);
        }
        q.fetch_one(pool).await
    }

    pub fn start_time(&self) -> Option<NaiveTime> {
        parse_time_of_day(&self.time)
    }
}

impl BookingDetails {
    pub async fn find_by_id(
        pool: &sqlx::SqlitePool,
        id: i64,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, BookingDetails>(&format!("{DETAILS_SELECT} WHERE b.id = ?"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Bookings dated within `[start, end]` whose status is in `statuses`.
    pub async fn find_by_date_range(
        pool: &sqlx::SqlitePool,
        start: NaiveDate,
        end: NaiveDate,
        statuses: &[BookingStatus],
    ) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "{DETAILS_SELECT} WHERE b.date >= ? AND b.date <= ? AND b.status IN ({}) ORDER BY b.date, b.time",
            placeholders(statuses.len())
        );
        let mut q = sqlx::query_as::<_, BookingDetails>(&query).bind(start).bind(end);
        for status in statuses {
            q = q.bind(*status);
        }
        q.fetch_all(pool).await
    }

    /// A client's bookings except cancelled ones, newest first.
    pub async fn find_by_user(
        pool: &sqlx::SqlitePool,
        user_id: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, BookingDetails>(&format!(
            "{DETAILS_SELECT} WHERE b.user_id = ? AND b.status != 'cancelled' ORDER BY b.date DESC, b.time DESC"
        ))
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    pub async fn find_recent(
        pool: &sqlx::SqlitePool,
        limit: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, BookingDetails>(&format!(
            "{DETAILS_SELECT} ORDER BY b.date DESC, b.time DESC LIMIT ?"
        ))
        .bind(limit)
        .fetch_all(pool)
        .await
    }

    /// Pending or confirmed bookings on `date` whose `kind` flag is still unset.
    pub async fn due_reminders(
        pool: &sqlx::SqlitePool,
        date: NaiveDate,
        kind: ReminderKind,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, BookingDetails>(&format!(
            "{DETAILS_SELECT} WHERE b.date = ? AND b.status IN ('pending', 'confirmed') AND b.{} = FALSE ORDER BY b.time",
            kind.column()
        ))
        .bind(date)
        .fetch_all(pool)
        .await
    }

    pub fn start_time(&self) -> Option<NaiveTime> {
        parse_time_of_day(&self.time)
    }

    pub fn client_name(&self) -> String {
        display_name(self.username.as_deref(), &self.first_name, &self.last_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_time_of_day() {
        assert_eq!(parse_time_of_day("09:30"), NaiveTime::from_hms_opt(9, 30, 0));
        assert_eq!(parse_time_of_day(" 18:00 "), NaiveTime::from_hms_opt(18, 0, 0));
        assert!(parse_time_of_day("25:00").is_none());
        assert!(parse_time_of_day("9.30").is_none());
        assert!(parse_time_of_day("").is_none());
    }

    #[test]
    fn test_placeholders() {
        assert_eq!(placeholders(1), "?");
        assert_eq!(placeholders(3), "?,?,?");
    }
}
