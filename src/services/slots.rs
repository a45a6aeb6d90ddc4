//! Slot availability: which start times on a date can still take a service.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Timelike};
use chrono_tz::Tz;
use sqlx::SqlitePool;

use crate::database::models::booking::{parse_time_of_day, Booking, BookedSlot, TIME_FORMAT};
use crate::database::models::service::Service;
use crate::error::BookingError;
use crate::services::clock::local_datetime;

/// Minimum lead, in minutes, between now and a bookable start.
pub const MIN_LEAD_MINUTES: i64 = 1;

/// Ordered, duplicate-free set of bookable start times.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeSlotGrid {
    slots: Vec<NaiveTime>,
}

impl TimeSlotGrid {
    /// Sorts and deduplicates `slots`; an empty grid is rejected.
    pub fn new(mut slots: Vec<NaiveTime>) -> Result<Self, BookingError> {
        if slots.is_empty() {
            return Err(BookingError::InvalidInput("time slot grid is empty".to_string()));
        }
        slots.sort();
        slots.dedup();
        Ok(Self { slots })
    }

    /// Parses a comma separated list such as `"09:00, 10:30, 12:00"`.
    pub fn parse(value: &str) -> Result<Self, BookingError> {
        let slots = value
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                parse_time_of_day(s)
                    .ok_or_else(|| BookingError::InvalidInput(format!("'{s}' is not a HH:MM time")))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(slots)
    }

    /// Start times in ascending order.
    pub fn slots(&self) -> &[NaiveTime] {
        &self.slots
    }

    /// Whether `time` is one of the grid slots.
    pub fn contains(&self, time: NaiveTime) -> bool {
        self.slots.binary_search(&time).is_ok()
    }

    /// Looks up a grid slot by its `"HH:MM"` label.
    pub fn find(&self, label: &str) -> Option<NaiveTime> {
        parse_time_of_day(label).filter(|t| self.contains(*t))
    }

    /// `"HH:MM"` labels in grid order.
    pub fn labels(&self) -> Vec<String> {
        self.slots.iter().map(|t| t.format(TIME_FORMAT).to_string()).collect()
    }
}

impl Default for TimeSlotGrid {
    fn default() -> Self {
        Self {
            slots: (9..=20).filter_map(|h| NaiveTime::from_hms_opt(h, 0, 0)).collect(),
        }
    }
}

fn minute_of_day(time: NaiveTime) -> i64 {
    i64::from(time.hour() * 60 + time.minute())
}

/// Whether `[start, start + duration)` overlaps any booked interval.
/// Half-open: a booking ending at 10:00 does not block a 10:00 start.
pub fn conflicts(start: NaiveTime, duration_minutes: i64, booked: &[BookedSlot]) -> bool {
    let cs = minute_of_day(start);
    let ce = cs + duration_minutes;
    booked.iter().any(|slot| {
        let Some(bs) = parse_time_of_day(&slot.time).map(minute_of_day) else {
            return false;
        };
        let be = bs + slot.duration;
        cs < be && ce > bs
    })
}

/// Applies the past-time and conflict rules to one candidate start.
pub fn check_slot(
    tz: Tz,
    date: NaiveDate,
    time: NaiveTime,
    duration_minutes: i64,
    booked: &[BookedSlot],
    now: DateTime<Tz>,
) -> bool {
    let Some(start) = local_datetime(tz, date, time) else {
        return false;
    };
    if start < now + Duration::minutes(MIN_LEAD_MINUTES) {
        return false;
    }
    !conflicts(time, duration_minutes, booked)
}

/// Grid slots on `date` that can take a service of `duration_minutes`, in grid order.
pub fn compute_available_slots(
    grid: &TimeSlotGrid,
    tz: Tz,
    date: NaiveDate,
    duration_minutes: i64,
    booked: &[BookedSlot],
    now: DateTime<Tz>,
) -> Vec<NaiveTime> {
    grid.slots()
        .iter()
        .copied()
        .filter(|t| check_slot(tz, date, *t, duration_minutes, booked, now))
        .collect()
}

/// Read-side availability queries against the booking store.
#[derive(Clone)]
/// Answers which grid slots a service can still take on a date.
pub struct SlotAvailabilityEngine {
    pool: SqlitePool,
    grid: TimeSlotGrid,
    tz: Tz,
}

impl SlotAvailabilityEngine {
    /// Engine over `grid`, interpreting dates in `tz`.
    pub fn new(pool: SqlitePool, grid: TimeSlotGrid, tz: Tz) -> Self {
        Self { pool, grid, tz }
    }

    pub fn grid(&self) -> &TimeSlotGrid {
        &self.grid
    }

    /// Salon timezone used to place slots on the calendar.
    pub fn timezone(&self) -> Tz {
        self.tz
    }

    /// Active, non-deleted service or `NotFound`.
    pub async fn bookable_service(&self, service_id: i64) -> Result<Service, BookingError> {
        match Service::find_by_id(&self.pool, service_id).await? {
            Some(service) if service.is_active => Ok(service),
            _ => Err(BookingError::NotFound("service".to_string())),
        }
    }

    /// Free start times on `date` for the service, in grid order.
    pub async fn available_slots(
        &self,
        date: NaiveDate,
        service_id: i64,
        now: DateTime<Tz>,
    ) -> Result<Vec<NaiveTime>, BookingError> {
        let service = self.bookable_service(service_id).await?;
        let booked = Booking::booked_slots_on(&self.pool, date).await?;

        let slots = compute_available_slots(&self.grid, self.tz, date, service.duration, &booked, now);
        tracing::debug!(
            "{} of {} slots free on {} for service {}",
            slots.len(),
            self.grid.slots().len(),
            date,
            service_id
        );
        Ok(slots)
    }

    /// Re-check of a single slot against the current store contents.
    pub async fn is_available(
        &self,
        date: NaiveDate,
        time: NaiveTime,
        duration_minutes: i64,
        now: DateTime<Tz>,
    ) -> Result<bool, BookingError> {
        let booked = Booking::booked_slots_on(&self.pool, date).await?;
        Ok(check_slot(self.tz, date, time, duration_minutes, &booked, now))
    }
}
