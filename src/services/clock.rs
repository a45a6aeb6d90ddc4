use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

/// Source of the current instant in the salon's timezone.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Tz>;
    fn timezone(&self) -> Tz;

    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// Wall clock in a configured timezone.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    tz: Tz,
}

impl SystemClock {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Tz> {
        Utc::now().with_timezone(&self.tz)
    }

    fn timezone(&self) -> Tz {
        self.tz
    }
}

/// Combines a calendar date and time of day in `tz`. Ambiguous local times
/// resolve to the earlier instant; times skipped by a DST jump yield `None`.
pub fn local_datetime(tz: Tz, date: NaiveDate, time: NaiveTime) -> Option<DateTime<Tz>> {
    tz.from_local_datetime(&date.and_time(time)).earliest()
}
