//! Periodic reminder sweep: the morning admin digest, day-before and
//! hour-before client reminders. Each threshold fires once per booking,
//! tracked by the booking's reminder flags.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{anyhow, Result};
use chrono::{DateTime, Duration, NaiveDate, Timelike};
use chrono_tz::Tz;
use sqlx::SqlitePool;
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::database::models::booking::{Booking, BookingDetails, ReminderKind};
use crate::error::BookingError;
use crate::services::clock::{local_datetime, Clock};
use crate::services::messages;
use crate::services::notification::NotificationGateway;

/// Timing of the reminder sweep. Every window must be wider than the sweep
/// interval, otherwise a threshold can fall between two sweeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReminderPolicy {
    /// Minutes between sweeps; must divide an hour.
    pub sweep_interval_minutes: u32,
    /// Local hour at which the admin digest window opens.
    pub digest_hour: u32,
    pub digest_window_minutes: u32,
    /// Local hour from which tomorrow's clients get their day-before reminder.
    pub day_before_hour: u32,
    pub hour_before_lead_minutes: i64,
    pub hour_before_tolerance_minutes: i64,
}

impl Default for ReminderPolicy {
    fn default() -> Self {
        Self {
            sweep_interval_minutes: 5,
            digest_hour: 8,
            digest_window_minutes: 10,
            day_before_hour: 10,
            hour_before_lead_minutes: 60,
            hour_before_tolerance_minutes: 5,
        }
    }
}

impl ReminderPolicy {
    /// Rejects policies whose windows a sweep could skip over.
    pub fn validate(&self) -> Result<()> {
        let interval = self.sweep_interval_minutes;
        if interval == 0 || 60 % interval != 0 {
            return Err(anyhow!("Sweep interval must divide 60 minutes, got {}", interval));
        }
        if self.digest_hour > 23 {
            return Err(anyhow!("Digest hour must be 0-23, got {}", self.digest_hour));
        }
        if self.day_before_hour > 23 {
            return Err(anyhow!("Day-before hour must be 0-23, got {}", self.day_before_hour));
        }
        if self.digest_window_minutes <= interval {
            return Err(anyhow!(
                "Digest window ({} min) must be wider than the sweep interval ({} min)",
                self.digest_window_minutes,
                interval
            ));
        }
        if self.hour_before_tolerance_minutes < 0
            || self.hour_before_tolerance_minutes >= self.hour_before_lead_minutes
        {
            return Err(anyhow!("Hour-before tolerance must be smaller than the lead"));
        }
        if 2 * self.hour_before_tolerance_minutes <= i64::from(interval) {
            return Err(anyhow!(
                "Hour-before window ({} min) must be wider than the sweep interval ({} min)",
                2 * self.hour_before_tolerance_minutes,
                interval
            ));
        }
        Ok(())
    }

    /// Six-field cron expression firing every sweep interval.
    pub fn cron_expression(&self) -> String {
        if self.sweep_interval_minutes >= 60 {
            return "0 0 * * * *".to_string();
        }
        format!("0 */{} * * * *", self.sweep_interval_minutes)
    }

    /// Whether `now` falls inside the admin digest window.
    pub fn in_digest_window(&self, now: DateTime<Tz>) -> bool {
        let minute = now.hour() * 60 + now.minute();
        let start = self.digest_hour * 60;
        minute >= start && minute < start + self.digest_window_minutes
    }

    /// Day-before reminders wait until `day_before_hour` so nobody is messaged at night.
    pub fn day_before_open(&self, now: DateTime<Tz>) -> bool {
        now.hour() >= self.day_before_hour
    }

    /// Whether a booking starting at `start` is due its hour-before reminder at `now`.
    pub fn hour_before_due(&self, start: DateTime<Tz>, now: DateTime<Tz>) -> bool {
        let until = start.signed_duration_since(now);
        let lead = Duration::minutes(self.hour_before_lead_minutes);
        let tolerance = Duration::minutes(self.hour_before_tolerance_minutes);
        until >= lead - tolerance && until <= lead + tolerance
    }
}

/// Outcome of one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Bookings included in an admin digest sent this sweep.
    pub digest_bookings: usize,
    pub day_before: usize,
    pub hour_before: usize,
    pub delivery_failures: usize,
    pub store_errors: usize,
}

/// Finds bookings due a reminder and sends it.
pub struct ReminderSweeper {
    pool: SqlitePool,
    gateway: Arc<dyn NotificationGateway>,
    clock: Arc<dyn Clock>,
    policy: ReminderPolicy,
}

impl ReminderSweeper {
    pub fn new(
        pool: SqlitePool,
        gateway: Arc<dyn NotificationGateway>,
        clock: Arc<dyn Clock>,
        policy: ReminderPolicy,
    ) -> Self {
        Self {
            pool,
            gateway,
            clock,
            policy,
        }
    }

    pub fn policy(&self) -> &ReminderPolicy {
        &self.policy
    }

    /// Runs all three phases once. A phase failing on the store is logged and
    /// does not stop the others.
    pub async fn sweep(&self) -> SweepReport {
        let now = self.clock.now();
        let today = now.date_naive();
        let mut report = SweepReport::default();

        if self.policy.in_digest_window(now) {
            if let Err(e) = self.admin_digest(today, &mut report).await {
                tracing::error!("Admin digest phase failed: {}", e);
                report.store_errors += 1;
            }
        }

        if let Some(tomorrow) = today.succ_opt().filter(|_| self.policy.day_before_open(now)) {
            if let Err(e) = self.day_before(tomorrow, &mut report).await {
                tracing::error!("Day-before reminder phase failed: {}", e);
                report.store_errors += 1;
            }
        }

        if let Err(e) = self.hour_before(now, &mut report).await {
            tracing::error!("Hour-before reminder phase failed: {}", e);
            report.store_errors += 1;
        }

        if report != SweepReport::default() {
            tracing::info!(
                "Reminder sweep: digest {} bookings, {} day-before, {} hour-before, {} delivery failures",
                report.digest_bookings,
                report.day_before,
                report.hour_before,
                report.delivery_failures
            );
        }
        report
    }

    async fn admin_digest(&self, today: NaiveDate, report: &mut SweepReport) -> Result<(), BookingError> {
        let bookings = BookingDetails::due_reminders(&self.pool, today, ReminderKind::AdminDigest).await?;
        if bookings.is_empty() {
            return Ok(());
        }

        if let Err(e) = self
            .gateway
            .send_to_admins(&messages::admin_digest(today, &bookings))
            .await
        {
            tracing::warn!("Failed to deliver admin digest for {}: {}", today, e);
            report.delivery_failures += 1;
        }

        for booking in &bookings {
            if Booking::mark_reminder_sent(&self.pool, booking.id, ReminderKind::AdminDigest).await? {
                report.digest_bookings += 1;
            }
        }
        Ok(())
    }

    async fn day_before(&self, tomorrow: NaiveDate, report: &mut SweepReport) -> Result<(), BookingError> {
        let bookings = BookingDetails::due_reminders(&self.pool, tomorrow, ReminderKind::DayBefore).await?;
        for booking in &bookings {
            if let Err(e) = self
                .gateway
                .send_to_user(booking.user_id, &messages::day_before_reminder(booking))
                .await
            {
                tracing::warn!("Failed to send day-before reminder for booking {}: {}", booking.id, e);
                report.delivery_failures += 1;
            }
            if Booking::mark_reminder_sent(&self.pool, booking.id, ReminderKind::DayBefore).await? {
                report.day_before += 1;
            }
        }
        Ok(())
    }

    async fn hour_before(&self, now: DateTime<Tz>, report: &mut SweepReport) -> Result<(), BookingError> {
        let tz = self.clock.timezone();
        let today = now.date_naive();
        let mut bookings = BookingDetails::due_reminders(&self.pool, today, ReminderKind::HourBefore).await?;
        // A late-evening lead can reach past midnight
        if let Some(tomorrow) = today.succ_opt() {
            bookings.extend(
                BookingDetails::due_reminders(&self.pool, tomorrow, ReminderKind::HourBefore).await?,
            );
        }

        for booking in &bookings {
            let Some(start) = booking
                .start_time()
                .and_then(|time| local_datetime(tz, booking.date, time))
            else {
                tracing::warn!("Booking {} has an unusable start time '{}'", booking.id, booking.time);
                continue;
            };
            if !self.policy.hour_before_due(start, now) {
                continue;
            }

            if let Err(e) = self
                .gateway
                .send_to_user(booking.user_id, &messages::hour_before_reminder(booking))
                .await
            {
                tracing::warn!("Failed to send hour-before reminder for booking {}: {}", booking.id, e);
                report.delivery_failures += 1;
            }
            if let Err(e) = self
                .gateway
                .send_to_admins(&messages::hour_before_admin(booking))
                .await
            {
                tracing::warn!("Failed to send hour-before notice to admins for booking {}: {}", booking.id, e);
                report.delivery_failures += 1;
            }
            if Booking::mark_reminder_sent(&self.pool, booking.id, ReminderKind::HourBefore).await? {
                report.hour_before += 1;
            }
        }
        Ok(())
    }
}

/// Drives `ReminderSweeper` on a cron schedule.
pub struct ReminderService {
    sweeper: Arc<ReminderSweeper>,
    scheduler: JobScheduler,
    shutdown: Arc<AtomicBool>,
    in_flight: Arc<tokio::sync::Mutex<()>>,
}

impl ReminderService {
    pub async fn new(sweeper: ReminderSweeper) -> Result<Self> {
        sweeper.policy().validate()?;
        let scheduler = JobScheduler::new().await?;

        Ok(Self {
            sweeper: Arc::new(sweeper),
            scheduler,
            shutdown: Arc::new(AtomicBool::new(false)),
            in_flight: Arc::new(tokio::sync::Mutex::new(())),
        })
    }

    /// Registers the sweep job and starts the scheduler.
    pub async fn start(&mut self) -> Result<()> {
        let cron = self.sweeper.policy().cron_expression();
        let sweeper = self.sweeper.clone();
        let shutdown = self.shutdown.clone();
        let in_flight = self.in_flight.clone();

        let reminder_job = Job::new_async(cron.as_str(), move |_uuid, _l| {
            let sweeper = sweeper.clone();
            let shutdown = shutdown.clone();
            let in_flight = in_flight.clone();
            Box::pin(async move {
                run_guarded(&sweeper, &shutdown, &in_flight).await;
            })
        })?;

        self.scheduler.add(reminder_job).await?;
        self.scheduler.start().await?;

        tracing::info!("Reminder service started with schedule '{}'", cron);
        Ok(())
    }

    /// Stops scheduling new sweeps and waits for a running one to finish.
    pub async fn stop(&mut self) -> Result<()> {
        self.shutdown.store(true, Ordering::SeqCst);
        let _idle = self.in_flight.lock().await;
        self.scheduler.shutdown().await?;
        tracing::info!("Reminder service stopped");
        Ok(())
    }

    /// Runs a sweep immediately unless the service is shutting down.
    pub async fn check_reminders_now(&self) -> Option<SweepReport> {
        run_guarded(&self.sweeper, &self.shutdown, &self.in_flight).await
    }
}

async fn run_guarded(
    sweeper: &ReminderSweeper,
    shutdown: &AtomicBool,
    in_flight: &tokio::sync::Mutex<()>,
) -> Option<SweepReport> {
    if shutdown.load(Ordering::SeqCst) {
        return None;
    }
    let _running = in_flight.lock().await;
    // Shutdown may have started while waiting for the previous sweep
    if shutdown.load(Ordering::SeqCst) {
        return None;
    }
    Some(sweeper.sweep().await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Tz> {
        chrono_tz::Europe::Moscow.with_ymd_and_hms(2030, 3, 4, h, m, 0).unwrap()
    }

    #[test]
    fn test_default_policy_is_valid() {
        let policy = ReminderPolicy::default();
        assert!(policy.validate().is_ok());
        assert_eq!(policy.cron_expression(), "0 */5 * * * *");
    }

    #[test]
    fn test_windows_must_exceed_interval() {
        let narrow_digest = ReminderPolicy {
            digest_window_minutes: 5,
            ..ReminderPolicy::default()
        };
        assert!(narrow_digest.validate().is_err());

        let slow_sweep = ReminderPolicy {
            sweep_interval_minutes: 15,
            digest_window_minutes: 20,
            ..ReminderPolicy::default()
        };
        // 60 ± 5 is only ten minutes wide
        assert!(slow_sweep.validate().is_err());

        let uneven = ReminderPolicy {
            sweep_interval_minutes: 7,
            ..ReminderPolicy::default()
        };
        assert!(uneven.validate().is_err());
    }

    #[test]
    fn test_hourly_cron() {
        let policy = ReminderPolicy {
            sweep_interval_minutes: 60,
            digest_window_minutes: 61,
            hour_before_tolerance_minutes: 31,
            hour_before_lead_minutes: 90,
            ..ReminderPolicy::default()
        };
        assert!(policy.validate().is_ok());
        assert_eq!(policy.cron_expression(), "0 0 * * * *");
    }

    #[test]
    fn test_digest_window() {
        let policy = ReminderPolicy::default();
        assert!(!policy.in_digest_window(at(7, 59)));
        assert!(policy.in_digest_window(at(8, 0)));
        assert!(policy.in_digest_window(at(8, 9)));
        assert!(!policy.in_digest_window(at(8, 10)));
    }

    #[test]
    fn test_day_before_waits_for_daytime() {
        let policy = ReminderPolicy::default();
        assert!(!policy.day_before_open(at(0, 5)));
        assert!(!policy.day_before_open(at(9, 55)));
        assert!(policy.day_before_open(at(10, 0)));
        assert!(policy.day_before_open(at(23, 55)));

        let late = ReminderPolicy {
            day_before_hour: 24,
            ..ReminderPolicy::default()
        };
        assert!(late.validate().is_err());
    }

    #[test]
    fn test_hour_before_bounds_inclusive() {
        let policy = ReminderPolicy::default();
        let start = at(12, 0);
        assert!(!policy.hour_before_due(start, at(10, 54)));
        assert!(policy.hour_before_due(start, at(10, 55)));
        assert!(policy.hour_before_due(start, at(11, 0)));
        assert!(policy.hour_before_due(start, at(11, 5)));
        assert!(!policy.hour_before_due(start, at(11, 6)));
    }
}
