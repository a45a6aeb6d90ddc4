//! Booking lifecycle: create with commit-time re-validation, cancel, and the
//! administrator transitions.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, NaiveDate};
use chrono_tz::Tz;
use sqlx::SqlitePool;
use tokio::sync::OwnedMutexGuard;

use crate::database::models::booking::{Booking, BookingDetails, BookingStatus, NewBooking};
use crate::database::models::user::User;
use crate::error::BookingError;
use crate::services::messages;
use crate::services::notification::{NotificationGateway, RenderedMessage};
use crate::services::slots::SlotAvailabilityEngine;
use crate::utils::datetime::parse_date;

/// Per-date mutual exclusion for booking creation. Entries nobody holds are
/// pruned on every acquire, so the map stays as small as the set of dates
/// being booked concurrently.
#[derive(Default)]
pub struct DateLocks {
    locks: Mutex<HashMap<NaiveDate, Arc<tokio::sync::Mutex<()>>>>,
}

impl DateLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to `date`; released when the guard drops.
    pub async fn acquire(&self, date: NaiveDate) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks.entry(date).or_default().clone()
        };
        lock.lock_owned().await
    }

    #[cfg(test)]
    fn tracked(&self) -> usize {
        self.locks.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

/// A client's request for one slot. `time` is the `HH:MM` label of a grid slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingRequest {
    pub user_id: i64,
    pub service_id: i64,
    pub date: NaiveDate,
    pub time: String,
}

impl BookingRequest {
    pub fn new(user_id: i64, service_id: i64, date: NaiveDate, time: impl Into<String>) -> Self {
        Self {
            user_id,
            service_id,
            date,
            time: time.into(),
        }
    }

    /// Builds a request from raw text, e.g. values carried through a chat session.
    pub fn parse(user_id: i64, service_id: i64, date: &str, time: &str) -> Result<Self, BookingError> {
        let date = parse_date(date).map_err(|e| BookingError::InvalidInput(e.to_string()))?;
        Ok(Self::new(user_id, service_id, date, time.trim()))
    }
}

#[derive(Clone)]
/// Creates bookings and moves them through their status transitions.
pub struct BookingLifecycle {
    pool: SqlitePool,
    slots: SlotAvailabilityEngine,
    gateway: Arc<dyn NotificationGateway>,
    locks: Arc<DateLocks>,
}

impl BookingLifecycle {
    pub fn new(
        pool: SqlitePool,
        slots: SlotAvailabilityEngine,
        gateway: Arc<dyn NotificationGateway>,
    ) -> Self {
        Self {
            pool,
            slots,
            gateway,
            locks: Arc::new(DateLocks::new()),
        }
    }

    /// Engine used for the commit-time slot check.
    pub fn slots(&self) -> &SlotAvailabilityEngine {
        &self.slots
    }

    /// Commits a pending booking if the slot is still free at `now`.
    pub async fn create(
        &self,
        request: &BookingRequest,
        now: DateTime<Tz>,
    ) -> Result<BookingDetails, BookingError> {
        let time = self.slots.grid().find(&request.time).ok_or_else(|| {
            BookingError::InvalidInput(format!("'{}' is not a bookable time", request.time))
        })?;
        let service = self.slots.bookable_service(request.service_id).await?;
        if User::find_by_id(&self.pool, request.user_id).await?.is_none() {
            return Err(BookingError::NotFound("user".to_string()));
        }

        let booking_id = {
            let _guard = self.locks.acquire(request.date).await;

            if !self
                .slots
                .is_available(request.date, time, service.duration, now)
                .await?
            {
                tracing::info!(
                    "Slot {} {} no longer available for user {}",
                    request.date,
                    request.time,
                    request.user_id
                );
                return Err(BookingError::SlotUnavailable);
            }

            let new = NewBooking {
                user_id: request.user_id,
                service_id: service.id,
                date: request.date,
                time,
            };
            Booking::insert_if_free(&self.pool, &new, service.duration)
                .await?
                .ok_or(BookingError::SlotUnavailable)?
        };

        let booking = self.details(booking_id).await?;
        tracing::info!(
            "Created booking {} for user {}: service {} on {} at {}",
            booking.id,
            booking.user_id,
            booking.service_id,
            booking.date,
            booking.time
        );

        self.notify_admins(&messages::booking_created_admin(&booking), booking.id)
            .await;
        Ok(booking)
    }

    /// Client cancellation; only the owner may cancel. Cancelling twice is a no-op.
    pub async fn cancel(&self, booking_id: i64, user_id: i64) -> Result<BookingDetails, BookingError> {
        let booking = self.booking(booking_id).await?;
        if booking.user_id != user_id {
            tracing::warn!(
                "User {} tried to cancel booking {} owned by {}",
                user_id,
                booking_id,
                booking.user_id
            );
            return Err(BookingError::Forbidden);
        }
        self.cancel_booking(booking, false).await
    }

    /// Administrator cancellation without the ownership check.
    pub async fn admin_cancel(&self, booking_id: i64) -> Result<BookingDetails, BookingError> {
        let booking = self.booking(booking_id).await?;
        self.cancel_booking(booking, true).await
    }

    /// Pending to Confirmed; notifies the client.
    pub async fn approve(&self, booking_id: i64) -> Result<BookingDetails, BookingError> {
        self.transition(booking_id, &[BookingStatus::Pending], BookingStatus::Confirmed)
            .await?;
        let booking = self.details(booking_id).await?;
        tracing::info!("Booking {} approved", booking_id);
        self.notify_user(&booking, &messages::booking_approved_user(&booking))
            .await;
        Ok(booking)
    }

    /// Pending to Cancelled; notifies the client.
    pub async fn reject(&self, booking_id: i64) -> Result<BookingDetails, BookingError> {
        self.transition(booking_id, &[BookingStatus::Pending], BookingStatus::Cancelled)
            .await?;
        let booking = self.details(booking_id).await?;
        tracing::info!("Booking {} rejected", booking_id);
        self.notify_user(&booking, &messages::booking_rejected_user(&booking))
            .await;
        Ok(booking)
    }

    /// Marks a confirmed visit as done.
    pub async fn complete(&self, booking_id: i64) -> Result<BookingDetails, BookingError> {
        self.transition(booking_id, &[BookingStatus::Confirmed], BookingStatus::Completed)
            .await?;
        let booking = self.details(booking_id).await?;
        tracing::info!("Booking {} completed", booking_id);
        self.notify_user(&booking, &messages::booking_completed_user(&booking))
            .await;
        Ok(booking)
    }

    /// A client's bookings except cancelled ones, newest first.
    pub async fn user_bookings(&self, user_id: i64) -> Result<Vec<BookingDetails>, BookingError> {
        Ok(BookingDetails::find_by_user(&self.pool, user_id).await?)
    }

    /// A client's pending and confirmed bookings.
    pub async fn user_active_bookings(&self, user_id: i64) -> Result<Vec<BookingDetails>, BookingError> {
        let bookings = BookingDetails::find_by_user(&self.pool, user_id).await?;
        Ok(bookings
            .into_iter()
            .filter(|b| BookingStatus::ACTIVE.contains(&b.status))
            .collect())
    }

    /// Bookings across all clients, latest appointment first.
    pub async fn recent(&self, limit: i64) -> Result<Vec<BookingDetails>, BookingError> {
        Ok(BookingDetails::find_recent(&self.pool, limit).await?)
    }

    /// Bookings dated `start..=end` with one of `statuses`.
    pub async fn find_by_date_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        statuses: &[BookingStatus],
    ) -> Result<Vec<BookingDetails>, BookingError> {
        if start > end {
            return Err(BookingError::InvalidInput("start date is after end date".to_string()));
        }
        Ok(BookingDetails::find_by_date_range(&self.pool, start, end, statuses).await?)
    }

    async fn cancel_booking(
        &self,
        booking: Booking,
        by_admin: bool,
    ) -> Result<BookingDetails, BookingError> {
        match booking.status {
            BookingStatus::Cancelled => return self.details(booking.id).await,
            BookingStatus::Completed => return Err(BookingError::AlreadyProcessed),
            BookingStatus::Pending | BookingStatus::Confirmed => {}
        }

        let changed = Booking::transition(
            &self.pool,
            booking.id,
            &BookingStatus::ACTIVE,
            BookingStatus::Cancelled,
        )
        .await?;
        let details = self.details(booking.id).await?;
        if !changed {
            // Lost a race with another transition
            return match details.status {
                BookingStatus::Cancelled => Ok(details),
                _ => Err(BookingError::AlreadyProcessed),
            };
        }

        tracing::info!(
            "Booking {} cancelled by {}",
            booking.id,
            if by_admin { "admin" } else { "client" }
        );
        self.notify_user(&details, &messages::booking_cancelled_user(&details))
            .await;
        self.notify_admins(&messages::booking_cancelled_admin(&details, by_admin), details.id)
            .await;
        Ok(details)
    }

    async fn transition(
        &self,
        booking_id: i64,
        from: &[BookingStatus],
        to: BookingStatus,
    ) -> Result<(), BookingError> {
        if Booking::transition(&self.pool, booking_id, from, to).await? {
            return Ok(());
        }
        match Booking::find_by_id(&self.pool, booking_id).await? {
            Some(_) => Err(BookingError::AlreadyProcessed),
            None => Err(BookingError::NotFound("booking".to_string())),
        }
    }

    async fn booking(&self, booking_id: i64) -> Result<Booking, BookingError> {
        Booking::find_by_id(&self.pool, booking_id)
            .await?
            .ok_or_else(|| BookingError::NotFound("booking".to_string()))
    }

    async fn details(&self, booking_id: i64) -> Result<BookingDetails, BookingError> {
        BookingDetails::find_by_id(&self.pool, booking_id)
            .await?
            .ok_or_else(|| BookingError::NotFound("booking".to_string()))
    }

    async fn notify_user(&self, booking: &BookingDetails, message: &RenderedMessage) {
        if let Err(e) = self.gateway.send_to_user(booking.user_id, message).await {
            tracing::warn!(
                "Failed to notify user {} about booking {}: {}",
                booking.user_id,
                booking.id,
                e
            );
        }
    }

    async fn notify_admins(&self, message: &RenderedMessage, booking_id: i64) {
        if let Err(e) = self.gateway.send_to_admins(message).await {
            tracing::warn!("Failed to notify admins about booking {}: {}", booking_id, e);
        }
    }
}
