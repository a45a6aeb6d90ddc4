use serde::Serialize;
use sqlx::SqlitePool;

use crate::database::models::booking::{Booking, BookingStatus};
use crate::database::models::service::Service;
use crate::database::models::user::User;
use crate::error::BookingError;

/// Salon-wide totals shown on the admin statistics screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SalonStats {
    pub total_users: i64,
    pub total_bookings: i64,
    pub active_bookings: i64,
    pub completed_bookings: i64,
    pub cancelled_bookings: i64,
    pub active_services: i64,
}

/// Counts everything shown on the statistics screen.
pub async fn collect(pool: &SqlitePool) -> Result<SalonStats, BookingError> {
    Ok(SalonStats {
        total_users: User::count(pool).await?,
        total_bookings: Booking::count(pool).await?,
        active_bookings: Booking::count_by_status(pool, &BookingStatus::ACTIVE).await?,
        completed_bookings: Booking::count_by_status(pool, &[BookingStatus::Completed]).await?,
        cancelled_bookings: Booking::count_by_status(pool, &[BookingStatus::Cancelled]).await?,
        active_services: Service::count_active(pool).await?,
    })
}
