//! Promotional discounts: price overlay and administration.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use sqlx::SqlitePool;

use crate::database::models::discount::{Discount, NewDiscount};
use crate::database::models::service::Service;
use crate::error::BookingError;
use crate::services::messages;
use crate::services::notification::{DeliveryError, NotificationGateway};
use crate::utils::validation::{validate_discount_name, validate_percentage};

/// `price - floor(price * pct / 100)` for non-negative prices. Computed in
/// i128; a result outside i64 leaves the base price.
pub fn apply_percentage(price: i64, percentage: i64) -> i64 {
    let wide = i128::from(price);
    let discounted = wide - wide * i128::from(percentage) / 100;
    i64::try_from(discounted).unwrap_or(price)
}

/// The discount that applies to `service_id` at `now`. Among several, the
/// highest percentage wins, then the lowest id.
pub fn applicable_discount(
    discounts: &[Discount],
    service_id: i64,
    now: DateTime<Utc>,
) -> Option<&Discount> {
    discounts
        .iter()
        .filter(|d| d.service_id == service_id && d.applies_at(now))
        .min_by(|a, b| b.percentage.cmp(&a.percentage).then(a.id.cmp(&b.id)))
}

/// Price of `service` at `now` after the applicable discount, if any.
pub fn effective_price(service: &Service, discounts: &[Discount], now: DateTime<Utc>) -> i64 {
    applicable_discount(discounts, service.id, now)
        .map(|d| apply_percentage(service.price, d.percentage))
        .unwrap_or(service.price)
}

#[derive(Clone)]
/// Discount storage plus price lookup and channel announcements.
pub struct DiscountOverlay {
    pool: SqlitePool,
    gateway: Arc<dyn NotificationGateway>,
    tz: Tz,
}

impl DiscountOverlay {
    pub fn new(pool: SqlitePool, gateway: Arc<dyn NotificationGateway>, tz: Tz) -> Self {
        Self { pool, gateway, tz }
    }

    /// Loads the service's discounts and applies the winning one.
    pub async fn effective_price(
        &self,
        service: &Service,
        now: DateTime<Utc>,
    ) -> Result<i64, BookingError> {
        let discounts = Discount::find_by_service(&self.pool, service.id).await?;
        Ok(effective_price(service, &discounts, now))
    }

    /// Validates and stores a discount, then announces it on the promo channel.
    pub async fn create(&self, new: NewDiscount) -> Result<Discount, BookingError> {
        validate_discount_name(&new.name).map_err(|e| BookingError::InvalidInput(e.to_string()))?;
        validate_percentage(new.percentage).map_err(|e| BookingError::InvalidInput(e.to_string()))?;
        if new.start_at > new.end_at {
            return Err(BookingError::InvalidInput(
                "discount must start before it ends".to_string(),
            ));
        }
        let service = Service::find_by_id(&self.pool, new.service_id)
            .await?
            .ok_or_else(|| BookingError::NotFound("service".to_string()))?;

        let discount = Discount::create(&self.pool, &new).await?;
        tracing::info!(
            "Created discount {} ({}%) for service {}",
            discount.id,
            discount.percentage,
            service.id
        );

        let promotion = messages::discount_promotion(&discount, &service, self.tz);
        match self.gateway.send_to_channel(&promotion).await {
            Ok(()) => tracing::info!("Posted discount {} to channel", discount.id),
            Err(DeliveryError::NoChannel) => {
                tracing::debug!("No channel configured, discount {} not announced", discount.id)
            }
            Err(e) => tracing::warn!("Failed to announce discount {}: {}", discount.id, e),
        }

        Ok(discount)
    }

    /// All discounts, newest first.
    pub async fn list_all(&self) -> Result<Vec<Discount>, BookingError> {
        Ok(Discount::find_all(&self.pool).await?)
    }

    /// Discounts attached to one service.
    pub async fn list_for_service(&self, service_id: i64) -> Result<Vec<Discount>, BookingError> {
        Ok(Discount::find_by_service(&self.pool, service_id).await?)
    }

    /// Flips the active flag and returns the updated discount.
    pub async fn toggle(&self, id: i64) -> Result<Discount, BookingError> {
        if !Discount::toggle_active(&self.pool, id).await? {
            return Err(BookingError::NotFound("discount".to_string()));
        }
        Discount::find_by_id(&self.pool, id)
            .await?
            .ok_or_else(|| BookingError::NotFound("discount".to_string()))
    }

    /// Removes a discount for good.
    pub async fn delete(&self, id: i64) -> Result<(), BookingError> {
        if !Discount::delete(&self.pool, id).await? {
            return Err(BookingError::NotFound("discount".to_string()));
        }
        tracing::info!("Deleted discount {}", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn discount(id: i64, service_id: i64, percentage: i64, active: bool) -> Discount {
        let start = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        Discount {
            id,
            service_id,
            name: format!("promo {id}"),
            percentage,
            start_at: start,
            end_at: start + Duration::days(10),
            is_active: active,
            created_at: start,
        }
    }

    #[test]
    fn test_apply_percentage_floors_the_discount() {
        assert_eq!(apply_percentage(300000, 20), 240000);
        assert_eq!(apply_percentage(999, 15), 850);
        assert_eq!(apply_percentage(0, 50), 0);
    }

    #[test]
    fn test_apply_percentage_on_extreme_prices() {
        assert_eq!(apply_percentage(100_000_000_000_000_000, 99), 1_000_000_000_000_000);
        assert_eq!(apply_percentage(i64::MAX, 99), 92_233_720_368_547_759);
        assert!(apply_percentage(i64::MAX, 1) > 0);
    }

    #[test]
    fn test_highest_percentage_then_lowest_id_wins() {
        let now = Utc.with_ymd_and_hms(2024, 6, 5, 12, 0, 0).unwrap();
        let discounts = vec![
            discount(3, 1, 30, true),
            discount(2, 1, 30, true),
            discount(1, 1, 10, true),
            discount(4, 1, 50, false),
            discount(5, 2, 90, true),
        ];

        let chosen = applicable_discount(&discounts, 1, now).unwrap();
        assert_eq!(chosen.id, 2);
    }

    #[test]
    fn test_window_bounds_are_inclusive() {
        let d = discount(1, 1, 10, true);
        assert!(applicable_discount(std::slice::from_ref(&d), 1, d.start_at).is_some());
        assert!(applicable_discount(std::slice::from_ref(&d), 1, d.end_at).is_some());
        assert!(applicable_discount(std::slice::from_ref(&d), 1, d.end_at + Duration::seconds(1)).is_none());
    }
}
