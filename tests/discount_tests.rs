#![allow(clippy::unwrap_used)]

mod common;

use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use common::*;
use salon_booking_bot::database::models::discount::NewDiscount;
use salon_booking_bot::error::BookingError;
use salon_booking_bot::services::discount::DiscountOverlay;

fn june(service_id: i64, name: &str, percentage: i64) -> NewDiscount {
    NewDiscount {
        service_id,
        name: name.to_string(),
        percentage,
        start_at: Utc.with_ymd_and_hms(2030, 6, 1, 0, 0, 0).unwrap(),
        end_at: Utc.with_ymd_and_hms(2030, 6, 30, 23, 59, 59).unwrap(),
    }
}

#[tokio::test]
async fn test_discount_changes_effective_price_inside_window() {
    let (db, _temp_dir) = setup_test_db().await;
    let overlay = DiscountOverlay::new(db.pool.clone(), Arc::new(RecordingGateway::default()), SALON_TZ);
    let service = create_service(&db.pool, "Classic massage", 60, 300000).await;
    overlay.create(june(service.id, "Summer", 20)).await.unwrap();

    let inside = Utc.with_ymd_and_hms(2030, 6, 15, 12, 0, 0).unwrap();
    let before = Utc.with_ymd_and_hms(2030, 5, 31, 23, 59, 59).unwrap();
    let after = Utc.with_ymd_and_hms(2030, 7, 1, 0, 0, 0).unwrap();

    assert_eq!(overlay.effective_price(&service, inside).await.unwrap(), 240000);
    assert_eq!(overlay.effective_price(&service, before).await.unwrap(), 300000);
    assert_eq!(overlay.effective_price(&service, after).await.unwrap(), 300000);
}

#[tokio::test]
async fn test_best_discount_wins() {
    let (db, _temp_dir) = setup_test_db().await;
    let overlay = DiscountOverlay::new(db.pool.clone(), Arc::new(RecordingGateway::default()), SALON_TZ);
    let service = create_service(&db.pool, "Sports massage", 60, 350000).await;
    overlay.create(june(service.id, "Small", 10)).await.unwrap();
    overlay.create(june(service.id, "Big", 30)).await.unwrap();

    let now = Utc.with_ymd_and_hms(2030, 6, 15, 12, 0, 0).unwrap();
    assert_eq!(overlay.effective_price(&service, now).await.unwrap(), 245000);
}

#[tokio::test]
async fn test_toggle_and_delete() {
    let (db, _temp_dir) = setup_test_db().await;
    let overlay = DiscountOverlay::new(db.pool.clone(), Arc::new(RecordingGateway::default()), SALON_TZ);
    let service = create_service(&db.pool, "Classic massage", 60, 300000).await;
    let discount = overlay.create(june(service.id, "Summer", 20)).await.unwrap();
    let now = Utc.with_ymd_and_hms(2030, 6, 15, 12, 0, 0).unwrap();

    let toggled = overlay.toggle(discount.id).await.unwrap();
    assert!(!toggled.is_active);
    assert_eq!(overlay.effective_price(&service, now).await.unwrap(), 300000);

    overlay.toggle(discount.id).await.unwrap();
    assert_eq!(overlay.effective_price(&service, now).await.unwrap(), 240000);

    overlay.delete(discount.id).await.unwrap();
    assert!(overlay.list_all().await.unwrap().is_empty());
    assert!(matches!(overlay.delete(discount.id).await, Err(BookingError::NotFound(_))));
    assert!(matches!(overlay.toggle(discount.id).await, Err(BookingError::NotFound(_))));
}

#[tokio::test]
async fn test_create_validates() {
    let (db, _temp_dir) = setup_test_db().await;
    let overlay = DiscountOverlay::new(db.pool.clone(), Arc::new(RecordingGateway::default()), SALON_TZ);
    let service = create_service(&db.pool, "Classic massage", 60, 300000).await;

    for percentage in [0, 100, -5] {
        let result = overlay.create(june(service.id, "Bad", percentage)).await;
        assert!(matches!(result, Err(BookingError::InvalidInput(_))), "{percentage}");
    }

    let mut reversed = june(service.id, "Reversed", 10);
    reversed.end_at = reversed.start_at - Duration::days(1);
    assert!(matches!(overlay.create(reversed).await, Err(BookingError::InvalidInput(_))));

    let result = overlay.create(june(9999, "Orphan", 10)).await;
    assert!(matches!(result, Err(BookingError::NotFound(_))));

    assert!(overlay.list_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_new_discount_is_announced_on_channel() {
    let (db, _temp_dir) = setup_test_db().await;
    let gateway = Arc::new(RecordingGateway::with_channel());
    let overlay = DiscountOverlay::new(db.pool.clone(), gateway.clone(), SALON_TZ);
    let service = create_service(&db.pool, "Classic massage", 60, 300000).await;

    overlay.create(june(service.id, "Summer", 20)).await.unwrap();

    let sent = gateway.sent();
    assert_eq!(sent.len(), 1);
    assert!(matches!(&sent[0], Sent::Channel(_)));
    if let Sent::Channel(message) = &sent[0] {
        assert!(message.text.contains("Summer"));
        assert!(message.text.contains("2400 ₽"));
        assert_eq!(message.actions[0].callback_data, "book");
    }
}

#[tokio::test]
async fn test_missing_channel_does_not_fail_creation() {
    let (db, _temp_dir) = setup_test_db().await;
    let gateway = Arc::new(RecordingGateway::default());
    let overlay = DiscountOverlay::new(db.pool.clone(), gateway.clone(), SALON_TZ);
    let service = create_service(&db.pool, "Classic massage", 60, 300000).await;

    let discount = overlay.create(june(service.id, "Summer", 20)).await.unwrap();
    assert_eq!(overlay.list_for_service(service.id).await.unwrap()[0].id, discount.id);
    assert!(gateway.sent().is_empty());
}
