#![allow(clippy::unwrap_used)]

mod common;

use chrono::NaiveTime;
use common::*;
use salon_booking_bot::database::models::booking::{Booking, BookingStatus, NewBooking};
use salon_booking_bot::error::BookingError;
use salon_booking_bot::services::catalog::Catalog;
use salon_booking_bot::services::slots::{SlotAvailabilityEngine, TimeSlotGrid};

fn t(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

async fn book(pool: &sqlx::SqlitePool, user_id: i64, service_id: i64, day: chrono::NaiveDate, at: NaiveTime, duration: i64) -> i64 {
    let new = NewBooking {
        user_id,
        service_id,
        date: day,
        time: at,
    };
    Booking::insert_if_free(pool, &new, duration).await.unwrap().unwrap()
}

#[tokio::test]
async fn test_empty_day_offers_whole_grid() {
    let (db, _temp_dir) = setup_test_db().await;
    let service = create_service(&db.pool, "Classic massage", 60, 300000).await;

    let slots = engine(&db.pool)
        .available_slots(date(2030, 6, 10), service.id, salon_time(2030, 6, 9, 12, 0))
        .await
        .unwrap();

    assert_eq!(slots.len(), 12);
    assert_eq!(slots.first(), Some(&t(9, 0)));
    assert_eq!(slots.last(), Some(&t(20, 0)));
}

#[tokio::test]
async fn test_long_booking_blocks_every_overlapping_start() {
    let (db, _temp_dir) = setup_test_db().await;
    create_user(&db.pool, 1, "Anna").await;
    let relaxing = create_service(&db.pool, "Relaxing massage", 90, 400000).await;
    let classic = create_service(&db.pool, "Classic massage", 60, 300000).await;
    let day = date(2030, 6, 10);

    book(&db.pool, 1, relaxing.id, day, t(10, 0), relaxing.duration).await;

    let slots = engine(&db.pool)
        .available_slots(day, classic.id, salon_time(2030, 6, 9, 12, 0))
        .await
        .unwrap();

    // [10:00, 11:30) is taken: 09:00 ends exactly at 10:00, 12:00 starts after 11:30
    assert!(slots.contains(&t(9, 0)));
    assert!(!slots.contains(&t(10, 0)));
    assert!(!slots.contains(&t(11, 0)));
    assert!(slots.contains(&t(12, 0)));
}

#[tokio::test]
async fn test_uneven_grid_uses_half_open_intervals() {
    let (db, _temp_dir) = setup_test_db().await;
    create_user(&db.pool, 1, "Anna").await;
    let classic = create_service(&db.pool, "Classic massage", 60, 300000).await;
    let short = create_service(&db.pool, "Arm depilation", 30, 150000).await;
    let day = date(2030, 6, 10);
    let grid = TimeSlotGrid::parse("09:00,09:30,09:45,11:00").unwrap();

    book(&db.pool, 1, classic.id, day, t(10, 0), classic.duration).await;

    let engine = SlotAvailabilityEngine::new(db.pool.clone(), grid, SALON_TZ);
    let slots = engine
        .available_slots(day, short.id, salon_time(2030, 6, 9, 12, 0))
        .await
        .unwrap();

    // 09:30 + 30 min ends exactly at 10:00, 09:45 runs into [10:00, 11:00)
    assert_eq!(slots, vec![t(9, 0), t(9, 30), t(11, 0)]);
}

#[tokio::test]
async fn test_new_service_cannot_run_into_next_booking() {
    let (db, _temp_dir) = setup_test_db().await;
    create_user(&db.pool, 1, "Anna").await;
    let short = create_service(&db.pool, "Arm depilation", 30, 150000).await;
    let long = create_service(&db.pool, "Relaxing massage", 90, 400000).await;
    let day = date(2030, 6, 10);

    book(&db.pool, 1, short.id, day, t(14, 0), short.duration).await;

    let slots = engine(&db.pool)
        .available_slots(day, long.id, salon_time(2030, 6, 9, 12, 0))
        .await
        .unwrap();

    // 13:00 + 90 min would run until 14:30
    assert!(slots.contains(&t(12, 0)));
    assert!(!slots.contains(&t(13, 0)));
    assert!(!slots.contains(&t(14, 0)));
    assert!(slots.contains(&t(15, 0)));
}

#[tokio::test]
async fn test_cancelled_booking_frees_the_slot() {
    let (db, _temp_dir) = setup_test_db().await;
    create_user(&db.pool, 1, "Anna").await;
    let service = create_service(&db.pool, "Classic massage", 60, 300000).await;
    let day = date(2030, 6, 10);
    let now = salon_time(2030, 6, 9, 12, 0);

    let id = book(&db.pool, 1, service.id, day, t(10, 0), service.duration).await;
    assert!(!engine(&db.pool).is_available(day, t(10, 0), 60, now).await.unwrap());

    Booking::transition(&db.pool, id, &BookingStatus::ACTIVE, BookingStatus::Cancelled)
        .await
        .unwrap();
    assert!(engine(&db.pool).is_available(day, t(10, 0), 60, now).await.unwrap());
}

#[tokio::test]
async fn test_completed_booking_still_occupies_the_slot() {
    let (db, _temp_dir) = setup_test_db().await;
    create_user(&db.pool, 1, "Anna").await;
    let service = create_service(&db.pool, "Classic massage", 60, 300000).await;
    let day = date(2030, 6, 10);

    let id = book(&db.pool, 1, service.id, day, t(10, 0), service.duration).await;
    Booking::transition(&db.pool, id, &[BookingStatus::Pending], BookingStatus::Confirmed)
        .await
        .unwrap();
    Booking::transition(&db.pool, id, &[BookingStatus::Confirmed], BookingStatus::Completed)
        .await
        .unwrap();

    let available = engine(&db.pool)
        .is_available(day, t(10, 0), 60, salon_time(2030, 6, 9, 12, 0))
        .await
        .unwrap();
    assert!(!available);
}

#[tokio::test]
async fn test_today_hides_past_slots() {
    let (db, _temp_dir) = setup_test_db().await;
    let service = create_service(&db.pool, "Classic massage", 60, 300000).await;

    let slots = engine(&db.pool)
        .available_slots(date(2030, 6, 10), service.id, salon_time(2030, 6, 10, 14, 30))
        .await
        .unwrap();

    assert_eq!(slots.first(), Some(&t(15, 0)));
    assert!(slots.iter().all(|s| *s > t(14, 30)));
}

#[tokio::test]
async fn test_past_date_has_no_slots() {
    let (db, _temp_dir) = setup_test_db().await;
    let service = create_service(&db.pool, "Classic massage", 60, 300000).await;

    let slots = engine(&db.pool)
        .available_slots(date(2030, 6, 9), service.id, salon_time(2030, 6, 10, 8, 0))
        .await
        .unwrap();
    assert!(slots.is_empty());
}

#[tokio::test]
async fn test_disabled_service_is_not_bookable() {
    let (db, _temp_dir) = setup_test_db().await;
    let service = create_service(&db.pool, "Classic massage", 60, 300000).await;
    Catalog::new(db.pool.clone()).toggle_active(service.id).await.unwrap();

    let result = engine(&db.pool)
        .available_slots(date(2030, 6, 10), service.id, salon_time(2030, 6, 9, 12, 0))
        .await;
    assert!(matches!(result, Err(BookingError::NotFound(_))));
}

#[tokio::test]
async fn test_guarded_insert_rejects_overlap() {
    let (db, _temp_dir) = setup_test_db().await;
    create_user(&db.pool, 1, "Anna").await;
    create_user(&db.pool, 2, "Boris").await;
    let service = create_service(&db.pool, "Relaxing massage", 90, 400000).await;
    let day = date(2030, 6, 10);

    book(&db.pool, 1, service.id, day, t(10, 0), service.duration).await;

    let overlapping = NewBooking {
        user_id: 2,
        service_id: service.id,
        date: day,
        time: t(11, 0),
    };
    let second = Booking::insert_if_free(&db.pool, &overlapping, service.duration)
        .await
        .unwrap();
    assert_eq!(second, None);

    let other_day = NewBooking {
        date: date(2030, 6, 11),
        ..overlapping
    };
    assert!(Booking::insert_if_free(&db.pool, &other_day, service.duration)
        .await
        .unwrap()
        .is_some());
}
