#![allow(dead_code, clippy::unwrap_used)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone};
use chrono_tz::Tz;
use salon_booking_bot::database::connection::DatabaseManager;
use salon_booking_bot::database::models::service::{NewService, Service};
use salon_booking_bot::database::models::user::User;
use salon_booking_bot::services::booking::BookingLifecycle;
use salon_booking_bot::services::clock::Clock;
use salon_booking_bot::services::notification::{DeliveryError, NotificationGateway, RenderedMessage};
use salon_booking_bot::services::slots::{SlotAvailabilityEngine, TimeSlotGrid};
use sqlx::SqlitePool;
use tempfile::{tempdir, TempDir};

pub const SALON_TZ: Tz = chrono_tz::Europe::Moscow;

pub async fn setup_test_db() -> (DatabaseManager, TempDir) {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("test.db");
    let db_url = format!("sqlite:{}", db_path.to_string_lossy());

    let db = DatabaseManager::new(&db_url).await.unwrap();
    db.run_migrations().await.unwrap();
    (db, dir)
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn salon_time(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Tz> {
    SALON_TZ.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
}

/// Clock pinned to a settable instant.
pub struct FixedClock {
    now: Mutex<DateTime<Tz>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Tz>) -> Self {
        Self { now: Mutex::new(now) }
    }

    pub fn set(&self, now: DateTime<Tz>) {
        *self.now.lock().unwrap() = now;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Tz> {
        *self.now.lock().unwrap()
    }

    fn timezone(&self) -> Tz {
        SALON_TZ
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
    User(i64, RenderedMessage),
    Admins(RenderedMessage),
    Channel(RenderedMessage),
}

/// Gateway that records every message and can be switched to fail.
#[derive(Default)]
pub struct RecordingGateway {
    sent: Mutex<Vec<Sent>>,
    failing: AtomicBool,
    channel: bool,
}

impl RecordingGateway {
    pub fn with_channel() -> Self {
        Self {
            channel: true,
            ..Self::default()
        }
    }

    pub fn fail(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    pub fn to_user(&self, user_id: i64) -> Vec<RenderedMessage> {
        self.sent()
            .into_iter()
            .filter_map(|s| match s {
                Sent::User(id, m) if id == user_id => Some(m),
                _ => None,
            })
            .collect()
    }

    pub fn to_admins(&self) -> Vec<RenderedMessage> {
        self.sent()
            .into_iter()
            .filter_map(|s| match s {
                Sent::Admins(m) => Some(m),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.sent.lock().unwrap().clear();
    }

    fn record(&self, sent: Sent) -> Result<(), DeliveryError> {
        // Attempts are recorded even when delivery fails
        self.sent.lock().unwrap().push(sent);
        if self.failing.load(Ordering::SeqCst) {
            return Err(DeliveryError::Partial { delivered: 0, total: 1 });
        }
        Ok(())
    }
}

#[async_trait]
impl NotificationGateway for RecordingGateway {
    async fn send_to_user(&self, user_id: i64, message: &RenderedMessage) -> Result<(), DeliveryError> {
        self.record(Sent::User(user_id, message.clone()))
    }

    async fn send_to_admins(&self, message: &RenderedMessage) -> Result<(), DeliveryError> {
        self.record(Sent::Admins(message.clone()))
    }

    async fn send_to_channel(&self, message: &RenderedMessage) -> Result<(), DeliveryError> {
        if !self.channel {
            return Err(DeliveryError::NoChannel);
        }
        self.record(Sent::Channel(message.clone()))
    }
}

pub async fn create_user(pool: &SqlitePool, id: i64, first_name: &str) -> User {
    User::upsert(pool, id, Some(format!("client{id}")), first_name.to_string(), String::new())
        .await
        .unwrap()
}

pub async fn create_service(pool: &SqlitePool, name: &str, duration: i64, price: i64) -> Service {
    Service::create(
        pool,
        &NewService {
            name: name.to_string(),
            description: format!("{name} description"),
            duration,
            price,
        },
    )
    .await
    .unwrap()
}

pub fn engine(pool: &SqlitePool) -> SlotAvailabilityEngine {
    SlotAvailabilityEngine::new(pool.clone(), TimeSlotGrid::default(), SALON_TZ)
}

pub fn lifecycle(pool: &SqlitePool, gateway: Arc<RecordingGateway>) -> BookingLifecycle {
    BookingLifecycle::new(pool.clone(), engine(pool), gateway)
}
