//! # Salon Booking Bot Main Entry Point
//!
//! Initializes logging, loads configuration, sets up the database and the
//! booking services, starts the reminder sweeps and the health server, and
//! runs the Telegram bot.

use std::sync::Arc;

use anyhow::Result;
use teloxide::dispatching::dialogue::InMemStorage;
use teloxide::prelude::*;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use salon_booking_bot::bot::handlers::{AppContext, BotHandler};
use salon_booking_bot::bot::state::BookingState;
use salon_booking_bot::config::Config;
use salon_booking_bot::database::connection::DatabaseManager;
use salon_booking_bot::services::booking::BookingLifecycle;
use salon_booking_bot::services::catalog::Catalog;
use salon_booking_bot::services::clock::{Clock, SystemClock};
use salon_booking_bot::services::discount::DiscountOverlay;
use salon_booking_bot::services::health::HealthService;
use salon_booking_bot::services::notification::{NotificationGateway, TelegramGateway};
use salon_booking_bot::services::reminder::{ReminderPolicy, ReminderService, ReminderSweeper};
use salon_booking_bot::services::slots::SlotAvailabilityEngine;
use salon_booking_bot::utils::logging::log_system_event;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "salon_booking_bot=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();
    let config = Arc::new(Config::from_env()?);

    info!("Starting Salon Booking Bot v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Configuration loaded - Database: {}, HTTP Port: {}, Timezone: {}, Admins: {}",
        config.database_url,
        config.http_port,
        config.timezone,
        config.admin_user_ids.len()
    );
    if config.admin_user_ids.is_empty() {
        tracing::warn!("ADMIN_USER_IDS is empty, bookings cannot be approved");
    }

    info!("Initializing database connection...");
    let db = DatabaseManager::new(&config.database_url).await?;
    info!("Running database migrations...");
    db.run_migrations().await?;

    let catalog = Catalog::new(db.pool.clone());
    let seeded = catalog.seed_defaults().await?;
    if seeded > 0 {
        info!("Seeded {} default services", seeded);
    }
    info!("Database initialized successfully");

    let bot = Bot::new(&config.telegram_bot_token);
    let gateway: Arc<dyn NotificationGateway> = Arc::new(TelegramGateway::new(
        bot.clone(),
        config.admin_user_ids.clone(),
        config.channel.clone(),
    ));
    let clock: Arc<dyn Clock> = Arc::new(SystemClock::new(config.timezone));

    let slots = SlotAvailabilityEngine::new(
        db.pool.clone(),
        config.time_slots.clone(),
        config.timezone,
    );
    let bookings = BookingLifecycle::new(db.pool.clone(), slots, gateway.clone());
    let discounts = DiscountOverlay::new(db.pool.clone(), gateway.clone(), config.timezone);

    let ctx = AppContext {
        db: db.clone(),
        config: config.clone(),
        clock: clock.clone(),
        catalog,
        bookings,
        discounts,
    };
    let handler = BotHandler::new(ctx);
    info!("Telegram bot initialized successfully");

    info!("Initializing reminder service...");
    let sweeper = ReminderSweeper::new(db.pool.clone(), gateway, clock, ReminderPolicy::default());
    let mut reminder_service = match ReminderService::new(sweeper).await {
        Ok(service) => service,
        Err(e) => {
            tracing::error!("Failed to create reminder service: {}", e);
            return Err(anyhow::anyhow!("Failed to create reminder service: {}", e));
        }
    };

    if let Err(e) = reminder_service.start().await {
        tracing::error!("Failed to start reminder service: {}", e);
    } else {
        info!("Reminder service started successfully");
    }

    let health_service = HealthService::new(db.pool.clone());
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.http_port))
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to port {}: {}", config.http_port, e))?;

    info!("Health check server starting on port {}", config.http_port);
    log_system_event("startup", Some(&format!("timezone {}", config.timezone)));

    let bot_task = tokio::spawn(async move {
        Dispatcher::builder(bot, handler.schema())
            .dependencies(dptree::deps![InMemStorage::<BookingState>::new()])
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;
    });

    let health_task = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, health_service.router).await {
            tracing::error!("Health server error: {}", e);
        }
    });

    tokio::select! {
        result = bot_task => {
            if let Err(e) = result {
                tracing::error!("Bot task error: {}", e);
            }
        }
        result = health_task => {
            if let Err(e) = result {
                tracing::error!("Health task error: {}", e);
            }
        }
    }

    if let Err(e) = reminder_service.stop().await {
        tracing::warn!("Error stopping reminder service: {}", e);
    }

    log_system_event("shutdown", None);
    Ok(())
}
