//! # Salon Booking Bot
//!
//! A Telegram bot for booking massage and depilation appointments.
//!
//! ## Features
//! - Step-by-step booking over inline keyboards (service, date, time)
//! - Conflict-free scheduling of variable-length services
//! - Administrator approval, rejection, completion and cancellation
//! - Reminders the day before and an hour before, plus a morning digest for admins
//! - Time-boxed percentage discounts announced on a promotion channel
//! - Persistent storage with SQLite

/// Bot command handlers, keyboards and dialogue state
pub mod bot;
/// Configuration management and environment variables
pub mod config;
/// Database models, connections, and migrations
pub mod database;
/// Error taxonomy of the booking core
pub mod error;
/// Booking core and background services like reminders and notifications
pub mod services;
/// Utility functions for datetime, validation, and formatting
pub mod utils;
