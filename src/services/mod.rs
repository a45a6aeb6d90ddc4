pub mod booking;
pub mod catalog;
pub mod clock;
pub mod discount;
pub mod health;
pub mod messages;
pub mod notification;
pub mod reminder;
pub mod slots;
pub mod stats;
